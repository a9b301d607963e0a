use std::fmt;
use std::str::FromStr;

pub const DEFAULT_STOCK_CODE: &str = "2330";

/// Lookback used by the ranking endpoint, in trading days.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RankingWindow {
    D5,
    D10,
    #[default]
    D20,
    D60,
}

impl RankingWindow {
    pub const ALL: [RankingWindow; 4] = [
        RankingWindow::D5,
        RankingWindow::D10,
        RankingWindow::D20,
        RankingWindow::D60,
    ];

    pub fn days(&self) -> u32 {
        match self {
            RankingWindow::D5 => 5,
            RankingWindow::D10 => 10,
            RankingWindow::D20 => 20,
            RankingWindow::D60 => 60,
        }
    }

    pub fn next(&self) -> RankingWindow {
        let idx = Self::ALL.iter().position(|w| w == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl FromStr for RankingWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let days: u32 = s
            .trim()
            .parse()
            .map_err(|_| format!("invalid ranking window `{s}` (use 5, 10, 20 or 60)"))?;
        Self::ALL
            .into_iter()
            .find(|window| window.days() == days)
            .ok_or_else(|| format!("unsupported ranking window `{days}` (use 5, 10, 20 or 60)"))
    }
}

impl fmt::Display for RankingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} 日", self.days())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum MarketFilter {
    #[default]
    All,
    Market(String),
}

impl MarketFilter {
    pub fn matches(&self, market: &str) -> bool {
        match self {
            MarketFilter::All => true,
            MarketFilter::Market(code) => code == market,
        }
    }

    /// `ALL`, then each configured market, then back to `ALL`.
    pub fn cycle(&self, markets: &[String]) -> MarketFilter {
        let next = match self {
            MarketFilter::All => markets.first(),
            MarketFilter::Market(code) => markets
                .iter()
                .position(|m| m == code)
                .and_then(|idx| markets.get(idx + 1)),
        };
        next.map(|code| MarketFilter::Market(code.clone()))
            .unwrap_or(MarketFilter::All)
    }
}

impl FromStr for MarketFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("market filter cannot be empty".to_string());
        }
        if trimmed.eq_ignore_ascii_case("ALL") {
            Ok(MarketFilter::All)
        } else {
            Ok(MarketFilter::Market(trimmed.to_string()))
        }
    }
}

impl fmt::Display for MarketFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketFilter::All => f.write_str("ALL"),
            MarketFilter::Market(code) => f.write_str(code),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SeriesKind {
    Foreign,
    Trust,
    Dealer,
    Total,
}

impl SeriesKind {
    pub const ALL: [SeriesKind; 4] = [
        SeriesKind::Foreign,
        SeriesKind::Trust,
        SeriesKind::Dealer,
        SeriesKind::Total,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeriesToggles {
    pub foreign: bool,
    pub trust: bool,
    pub dealer: bool,
    pub total: bool,
}

impl Default for SeriesToggles {
    fn default() -> Self {
        SeriesToggles {
            foreign: true,
            trust: true,
            dealer: true,
            total: true,
        }
    }
}

impl SeriesToggles {
    pub fn is_enabled(&self, kind: SeriesKind) -> bool {
        match kind {
            SeriesKind::Foreign => self.foreign,
            SeriesKind::Trust => self.trust,
            SeriesKind::Dealer => self.dealer,
            SeriesKind::Total => self.total,
        }
    }

    pub fn set(&mut self, kind: SeriesKind, enabled: bool) {
        match kind {
            SeriesKind::Foreign => self.foreign = enabled,
            SeriesKind::Trust => self.trust = enabled,
            SeriesKind::Dealer => self.dealer = enabled,
            SeriesKind::Total => self.total = enabled,
        }
    }

    pub fn enabled_count(&self) -> usize {
        SeriesKind::ALL
            .iter()
            .filter(|kind| self.is_enabled(**kind))
            .count()
    }
}

/// The values the page keeps in its controls. Owned by the controller and
/// only changed through dispatched events.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    pub stock_input: String,
    pub log_scale: bool,
    pub market_filter: MarketFilter,
    pub ranking_window: RankingWindow,
    pub toggles: SeriesToggles,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            stock_input: String::new(),
            log_scale: false,
            market_filter: MarketFilter::All,
            ranking_window: RankingWindow::default(),
            toggles: SeriesToggles::default(),
        }
    }
}

impl ViewState {
    /// Code used by reloads that fall back to the default stock.
    pub fn code_or_default(&self) -> String {
        let trimmed = self.stock_input.trim();
        if trimmed.is_empty() {
            DEFAULT_STOCK_CODE.to_string()
        } else {
            trimmed.to_string()
        }
    }
}
