use std::path::PathBuf;

use clap::Parser;

use crate::state::{DEFAULT_STOCK_CODE, MarketFilter, RankingWindow, ViewState};

#[derive(Parser, Clone, Debug)]
#[clap(name = "inst-ratio-dash", about = "三大法人持股比重與券商進出儀表板")]
pub struct CliParams {
    /// Root the pipeline's `data/` directory is served from
    #[clap(
        long = "base-url",
        env = "INST_DASH_BASE_URL",
        default_value = "http://127.0.0.1:8000/"
    )]
    pub base_url: String,

    /// Stock code charted at startup and used when the input is empty
    #[clap(long = "stock", default_value = DEFAULT_STOCK_CODE)]
    pub stock: String,

    /// Ranking window in trading days (5, 10, 20 or 60)
    #[clap(long = "window", value_name = "DAYS", default_value = "20")]
    pub window: RankingWindow,

    /// Initial market filter; ALL or one market code
    #[clap(long = "market", default_value = "ALL")]
    pub market: MarketFilter,

    /// Market codes the filter cycles through after ALL; comma separated
    #[clap(
        long = "markets",
        value_delimiter = ',',
        num_args = 1..,
        default_values_t = vec!["上市".to_string(), "上櫃".to_string()]
    )]
    pub markets: Vec<String>,

    /// Start with a logarithmic Y axis
    #[clap(long = "log-scale")]
    pub log_scale: bool,

    /// Directory for the rolling log file and the failure log
    #[clap(long = "log-dir", env = "INST_DASH_LOG_DIR", default_value = "logs")]
    pub log_dir: PathBuf,
}

impl CliParams {
    pub fn default_code(&self) -> String {
        let trimmed = self.stock.trim();
        if trimmed.is_empty() {
            DEFAULT_STOCK_CODE.to_string()
        } else {
            trimmed.to_string()
        }
    }

    pub fn market_codes(&self) -> Vec<String> {
        self.markets
            .iter()
            .map(|market| market.trim())
            .filter(|market| !market.is_empty() && !market.eq_ignore_ascii_case("ALL"))
            .map(str::to_string)
            .collect()
    }

    pub fn initial_view_state(&self) -> ViewState {
        ViewState {
            log_scale: self.log_scale,
            market_filter: self.market.clone(),
            ranking_window: self.window,
            ..ViewState::default()
        }
    }
}
