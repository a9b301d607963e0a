use crate::dispatch::LoadRequest;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tab {
    Ownership,
    BrokerRanking,
    BrokerTrades,
    TargetBrokers,
}

impl Tab {
    pub const ALL: [Tab; 4] = [
        Tab::Ownership,
        Tab::BrokerRanking,
        Tab::BrokerTrades,
        Tab::TargetBrokers,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Ownership => "三大法人",
            Tab::BrokerRanking => "券商排名",
            Tab::BrokerTrades => "最新券商交易",
            Tab::TargetBrokers => "目標券商",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|tab| tab == self).unwrap_or(0)
    }

    /// Loader run every time the tab is activated. The ownership tab is
    /// filled at startup and by its own controls instead.
    pub fn loader(&self) -> Option<LoadRequest> {
        match self {
            Tab::Ownership => None,
            Tab::BrokerRanking => Some(LoadRequest::BrokerRanking),
            Tab::BrokerTrades => Some(LoadRequest::BrokerTrades),
            Tab::TargetBrokers => Some(LoadRequest::TargetBrokers),
        }
    }
}

/// Exactly one tab is active. Activation re-runs the tab's loader even when
/// the tab was already active.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TabController {
    active: Tab,
}

impl Default for TabController {
    fn default() -> Self {
        TabController {
            active: Tab::Ownership,
        }
    }
}

impl TabController {
    pub fn active(&self) -> Tab {
        self.active
    }

    pub fn is_active(&self, tab: Tab) -> bool {
        self.active == tab
    }

    pub fn activate(&mut self, tab: Tab) -> Option<LoadRequest> {
        self.active = tab;
        tab.loader()
    }

    pub fn neighbour(&self, delta: isize) -> Tab {
        let len = Tab::ALL.len() as isize;
        let idx = (self.active.index() as isize + delta).rem_euclid(len);
        Tab::ALL[idx as usize]
    }
}
