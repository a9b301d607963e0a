//! Event handling for the dashboard.
//!
//! `Dashboard::dispatch` maps each UI event to its handler. Handlers only
//! touch `ViewState` and hand back the loads to start; fetched results come
//! back through `Dashboard::apply`, which renders the one panel they belong
//! to. Nothing here does I/O, so the whole page logic runs in tests.

use crate::broker::{
    BrokerRankingTableRow, BrokerTradesView, TargetDigest, render_broker_ranking,
    render_broker_trades, render_target_brokers,
};
use crate::chart::{ChartConfig, ChartSlot};
use crate::error::Result;
use crate::format::format_percent;
use crate::model::{
    BrokerRankingPayload, BrokerTradesPayload, RankingRow, TargetBrokerPayload, TimeSeriesPoint,
};
use crate::ranking::{RankingTableRow, render_ranking};
use crate::series::{date_labels, project};
use crate::state::{MarketFilter, RankingWindow, SeriesKind, SeriesToggles, ViewState};
use crate::table::TableBody;
use crate::tabs::{Tab, TabController};

#[derive(Clone, Debug, PartialEq)]
pub enum UiEvent {
    Startup,
    LoadClicked,
    InputEnter,
    InputChanged(String),
    MarketChanged(MarketFilter),
    WindowChanged(RankingWindow),
    LogScaleChanged(bool),
    SeriesToggled(SeriesKind, bool),
    RankingRowClicked(usize),
    TabClicked(Tab),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadRequest {
    Stock {
        code: String,
        toggles: SeriesToggles,
    },
    Ranking {
        window: RankingWindow,
    },
    BrokerRanking,
    BrokerTrades,
    TargetBrokers,
}

#[derive(Debug)]
pub enum LoadOutcome {
    Stock {
        code: String,
        toggles: SeriesToggles,
        result: Result<Vec<TimeSeriesPoint>>,
    },
    Ranking {
        window: RankingWindow,
        result: Result<Vec<RankingRow>>,
    },
    BrokerRanking(Result<BrokerRankingPayload>),
    BrokerTrades(Result<BrokerTradesPayload>),
    TargetBrokers(Result<TargetBrokerPayload>),
}

impl LoadOutcome {
    pub fn panel(&self) -> &'static str {
        match self {
            LoadOutcome::Stock { .. } => "stock",
            LoadOutcome::Ranking { .. } => "ranking",
            LoadOutcome::BrokerRanking(_) => "broker_ranking",
            LoadOutcome::BrokerTrades(_) => "broker_trades",
            LoadOutcome::TargetBrokers(_) => "target_brokers",
        }
    }

    /// Error kind and message when the load failed.
    pub fn failure(&self) -> Option<(&'static str, String)> {
        let err = match self {
            LoadOutcome::Stock { result, .. } => result.as_ref().err(),
            LoadOutcome::Ranking { result, .. } => result.as_ref().err(),
            LoadOutcome::BrokerRanking(result) => result.as_ref().err(),
            LoadOutcome::BrokerTrades(result) => result.as_ref().err(),
            LoadOutcome::TargetBrokers(result) => result.as_ref().err(),
        }?;
        Some((err.kind(), err.to_string()))
    }
}

/// Everything currently on screen.
#[derive(Debug, Default)]
pub struct Panels {
    pub chart: ChartSlot,
    pub chart_title: String,
    pub chart_status: String,
    /// The load button is disabled while a stock load is in flight.
    pub stock_loading: bool,
    pub ranking: TableBody<RankingTableRow>,
    pub broker_ranking: TableBody<BrokerRankingTableRow>,
    pub broker_trades: BrokerTradesView,
    pub target_brokers: TableBody<TargetDigest>,
}

#[derive(Debug)]
pub struct Dashboard {
    pub state: ViewState,
    pub tabs: TabController,
    pub panels: Panels,
    default_code: String,
}

impl Dashboard {
    pub fn new(state: ViewState, default_code: impl Into<String>) -> Dashboard {
        Dashboard {
            state,
            tabs: TabController::default(),
            panels: Panels::default(),
            default_code: default_code.into(),
        }
    }

    pub fn dispatch(&mut self, event: UiEvent) -> Vec<LoadRequest> {
        match event {
            UiEvent::Startup => self.on_startup(),
            UiEvent::LoadClicked => self.on_load_clicked(),
            UiEvent::InputEnter => self.load_input(),
            UiEvent::InputChanged(value) => {
                self.state.stock_input = value;
                Vec::new()
            }
            UiEvent::MarketChanged(filter) => {
                self.state.market_filter = filter;
                vec![self.ranking_request()]
            }
            UiEvent::WindowChanged(window) => {
                self.state.ranking_window = window;
                vec![self.ranking_request()]
            }
            UiEvent::LogScaleChanged(enabled) => {
                self.state.log_scale = enabled;
                self.reload_chart()
            }
            UiEvent::SeriesToggled(kind, enabled) => {
                self.state.toggles.set(kind, enabled);
                self.reload_chart()
            }
            UiEvent::RankingRowClicked(index) => self.on_ranking_row_clicked(index),
            UiEvent::TabClicked(tab) => self.tabs.activate(tab).into_iter().collect(),
        }
    }

    fn on_startup(&mut self) -> Vec<LoadRequest> {
        self.state.stock_input = self.default_code.clone();
        let mut requests = self.load_input();
        requests.push(self.ranking_request());
        requests
    }

    fn on_load_clicked(&mut self) -> Vec<LoadRequest> {
        if self.panels.stock_loading {
            return Vec::new();
        }
        self.load_input()
    }

    fn load_input(&mut self) -> Vec<LoadRequest> {
        let code = self.state.stock_input.clone();
        self.begin_stock_load(&code).into_iter().collect()
    }

    fn reload_chart(&mut self) -> Vec<LoadRequest> {
        let code = self.state.code_or_default();
        self.begin_stock_load(&code).into_iter().collect()
    }

    fn on_ranking_row_clicked(&mut self, index: usize) -> Vec<LoadRequest> {
        let Some(code) = self.panels.ranking.rows().get(index).map(|row| row.code.clone()) else {
            return Vec::new();
        };
        self.state.stock_input = code.clone();
        self.begin_stock_load(&code).into_iter().collect()
    }

    fn begin_stock_load(&mut self, code: &str) -> Option<LoadRequest> {
        let code = code.trim();
        if code.is_empty() {
            return None;
        }
        self.panels.stock_loading = true;
        self.panels.chart_status = format!("載入 {code}...");
        Some(LoadRequest::Stock {
            code: code.to_string(),
            toggles: self.state.toggles,
        })
    }

    fn ranking_request(&self) -> LoadRequest {
        LoadRequest::Ranking {
            window: self.state.ranking_window,
        }
    }

    /// Renders a finished load. The market filter and log-scale flag are
    /// read now, not when the request was issued.
    pub fn apply(&mut self, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Stock {
                code,
                toggles,
                result,
            } => self.apply_stock(&code, toggles, result),
            LoadOutcome::Ranking { window, result } => {
                tracing::debug!(window = window.days(), market = %self.state.market_filter, "ranking applied");
                self.panels.ranking = render_ranking(&result, &self.state.market_filter);
            }
            LoadOutcome::BrokerRanking(result) => {
                self.panels.broker_ranking = render_broker_ranking(&result);
            }
            LoadOutcome::BrokerTrades(result) => {
                self.panels.broker_trades = render_broker_trades(&result);
            }
            LoadOutcome::TargetBrokers(result) => {
                self.panels.target_brokers = render_target_brokers(&result);
            }
        }
    }

    fn apply_stock(
        &mut self,
        code: &str,
        toggles: SeriesToggles,
        result: Result<Vec<TimeSeriesPoint>>,
    ) {
        self.panels.stock_loading = false;
        let points = match result {
            Ok(points) => points,
            Err(err) => {
                self.panels.chart_status = format!("載入失敗：{err}");
                return;
            }
        };
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            self.panels.chart_status = format!("找不到 {code} 資料");
            return;
        };
        let market = if first.market.is_empty() {
            "未知市場"
        } else {
            first.market.as_str()
        };
        self.panels.chart_title = format!("{code} {}（{market}）三大法人持股比重", first.name);
        self.panels.chart_status = format!(
            "最新日期 {} 三大法人持股約 {}%",
            last.date,
            format_percent(last.three_inst_ratio.unwrap_or(0.0))
        );
        let config = ChartConfig::line(
            date_labels(&points),
            project(&points, toggles),
            self.state.log_scale,
        );
        let chart_id = self.panels.chart.update(config).id();
        tracing::debug!(
            chart = chart_id,
            series = toggles.enabled_count(),
            live = self.panels.chart.canvas().live_instances(),
            "chart rebuilt"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ScaleType;
    use crate::error::DashError;
    use crate::fetcher::decode_response;

    fn dashboard() -> Dashboard {
        Dashboard::new(ViewState::default(), "2330")
    }

    fn stock_outcome(code: &str, body: &str) -> LoadOutcome {
        LoadOutcome::Stock {
            code: code.to_string(),
            toggles: SeriesToggles::default(),
            result: decode_response(200, body.as_bytes()),
        }
    }

    fn ranking_body() -> &'static str {
        r#"[
            {"code":"2330","name":"台積電","market":"上市","three_inst_ratio":75.1,"change":2.0},
            {"code":"6488","name":"環球晶","market":"上櫃","three_inst_ratio":40.0,"change":1.5},
            {"code":"2317","name":"鴻海","market":"上市","three_inst_ratio":50.2,"change":0.0}
        ]"#
    }

    #[test]
    fn startup_loads_default_stock_and_ranking() {
        let mut dash = dashboard();
        let requests = dash.dispatch(UiEvent::Startup);
        assert_eq!(dash.state.stock_input, "2330");
        assert_eq!(
            requests,
            vec![
                LoadRequest::Stock {
                    code: "2330".to_string(),
                    toggles: SeriesToggles::default()
                },
                LoadRequest::Ranking {
                    window: RankingWindow::D20
                },
            ]
        );
        assert!(dash.panels.stock_loading);
        assert_eq!(dash.panels.chart_status, "載入 2330...");
    }

    #[test]
    fn single_point_series_reports_latest_ratio() {
        let mut dash = dashboard();
        dash.dispatch(UiEvent::Startup);
        dash.apply(stock_outcome(
            "2330",
            r#"[{"date":"2024-01-02","three_inst_ratio":75.4321}]"#,
        ));
        assert_eq!(dash.panels.chart_status, "最新日期 2024-01-02 三大法人持股約 75.43%");
        assert_eq!(dash.panels.chart_title, "2330 （未知市場）三大法人持股比重");
        assert!(!dash.panels.stock_loading);
        assert_eq!(dash.panels.chart.canvas().live_instances(), 1);
    }

    #[test]
    fn empty_series_is_not_found_without_chart() {
        let mut dash = dashboard();
        dash.dispatch(UiEvent::Startup);
        dash.apply(stock_outcome("9999", "[]"));
        assert_eq!(dash.panels.chart_status, "找不到 9999 資料");
        assert!(!dash.panels.chart.is_rendered());
        assert!(!dash.panels.stock_loading);
    }

    #[test]
    fn failed_stock_load_keeps_previous_chart() {
        let mut dash = dashboard();
        dash.apply(stock_outcome(
            "2330",
            r#"[{"date":"2024-01-02","name":"台積電","market":"上市","three_inst_ratio":75.0}]"#,
        ));
        dash.apply(LoadOutcome::Stock {
            code: "2317".to_string(),
            toggles: SeriesToggles::default(),
            result: Err(DashError::Fetch { status: 404 }),
        });
        assert_eq!(dash.panels.chart_status, "載入失敗：HTTP 404");
        assert_eq!(dash.panels.chart_title, "2330 台積電（上市）三大法人持股比重");
        assert_eq!(dash.panels.chart.canvas().live_instances(), 1);
    }

    #[test]
    fn empty_code_is_a_no_op() {
        let mut dash = dashboard();
        dash.dispatch(UiEvent::InputChanged("   ".to_string()));
        assert!(dash.dispatch(UiEvent::LoadClicked).is_empty());
        assert!(dash.dispatch(UiEvent::InputEnter).is_empty());
        assert!(!dash.panels.stock_loading);
    }

    #[test]
    fn load_button_is_disabled_while_loading_but_enter_is_not() {
        let mut dash = dashboard();
        dash.dispatch(UiEvent::InputChanged("2317".to_string()));
        assert_eq!(dash.dispatch(UiEvent::LoadClicked).len(), 1);
        assert!(dash.dispatch(UiEvent::LoadClicked).is_empty());
        assert_eq!(dash.dispatch(UiEvent::InputEnter).len(), 1);
    }

    #[test]
    fn toggles_and_log_scale_reload_with_default_fallback() {
        let mut dash = dashboard();
        let requests = dash.dispatch(UiEvent::SeriesToggled(SeriesKind::Trust, false));
        let mut expected_toggles = SeriesToggles::default();
        expected_toggles.trust = false;
        assert_eq!(
            requests,
            vec![LoadRequest::Stock {
                code: "2330".to_string(),
                toggles: expected_toggles
            }]
        );
        let requests = dash.dispatch(UiEvent::LogScaleChanged(true));
        assert!(dash.state.log_scale);
        assert_eq!(requests.len(), 1);
    }

    #[test]
    fn log_scale_is_read_when_the_response_lands() {
        let mut dash = dashboard();
        dash.dispatch(UiEvent::Startup);
        dash.state.log_scale = true;
        dash.apply(stock_outcome(
            "2330",
            r#"[{"date":"2024-01-02","three_inst_ratio":75.0},{"date":"2024-01-03","three_inst_ratio":76.0}]"#,
        ));
        let chart = dash.panels.chart.active().unwrap();
        assert_eq!(chart.config().y_axis.scale, ScaleType::Logarithmic);
        assert_eq!(chart.config().datasets.len(), 4);
    }

    #[test]
    fn ranking_is_filtered_by_current_market() {
        let mut dash = dashboard();
        let requests = dash.dispatch(UiEvent::MarketChanged(MarketFilter::Market(
            "上市".to_string(),
        )));
        assert_eq!(
            requests,
            vec![LoadRequest::Ranking {
                window: RankingWindow::D20
            }]
        );
        dash.apply(LoadOutcome::Ranking {
            window: RankingWindow::D20,
            result: decode_response(200, ranking_body().as_bytes()),
        });
        let codes: Vec<&str> = dash
            .panels
            .ranking
            .rows()
            .iter()
            .map(|row| row.code.as_str())
            .collect();
        assert_eq!(codes, vec!["2330", "2317"]);
    }

    #[test]
    fn window_change_requests_new_ranking() {
        let mut dash = dashboard();
        let requests = dash.dispatch(UiEvent::WindowChanged(RankingWindow::D60));
        assert_eq!(
            requests,
            vec![LoadRequest::Ranking {
                window: RankingWindow::D60
            }]
        );
    }

    #[test]
    fn empty_ranking_renders_message_row() {
        let mut dash = dashboard();
        dash.apply(LoadOutcome::Ranking {
            window: RankingWindow::D20,
            result: decode_response(200, b"[]"),
        });
        assert!(dash.panels.ranking.rows().is_empty());
        assert_eq!(dash.panels.ranking.message(), Some("載入排名失敗：查無排名資料"));
    }

    #[test]
    fn ranking_row_click_retargets_chart() {
        let mut dash = dashboard();
        dash.apply(LoadOutcome::Ranking {
            window: RankingWindow::D20,
            result: decode_response(200, ranking_body().as_bytes()),
        });
        let requests = dash.dispatch(UiEvent::RankingRowClicked(1));
        assert_eq!(dash.state.stock_input, "6488");
        assert_eq!(
            requests,
            vec![LoadRequest::Stock {
                code: "6488".to_string(),
                toggles: SeriesToggles::default()
            }]
        );
        assert!(dash.dispatch(UiEvent::RankingRowClicked(10)).is_empty());
    }

    #[test]
    fn broker_trades_without_updated_use_placeholders() {
        let mut dash = dashboard();
        let requests = dash.dispatch(UiEvent::TabClicked(Tab::BrokerTrades));
        assert_eq!(requests, vec![LoadRequest::BrokerTrades]);
        dash.apply(LoadOutcome::BrokerTrades(decode_response(
            200,
            br#"{"data":[]}"#,
        )));
        assert_eq!(dash.panels.broker_trades.status, "更新時間 未知｜共 0 筆");
    }

    #[test]
    fn panel_failure_leaves_other_panels_alone() {
        let mut dash = dashboard();
        dash.apply(stock_outcome(
            "2330",
            r#"[{"date":"2024-01-02","three_inst_ratio":75.0}]"#,
        ));
        let status = dash.panels.chart_status.clone();
        let outcome = LoadOutcome::BrokerRanking(decode_response(200, b"{oops"));
        assert_eq!(outcome.failure().map(|(kind, _)| kind), Some("parse"));
        dash.apply(outcome);
        assert!(
            dash.panels
                .broker_ranking
                .message()
                .unwrap()
                .starts_with("載入券商排名失敗：")
        );
        assert_eq!(dash.panels.chart_status, status);
        assert!(dash.panels.chart.is_rendered());
    }

    #[test]
    fn late_responses_overwrite_by_arrival() {
        let mut dash = dashboard();
        dash.apply(stock_outcome(
            "2317",
            r#"[{"date":"2024-01-05","name":"鴻海","three_inst_ratio":50.0}]"#,
        ));
        dash.apply(stock_outcome(
            "2330",
            r#"[{"date":"2024-01-02","name":"台積電","three_inst_ratio":75.0}]"#,
        ));
        assert!(dash.panels.chart_title.starts_with("2330 台積電"));
        assert_eq!(dash.panels.chart.canvas().live_instances(), 1);
    }
}
