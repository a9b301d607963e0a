//! Broker ranking, latest broker trades and the per-broker trade digest.

use crate::error::{DashError, Result};
use crate::format::{format_count, format_percent};
use crate::model::{
    BrokerRankingPayload, BrokerTradesPayload, TargetBrokerEntry, TargetBrokerPayload, TradeSide,
};
use crate::table::{SignClass, TableBody, classify_sign};

pub const BROKER_RANKING_LIMIT: usize = 50;
pub const BROKER_TRADES_LIMIT: usize = 100;
pub const TARGET_TRADES_SHOWN: usize = 10;

pub const BROKER_RANKING_ERROR_PREFIX: &str = "載入券商排名失敗";
pub const BROKER_TRADES_ERROR_PREFIX: &str = "載入券商交易失敗";
pub const TARGET_BROKERS_ERROR_PREFIX: &str = "載入目標券商失敗";

const UNKNOWN_UPDATED: &str = "未知";

#[derive(Clone, Debug, PartialEq)]
pub struct BrokerRankingTableRow {
    pub rank: usize,
    pub broker_name: String,
    pub net_vol: String,
    pub net_class: SignClass,
    pub buy_count: u64,
    pub sell_count: u64,
    pub stocks_traded: u64,
}

pub fn render_broker_ranking(
    result: &Result<BrokerRankingPayload>,
) -> TableBody<BrokerRankingTableRow> {
    let payload = match result {
        Ok(payload) => payload,
        Err(err) => return TableBody::failure(BROKER_RANKING_ERROR_PREFIX, err),
    };
    if payload.data.is_empty() {
        return TableBody::failure(
            BROKER_RANKING_ERROR_PREFIX,
            &DashError::empty("查無券商排名資料"),
        );
    }
    let rows = payload
        .data
        .iter()
        .take(BROKER_RANKING_LIMIT)
        .enumerate()
        .map(|(idx, row)| {
            let net = row.total_net_vol.unwrap_or(0.0);
            BrokerRankingTableRow {
                rank: idx + 1,
                broker_name: row.broker_name.clone(),
                net_vol: format_count(net),
                net_class: classify_sign(net),
                buy_count: row.buy_count,
                sell_count: row.sell_count,
                stocks_traded: row.stocks_traded,
            }
        })
        .collect();
    TableBody::Rows(rows)
}

#[derive(Clone, Debug, PartialEq)]
pub struct BrokerTradeTableRow {
    pub date: String,
    pub stock_code: String,
    pub broker_name: String,
    pub buy_vol: String,
    pub sell_vol: String,
    pub net_vol: String,
    pub net_class: SignClass,
    pub pct: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BrokerTradesView {
    pub status: String,
    pub body: TableBody<BrokerTradeTableRow>,
}

impl Default for BrokerTradesView {
    fn default() -> Self {
        BrokerTradesView {
            status: String::new(),
            body: TableBody::default(),
        }
    }
}

pub fn trades_status_line(payload: &BrokerTradesPayload) -> String {
    let updated = payload
        .updated
        .as_deref()
        .filter(|value| !value.is_empty())
        .unwrap_or(UNKNOWN_UPDATED);
    let count = payload.count.unwrap_or(0);
    format!("更新時間 {updated}｜共 {count} 筆")
}

pub fn render_broker_trades(result: &Result<BrokerTradesPayload>) -> BrokerTradesView {
    let payload = match result {
        Ok(payload) => payload,
        Err(err) => {
            let body = TableBody::failure(BROKER_TRADES_ERROR_PREFIX, err);
            let status = body.message().unwrap_or_default().to_string();
            return BrokerTradesView { status, body };
        }
    };
    let status = trades_status_line(payload);
    if payload.data.is_empty() {
        return BrokerTradesView {
            status,
            body: TableBody::Message("目前沒有券商交易資料".to_string()),
        };
    }
    let rows = payload
        .data
        .iter()
        .take(BROKER_TRADES_LIMIT)
        .map(|row| {
            let net = row.net_vol.unwrap_or(0.0);
            BrokerTradeTableRow {
                date: row.date.clone(),
                stock_code: row.stock_code.clone(),
                broker_name: row.broker_name.clone(),
                buy_vol: format_count(row.buy_vol.unwrap_or(0.0)),
                sell_vol: format_count(row.sell_vol.unwrap_or(0.0)),
                net_vol: format_count(net),
                net_class: classify_sign(net),
                pct: format_percent(row.pct.unwrap_or(0.0)),
            }
        })
        .collect();
    BrokerTradesView {
        status,
        body: TableBody::Rows(rows),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TargetTradeLine {
    pub stock_code: String,
    pub side: TradeSide,
    pub net_vol: String,
    pub net_class: SignClass,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TargetDigest {
    pub broker_name: String,
    pub total_net_vol: f64,
    pub total: String,
    pub total_class: SignClass,
    pub trades: Vec<TargetTradeLine>,
    pub hidden: usize,
}

impl TargetDigest {
    pub fn more_suffix(&self) -> Option<String> {
        (self.hidden > 0).then(|| format!("…另有 {} 筆", self.hidden))
    }
}

/// The header total covers the whole list, not only the lines shown.
pub fn digest_broker(entry: &TargetBrokerEntry) -> TargetDigest {
    let total_net_vol: f64 = entry
        .trades
        .iter()
        .map(|trade| trade.net_vol.unwrap_or(0.0))
        .sum();
    let trades = entry
        .trades
        .iter()
        .take(TARGET_TRADES_SHOWN)
        .map(|trade| {
            let net = trade.net_vol.unwrap_or(0.0);
            TargetTradeLine {
                stock_code: trade.stock_code.clone(),
                side: trade.side,
                net_vol: format_count(net),
                net_class: classify_sign(net),
            }
        })
        .collect();
    TargetDigest {
        broker_name: entry.broker_name.clone(),
        total_net_vol,
        total: format_count(total_net_vol),
        total_class: classify_sign(total_net_vol),
        trades,
        hidden: entry.trades.len().saturating_sub(TARGET_TRADES_SHOWN),
    }
}

pub fn render_target_brokers(result: &Result<TargetBrokerPayload>) -> TableBody<TargetDigest> {
    match result {
        Ok(payload) if payload.brokers.is_empty() => TableBody::failure(
            TARGET_BROKERS_ERROR_PREFIX,
            &DashError::empty("查無目標券商資料"),
        ),
        Ok(payload) => TableBody::Rows(payload.brokers.iter().map(digest_broker).collect()),
        Err(err) => TableBody::failure(TARGET_BROKERS_ERROR_PREFIX, err),
    }
}
