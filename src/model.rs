//! Payload shapes published by the upstream data pipeline.
//!
//! Every field the page treats leniently (`row.name || ""`) is defaulted
//! here instead of failing the whole payload.

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimeSeriesPoint {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub market: String,
    #[serde(default)]
    pub foreign_ratio: Option<f64>,
    #[serde(default)]
    pub trust_ratio: Option<f64>,
    #[serde(default)]
    pub dealer_ratio: Option<f64>,
    #[serde(default)]
    pub three_inst_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RankingRow {
    #[serde(default, deserialize_with = "string_or_number")]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub market: String,
    #[serde(default)]
    pub three_inst_ratio: Option<f64>,
    #[serde(default)]
    pub change: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BrokerRankingRow {
    #[serde(default)]
    pub broker_name: String,
    #[serde(default)]
    pub total_net_vol: Option<f64>,
    #[serde(default)]
    pub buy_count: u64,
    #[serde(default)]
    pub sell_count: u64,
    #[serde(default)]
    pub stocks_traded: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrokerRankingPayload {
    #[serde(default)]
    pub data: Vec<BrokerRankingRow>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BrokerTradeRow {
    #[serde(default)]
    pub date: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub stock_code: String,
    #[serde(default)]
    pub broker_name: String,
    #[serde(default)]
    pub buy_vol: Option<f64>,
    #[serde(default)]
    pub sell_vol: Option<f64>,
    #[serde(default)]
    pub net_vol: Option<f64>,
    #[serde(default)]
    pub pct: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrokerTradesPayload {
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub data: Vec<BrokerTradeRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn label(&self) -> &'static str {
        match self {
            TradeSide::Buy => "買",
            TradeSide::Sell => "賣",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TargetBrokerTrade {
    #[serde(deserialize_with = "string_or_number")]
    pub stock_code: String,
    pub side: TradeSide,
    #[serde(default)]
    pub net_vol: Option<f64>,
}

/// One broker and its trade list, in payload order.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetBrokerEntry {
    pub broker_name: String,
    pub trades: Vec<TargetBrokerTrade>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetBrokerPayload {
    #[serde(default, deserialize_with = "ordered_brokers")]
    pub brokers: Vec<TargetBrokerEntry>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Int(value) => value.to_string(),
        Raw::Float(value) => value.to_string(),
    })
}

// Keeps the object's key order, which is the order the brokers are shown in.
fn ordered_brokers<'de, D>(deserializer: D) -> Result<Vec<TargetBrokerEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    struct BrokersVisitor;

    impl<'de> Visitor<'de> for BrokersVisitor {
        type Value = Vec<TargetBrokerEntry>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an object mapping broker names to trade lists")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((broker_name, trades)) =
                map.next_entry::<String, Option<Vec<TargetBrokerTrade>>>()?
            {
                entries.push(TargetBrokerEntry {
                    broker_name,
                    trades: trades.unwrap_or_default(),
                });
            }
            Ok(entries)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(BrokersVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeseries_point_tolerates_missing_fields() {
        let points: Vec<TimeSeriesPoint> =
            serde_json::from_str(r#"[{"date":"2024-01-02","three_inst_ratio":75.4321}]"#).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].name, "");
        assert_eq!(points[0].market, "");
        assert_eq!(points[0].foreign_ratio, None);
        assert_eq!(points[0].three_inst_ratio, Some(75.4321));
    }

    #[test]
    fn ranking_code_accepts_numbers() {
        let rows: Vec<RankingRow> = serde_json::from_str(
            r#"[{"code":2330,"name":"台積電","market":"上市","three_inst_ratio":80.1,"change":1.2},
                {"code":"00632R","change":null}]"#,
        )
        .unwrap();
        assert_eq!(rows[0].code, "2330");
        assert_eq!(rows[1].code, "00632R");
        assert_eq!(rows[1].change, None);
    }

    #[test]
    fn ranking_row_without_code_still_parses() {
        let rows: Vec<RankingRow> = serde_json::from_str(
            r#"[{"name":"無代號","market":"上市","three_inst_ratio":12.5,"change":0.3},
                {"code":"2317","name":"鴻海"}]"#,
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].code, "");
        assert_eq!(rows[0].name, "無代號");
        assert_eq!(rows[1].code, "2317");
    }

    #[test]
    fn broker_trades_payload_defaults_missing_header() {
        let payload: BrokerTradesPayload = serde_json::from_str(r#"{"data":[]}"#).unwrap();
        assert!(payload.updated.is_none());
        assert!(payload.count.is_none());
        assert!(payload.data.is_empty());
    }

    #[test]
    fn target_brokers_keep_payload_order() {
        let payload: TargetBrokerPayload = serde_json::from_str(
            r#"{"brokers":{
                "凱基-台北":[{"stock_code":"2330","side":"buy","net_vol":120}],
                "元大":[{"stock_code":"2317","side":"sell","net_vol":-40}],
                "摩根大通":null
            }}"#,
        )
        .unwrap();
        let names: Vec<&str> = payload
            .brokers
            .iter()
            .map(|entry| entry.broker_name.as_str())
            .collect();
        assert_eq!(names, vec!["凱基-台北", "元大", "摩根大通"]);
        assert_eq!(payload.brokers[1].trades[0].side, TradeSide::Sell);
        assert!(payload.brokers[2].trades.is_empty());
    }

    #[test]
    fn unknown_trade_side_is_a_parse_error() {
        let result = serde_json::from_str::<TargetBrokerTrade>(
            r#"{"stock_code":"2330","side":"hold","net_vol":1}"#,
        );
        assert!(result.is_err());
    }
}
