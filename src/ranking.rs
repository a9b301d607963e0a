use crate::error::{DashError, Result};
use crate::format::format_percent;
use crate::model::RankingRow;
use crate::state::MarketFilter;
use crate::table::{SignClass, TableBody, classify_sign};

pub const RANKING_DISPLAY_LIMIT: usize = 50;
pub const RANKING_ERROR_PREFIX: &str = "載入排名失敗";
pub const RANKING_EMPTY_MESSAGE: &str = "查無排名資料";
pub const RANKING_NO_MATCH_MESSAGE: &str = "此市場沒有符合的股票";

#[derive(Clone, Debug, PartialEq)]
pub struct RankingTableRow {
    pub rank: usize,
    pub code: String,
    pub name: String,
    pub market: String,
    pub ratio: String,
    pub change: String,
    pub change_class: SignClass,
}

impl RankingTableRow {
    /// Code/name cell: code badge followed by the name.
    pub fn stock_cell(&self) -> String {
        format!("[{}] {}", self.code, self.name)
    }
}

/// Rows matching the filter, pipeline order kept, at most the display limit.
pub fn filter_ranking<'a>(rows: &'a [RankingRow], filter: &MarketFilter) -> Vec<&'a RankingRow> {
    rows.iter()
        .filter(|row| filter.matches(&row.market))
        .take(RANKING_DISPLAY_LIMIT)
        .collect()
}

pub fn ranking_rows(rows: &[RankingRow], filter: &MarketFilter) -> Vec<RankingTableRow> {
    filter_ranking(rows, filter)
        .into_iter()
        .enumerate()
        .map(|(idx, row)| {
            let change = row.change.unwrap_or(0.0);
            RankingTableRow {
                rank: idx + 1,
                code: row.code.clone(),
                name: row.name.clone(),
                market: row.market.clone(),
                ratio: format_percent(row.three_inst_ratio.unwrap_or(0.0)),
                change: format_percent(change),
                change_class: classify_sign(change),
            }
        })
        .collect()
}

/// Full replacement of the ranking table for one fetch result.
pub fn render_ranking(
    result: &Result<Vec<RankingRow>>,
    filter: &MarketFilter,
) -> TableBody<RankingTableRow> {
    match result {
        Ok(rows) if rows.is_empty() => TableBody::failure(
            RANKING_ERROR_PREFIX,
            &DashError::empty(RANKING_EMPTY_MESSAGE),
        ),
        Ok(rows) => {
            let table = ranking_rows(rows, filter);
            if table.is_empty() {
                TableBody::Message(RANKING_NO_MATCH_MESSAGE.to_string())
            } else {
                TableBody::Rows(table)
            }
        }
        Err(err) => TableBody::failure(RANKING_ERROR_PREFIX, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: usize, market: &str) -> RankingRow {
        RankingRow {
            code: format!("{code}"),
            name: format!("股票{code}"),
            market: market.to_string(),
            three_inst_ratio: Some(40.0 + code as f64 / 100.0),
            change: Some(if code % 2 == 0 { 1.25 } else { -0.5 }),
        }
    }

    fn mixed(n: usize) -> Vec<RankingRow> {
        (0..n)
            .map(|i| row(1000 + i, if i % 3 == 0 { "上櫃" } else { "上市" }))
            .collect()
    }

    #[test]
    fn row_count_is_capped_per_filter() {
        let listed = MarketFilter::Market("上市".to_string());
        let otc = MarketFilter::Market("上櫃".to_string());
        for n in [0, 1, 10, 49, 50, 51, 120, 200] {
            let rows = mixed(n);
            let matching_listed = rows.iter().filter(|r| r.market == "上市").count();
            let matching_otc = rows.iter().filter(|r| r.market == "上櫃").count();
            assert_eq!(ranking_rows(&rows, &MarketFilter::All).len(), n.min(50));
            assert_eq!(ranking_rows(&rows, &listed).len(), matching_listed.min(50));
            assert_eq!(ranking_rows(&rows, &otc).len(), matching_otc.min(50));
        }
    }

    #[test]
    fn filtering_preserves_relative_order_and_ranks_from_one() {
        let rows = mixed(12);
        let otc = ranking_rows(&rows, &MarketFilter::Market("上櫃".to_string()));
        let codes: Vec<&str> = otc.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["1000", "1003", "1006", "1009"]);
        let ranks: Vec<usize> = otc.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
    }

    #[test]
    fn row_cells_are_formatted() {
        let rows = vec![RankingRow {
            code: "2330".to_string(),
            name: "台積電".to_string(),
            market: "上市".to_string(),
            three_inst_ratio: Some(75.4321),
            change: Some(0.0),
        }];
        let table = ranking_rows(&rows, &MarketFilter::All);
        assert_eq!(table[0].stock_cell(), "[2330] 台積電");
        assert_eq!(table[0].ratio, "75.43");
        assert_eq!(table[0].change, "0.00");
        assert_eq!(table[0].change_class, SignClass::Negative);
    }

    #[test]
    fn empty_payload_renders_single_message_row() {
        let body = render_ranking(&Ok(Vec::new()), &MarketFilter::All);
        assert_eq!(body.message(), Some("載入排名失敗：查無排名資料"));
        assert!(body.rows().is_empty());
    }

    #[test]
    fn fetch_failure_renders_message_row() {
        let body = render_ranking(&Err(DashError::Fetch { status: 404 }), &MarketFilter::All);
        assert_eq!(body.message(), Some("載入排名失敗：HTTP 404"));
    }

    #[test]
    fn unmatched_filter_renders_message_row() {
        let body = render_ranking(&Ok(mixed(5)), &MarketFilter::Market("興櫃".to_string()));
        assert_eq!(body.message(), Some(RANKING_NO_MATCH_MESSAGE));
    }
}
