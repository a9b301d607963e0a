//! Projection of a stock's ratio history into chart datasets.

use crate::model::TimeSeriesPoint;
use crate::state::{SeriesKind, SeriesToggles};

/// Fixed look of one series. Looked up by identity, never computed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeriesStyle {
    pub label: &'static str,
    pub line_width: f64,
    pub dash: &'static [u8],
    /// `None` keeps the chart's default point marker.
    pub point_radius: Option<f64>,
    pub tension: f64,
}

const FOREIGN_STYLE: SeriesStyle = SeriesStyle {
    label: "外資持股比重%",
    line_width: 1.5,
    dash: &[],
    point_radius: None,
    tension: 0.1,
};

const TRUST_STYLE: SeriesStyle = SeriesStyle {
    label: "投信持股估計%",
    line_width: 1.5,
    dash: &[4, 3],
    point_radius: None,
    tension: 0.1,
};

const DEALER_STYLE: SeriesStyle = SeriesStyle {
    label: "自營商持股估計%",
    line_width: 1.5,
    dash: &[2, 2],
    point_radius: None,
    tension: 0.1,
};

const TOTAL_STYLE: SeriesStyle = SeriesStyle {
    label: "三大法人合計持股估計%",
    line_width: 2.0,
    dash: &[],
    point_radius: Some(0.0),
    tension: 0.15,
};

impl SeriesKind {
    pub fn style(&self) -> &'static SeriesStyle {
        match self {
            SeriesKind::Foreign => &FOREIGN_STYLE,
            SeriesKind::Trust => &TRUST_STYLE,
            SeriesKind::Dealer => &DEALER_STYLE,
            SeriesKind::Total => &TOTAL_STYLE,
        }
    }

    pub fn value_of(&self, point: &TimeSeriesPoint) -> Option<f64> {
        match self {
            SeriesKind::Foreign => point.foreign_ratio,
            SeriesKind::Trust => point.trust_ratio,
            SeriesKind::Dealer => point.dealer_ratio,
            SeriesKind::Total => point.three_inst_ratio,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectedSeries {
    pub kind: SeriesKind,
    pub style: &'static SeriesStyle,
    /// One entry per input point; `None` is a gap in the line.
    pub values: Vec<Option<f64>>,
}

impl ProjectedSeries {
    pub fn label(&self) -> &'static str {
        self.style.label
    }
}

/// Enabled series in the fixed order foreign, trust, dealer, total.
/// Disabled series are left out entirely.
pub fn project(points: &[TimeSeriesPoint], toggles: SeriesToggles) -> Vec<ProjectedSeries> {
    if points.is_empty() {
        return Vec::new();
    }
    SeriesKind::ALL
        .iter()
        .filter(|kind| toggles.is_enabled(**kind))
        .map(|kind| ProjectedSeries {
            kind: *kind,
            style: kind.style(),
            values: points.iter().map(|point| kind.value_of(point)).collect(),
        })
        .collect()
}

pub fn date_labels(points: &[TimeSeriesPoint]) -> Vec<String> {
    points.iter().map(|point| point.date.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(date: &str, foreign: f64, trust: f64, dealer: f64, total: f64) -> TimeSeriesPoint {
        TimeSeriesPoint {
            date: date.to_string(),
            name: "台積電".to_string(),
            market: "上市".to_string(),
            foreign_ratio: Some(foreign),
            trust_ratio: Some(trust),
            dealer_ratio: Some(dealer),
            three_inst_ratio: Some(total),
        }
    }

    fn sample() -> Vec<TimeSeriesPoint> {
        vec![
            point("2024-01-02", 72.1, 1.5, 0.4, 74.0),
            point("2024-01-03", 72.3, 1.6, 0.5, 74.4),
            point("2024-01-04", 72.0, 1.7, 0.3, 74.0),
        ]
    }

    #[test]
    fn all_toggles_yield_four_series_in_fixed_order() {
        let series = project(&sample(), SeriesToggles::default());
        let kinds: Vec<SeriesKind> = series.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, SeriesKind::ALL.to_vec());
        for s in &series {
            assert_eq!(s.values.len(), 3);
        }
        assert_eq!(series[3].values, vec![Some(74.0), Some(74.4), Some(74.0)]);
    }

    #[test]
    fn toggles_change_membership_not_values() {
        let points = sample();
        let full = project(&points, SeriesToggles::default());
        for mask in 0u8..16 {
            let toggles = SeriesToggles {
                foreign: mask & 1 != 0,
                trust: mask & 2 != 0,
                dealer: mask & 4 != 0,
                total: mask & 8 != 0,
            };
            let partial = project(&points, toggles);
            assert_eq!(partial.len(), toggles.enabled_count());
            let expected: Vec<&ProjectedSeries> = full
                .iter()
                .filter(|s| toggles.is_enabled(s.kind))
                .collect();
            let actual: Vec<&ProjectedSeries> = partial.iter().collect();
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn empty_input_yields_no_series() {
        assert!(project(&[], SeriesToggles::default()).is_empty());
    }

    #[test]
    fn missing_values_become_gaps() {
        let mut points = sample();
        points[1].trust_ratio = None;
        let series = project(&points, SeriesToggles::default());
        assert_eq!(series[1].values, vec![Some(1.5), None, Some(1.7)]);
    }

    #[test]
    fn style_table_is_static() {
        assert_eq!(SeriesKind::Trust.style().dash, &[4, 3]);
        assert_eq!(SeriesKind::Dealer.style().dash, &[2, 2]);
        assert_eq!(SeriesKind::Total.style().point_radius, Some(0.0));
        assert_eq!(SeriesKind::Total.style().line_width, 2.0);
        assert_eq!(SeriesKind::Foreign.style().label, "外資持股比重%");
    }
}
