//! Line chart of ownership ratios.
//!
//! `ChartConfig` is everything the chart is built from. `ChartSlot` owns the
//! one live `LineChart` bound to the canvas: an update always drops the old
//! instance before the new one exists.

use std::cell::Cell;
use std::rc::Rc;

use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Chart, Dataset, GraphType, LegendPosition};

use crate::format::format_percent;
use crate::series::ProjectedSeries;
use crate::state::SeriesKind;

pub const Y_AXIS_TITLE: &str = "持股比重 (%)";
pub const MAX_X_TICKS: usize = 10;
const Y_AXIS_MIN: f64 = 0.0;
const CURSOR_COLOR: Color = Color::DarkGray;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScaleType {
    Linear,
    Logarithmic,
}

impl ScaleType {
    pub fn from_log_flag(log_scale: bool) -> ScaleType {
        if log_scale {
            ScaleType::Logarithmic
        } else {
            ScaleType::Linear
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionMode {
    /// Every series' value at the hovered index.
    Index,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interaction {
    pub mode: InteractionMode,
    pub intersect: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct YAxisConfig {
    pub scale: ScaleType,
    pub min: f64,
    pub title: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct XAxisConfig {
    pub max_ticks_limit: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChartConfig {
    pub labels: Vec<String>,
    pub datasets: Vec<ProjectedSeries>,
    pub x_axis: XAxisConfig,
    pub y_axis: YAxisConfig,
    pub legend: LegendPosition,
    pub interaction: Interaction,
}

impl ChartConfig {
    pub fn line(labels: Vec<String>, datasets: Vec<ProjectedSeries>, log_scale: bool) -> Self {
        ChartConfig {
            labels,
            datasets,
            x_axis: XAxisConfig {
                max_ticks_limit: MAX_X_TICKS,
            },
            y_axis: YAxisConfig {
                scale: ScaleType::from_log_flag(log_scale),
                min: Y_AXIS_MIN,
                title: Y_AXIS_TITLE,
            },
            legend: LegendPosition::Bottom,
            interaction: Interaction {
                mode: InteractionMode::Index,
                intersect: false,
            },
        }
    }
}

/// Evenly spread label indices, first and last included, at most `max`.
pub fn tick_indices(len: usize, max: usize) -> Vec<usize> {
    if len == 0 || max == 0 {
        return Vec::new();
    }
    if len <= max {
        return (0..len).collect();
    }
    if max == 1 {
        return vec![0];
    }
    let step = (len - 1) as f64 / (max - 1) as f64;
    (0..max).map(|i| (i as f64 * step).round() as usize).collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
    pub title: String,
    pub entries: Vec<(&'static str, Option<f64>)>,
}

impl Tooltip {
    pub fn text(&self) -> String {
        let values: Vec<String> = self
            .entries
            .iter()
            .map(|(label, value)| match value {
                Some(v) => format!("{label} {}", format_percent(*v)),
                None => format!("{label} -"),
            })
            .collect();
        format!("{}  {}", self.title, values.join("  "))
    }
}

/// The canvas a chart draws into. Counts how many chart instances are
/// currently bound to it.
#[derive(Clone, Debug, Default)]
pub struct ChartCanvas {
    live: Rc<Cell<usize>>,
    created: Rc<Cell<u64>>,
}

impl ChartCanvas {
    pub fn live_instances(&self) -> usize {
        self.live.get()
    }

    fn bind(&self) -> CanvasBinding {
        self.live.set(self.live.get() + 1);
        let id = self.created.get() + 1;
        self.created.set(id);
        CanvasBinding {
            live: Rc::clone(&self.live),
            id,
        }
    }
}

#[derive(Debug)]
struct CanvasBinding {
    live: Rc<Cell<usize>>,
    id: u64,
}

impl Drop for CanvasBinding {
    fn drop(&mut self) {
        self.live.set(self.live.get().saturating_sub(1));
    }
}

#[derive(Debug)]
pub struct LineChart {
    config: ChartConfig,
    cursor: usize,
    binding: CanvasBinding,
}

impl LineChart {
    fn new(canvas: &ChartCanvas, config: ChartConfig) -> LineChart {
        let cursor = config.labels.len().saturating_sub(1);
        LineChart {
            config,
            cursor,
            binding: canvas.bind(),
        }
    }

    pub fn id(&self) -> u64 {
        self.binding.id
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.config.labels.len();
        if len == 0 {
            return;
        }
        let next = self.cursor as isize + delta;
        self.cursor = next.clamp(0, len as isize - 1) as usize;
    }

    /// Values of every series at the shared index. With `intersect` off a
    /// tooltip shows even where no series has a point.
    pub fn tooltip_at(&self, index: usize) -> Option<Tooltip> {
        let title = self.config.labels.get(index)?.clone();
        let entries: Vec<(&'static str, Option<f64>)> = match self.config.interaction.mode {
            InteractionMode::Index => self
                .config
                .datasets
                .iter()
                .map(|series| (series.label(), series.values.get(index).copied().flatten()))
                .collect(),
        };
        if self.config.interaction.intersect && entries.iter().all(|(_, value)| value.is_none()) {
            return None;
        }
        Some(Tooltip { title, entries })
    }

    pub fn tooltip(&self) -> Option<Tooltip> {
        self.tooltip_at(self.cursor)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, title: Line<'static>) {
        let scale = self.config.y_axis.scale;
        let points: Vec<Vec<(f64, f64)>> = self
            .config
            .datasets
            .iter()
            .map(|series| plot_points(&series.values, scale))
            .collect();
        let (y_min, y_max) = y_bounds(&points, scale, self.config.y_axis.min);
        let len = self.config.labels.len();
        let x_max = if len > 1 { (len - 1) as f64 } else { 1.0 };
        let cursor_x = self.cursor as f64;
        let cursor_line = [(cursor_x, y_min), (cursor_x, y_max)];

        let mut datasets: Vec<Dataset> = self
            .config
            .datasets
            .iter()
            .zip(points.iter())
            .map(|(series, data)| {
                Dataset::default()
                    .name(series.label())
                    .marker(marker_for(series))
                    .graph_type(GraphType::Line)
                    .style(style_for(series))
                    .data(data)
            })
            .collect();
        if len > 0 {
            datasets.push(
                Dataset::default()
                    .marker(symbols::Marker::Dot)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(CURSOR_COLOR))
                    .data(&cursor_line),
            );
        }

        let x_labels: Vec<Span> = tick_indices(len, self.config.x_axis.max_ticks_limit)
            .into_iter()
            .filter_map(|idx| self.config.labels.get(idx))
            .map(|label| Span::raw(label.clone()))
            .collect();
        let y_labels = y_axis_labels(y_min, y_max, scale);
        let (legend_x, legend_y) = match self.config.legend {
            LegendPosition::Bottom => (Constraint::Ratio(1, 1), Constraint::Ratio(1, 1)),
            _ => (Constraint::Ratio(1, 4), Constraint::Ratio(1, 4)),
        };

        let chart = Chart::new(datasets)
            .block(Block::bordered().title(title))
            .x_axis(
                Axis::default()
                    .style(Style::default().fg(Color::Gray))
                    .labels(x_labels)
                    .bounds([0.0, x_max]),
            )
            .y_axis(
                Axis::default()
                    .title(self.config.y_axis.title)
                    .style(Style::default().fg(Color::Gray))
                    .labels(y_labels)
                    .bounds([y_min, y_max]),
            )
            .legend_position(Some(self.config.legend))
            .hidden_legend_constraints((legend_x, legend_y));
        frame.render_widget(chart, area);
    }
}

fn plot_points(values: &[Option<f64>], scale: ScaleType) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .filter_map(|(idx, value)| {
            let v = (*value)?;
            if !v.is_finite() {
                return None;
            }
            match scale {
                ScaleType::Linear => Some((idx as f64, v)),
                ScaleType::Logarithmic if v > 0.0 => Some((idx as f64, v.log10())),
                ScaleType::Logarithmic => None,
            }
        })
        .collect()
}

// Linear axes start at the configured minimum. A log axis cannot reach 0,
// so it starts at the decade below the smallest positive value.
fn y_bounds(points: &[Vec<(f64, f64)>], scale: ScaleType, min: f64) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for (_, y) in points.iter().flatten() {
        lo = lo.min(*y);
        hi = hi.max(*y);
    }
    match scale {
        ScaleType::Linear => {
            if !hi.is_finite() || hi <= min {
                (min, min + 1.0)
            } else {
                (min, hi + (hi - min) * 0.05)
            }
        }
        ScaleType::Logarithmic => {
            if !lo.is_finite() || !hi.is_finite() {
                (0.0, 1.0)
            } else {
                let floor = lo.floor();
                let ceil = hi.ceil().max(floor + 1.0);
                (floor, ceil)
            }
        }
    }
}

fn y_axis_labels(min: f64, max: f64, scale: ScaleType) -> Vec<Span<'static>> {
    let mid = (min + max) / 2.0;
    let to_value = |y: f64| match scale {
        ScaleType::Linear => y,
        ScaleType::Logarithmic => 10f64.powf(y),
    };
    vec![
        Span::styled(
            format_percent(to_value(min)),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format_percent(to_value(mid))),
        Span::styled(
            format_percent(to_value(max)),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ]
}

pub fn color_for(kind: SeriesKind) -> Color {
    match kind {
        SeriesKind::Foreign => Color::Cyan,
        SeriesKind::Trust => Color::Yellow,
        SeriesKind::Dealer => Color::Magenta,
        SeriesKind::Total => Color::LightRed,
    }
}

// Dashed series are drawn with sparse dots, wide series in bold. Series
// with visible point markers get block cells.
fn marker_for(series: &ProjectedSeries) -> symbols::Marker {
    if !series.style.dash.is_empty() {
        symbols::Marker::Dot
    } else if series.style.point_radius == Some(0.0) {
        symbols::Marker::Braille
    } else {
        symbols::Marker::HalfBlock
    }
}

fn style_for(series: &ProjectedSeries) -> Style {
    let style = Style::default().fg(color_for(series.kind));
    if series.style.line_width >= 2.0 {
        style.add_modifier(Modifier::BOLD)
    } else {
        style
    }
}

/// Holds at most one chart bound to the canvas.
#[derive(Debug, Default)]
pub struct ChartSlot {
    canvas: ChartCanvas,
    active: Option<LineChart>,
}

impl ChartSlot {
    pub fn is_rendered(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&LineChart> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut LineChart> {
        self.active.as_mut()
    }

    pub fn canvas(&self) -> &ChartCanvas {
        &self.canvas
    }

    /// Disposes the current chart, then builds the replacement.
    pub fn update(&mut self, config: ChartConfig) -> &LineChart {
        drop(self.active.take());
        self.active.insert(LineChart::new(&self.canvas, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TimeSeriesPoint;
    use crate::series::{date_labels, project};
    use crate::state::SeriesToggles;

    fn points(n: usize) -> Vec<TimeSeriesPoint> {
        (0..n)
            .map(|i| TimeSeriesPoint {
                date: format!("2024-01-{:02}", i + 1),
                name: "台積電".to_string(),
                market: "上市".to_string(),
                foreign_ratio: Some(70.0 + i as f64),
                trust_ratio: Some(1.0),
                dealer_ratio: None,
                three_inst_ratio: Some(72.0 + i as f64),
            })
            .collect()
    }

    fn config(n: usize, log_scale: bool) -> ChartConfig {
        let data = points(n);
        ChartConfig::line(
            date_labels(&data),
            project(&data, SeriesToggles::default()),
            log_scale,
        )
    }

    #[test]
    fn config_carries_fixed_axis_settings() {
        let linear = config(3, false);
        assert_eq!(linear.y_axis.scale, ScaleType::Linear);
        assert_eq!(linear.y_axis.min, 0.0);
        assert_eq!(linear.y_axis.title, Y_AXIS_TITLE);
        assert_eq!(linear.x_axis.max_ticks_limit, 10);
        assert_eq!(linear.legend, LegendPosition::Bottom);
        assert_eq!(linear.interaction.mode, InteractionMode::Index);
        assert!(!linear.interaction.intersect);
        assert_eq!(config(3, true).y_axis.scale, ScaleType::Logarithmic);
    }

    #[test]
    fn tick_indices_are_capped() {
        assert_eq!(tick_indices(0, 10), Vec::<usize>::new());
        assert_eq!(tick_indices(4, 10), vec![0, 1, 2, 3]);
        let ticks = tick_indices(250, 10);
        assert_eq!(ticks.len(), 10);
        assert_eq!(ticks.first(), Some(&0));
        assert_eq!(ticks.last(), Some(&249));
        assert!(ticks.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn repeated_updates_leave_one_live_chart() {
        let mut slot = ChartSlot::default();
        assert!(!slot.is_rendered());
        assert_eq!(slot.canvas().live_instances(), 0);
        let first_id = slot.update(config(3, false)).id();
        assert_eq!(slot.canvas().live_instances(), 1);
        let second_id = slot.update(config(5, true)).id();
        assert_eq!(slot.canvas().live_instances(), 1);
        assert_ne!(first_id, second_id);
        assert_eq!(
            slot.active().map(|chart| chart.config().labels.len()),
            Some(5)
        );
    }

    #[test]
    fn tooltip_lists_every_series_at_shared_index() {
        let mut slot = ChartSlot::default();
        slot.update(config(3, false));
        let chart = slot.active_mut().unwrap();
        assert_eq!(chart.cursor(), 2);
        chart.move_cursor(-1);
        let tooltip = chart.tooltip().unwrap();
        assert_eq!(tooltip.title, "2024-01-02");
        assert_eq!(tooltip.entries.len(), 4);
        assert_eq!(tooltip.entries[0], ("外資持股比重%", Some(71.0)));
        assert_eq!(tooltip.entries[2], ("自營商持股估計%", None));
        chart.move_cursor(-10);
        assert_eq!(chart.cursor(), 0);
        chart.move_cursor(10);
        assert_eq!(chart.cursor(), 2);
    }

    #[test]
    fn log_scale_drops_non_positive_points() {
        let projected = plot_points(&[Some(100.0), Some(0.0), None, Some(-1.0), Some(10.0)], ScaleType::Logarithmic);
        assert_eq!(projected, vec![(0.0, 2.0), (4.0, 1.0)]);
        let linear = plot_points(&[Some(1.0), None, Some(f64::NAN)], ScaleType::Linear);
        assert_eq!(linear, vec![(0.0, 1.0)]);
    }

    #[test]
    fn linear_bounds_start_at_zero() {
        let (lo, hi) = y_bounds(&[vec![(0.0, 50.0), (1.0, 80.0)]], ScaleType::Linear, 0.0);
        assert_eq!(lo, 0.0);
        assert!(hi > 80.0);
        assert_eq!(y_bounds(&[], ScaleType::Linear, 0.0), (0.0, 1.0));
        let (lo, hi) = y_bounds(&[vec![(0.0, 0.3), (1.0, 1.8)]], ScaleType::Logarithmic, 0.0);
        assert_eq!((lo, hi), (0.0, 2.0));
    }
}
