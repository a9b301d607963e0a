//! Pieces shared by every table panel: the body model, sign classes and
//! fixed-width column layout.

use ratatui::style::{Color, Modifier, Style};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::error::DashError;

/// A table is either its data rows or one full-width message row.
#[derive(Clone, Debug, PartialEq)]
pub enum TableBody<R> {
    Rows(Vec<R>),
    Message(String),
}

impl<R> TableBody<R> {
    pub fn rows(&self) -> &[R] {
        match self {
            TableBody::Rows(rows) => rows,
            TableBody::Message(_) => &[],
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            TableBody::Rows(_) => None,
            TableBody::Message(message) => Some(message),
        }
    }

    pub fn failure(prefix: &str, err: &DashError) -> Self {
        TableBody::Message(format!("{prefix}：{err}"))
    }
}

impl<R> Default for TableBody<R> {
    fn default() -> Self {
        TableBody::Message("載入中...".to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignClass {
    Positive,
    Negative,
}

/// Strictly greater than zero is positive; zero and NaN are not.
pub fn classify_sign(value: f64) -> SignClass {
    if value > 0.0 {
        SignClass::Positive
    } else {
        SignClass::Negative
    }
}

impl SignClass {
    // Taiwan quotes: rising red, falling green.
    pub fn style(&self) -> Style {
        match self {
            SignClass::Positive => Style::default().fg(Color::Red),
            SignClass::Negative => Style::default().fg(Color::Green),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnAlign {
    Left,
    Right,
}

pub fn header_style() -> Style {
    Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::BOLD)
}

pub fn row_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .bg(Color::LightCyan)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

pub fn format_column_value(value: &str, align: ColumnAlign, width: usize) -> String {
    let clipped = clip_to_width(value, width);
    pad_to_width(&clipped, width, align)
}

fn clip_to_width(value: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    if UnicodeWidthStr::width(value) <= width {
        return value.to_string();
    }
    let mut result = String::new();
    let mut remaining = width.saturating_sub(1);
    for ch in value.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if ch_width > remaining {
            break;
        }
        result.push(ch);
        remaining = remaining.saturating_sub(ch_width);
    }
    result.push('…');
    result
}

fn pad_to_width(value: &str, width: usize, align: ColumnAlign) -> String {
    let current = UnicodeWidthStr::width(value);
    if current >= width {
        return value.to_string();
    }
    let padding = " ".repeat(width - current);
    match align {
        ColumnAlign::Left => format!("{value}{padding}"),
        ColumnAlign::Right => format!("{padding}{value}"),
    }
}

pub fn visible_range(len: usize, visible: usize, selected: usize) -> (usize, usize) {
    if len == 0 || visible == 0 {
        return (0, 0);
    }
    if len <= visible {
        return (0, len);
    }
    let max_start = len - visible;
    let start = selected.min(len - 1).saturating_sub(visible - 1).min(max_start);
    (start, start + visible)
}
