use std::time::{Duration, Instant};

use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Tabs, Wrap};
use tokio::sync::mpsc;

use crate::broker::TargetDigest;
use crate::chart::color_for;
use crate::command::Command;
use crate::dispatch::{Dashboard, LoadOutcome, UiEvent};
use crate::error_log::{ErrorLogEntry, ErrorLogStore};
use crate::fetcher::DataFetcher;
use crate::loader::spawn_load;
use crate::state::SeriesKind;
use crate::table::{ColumnAlign, TableBody, format_column_value, header_style, row_style, visible_range};
use crate::tabs::Tab;

const RANKING_COLUMNS: [(&str, ColumnAlign, usize); 5] = [
    ("排名", ColumnAlign::Right, 4),
    ("股票", ColumnAlign::Left, 20),
    ("市場", ColumnAlign::Left, 6),
    ("持股%", ColumnAlign::Right, 8),
    ("變化", ColumnAlign::Right, 8),
];
const BROKER_RANKING_COLUMNS: [(&str, ColumnAlign, usize); 6] = [
    ("排名", ColumnAlign::Right, 4),
    ("券商", ColumnAlign::Left, 16),
    ("淨買賣超", ColumnAlign::Right, 14),
    ("買超檔數", ColumnAlign::Right, 8),
    ("賣超檔數", ColumnAlign::Right, 8),
    ("交易檔數", ColumnAlign::Right, 8),
];
const BROKER_TRADE_COLUMNS: [(&str, ColumnAlign, usize); 7] = [
    ("日期", ColumnAlign::Left, 10),
    ("代號", ColumnAlign::Left, 8),
    ("券商", ColumnAlign::Left, 14),
    ("買進", ColumnAlign::Right, 12),
    ("賣出", ColumnAlign::Right, 12),
    ("淨額", ColumnAlign::Right, 12),
    ("比重%", ColumnAlign::Right, 8),
];

pub struct TuiApp {
    dashboard: Dashboard,
    fetcher: DataFetcher,
    tx: mpsc::UnboundedSender<Command>,
    markets: Vec<String>,
    error_log: ErrorLogStore,
    input_buffer: Option<String>,
    input_original: String,
    selection: [usize; 4],
    exit_confirmation: bool,
    status_message: Option<String>,
    status_visible_until: Option<Instant>,
    last_draw: Instant,
    min_redraw_gap: Duration,
    redraw_pending: bool,
}

impl TuiApp {
    pub fn new(
        dashboard: Dashboard,
        fetcher: DataFetcher,
        tx: mpsc::UnboundedSender<Command>,
        markets: Vec<String>,
        error_log: ErrorLogStore,
    ) -> TuiApp {
        let min_redraw_gap = Duration::from_millis(100);
        TuiApp {
            dashboard,
            fetcher,
            tx,
            markets,
            error_log,
            input_buffer: None,
            input_original: String::new(),
            selection: [0; 4],
            exit_confirmation: false,
            status_message: None,
            status_visible_until: None,
            last_draw: Instant::now() - min_redraw_gap,
            min_redraw_gap,
            redraw_pending: false,
        }
    }

    pub fn dispose(&self) {
        ratatui::restore();
    }

    pub async fn run(&mut self, rx: &mut mpsc::UnboundedReceiver<Command>) -> Result<()> {
        color_eyre::install()?;
        let mut terminal = ratatui::init();
        let mut input_tick = tokio::time::interval(self.min_redraw_gap);
        self.emit(UiEvent::Startup);
        terminal.draw(|frame| self.render(frame))?;
        self.last_draw = Instant::now();
        loop {
            tokio::select! {
                biased;
                _ = input_tick.tick() => {
                    let before = self.status_message.is_some();
                    self.clear_status_if_expired();
                    match self.poll_input()? {
                        InputResult::Exit => return Ok(()),
                        InputResult::Handled => self.redraw_pending = true,
                        InputResult::Idle => {
                            if before != self.status_message.is_some() {
                                self.redraw_pending = true;
                            }
                        }
                    }
                    if self.redraw_pending {
                        terminal.draw(|frame| self.render(frame))?;
                        self.last_draw = Instant::now();
                        self.redraw_pending = false;
                    }
                }
                message = rx.recv() => {
                    match message {
                        Some(Command::Loaded(outcome)) => {
                            self.on_loaded(outcome);
                            if self.last_draw.elapsed() >= self.min_redraw_gap {
                                terminal.draw(|frame| self.render(frame))?;
                                self.last_draw = Instant::now();
                            } else {
                                self.redraw_pending = true;
                            }
                        }
                        Some(Command::Exit) | None => return Ok(()),
                    }
                }
            }
        }
    }

    fn emit(&mut self, event: UiEvent) {
        for request in self.dashboard.dispatch(event) {
            spawn_load(self.fetcher.clone(), request, self.tx.clone());
        }
    }

    fn on_loaded(&mut self, outcome: LoadOutcome) {
        if let Some((kind, message)) = outcome.failure() {
            let entry = ErrorLogEntry::new(outcome.panel(), kind, message);
            if let Err(err) = self.error_log.append(&entry) {
                tracing::warn!(path = %self.error_log.path().display(), %err, "failed to write error log");
            }
        }
        self.dashboard.apply(outcome);
        self.clamp_selection();
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_visible_until = Some(Instant::now() + Duration::from_secs(5));
    }

    fn clear_status_if_expired(&mut self) {
        if let Some(visible_until) = self.status_visible_until {
            if Instant::now() < visible_until {
                return;
            }
        }
        self.status_message = None;
        self.status_visible_until = None;
    }

    fn poll_input(&mut self) -> Result<InputResult> {
        let mut result = InputResult::Idle;
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if self.handle_key_event(key) {
                        return Ok(InputResult::Exit);
                    }
                    result = InputResult::Handled;
                }
                Event::Resize(_, _) => result = InputResult::Handled,
                _ => {}
            }
        }
        Ok(result)
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }
        if self.exit_confirmation {
            return self.handle_exit_confirmation_key(key);
        }
        if self.input_buffer.is_some() {
            self.handle_input_key(key);
            return false;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.exit_confirmation = true;
            }
            KeyCode::Tab => self.activate_tab(self.dashboard.tabs.neighbour(1)),
            KeyCode::BackTab => self.activate_tab(self.dashboard.tabs.neighbour(-1)),
            KeyCode::Char(c @ '1'..='4') => {
                let idx = c as usize - '1' as usize;
                self.activate_tab(Tab::ALL[idx]);
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-10),
            KeyCode::PageDown => self.move_selection(10),
            _ => {
                if self.dashboard.tabs.is_active(Tab::Ownership) {
                    self.handle_ownership_key(key);
                }
            }
        }
        false
    }

    fn handle_exit_confirmation_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('y')
            | KeyCode::Char('Y')
            | KeyCode::Char('q')
            | KeyCode::Char('Q')
            | KeyCode::Enter => true,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.exit_confirmation = false;
                self.set_status_message("已取消退出");
                false
            }
            _ => false,
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        let Some(buffer) = self.input_buffer.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Char(c) if !c.is_control() => {
                buffer.push(c);
                let value = buffer.clone();
                self.emit(UiEvent::InputChanged(value));
            }
            KeyCode::Backspace => {
                buffer.pop();
                let value = buffer.clone();
                self.emit(UiEvent::InputChanged(value));
            }
            KeyCode::Enter => {
                self.input_buffer = None;
                self.emit(UiEvent::InputEnter);
            }
            KeyCode::Esc => {
                self.input_buffer = None;
                let original = std::mem::take(&mut self.input_original);
                self.emit(UiEvent::InputChanged(original));
            }
            _ => {}
        }
    }

    fn handle_ownership_key(&mut self, key: KeyEvent) {
        let state = &self.dashboard.state;
        match key.code {
            KeyCode::Char('/') | KeyCode::Char('i') => {
                self.input_original = state.stock_input.clone();
                self.input_buffer = Some(state.stock_input.clone());
            }
            KeyCode::Char('r') => self.emit(UiEvent::LoadClicked),
            KeyCode::Char('l') => {
                let enabled = !state.log_scale;
                self.emit(UiEvent::LogScaleChanged(enabled));
            }
            KeyCode::Char(c @ ('f' | 't' | 'd' | 'a')) => {
                let kind = match c {
                    'f' => SeriesKind::Foreign,
                    't' => SeriesKind::Trust,
                    'd' => SeriesKind::Dealer,
                    _ => SeriesKind::Total,
                };
                let enabled = !state.toggles.is_enabled(kind);
                self.emit(UiEvent::SeriesToggled(kind, enabled));
            }
            KeyCode::Char('m') => {
                let filter = state.market_filter.cycle(&self.markets);
                self.emit(UiEvent::MarketChanged(filter));
            }
            KeyCode::Char('w') => {
                let window = state.ranking_window.next();
                self.emit(UiEvent::WindowChanged(window));
            }
            KeyCode::Left => self.move_chart_cursor(-1),
            KeyCode::Right => self.move_chart_cursor(1),
            KeyCode::Home => self.move_chart_cursor(isize::MIN / 2),
            KeyCode::End => self.move_chart_cursor(isize::MAX / 2),
            KeyCode::Enter => {
                let row = self.selection[Tab::Ownership.index()];
                self.emit(UiEvent::RankingRowClicked(row));
            }
            _ => {}
        }
    }

    fn activate_tab(&mut self, tab: Tab) {
        self.selection[tab.index()] = 0;
        self.emit(UiEvent::TabClicked(tab));
    }

    fn move_chart_cursor(&mut self, delta: isize) {
        if let Some(chart) = self.dashboard.panels.chart.active_mut() {
            chart.move_cursor(delta);
        }
    }

    fn selectable_len(&self, tab: Tab) -> usize {
        let panels = &self.dashboard.panels;
        match tab {
            Tab::Ownership => panels.ranking.rows().len(),
            Tab::BrokerRanking => panels.broker_ranking.rows().len(),
            Tab::BrokerTrades => panels.broker_trades.body.rows().len(),
            Tab::TargetBrokers => target_line_count(&panels.target_brokers),
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let tab = self.dashboard.tabs.active();
        let len = self.selectable_len(tab);
        let slot = &mut self.selection[tab.index()];
        if len == 0 {
            *slot = 0;
            return;
        }
        *slot = (*slot as isize + delta).clamp(0, len as isize - 1) as usize;
    }

    fn clamp_selection(&mut self) {
        for tab in Tab::ALL {
            let len = self.selectable_len(tab);
            let slot = &mut self.selection[tab.index()];
            *slot = (*slot).min(len.saturating_sub(1));
        }
    }

    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(1),
            ])
            .split(area);
        self.render_tabs(frame, chunks[0]);
        match self.dashboard.tabs.active() {
            Tab::Ownership => self.render_ownership(frame, chunks[1]),
            Tab::BrokerRanking => self.render_broker_ranking(frame, chunks[1]),
            Tab::BrokerTrades => self.render_broker_trades(frame, chunks[1]),
            Tab::TargetBrokers => self.render_target_brokers(frame, chunks[1]),
        }
        self.render_footer(frame, chunks[2]);
        if self.exit_confirmation {
            self.render_exit_confirmation(frame);
        }
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = Tab::ALL
            .iter()
            .enumerate()
            .map(|(idx, tab)| Line::from(format!("{} {}", idx + 1, tab.title())))
            .collect();
        let tabs = Tabs::new(titles)
            .block(Block::bordered().title("三大法人持股儀表板"))
            .select(self.dashboard.tabs.active().index())
            .highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::LightCyan)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let text = match &self.status_message {
            Some(message) => Line::styled(message.clone(), Style::default().fg(Color::Yellow)),
            None => Line::styled(self.key_hints(), Style::default().fg(Color::DarkGray)),
        };
        frame.render_widget(Paragraph::new(text), area);
    }

    fn key_hints(&self) -> &'static str {
        if self.input_buffer.is_some() {
            return "輸入股票代號 · Enter 載入 · Esc 結束編輯";
        }
        match self.dashboard.tabs.active() {
            Tab::Ownership => {
                "/ 編輯代號 · r 載入 · f/t/d/a 切換線圖 · l 對數 · m 市場 · w 區間 · ←→ 游標 · ↑↓ Enter 排名 · Tab 切換 · q 離開"
            }
            _ => "↑↓ 捲動 · 1-4/Tab 切換並重新載入 · q 離開",
        }
    }

    fn render_ownership(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(10),
                Constraint::Length(2),
                Constraint::Percentage(35),
            ])
            .split(area);
        self.render_controls(frame, chunks[0]);
        self.render_chart(frame, chunks[1]);
        self.render_chart_status(frame, chunks[2]);
        self.render_ranking(frame, chunks[3]);
    }

    fn render_controls(&self, frame: &mut Frame, area: Rect) {
        let state = &self.dashboard.state;
        let panels = &self.dashboard.panels;
        let input_value = self
            .input_buffer
            .as_ref()
            .map(|buffer| format!("{buffer}_"))
            .unwrap_or_else(|| state.stock_input.clone());
        let input_style = if self.input_buffer.is_some() {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        let load_style = if panels.stock_loading {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::LightGreen)
        };
        let mut first = vec![
            Span::raw("股票代號 "),
            Span::styled(input_field(&input_value), input_style),
            Span::raw(" "),
            Span::styled("r 載入", load_style),
            Span::raw("   "),
            checkbox("l 對數刻度", state.log_scale, Color::White),
        ];
        for (key, kind) in [
            ('f', SeriesKind::Foreign),
            ('t', SeriesKind::Trust),
            ('d', SeriesKind::Dealer),
            ('a', SeriesKind::Total),
        ] {
            first.push(Span::raw("  "));
            first.push(checkbox(
                &format!("{key} {}", series_short_label(kind)),
                state.toggles.is_enabled(kind),
                color_for(kind),
            ));
        }
        let second = Line::from(vec![
            Span::raw("m 市場 "),
            Span::styled(
                state.market_filter.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("   w 區間 "),
            Span::styled(
                state.ranking_window.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]);
        let paragraph = Paragraph::new(vec![Line::from(first), second]).block(Block::bordered());
        frame.render_widget(paragraph, area);
    }

    fn render_chart(&self, frame: &mut Frame, area: Rect) {
        let panels = &self.dashboard.panels;
        let title = Line::from(Span::styled(
            panels.chart_title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        match panels.chart.active() {
            Some(chart) => chart.render(frame, area, title),
            None => {
                let placeholder = Paragraph::new(panels.chart_status.as_str())
                    .alignment(Alignment::Center)
                    .block(Block::bordered().title(title));
                frame.render_widget(placeholder, area);
            }
        }
    }

    fn render_chart_status(&self, frame: &mut Frame, area: Rect) {
        let panels = &self.dashboard.panels;
        let mut lines = vec![Line::styled(
            panels.chart_status.clone(),
            Style::default().fg(Color::Yellow),
        )];
        if let Some(tooltip) = panels.chart.active().and_then(|chart| chart.tooltip()) {
            lines.push(Line::styled(tooltip.text(), Style::default().fg(Color::Gray)));
        }
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_ranking(&self, frame: &mut Frame, area: Rect) {
        let state = &self.dashboard.state;
        let title = format!(
            "三大法人持股增加排名（{}・{}）",
            state.ranking_window, state.market_filter
        );
        let selected = self.selection[Tab::Ownership.index()];
        let lines = table_lines(
            &self.dashboard.panels.ranking,
            &RANKING_COLUMNS,
            selected,
            visible_rows(area),
            |row| {
                vec![
                    (row.rank.to_string(), Style::default()),
                    (row.stock_cell(), Style::default()),
                    (row.market.clone(), Style::default()),
                    (row.ratio.clone(), Style::default()),
                    (row.change.clone(), row.change_class.style()),
                ]
            },
        );
        let paragraph = Paragraph::new(lines).block(Block::bordered().title(title));
        frame.render_widget(paragraph, area);
    }

    fn render_broker_ranking(&self, frame: &mut Frame, area: Rect) {
        let selected = self.selection[Tab::BrokerRanking.index()];
        let lines = table_lines(
            &self.dashboard.panels.broker_ranking,
            &BROKER_RANKING_COLUMNS,
            selected,
            visible_rows(area),
            |row| {
                vec![
                    (row.rank.to_string(), Style::default()),
                    (row.broker_name.clone(), Style::default()),
                    (row.net_vol.clone(), row.net_class.style()),
                    (row.buy_count.to_string(), Style::default()),
                    (row.sell_count.to_string(), Style::default()),
                    (row.stocks_traded.to_string(), Style::default()),
                ]
            },
        );
        let paragraph = Paragraph::new(lines).block(Block::bordered().title("券商淨買賣超排名"));
        frame.render_widget(paragraph, area);
    }

    fn render_broker_trades(&self, frame: &mut Frame, area: Rect) {
        let view = &self.dashboard.panels.broker_trades;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(3)])
            .split(area);
        frame.render_widget(
            Paragraph::new(Line::styled(view.status.clone(), Style::default().fg(Color::Yellow))),
            chunks[0],
        );
        let selected = self.selection[Tab::BrokerTrades.index()];
        let lines = table_lines(
            &view.body,
            &BROKER_TRADE_COLUMNS,
            selected,
            visible_rows(chunks[1]),
            |row| {
                vec![
                    (row.date.clone(), Style::default()),
                    (row.stock_code.clone(), Style::default()),
                    (row.broker_name.clone(), Style::default()),
                    (row.buy_vol.clone(), Style::default()),
                    (row.sell_vol.clone(), Style::default()),
                    (row.net_vol.clone(), row.net_class.style()),
                    (row.pct.clone(), Style::default()),
                ]
            },
        );
        let paragraph = Paragraph::new(lines).block(Block::bordered().title("最新券商交易"));
        frame.render_widget(paragraph, chunks[1]);
    }

    fn render_target_brokers(&self, frame: &mut Frame, area: Rect) {
        let block = Block::bordered().title("目標券商進出");
        let digests = match &self.dashboard.panels.target_brokers {
            TableBody::Message(message) => {
                let paragraph = Paragraph::new(message.as_str())
                    .wrap(Wrap { trim: true })
                    .block(block);
                frame.render_widget(paragraph, area);
                return;
            }
            TableBody::Rows(digests) => digests,
        };
        let mut lines = Vec::new();
        for digest in digests {
            lines.push(Line::from(vec![
                Span::styled(
                    format_column_value(&digest.broker_name, ColumnAlign::Left, 18),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(" 合計 "),
                Span::styled(
                    digest.total.clone(),
                    digest.total_class.style().add_modifier(Modifier::BOLD),
                ),
            ]));
            for trade in &digest.trades {
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::raw(format_column_value(&trade.stock_code, ColumnAlign::Left, 8)),
                    Span::raw(format!(" {} ", trade.side.label())),
                    Span::styled(
                        format_column_value(&trade.net_vol, ColumnAlign::Right, 12),
                        trade.net_class.style(),
                    ),
                ]));
            }
            if let Some(suffix) = digest.more_suffix() {
                lines.push(Line::styled(
                    format!("  {suffix}"),
                    Style::default().fg(Color::DarkGray),
                ));
            }
        }
        let visible = visible_rows(area) + 1;
        let selected = self.selection[Tab::TargetBrokers.index()];
        let (start, _) = visible_range(lines.len(), visible, selected);
        let paragraph = Paragraph::new(lines)
            .scroll((start.min(u16::MAX as usize) as u16, 0))
            .block(block);
        frame.render_widget(paragraph, area);
    }

    fn render_exit_confirmation(&self, frame: &mut Frame) {
        let area = frame.area();
        if area.width < 24 || area.height < 5 {
            return;
        }
        let popup_width = area.width.saturating_sub(20).clamp(28, 50).min(area.width);
        let popup_height = 5;
        let left = area.x + (area.width.saturating_sub(popup_width)) / 2;
        let top = area.y + (area.height.saturating_sub(popup_height)) / 2;
        let popup = Rect::new(left, top, popup_width, popup_height);
        let lines = vec![
            Line::from(Span::styled(
                "確定要離開儀表板？",
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from("Y/Enter 確認 · N/Esc 取消"),
        ];
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .block(Block::bordered().title("確認離開"));
        frame.render_widget(Clear, popup);
        frame.render_widget(paragraph, popup);
    }
}

enum InputResult {
    Idle,
    Handled,
    Exit,
}

fn checkbox(label: &str, checked: bool, color: Color) -> Span<'static> {
    let mark = if checked { "[x]" } else { "[ ]" };
    let style = if checked {
        Style::default().fg(color)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Span::styled(format!("{label} {mark}"), style)
}

// Padded by display width so full-width input keeps the controls aligned.
fn input_field(value: &str) -> String {
    format!("[{}]", format_column_value(value, ColumnAlign::Left, 8))
}

fn series_short_label(kind: SeriesKind) -> &'static str {
    match kind {
        SeriesKind::Foreign => "外資",
        SeriesKind::Trust => "投信",
        SeriesKind::Dealer => "自營商",
        SeriesKind::Total => "合計",
    }
}

// Rows that fit below the header inside a bordered block.
fn visible_rows(area: Rect) -> usize {
    area.height.saturating_sub(3) as usize
}

// Header, shown trades and the optional overflow line per broker.
fn target_line_count(body: &TableBody<TargetDigest>) -> usize {
    body.rows()
        .iter()
        .map(|digest| 1 + digest.trades.len() + usize::from(digest.hidden > 0))
        .sum()
}

/// Header plus the visible window of rows, or the single message row.
fn table_lines<R, F>(
    body: &TableBody<R>,
    columns: &[(&str, ColumnAlign, usize)],
    selected: usize,
    visible: usize,
    cells: F,
) -> Vec<Line<'static>>
where
    F: Fn(&R) -> Vec<(String, Style)>,
{
    let header: Vec<Span> = columns
        .iter()
        .map(|(title, align, width)| {
            Span::styled(format!("{} ", format_column_value(title, *align, *width)), header_style())
        })
        .collect();
    let mut lines = vec![Line::from(header)];
    let rows = match body {
        TableBody::Message(message) => {
            lines.push(Line::styled(message.clone(), Style::default().fg(Color::LightRed)));
            return lines;
        }
        TableBody::Rows(rows) => rows,
    };
    let (start, end) = visible_range(rows.len(), visible, selected);
    for (idx, row) in rows.iter().enumerate().skip(start).take(end - start) {
        let is_selected = idx == selected;
        let spans: Vec<Span> = cells(row)
            .into_iter()
            .zip(columns.iter())
            .map(|((value, style), (_, align, width))| {
                let text = format!("{} ", format_column_value(&value, *align, *width));
                if is_selected {
                    Span::styled(text, row_style(true))
                } else {
                    Span::styled(text, style)
                }
            })
            .collect();
        lines.push(Line::from(spans));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use unicode_width::UnicodeWidthStr;

    use crate::state::ViewState;

    fn app(name: &str) -> TuiApp {
        let dir = std::env::temp_dir().join(format!(
            "inst-ratio-dash-tui-{name}-{}",
            std::process::id()
        ));
        let mut state = ViewState::default();
        state.stock_input = "2330".to_string();
        let dashboard = Dashboard::new(state, "2330");
        let fetcher = DataFetcher::new("http://127.0.0.1:9/").unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();
        TuiApp::new(
            dashboard,
            fetcher,
            tx,
            vec!["上市".to_string(), "上櫃".to_string()],
            ErrorLogStore::in_dir(&dir),
        )
    }

    fn press(app: &mut TuiApp, code: KeyCode) -> bool {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn esc_restores_the_code_before_editing() {
        let mut app = app("esc");
        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Char('9'));
        assert_eq!(app.input_buffer.as_deref(), Some("2339"));
        assert_eq!(app.dashboard.state.stock_input, "2339");

        press(&mut app, KeyCode::Esc);
        assert!(app.input_buffer.is_none());
        assert_eq!(app.dashboard.state.stock_input, "2330");
        assert!(!app.exit_confirmation);
    }

    #[test]
    fn editing_again_after_cancel_starts_from_the_kept_code() {
        let mut app = app("reedit");
        press(&mut app, KeyCode::Char('i'));
        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.input_buffer.as_deref(), Some("2330"));
    }

    #[test]
    fn q_asks_before_exiting() {
        let mut app = app("quit");
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert!(app.exit_confirmation);
        assert!(!press(&mut app, KeyCode::Char('n')));
        assert!(!app.exit_confirmation);
        press(&mut app, KeyCode::Char('q'));
        assert!(press(&mut app, KeyCode::Char('y')));
    }

    #[test]
    fn exit_popup_fits_narrow_terminals() {
        let app = app("popup");
        for width in 20..=60 {
            let mut terminal = Terminal::new(TestBackend::new(width, 20)).unwrap();
            terminal
                .draw(|frame| app.render_exit_confirmation(frame))
                .unwrap();
        }
    }

    #[test]
    fn input_field_pads_by_display_width() {
        assert_eq!(input_field("2330").width(), 10);
        assert_eq!(input_field("２３３").width(), 10);
        assert_eq!(input_field("2330_"), "[2330_   ]");
    }
}
