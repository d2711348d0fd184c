use crate::storage::{load_events, EventsLocation, ViewConfig};
use anyhow::Result;
use chrono::{Duration as ChronoDuration, Local, NaiveDate};
use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use daygrid::{
    week_layout, AccountFilter, DayLayout, Event, LayoutItem, LayoutOptions, Percent,
};
use log::{info, warn};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::Duration;

const ROWS_PER_HOUR: u16 = 2;
const HOURS_PER_DAY: u16 = 24;
const GUTTER_WIDTH: u16 = 6;
const DEFAULT_FIRST_HOUR: u16 = 8;

pub fn run(
    events: Vec<Event>,
    location: EventsLocation,
    config: ViewConfig,
    filter: AccountFilter,
    date: NaiveDate,
) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(events, location, config, filter, date);
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

struct App {
    events: Vec<Event>,
    location: EventsLocation,
    config: ViewConfig,
    filter: AccountFilter,
    accounts: Vec<String>,
    cursor: NaiveDate,
    view: ViewMode,
    first_hour: u16,
    selected: usize,
    status: String,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum ViewMode {
    Day,
    Week,
}

impl ViewMode {
    fn label(&self) -> &'static str {
        match self {
            ViewMode::Day => "day",
            ViewMode::Week => "week",
        }
    }
}

impl App {
    fn new(
        events: Vec<Event>,
        location: EventsLocation,
        config: ViewConfig,
        filter: AccountFilter,
        cursor: NaiveDate,
    ) -> Self {
        let status = format!(
            "Loaded {} events from {}",
            events.len(),
            location.path.display()
        );
        let accounts = known_accounts(&events);
        App {
            events,
            location,
            config,
            filter,
            accounts,
            cursor,
            view: ViewMode::Day,
            first_hour: DEFAULT_FIRST_HOUR,
            selected: 0,
            status,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                if let TermEvent::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('h') | KeyCode::Left => self.shift_days(-1),
            KeyCode::Char('l') | KeyCode::Right => self.shift_days(1),
            KeyCode::Char('[') => self.shift_days(-7),
            KeyCode::Char(']') => self.shift_days(7),
            KeyCode::Char('t') => {
                self.cursor = Local::now().date_naive();
                self.selected = 0;
            }
            KeyCode::Char('w') => {
                self.view = match self.view {
                    ViewMode::Day => ViewMode::Week,
                    ViewMode::Week => ViewMode::Day,
                };
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.first_hour = (self.first_hour + 1).min(HOURS_PER_DAY - 1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.first_hour = self.first_hour.saturating_sub(1);
            }
            KeyCode::Tab => self.select_next(1),
            KeyCode::BackTab => self.select_next(-1),
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
        false
    }

    fn shift_days(&mut self, days: i64) {
        if let Some(next) = self
            .cursor
            .checked_add_signed(ChronoDuration::days(days))
        {
            self.cursor = next;
            self.selected = 0;
        }
    }

    fn select_next(&mut self, delta: isize) {
        let count = self.cursor_day().timed.len();
        if count == 0 {
            return;
        }
        let current = self.selected.min(count - 1) as isize;
        self.selected = (current + delta).rem_euclid(count as isize) as usize;
        if let Some(item) = self.cursor_day().timed.get(self.selected) {
            let hour = (item.top / self.options().px_per_hour).floor() as u16;
            self.first_hour = hour.min(HOURS_PER_DAY - 1);
        }
    }

    fn reload(&mut self) {
        match load_events(&self.location) {
            Ok(events) => {
                info!(
                    "event=reload module=ui path={} count={}",
                    self.location.path.display(),
                    events.len()
                );
                self.accounts = known_accounts(&events);
                self.status = format!("Reloaded {} events", events.len());
                self.events = events;
                self.selected = 0;
            }
            Err(err) => {
                warn!("event=reload module=ui status=error error={:#}", err);
                self.status = format!("Reload failed: {:#}", err);
            }
        }
    }

    fn options(&self) -> LayoutOptions {
        match self.view {
            ViewMode::Day => self.config.day_options(None),
            ViewMode::Week => self.config.week_options(None),
        }
    }

    fn cursor_day(&self) -> DayLayout {
        DayLayout::build(&self.events, self.cursor, &self.filter, &self.options())
    }

    fn visible_days(&self) -> Vec<DayLayout> {
        match self.view {
            ViewMode::Day => vec![self.cursor_day()],
            ViewMode::Week => week_layout(
                &self.events,
                self.cursor,
                self.config.week_starts_on,
                &self.filter,
                &self.options(),
            ),
        }
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let days = self.visible_days();
        let all_day_rows = days
            .iter()
            .map(|d| d.all_day.len())
            .max()
            .unwrap_or(0)
            .min(3) as u16;
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(all_day_rows + 1),
                Constraint::Min(6),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        let columns = self.day_columns(layout[1].union(layout[2]), days.len());
        for (day, column) in days.iter().zip(columns.iter()) {
            let strip = Rect::new(column.x, layout[1].y, column.width, layout[1].height);
            let grid = Rect::new(column.x, layout[2].y, column.width, layout[2].height);
            self.draw_all_day(f, strip, day);
            self.draw_grid(f, grid, day);
        }
        self.draw_gutter(f, layout[2]);
        self.draw_footer(f, layout[3]);
    }

    fn day_columns(&self, area: Rect, count: usize) -> Vec<Rect> {
        let body = Rect::new(
            area.x + GUTTER_WIDTH,
            area.y,
            area.width.saturating_sub(GUTTER_WIDTH),
            area.height,
        );
        let constraints: Vec<Constraint> = (0..count)
            .map(|_| Constraint::Ratio(1, count.max(1) as u32))
            .collect();
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(body)
            .to_vec()
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let title = Line::from(vec![
            Span::styled(
                "daygrid ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                self.cursor.format("%A %Y-%m-%d").to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  •  "),
            Span::styled(self.location.scope.label(), Style::default().fg(Color::Green)),
            Span::raw("  •  "),
            Span::styled(
                format!("{}", self.location.path.display()),
                Style::default().fg(Color::DarkGray),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("view {}", self.view.label()),
                Style::default().fg(Color::Magenta),
            ),
        ]);

        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(title)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_gutter(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let gutter = Rect::new(area.x, area.y, GUTTER_WIDTH.min(area.width), area.height);
        let first_row = self.first_hour * ROWS_PER_HOUR;
        let lines: Vec<Line<'static>> = (0..gutter.height)
            .map(|offset| {
                let row = first_row + offset;
                if row % ROWS_PER_HOUR == 0 && row / ROWS_PER_HOUR < HOURS_PER_DAY {
                    Line::from(Span::styled(
                        format!("{:02}:00", row / ROWS_PER_HOUR),
                        Style::default().fg(Color::Gray),
                    ))
                } else {
                    Line::from("")
                }
            })
            .collect();
        f.render_widget(Paragraph::new(lines), gutter);
    }

    fn draw_all_day(&self, f: &mut ratatui::Frame<'_>, area: Rect, day: &DayLayout) {
        let is_cursor = day.date == self.cursor;
        let mut lines = vec![Line::from(Span::styled(
            day.date.format("%a %d").to_string(),
            Style::default()
                .fg(if is_cursor { Color::Cyan } else { Color::Gray })
                .add_modifier(Modifier::BOLD),
        ))];
        for merged in day.all_day.iter().take(area.height.saturating_sub(1) as usize) {
            let color = self.account_color(&merged.event.account_email);
            lines.push(Line::from(Span::styled(
                truncate_text(
                    &format!(
                        "{}{}",
                        merged.event.title(),
                        account_badge(merged.merged_accounts.len())
                    ),
                    area.width as usize,
                ),
                Style::default().fg(Color::Black).bg(color),
            )));
        }
        f.render_widget(Paragraph::new(lines), area);
    }

    fn draw_grid(&self, f: &mut ratatui::Frame<'_>, area: Rect, day: &DayLayout) {
        let px_per_hour = self.options().px_per_hour;
        let first_row = self.first_hour * ROWS_PER_HOUR;
        let lines: Vec<Line<'static>> = (0..area.height)
            .map(|offset| {
                if (first_row + offset) % ROWS_PER_HOUR == 0 {
                    Line::from(Span::styled(
                        "┈".repeat(area.width as usize),
                        Style::default().fg(Color::Rgb(40, 44, 52)),
                    ))
                } else {
                    Line::from("")
                }
            })
            .collect();
        f.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .borders(Borders::LEFT)
                    .border_style(Style::default().fg(Color::DarkGray)),
            ),
            area,
        );
        let inner = Rect::new(
            area.x + 1,
            area.y,
            area.width.saturating_sub(1),
            area.height,
        );

        let mut by_z: Vec<(usize, &LayoutItem)> = day.timed.iter().enumerate().collect();
        by_z.sort_by_key(|(_, item)| item.z_index);
        for (idx, item) in by_z {
            let Some(rect) = item_rect(item, inner, px_per_hour, first_row) else {
                continue;
            };
            let selected = day.date == self.cursor && idx == self.selected;
            self.draw_item(f, rect, item, selected);
        }
    }

    fn draw_item(&self, f: &mut ratatui::Frame<'_>, rect: Rect, item: &LayoutItem, selected: bool) {
        let event = &item.event.event;
        let color = self.account_color(&event.account_email);
        let mut style = if item.is_background {
            Style::default().fg(color).bg(Color::Rgb(24, 26, 32))
        } else {
            Style::default().fg(Color::Black).bg(color)
        };
        if selected {
            style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
        }
        let accent = if item.is_background { "▎" } else { "" };
        let mut lines = vec![Line::from(Span::styled(
            truncate_text(
                &format!(
                    "{}{}{}",
                    accent,
                    event.title(),
                    account_badge(item.event.merged_accounts.len())
                ),
                rect.width as usize,
            ),
            style,
        ))];
        if rect.height > 1 {
            if let (Some(start), Some(end)) = (event.start_time, event.end_time) {
                lines.push(Line::from(Span::styled(
                    truncate_text(
                        &format!("{}-{}", start.format("%H:%M"), end.format("%H:%M")),
                        rect.width as usize,
                    ),
                    style,
                )));
            }
        }
        f.render_widget(Clear, rect);
        f.render_widget(Paragraph::new(lines).style(style), rect);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(rows[1]);

        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status, bottom[0]);

        let day = self.cursor_day();
        let detail = match day.timed.get(self.selected) {
            Some(item) => selected_item_detail(item),
            None => Line::from(Span::styled(
                "No event selected",
                Style::default().fg(Color::DarkGray),
            )),
        };
        let detail = Paragraph::new(detail).wrap(Wrap { trim: true }).block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(format!(
                    "{} timed, {} all day, {} cols",
                    day.timed.len(),
                    day.all_day.len(),
                    day.max_columns()
                )),
        );
        f.render_widget(detail, bottom[1]);
    }

    fn account_color(&self, account: &str) -> Color {
        let idx = self
            .accounts
            .iter()
            .position(|a| a == account)
            .unwrap_or(0);
        color_for_index(idx)
    }
}

/// Maps an item's pixel geometry onto terminal cells inside `area`.
///
/// `first_row` is the grid row shown at the top of `area`. Returns `None`
/// when the item is scrolled out of view or the area has no room.
fn item_rect(item: &LayoutItem, area: Rect, px_per_hour: f64, first_row: u16) -> Option<Rect> {
    if area.width == 0 || area.height == 0 || px_per_hour <= 0.0 {
        return None;
    }
    let rows_per_px = f64::from(ROWS_PER_HOUR) / px_per_hour;
    let top = (item.top * rows_per_px).round() as i64 - i64::from(first_row);
    let height = ((item.height * rows_per_px).round() as i64).max(1);
    let bottom = top + height;
    if bottom <= 0 || top >= i64::from(area.height) {
        return None;
    }
    let y = top.max(0) as u16;
    let h = (bottom.min(i64::from(area.height)) - i64::from(y)) as u16;

    let x = item.left.scale(area.width);
    let right = Percent((item.left.value() + item.width.value()).min(100.0)).scale(area.width);
    let w = right.saturating_sub(x).max(1).min(area.width.saturating_sub(x));
    if w == 0 {
        return None;
    }
    Some(Rect::new(area.x + x, area.y + y, w, h))
}

fn known_accounts(events: &[Event]) -> Vec<String> {
    let mut accounts: Vec<String> = Vec::new();
    for event in events {
        if !accounts.contains(&event.account_email) {
            accounts.push(event.account_email.clone());
        }
    }
    accounts
}

fn account_badge(count: usize) -> String {
    if count > 1 {
        format!(" ×{}", count)
    } else {
        String::new()
    }
}

fn footer_help_line() -> Line<'static> {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::LightCyan));
    let text = |t: &'static str| Span::raw(t);
    Line::from(vec![
        key("h/l"),
        text(" day  "),
        key("[ ]"),
        text(" week  "),
        key("t"),
        text(" today  "),
        key("w"),
        text(" day/week  "),
        key("j/k"),
        text(" scroll  "),
        key("Tab"),
        text(" select  "),
        key("r"),
        text(" reload  "),
        key("q"),
        text(" quit"),
    ])
}

fn selected_item_detail(item: &LayoutItem) -> Line<'static> {
    let event = &item.event.event;
    let mut spans = vec![Span::styled(
        event.title().to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if let (Some(start), Some(end)) = (event.start_time, event.end_time) {
        spans.push(Span::raw(format!(
            "  {}-{}",
            start.format("%H:%M"),
            end.format("%H:%M")
        )));
    }
    spans.push(Span::styled(
        format!("  {}", item.event.merged_accounts.join(", ")),
        Style::default().fg(Color::LightGreen),
    ));
    if let Some(location) = &event.location {
        spans.push(Span::styled(
            format!("  @ {}", location),
            Style::default().fg(Color::Gray),
        ));
    }
    if !event.attendees.is_empty() {
        spans.push(Span::styled(
            format!("  {} attendees", event.attendees.len()),
            Style::default().fg(Color::Gray),
        ));
    }
    spans.push(Span::styled(
        format!("  col {}/{}", item.column + 1, item.column_count),
        Style::default().fg(Color::DarkGray),
    ));
    Line::from(spans)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn color_for_index(idx: usize) -> Color {
    let palette = [
        Color::Cyan,
        Color::LightGreen,
        Color::LightMagenta,
        Color::LightBlue,
        Color::LightYellow,
        Color::LightRed,
    ];
    palette[idx % palette.len()]
}

fn truncate_text(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().take(max).collect();
    }
    let mut out: String = text.chars().take(max - 3).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use daygrid::{layout, Event, MergedEvent};

    fn items(ranges: &[((u32, u32), (u32, u32))]) -> Vec<LayoutItem> {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let merged: Vec<MergedEvent> = ranges
            .iter()
            .enumerate()
            .map(|(idx, ((sh, sm), (eh, em)))| {
                MergedEvent::single(Event::timed(
                    idx.to_string(),
                    "Meeting",
                    date.and_hms_opt(*sh, *sm, 0).unwrap(),
                    date.and_hms_opt(*eh, *em, 0).unwrap(),
                    "a@x.com",
                ))
            })
            .collect();
        layout(&merged, 60.0)
    }

    #[test]
    fn item_rect_maps_pixels_to_cells() {
        let laid = items(&[((9, 0), (10, 0)), ((9, 30), (10, 30))]);
        let area = Rect::new(10, 5, 40, 20);
        let first = item_rect(&laid[0], area, 60.0, 16).unwrap();
        assert_eq!(first, Rect::new(10, 7, 20, 2));
        let second = item_rect(&laid[1], area, 60.0, 16).unwrap();
        assert_eq!(second, Rect::new(30, 8, 20, 2));
    }

    #[test]
    fn item_rect_clips_and_hides_offscreen_items() {
        let laid = items(&[((7, 0), (9, 0)), ((20, 0), (21, 0))]);
        let area = Rect::new(0, 0, 30, 10);
        let clipped = item_rect(&laid[0], area, 60.0, 16).unwrap();
        assert_eq!((clipped.y, clipped.height), (0, 2));
        assert!(item_rect(&laid[1], area, 60.0, 16).is_none());
    }

    #[test]
    fn truncate_text_keeps_short_strings() {
        assert_eq!(truncate_text("Standup", 10), "Standup");
        assert_eq!(truncate_text("Quarterly planning", 10), "Quarter...");
        assert_eq!(truncate_text("abc", 0), "");
    }

    #[test]
    fn known_accounts_keep_first_seen_order() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let at = date.and_hms_opt(9, 0, 0).unwrap();
        let events = vec![
            Event::timed("1", "A", at, at, "b@x.com"),
            Event::timed("2", "B", at, at, "a@x.com"),
            Event::timed("3", "C", at, at, "b@x.com"),
        ];
        assert_eq!(known_accounts(&events), vec!["b@x.com", "a@x.com"]);
    }
}
