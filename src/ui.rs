// src/ui.rs
use crate::app::App;
use crate::event::{Category, Event};
use crate::filter::CategoryFilter;
use crate::grid::DayCell;
use crate::session::MonthSnapshot;
use chrono::{Datelike, Local};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
};
use std::fmt::Write as _;
use std::rc::Rc;

/// Titles shown in a day cell before collapsing the rest into "+N".
pub const MAX_TITLES_PER_CELL: usize = 3;

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub fn category_color(category: Category) -> Color {
    match category {
        Category::Circle => Color::Blue,
        Category::JobHunting => Color::Green,
        Category::University => Color::Magenta,
        Category::Personal => Color::Yellow,
    }
}

pub struct LayoutChunks {
    pub tabs_chunk: Rect,
    pub filter_chunk: Rect,
    pub grid_chunk: Rect,
    pub detail_chunk: Rect,
    pub status_chunk: Rect,
}

pub fn compute_layout(frame_size: Rect) -> LayoutChunks {
    let main_chunks: Rc<[Rect]> = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // tabs
            Constraint::Length(3), // month + type chips
            Constraint::Min(8),    // grid
            Constraint::Length(8), // selected day
            Constraint::Length(1), // status / hints
        ])
        .split(frame_size);

    LayoutChunks {
        tabs_chunk: main_chunks[0],
        filter_chunk: main_chunks[1],
        grid_chunk: main_chunks[2],
        detail_chunk: main_chunks[3],
        status_chunk: main_chunks[4],
    }
}

pub fn ui(f: &mut Frame, app: &App) {
    let chunks = compute_layout(f.size());

    // === Tabs ===
    let titles: Vec<String> = CategoryFilter::TABS.iter().map(|t| t.label().to_string()).collect();
    let tabs = Tabs::new(titles)
        .select(app.active_tab.tab_index().unwrap_or(0))
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, chunks.tabs_chunk);

    // === Month + type chips ===
    let mut chips: Vec<Span> = Vec::new();
    for (i, event_type) in app.available_types().iter().enumerate() {
        let style = if app.selected_types.contains(event_type) {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::Gray)
        };
        let label = if i < 9 { format!(" {}:{} ", i + 1, event_type) } else { format!(" {} ", event_type) };
        chips.push(Span::styled(label, style));
        chips.push(Span::raw(" "));
    }
    let filter_widget = Paragraph::new(Line::from(chips)).block(
        Block::default()
            .title(format!(" < {} > ", app.reference.format("%B %Y")))
            .borders(Borders::ALL),
    );
    f.render_widget(filter_widget, chunks.filter_chunk);

    // === Grid ===
    if app.is_loading() {
        let loading = Paragraph::new("Loading events...")
            .style(Style::default().fg(Color::Cyan))
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(loading, chunks.grid_chunk);
    } else {
        render_grid(f, chunks.grid_chunk, app);
    }

    // === Selected day ===
    let events = app.selected_day_events();
    let mut lines: Vec<Line> = Vec::new();
    if events.is_empty() {
        lines.push(Line::from(Span::styled("No events", Style::default().fg(Color::DarkGray))));
    }
    for (i, event) in events.iter().enumerate() {
        let marker = if i == app.selected_event_index { "> " } else { "  " };
        lines.push(Line::from(vec![
            Span::raw(marker),
            Span::styled(
                format!("[{}] ", event.category().label()),
                Style::default().fg(category_color(event.category())),
            ),
            Span::styled(event.title().to_string(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(detail_suffix(event)),
        ]));
    }
    let detail_widget = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .title(format!(" {} ", app.selected_date.format("%a %-d %B")))
            .borders(Borders::ALL),
    );
    f.render_widget(detail_widget, chunks.detail_chunk);

    // === Status ===
    let status = app.status_message.clone().unwrap_or_else(|| {
        " [/]:Month Tab:Category 1-9:Type 0:Clear arrows:Day n/p:Event e:Export q:Quit".to_string()
    });
    f.render_widget(Paragraph::new(status).style(Style::default().fg(Color::DarkGray)), chunks.status_chunk);
}

fn detail_suffix(event: &Event) -> String {
    let mut suffix = String::new();
    if let Some(at) = event.starts_at_in(&Local) {
        let _ = write!(suffix, "  {}", at.format("%H:%M"));
    }
    for part in [event.event_type(), event.location(), event.company(), event.url()].into_iter().flatten() {
        let _ = write!(suffix, "  {}", part);
    }
    suffix
}

fn render_grid(f: &mut Frame, area: Rect, app: &App) {
    let cells = app.grid();
    let weeks = cells.len().div_ceil(7).max(1);

    let mut row_constraints = vec![Constraint::Length(1)];
    row_constraints.extend((0..weeks).map(|_| Constraint::Ratio(1, weeks as u32)));
    let rows: Rc<[Rect]> =
        Layout::default().direction(Direction::Vertical).constraints(row_constraints).split(area);

    let header: Vec<Span> = DAY_NAMES
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let width = (area.width / 7) as usize;
            Span::styled(format!("{:^width$}", d, width = width), weekday_style(i))
        })
        .collect();
    f.render_widget(Paragraph::new(Line::from(header)), rows[0]);

    for (week, week_cells) in cells.chunks(7).enumerate() {
        let columns: Rc<[Rect]> = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 7); 7])
            .split(rows[week + 1]);
        for (col, cell) in week_cells.iter().enumerate() {
            let selected = cell.in_month && cell.date == app.selected_date;
            f.render_widget(day_cell_widget(cell, selected), columns[col]);
        }
    }
}

fn weekday_style(weekday_from_sunday: usize) -> Style {
    match weekday_from_sunday {
        0 => Style::default().fg(Color::Red),
        6 => Style::default().fg(Color::Blue),
        _ => Style::default(),
    }
}

fn day_cell_widget(cell: &DayCell, selected: bool) -> Paragraph<'static> {
    let mut lines: Vec<Line> = Vec::new();
    let day_style = weekday_style(cell.date.weekday().num_days_from_sunday() as usize);
    lines.push(Line::from(Span::styled(cell.date.day().to_string(), day_style)));

    for event in cell.events.iter().take(MAX_TITLES_PER_CELL) {
        lines.push(Line::from(Span::styled(
            event.title().to_string(),
            Style::default().fg(category_color(event.category())),
        )));
    }
    if cell.events.len() > MAX_TITLES_PER_CELL {
        lines.push(Line::from(Span::styled(
            format!("+{}", cell.events.len() - MAX_TITLES_PER_CELL),
            Style::default().fg(Color::Gray),
        )));
    }

    let mut block = Block::default().borders(Borders::ALL);
    if selected {
        block = block.border_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    }
    let mut paragraph = Paragraph::new(lines).block(block);
    if !cell.in_month {
        paragraph = paragraph.style(Style::default().add_modifier(Modifier::DIM));
    }
    paragraph
}

/// Plain-text listing of a month for non-interactive output.
pub fn month_report(snapshot: &MonthSnapshot, active: CategoryFilter, selected_types: &[String]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} [{}]", snapshot.reference().format("%B %Y"), active);
    let types = snapshot.facets().types(active);
    if !types.is_empty() {
        let _ = writeln!(out, "Types: {}", types.join(", "));
    }

    let mut listed = 0;
    for cell in snapshot.grid(active, selected_types).iter().filter(|c| c.in_month) {
        for event in &cell.events {
            let _ = writeln!(
                out,
                "{}  {:<12} {}  ({})",
                cell.date.format("%a %d"),
                format!("[{}]", event.category()),
                event.title(),
                event.id()
            );
            listed += 1;
        }
    }
    if listed == 0 {
        let _ = writeln!(out, "No events");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ratatui::{Terminal, backend::TestBackend};

    fn snapshot() -> MonthSnapshot {
        let events = vec![
            Event::new("c1".into(), "Practice".into(), "2024-03-15T10:00:00".into(), Category::Circle)
                .with_type("practice"),
            Event::new("u1".into(), "Exam".into(), "2024-03-18T10:00:00".into(), Category::University),
        ];
        MonthSnapshot::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), events)
    }

    #[test]
    fn test_month_report_lists_visible_events() {
        let report = month_report(&snapshot(), CategoryFilter::All, &[]);
        assert!(report.starts_with("March 2024 [all]\n"));
        assert!(report.contains("Types: practice\n"));
        assert!(report.contains("Fri 15  [circle]     Practice  (c1)"));
        assert!(report.contains("Mon 18  [university] Exam  (u1)"));

        let filtered = month_report(&snapshot(), CategoryFilter::All, &["practice".to_string()]);
        assert!(!filtered.contains("Exam"));
    }

    #[test]
    fn test_month_report_without_events() {
        let empty = MonthSnapshot::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), Vec::new());
        assert!(month_report(&empty, CategoryFilter::All, &[]).ends_with("No events\n"));
    }

    #[test]
    fn test_cell_overflow_marker() {
        let events: Vec<Event> = (0..5)
            .map(|i| {
                Event::new(format!("e{}", i), format!("E{}", i), "2024-03-15T10:00:00".into(), Category::Circle)
            })
            .collect();
        let cell = DayCell { date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(), in_month: true, events };

        let backend = TestBackend::new(12, 8);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| f.render_widget(day_cell_widget(&cell, false), f.size())).unwrap();

        let buffer = terminal.backend().buffer().clone();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("E2"));
        assert!(!text.contains("E3"));
        assert!(text.contains("+2"));
    }

    #[test]
    fn test_full_frame_renders_while_loading() {
        let app = App::new(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|f| ui(f, &app)).unwrap();

        let text: String = terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Loading events..."));
        assert!(text.contains("March 2024"));
    }
}
