// src/app.rs
use crate::event::Event;
use crate::export::calendar_link;
use crate::filter::CategoryFilter;
use crate::grid::{DayCell, first_of_month, last_of_month, shift_month};
use crate::session::{CalendarSession, MonthSnapshot};
use anyhow::Result;
use chrono::{Duration, NaiveDate};
use crossterm::{
    event::{self, Event as TermEvent, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{debug, info};
use ratatui::{Terminal, backend::Backend};
use std::io;

pub struct App {
    pub should_quit: bool,
    /// First day of the displayed month.
    pub reference: NaiveDate,
    /// `None` while the month is being fetched.
    pub snapshot: Option<MonthSnapshot>,
    pub active_tab: CategoryFilter,
    pub selected_types: Vec<String>,
    pub selected_date: NaiveDate,
    pub selected_event_index: usize,
    pub status_message: Option<String>,
    /// Set whenever the displayed month changes; the loop fetches it.
    pub needs_reload: bool,
}

impl App {
    pub fn new(today: NaiveDate) -> App {
        App {
            should_quit: false,
            reference: first_of_month(today),
            snapshot: None,
            active_tab: CategoryFilter::All,
            selected_types: Vec::new(),
            selected_date: today,
            selected_event_index: 0,
            status_message: None,
            needs_reload: true,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.snapshot.is_none()
    }

    pub fn set_snapshot(&mut self, snapshot: MonthSnapshot) {
        debug!("App: {} events loaded for {}", snapshot.events().len(), snapshot.reference());
        self.snapshot = Some(snapshot);
        self.needs_reload = false;
        self.selected_event_index = 0;
    }

    // =================================== Month navigation ========================================

    fn show_month(&mut self, reference: NaiveDate) {
        self.reference = first_of_month(reference);
        self.selected_date = self.reference;
        self.selected_event_index = 0;
        self.snapshot = None;
        self.needs_reload = true;
    }

    pub fn prev_month(&mut self) {
        self.show_month(shift_month(self.reference, -1));
    }

    pub fn next_month(&mut self) {
        self.show_month(shift_month(self.reference, 1));
    }

    // ==================================== Filters ================================================

    pub fn next_tab(&mut self) {
        self.active_tab = self.active_tab.next();
        self.selected_event_index = 0;
    }

    pub fn prev_tab(&mut self) {
        self.active_tab = self.active_tab.prev();
        self.selected_event_index = 0;
    }

    /// Type chips offered for the active tab.
    pub fn available_types(&self) -> Vec<String> {
        self.snapshot.as_ref().map(|s| s.facets().types(self.active_tab)).unwrap_or_default()
    }

    /// Toggles the chip at `index` (0-based) in the active tab's list.
    pub fn toggle_type(&mut self, index: usize) {
        let Some(event_type) = self.available_types().into_iter().nth(index) else {
            return;
        };
        if let Some(pos) = self.selected_types.iter().position(|t| *t == event_type) {
            self.selected_types.remove(pos);
        } else {
            self.selected_types.push(event_type);
        }
        self.selected_event_index = 0;
    }

    pub fn clear_types(&mut self) {
        self.selected_types.clear();
        self.selected_event_index = 0;
    }

    // ================================== Grid & selection =========================================

    pub fn grid(&self) -> Vec<DayCell> {
        self.snapshot
            .as_ref()
            .map(|s| s.grid(self.active_tab, &self.selected_types))
            .unwrap_or_default()
    }

    /// Moves the selected day, staying inside the displayed month.
    pub fn move_selection(&mut self, days: i64) {
        let target = self.selected_date + Duration::days(days);
        self.selected_date = target.clamp(self.reference, last_of_month(self.reference));
        self.selected_event_index = 0;
    }

    pub fn selected_day_events(&self) -> Vec<Event> {
        self.grid()
            .into_iter()
            .find(|cell| cell.in_month && cell.date == self.selected_date)
            .map(|cell| cell.events)
            .unwrap_or_default()
    }

    pub fn cycle_event(&mut self, forward: bool) {
        let len = self.selected_day_events().len();
        if len == 0 {
            self.selected_event_index = 0;
            return;
        }
        let current = self.selected_event_index.min(len - 1);
        self.selected_event_index =
            if forward { (current + 1) % len } else { (current + len - 1) % len };
    }

    pub fn selected_event(&self) -> Option<Event> {
        self.selected_day_events().into_iter().nth(self.selected_event_index)
    }

    pub fn export_selected(&mut self) {
        self.status_message = Some(match self.selected_event() {
            Some(event) => match calendar_link(&event) {
                Ok(url) => url.to_string(),
                Err(e) => e.to_string(),
            },
            None => "No event selected".to_string(),
        });
    }

    // --- Key Handler ---
    pub fn on_key(&mut self, key: KeyCode) {
        self.status_message = None;
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('[') => self.prev_month(),
            KeyCode::Char(']') => self.next_month(),
            KeyCode::Tab => self.next_tab(),
            KeyCode::BackTab => self.prev_tab(),
            KeyCode::Char('0') => self.clear_types(),
            KeyCode::Char(c @ '1'..='9') => self.toggle_type(c as usize - '1' as usize),
            KeyCode::Left | KeyCode::Char('h') => self.move_selection(-1),
            KeyCode::Right | KeyCode::Char('l') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-7),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(7),
            KeyCode::Char('n') => self.cycle_event(true),
            KeyCode::Char('p') => self.cycle_event(false),
            KeyCode::Char('e') => self.export_selected(),
            _ => {}
        }
    }
}

pub async fn start_ui(app: App, session: &CalendarSession) -> Result<()> {
    // Set up the terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = app;
    let res = run_app_loop(&mut terminal, &mut app, session).await;

    // Restore the terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

pub async fn run_app_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    session: &CalendarSession,
) -> Result<()> {
    while !app.should_quit {
        if app.needs_reload {
            // Draw the loading state before suspending on the fetch.
            terminal.draw(|f| crate::ui::ui(f, app))?;
            info!("App: fetching {}", app.reference.format("%Y-%m"));
            let snapshot = session.load_month(app.reference).await;
            app.set_snapshot(snapshot);
        }

        terminal.draw(|f| crate::ui::ui(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let TermEvent::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press {
                    app.on_key(key_event.code);
                }
            }
        }
    }

    Ok(())
}
