mod app;
mod ui;

pub use app::{App, DetailScreen, InputMode, Message, Screen, UploadField, UploadScreen};
pub use ui::draw;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use pkgcat_core::{CatalogApi, ViewState};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::sync::Arc;
use std::time::Duration;

const TICK: Duration = Duration::from_millis(100);

pub async fn run(api: Arc<dyn CatalogApi>, view: ViewState) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(api, view);
    app.reload_catalog();

    let res = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.drain_messages();
        terminal.draw(|f| ui::draw(f, app))?;

        if !event::poll(TICK)? {
            tokio::task::yield_now().await;
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && handle_key(app, key) {
                return Ok(());
            }
        }
    }
}

/// Dispatch one key press. Returns true when the app should quit.
pub fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    match app.input_mode {
        InputMode::Normal => {
            if let KeyCode::Char('q') = key.code {
                return true;
            }
            if matches!(app.screen, Screen::Catalog) {
                handle_catalog_key(app, key.code);
            } else {
                handle_detail_key(app, key.code);
            }
        }
        InputMode::Searching => match key.code {
            KeyCode::Enter | KeyCode::Esc => app.input_mode = InputMode::Normal,
            KeyCode::Backspace => app.search_backspace(),
            KeyCode::Char(c) => app.search_input(c),
            _ => {}
        },
        InputMode::FilteringTitles => match key.code {
            KeyCode::Enter | KeyCode::Esc => app.input_mode = InputMode::Normal,
            KeyCode::Backspace => app.title_filter_backspace(),
            KeyCode::Char(c) => app.title_filter_input(c),
            _ => {}
        },
        InputMode::Uploading => handle_upload_key(app, key.code),
        InputMode::ConfirmDelete => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_delete(),
            _ => {}
        },
        InputMode::ShowingHelp => match key.code {
            KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => app.toggle_help(),
            _ => {}
        },
    }
    false
}

fn handle_catalog_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('?') => app.toggle_help(),
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.previous(),
        KeyCode::Char('l') | KeyCode::Right | KeyCode::PageDown => app.next_page(),
        KeyCode::Char('h') | KeyCode::Left | KeyCode::PageUp => app.previous_page(),
        KeyCode::Enter => app.open_selected(),
        KeyCode::Char('/') => app.start_search(),
        KeyCode::Char('s') => app.cycle_sort(),
        KeyCode::Char('n') => app.cycle_page_size(),
        KeyCode::Char('u') => app.start_upload(),
        KeyCode::Char('r') => app.reload_catalog(),
        _ => {}
    }
}

fn handle_detail_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('?') => app.toggle_help(),
        KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => app.back_to_catalog(),
        KeyCode::Char('j') | KeyCode::Down => app.next_title(),
        KeyCode::Char('k') | KeyCode::Up => app.previous_title(),
        KeyCode::Char('t') | KeyCode::Enter => app.toggle_titles(),
        KeyCode::Char('/') => app.start_title_filter(),
        KeyCode::Char('o') => app.copy_title_link("OpenAlex"),
        KeyCode::Char('c') => app.copy_title_link("Crossref"),
        KeyCode::Char('u') => app.start_upload(),
        KeyCode::Char('D') => app.start_delete(),
        KeyCode::Char('r') => app.refresh_detail(),
        _ => {}
    }
}

fn handle_upload_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => app.close_upload(),
        KeyCode::Enter => app.submit_upload(),
        KeyCode::Tab | KeyCode::Down => app.upload_next_field(),
        KeyCode::BackTab | KeyCode::Up => app.upload_previous_field(),
        KeyCode::Left | KeyCode::Right => {
            let on_type = app
                .upload
                .as_ref()
                .is_some_and(|u| u.field == UploadField::IdentifierType);
            if on_type {
                app.upload_cycle_type();
            }
        }
        KeyCode::Backspace => app.upload_backspace(),
        KeyCode::Char(c) => app.upload_input(c),
        _ => {}
    }
}
