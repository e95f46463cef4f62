//! TUI event loop
//!
//! Sets up the terminal, polls for input on a short interval so the status
//! board stays visually fresh, and dispatches keys per application state.

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::stdout;
use std::time::Duration;

use crate::ui::{render::render_state, App, AppState};

/// Run the interactive loop until the user exits.
pub fn run_loop(app: &mut App) -> Result<()> {
    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;

    // Ensure terminal is restored even if we exit early
    struct TuiGuard;
    impl Drop for TuiGuard {
        fn drop(&mut self) {
            let _ = disable_raw_mode();
            let mut out = std::io::stdout();
            let _ = execute!(out, LeaveAlternateScreen);
        }
    }
    let _guard = TuiGuard;

    loop {
        terminal.draw(|f| {
            render_state(f, app);
        })?;

        if event::poll(Duration::from_millis(200))? {
            if let Event::Key(key) = event::read()? {
                if !should_handle_key(&key) {
                    continue;
                }
                match app.state {
                    AppState::Table => handle_table_key(app, &key),
                    AppState::Form => handle_form_key(app, &key),
                    AppState::ConfirmRemove => handle_confirm_remove_key(app, &key),
                    AppState::ConfirmExit => handle_confirm_exit_key(app, &key),
                }
            }
        }

        if app.exit_requested {
            break;
        }
    }

    Ok(())
}

fn should_handle_key(key: &KeyEvent) -> bool {
    key.kind == KeyEventKind::Press
}

fn handle_table_key(app: &mut App, key: &KeyEvent) {
    match key.code {
        KeyCode::Char('q') => {
            if app.mounted_count() > 0 {
                app.state = AppState::ConfirmExit;
            } else {
                app.exit_requested = true;
            }
        }
        KeyCode::Up => app.select_up(),
        KeyCode::Down => app.select_down(),
        KeyCode::Char('a') => app.begin_add(),
        KeyCode::Char('e') => app.begin_edit(),
        KeyCode::Char('d') => {
            if app.connection_count() > 0 {
                app.state = AppState::ConfirmRemove;
            }
        }
        KeyCode::Char('m') => app.mount_selected(),
        KeyCode::Char('u') => app.unmount_selected(),
        KeyCode::Char('r') => app.refresh_now(),
        _ => {}
    }
}

fn handle_form_key(app: &mut App, key: &KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_form(),
        KeyCode::Enter => app.submit_form(),
        KeyCode::Tab | KeyCode::Down => app.form.next_field(),
        KeyCode::BackTab | KeyCode::Up => app.form.prev_field(),
        KeyCode::Backspace => app.form.backspace(),
        KeyCode::Char(c) => app.form.input(c),
        _ => {}
    }
}

fn handle_confirm_remove_key(app: &mut App, key: &KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => app.remove_selected(),
        KeyCode::Char('n') | KeyCode::Esc => app.state = AppState::Table,
        _ => {}
    }
}

fn handle_confirm_exit_key(app: &mut App, key: &KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => {
            app.unmount_all();
            app.exit_requested = true;
        }
        KeyCode::Char('n') => {
            // Leave everything mounted.
            app.exit_requested = true;
        }
        KeyCode::Esc => app.state = AppState::Table,
        _ => {}
    }
}
