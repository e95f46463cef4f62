//! Screen rendering based on application state

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use ratatui::Frame;

use crate::ui::form::FIELD_LABELS;
use crate::ui::{App, AppState};

/// Render the current state into the frame
pub fn render_state(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(4),
        ])
        .split(area);

    render_header(frame, app, chunks[0]);
    render_table(frame, app, chunks[1]);
    render_footer(frame, app, chunks[2]);

    match app.state {
        AppState::Form => render_form_overlay(frame, app, area),
        AppState::ConfirmRemove => render_confirm_remove(frame, app, area),
        AppState::ConfirmExit => render_confirm_exit(frame, area),
        AppState::Table => {}
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = match &app.sshfs_warning {
        Some(warning) => format!("SSHFS Manager — {}", warning),
        None => "SSHFS Manager".to_string(),
    };
    let header = Paragraph::new(title)
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    frame.render_widget(header, area);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let rows = app.rows();

    if rows.is_empty() {
        let empty = Paragraph::new("No connections. Press 'a' to add one.")
            .block(Block::default().title("Connections").borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(["Name", "Host", "Remote Path", "Local Mount", "Status"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let table_rows: Vec<Row> = rows
        .iter()
        .enumerate()
        .map(|(i, (_, def, mounted))| {
            let (status, status_style) = if *mounted {
                ("Mounted", Style::default().fg(Color::Green))
            } else {
                ("Not Mounted", Style::default().fg(Color::DarkGray))
            };
            let row = Row::new(vec![
                Cell::from(def.name.clone()),
                Cell::from(format!("{}:{}", def.host, def.port)),
                Cell::from(def.remote_path.clone()),
                Cell::from(def.local_mount_point.clone()),
                Cell::from(status).style(status_style),
            ]);
            if i == app.selected {
                row.style(Style::default().add_modifier(Modifier::REVERSED))
            } else {
                row
            }
        })
        .collect();

    let table = Table::new(
        table_rows,
        [
            Constraint::Percentage(20),
            Constraint::Percentage(25),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
            Constraint::Percentage(15),
        ],
    )
    .header(header)
    .block(Block::default().title("Connections").borders(Borders::ALL));

    frame.render_widget(table, area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let refreshed = app
        .board
        .last_refresh()
        .map(|ts| ts.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());
    let controls =
        "a add • e edit • d delete • m mount • u unmount • r refresh • Up/Down select • q quit";
    let footer = Paragraph::new(vec![
        Line::from(app.status_line.clone()),
        Line::from(format!("{} • refreshed {}", controls, refreshed)),
    ])
    .block(Block::default().borders(Borders::ALL))
    .wrap(Wrap { trim: true });
    frame.render_widget(footer, area);
}

fn render_form_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let overlay = centered_rect(70, 70, area);
    frame.render_widget(Clear, overlay);

    let title = if app.editing.is_some() {
        "Edit Connection"
    } else {
        "Add Connection"
    };

    let mut lines = Vec::new();
    for (i, label) in FIELD_LABELS.iter().enumerate() {
        let marker = if i == app.form.selected { "> " } else { "  " };
        lines.push(Line::from(format!(
            "{}{}: {}",
            marker, label, app.form.fields[i]
        )));
    }
    lines.push(Line::from(""));
    if let Some(error) = &app.form.error {
        lines.push(Line::from(error.clone()).style(Style::default().fg(Color::Red)));
    }
    lines.push(Line::from(
        "Tab/Down next • Up previous • Enter save • Esc cancel",
    ));

    let form = Paragraph::new(lines)
        .block(Block::default().title(title).borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    frame.render_widget(form, overlay);
}

fn render_confirm_remove(frame: &mut Frame, app: &App, area: Rect) {
    let overlay = centered_rect(60, 30, area);
    frame.render_widget(Clear, overlay);

    let name = app
        .selected_name()
        .unwrap_or_else(|| "this connection".to_string());
    let lines = vec![
        Line::from(format!("Delete connection '{}'?", name)),
        Line::from("It will be unmounted first if currently mounted."),
        Line::from(""),
        Line::from("y/Enter confirm • n/Esc cancel"),
    ];
    let confirm = Paragraph::new(lines)
        .block(Block::default().title("Confirm Delete").borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    frame.render_widget(confirm, overlay);
}

fn render_confirm_exit(frame: &mut Frame, area: Rect) {
    let overlay = centered_rect(60, 30, area);
    frame.render_widget(Clear, overlay);

    let lines = vec![
        Line::from("Some connections are still mounted."),
        Line::from("Unmount them before exiting?"),
        Line::from(""),
        Line::from("y unmount and exit • n exit anyway • Esc cancel"),
    ];
    let confirm = Paragraph::new(lines)
        .block(Block::default().title("Confirm Exit").borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    frame.render_widget(confirm, overlay);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let vertical = popup_layout[1];
    let horizontal_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical);

    horizontal_layout[1]
}
