//! Users table and the create/edit form modal.
//!
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};

use crate::app::AppState;
use crate::app::form::FormDraft;
use crate::model::UserField;

/// Header label for a column, with an arrow on the active sort column.
pub fn column_header(app: &AppState, field: UserField) -> String {
    match app.view.sort {
        Some(key) if key.field == field => format!("{} {}", field.label(), key.direction.arrow()),
        _ => field.label().to_string(),
    }
}

/// Table title: cursor position within the derived view.
pub fn table_title(app: &AppState) -> String {
    if app.snapshot.is_empty() {
        "Users (none)".to_string()
    } else if app.users.is_empty() {
        "Users 0/0".to_string()
    } else {
        format!("Users {}/{}", app.selected_index + 1, app.users.len())
    }
}

/// Render the derived view one page at a time around the selection.
pub fn render_users_table(f: &mut Frame, area: Rect, app: &mut AppState) {
    let body_height = area.height.saturating_sub(3) as usize;
    if body_height > 0 {
        app.rows_per_page = body_height;
    }

    let start = (app.selected_index / app.rows_per_page) * app.rows_per_page;
    let end = (start + app.rows_per_page).min(app.users.len());
    let slice = &app.users[start.min(end)..end];

    let rows = slice.iter().enumerate().map(|(i, u)| {
        let style = if start + i == app.selected_index {
            Style::default()
                .fg(app.theme.highlight_fg)
                .bg(app.theme.highlight_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.text)
        };
        Row::new(UserField::ALL.iter().map(|field| Cell::from(u.field(*field).to_string()))).style(style)
    });

    let widths = [
        Constraint::Percentage(20),
        Constraint::Percentage(20),
        Constraint::Percentage(25),
        Constraint::Percentage(35),
    ];
    let header = Row::new(UserField::ALL.iter().map(|field| column_header(app, *field)))
        .style(Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD));

    let title = table_title(app);
    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .column_spacing(1);

    f.render_widget(table, area);
}

/// Modal with the four inputs; the focused one carries a marker and cursor.
pub fn render_user_form(f: &mut Frame, area: Rect, app: &AppState, draft: &FormDraft) {
    let rect = crate::ui::components::centered_rect(64, 10, area);
    let mut lines: Vec<Line> = Vec::with_capacity(6);
    for field in UserField::ALL {
        let focused = field == draft.focus;
        let marker = if focused { "▶ " } else { "  " };
        let cursor = if focused && !draft.submitting() { "_" } else { "" };
        let label_style = if focused {
            Style::default().fg(app.theme.highlight_fg).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.text)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{marker}{:<11}", field.label()), label_style),
            Span::raw(format!("{}{cursor}", draft.fields.get(field))),
        ]));
    }
    lines.push(Line::raw(""));
    let hint = if draft.submitting() {
        "Saving…".to_string()
    } else {
        let verb = match draft.mode() {
            crate::app::form::FormMode::Create => "Submit",
            crate::app::form::FormMode::Edit => "Save",
        };
        format!("Enter: {verb}   Esc: Cancel   Tab/Up/Down: move")
    };
    lines.push(Line::styled(hint, Style::default().fg(app.theme.muted)));

    let p = Paragraph::new(lines).block(
        Block::default()
            .title(draft.title())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
