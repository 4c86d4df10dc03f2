//! Shared UI components (status bar, modal helpers).
//!
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::keymap::KeyAction;
use crate::app::{AppState, InputMode, ModalState, SyncStatus};

/// Bottom line: mode, sync state, sort key and the latest status message.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let mode = match app.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::Search => "SEARCH",
        InputMode::Form => "FORM",
        InputMode::Modal => "MODAL",
    };
    let sync = match &app.sync {
        SyncStatus::Loading => "loading".to_string(),
        SyncStatus::Fresh { at } => format!("synced {}s ago", at.elapsed().as_secs()),
        SyncStatus::Stale { .. } => "STALE".to_string(),
    };
    let sort = match app.view.sort {
        Some(key) => format!("  sort:{} {}", key.field.label(), key.direction.arrow()),
        None => String::new(),
    };
    let mut spans = vec![Span::raw(format!("mode: {mode}  {sync}{sort}"))];
    if let Some(msg) = &app.status {
        let style = if msg.is_error {
            Style::default().fg(app.theme.error).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        spans.push(Span::raw("  "));
        spans.push(Span::styled(msg.text.clone(), style));
    } else if let SyncStatus::Stale { error } = &app.sync {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(error.clone(), Style::default().fg(app.theme.error)));
    }
    let p = Paragraph::new(Line::from(spans))
        .style(Style::default().fg(app.theme.status_fg).bg(app.theme.status_bg));
    f.render_widget(p, area);
}

pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

pub fn render_info_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    if let ModalState::Info { message } = state {
        let width = area.width.saturating_sub(6).clamp(30, 70);
        let inner = width.saturating_sub(2).max(1) as usize;
        let lines: u16 = message
            .lines()
            .map(|l| (l.chars().count() / inner) as u16 + 1)
            .sum();
        let rect = centered_rect(width, (lines + 2).min(area.height), area);
        let p = Paragraph::new(message.clone())
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title("Info")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(app.theme.border)),
            );
        f.render_widget(Clear, rect);
        f.render_widget(p, rect);
    }
}

/// Help listing generated from the active keymap, plus the fixed text-entry keys.
pub fn help_lines(app: &AppState) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut rows: Vec<(String, String)> = KeyAction::ALL
        .iter()
        .filter(|a| **a != KeyAction::Ignore)
        .filter_map(|a| {
            let keys = app.keymap.keys_for(*a);
            if keys.is_empty() {
                None
            } else {
                Some((a.describe().to_string(), keys.join(", ")))
            }
        })
        .collect();
    let width = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0);

    let mut lines = vec![Line::styled("List:", bold)];
    for (label, keys) in rows.drain(..) {
        lines.push(Line::from(vec![
            Span::raw(format!("  {label:>width$} │ ")),
            Span::styled(keys, Style::default().add_modifier(Modifier::ITALIC)),
        ]));
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled("Search:", bold));
    lines.push(Line::raw("  type to filter, Enter keeps the query, Esc clears it"));
    lines.push(Line::raw(""));
    lines.push(Line::styled("Form:", bold));
    lines.push(Line::raw("  Tab/Down next field, BackTab/Up previous, Enter submit, Esc cancel"));
    lines
}

pub fn render_help_modal(f: &mut Frame, area: Rect, app: &AppState, scroll: u16) {
    let width = area.width.saturating_sub(8).clamp(40, 80);
    let height = area.height.saturating_sub(4).clamp(8, 30);
    let rect = centered_rect(width, height, area);
    let p = Paragraph::new(help_lines(app))
        .scroll((scroll, 0))
        .block(
            Block::default()
                .title("Help (Esc to close)")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
