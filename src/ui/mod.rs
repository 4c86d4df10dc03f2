pub mod components;
pub mod users;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{AppState, InputMode, ModalState};

pub fn render(f: &mut Frame, app: &mut AppState) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(1)].as_ref())
        .split(f.area());

    let prompt = match app.input_mode {
        InputMode::Search => format!("  Search: {}_", app.view.search_query),
        _ if !app.view.search_query.is_empty() => format!("  Search: {}", app.view.search_query),
        _ => String::new(),
    };
    let p = Paragraph::new(format!(
        "{}{prompt}  users:{}/{}  a: add; e: edit; d: delete; /: search; 1-4: sort; r: refresh; ?: help; q: quit",
        app.source,
        app.users.len(),
        app.snapshot.len(),
    ))
    .block(
        Block::default()
            .title("userbook")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    )
    .style(Style::default().fg(app.theme.header_fg).bg(app.theme.header_bg));
    f.render_widget(p, root[0]);

    users::render_users_table(f, root[1], app);
    components::render_status_bar(f, root[2], app);

    let area = f.area();
    if let Some(draft) = app.view.form.clone() {
        users::render_user_form(f, area, app, &draft);
    }
    if let Some(state) = app.modal.clone() {
        match state {
            ModalState::Info { .. } => components::render_info_modal(f, area, app, &state),
            ModalState::Help { scroll } => components::render_help_modal(f, area, app, scroll),
        }
    }
}
