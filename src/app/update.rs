use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::time::{Duration, Instant};

use crate::app::form::FormDraft;
use crate::app::keymap::KeyAction;
use crate::app::{AppState, InputMode, ModalState, StatusMessage, SyncStatus};
use crate::backend::{BackendCommand, BackendEvent, BackendHandle, Mutation, MutationKind};
use crate::search::{SortKey, apply_view};
use crate::ui;

/// Draw, poll input, forward commands and apply backend events until quit.
pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut AppState,
    backend: &BackendHandle,
) -> Result<()> {
    while !app.should_quit {
        while let Some(ev) = backend.try_recv() {
            apply_backend_event(app, ev);
        }

        terminal.draw(|f| ui::render(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(cmd) = handle_key(app, key) {
                        if !backend.send(cmd) {
                            app.status = Some(StatusMessage::error("backend worker stopped"));
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// Update state for one key press. Returns a command for the backend, if any.
pub fn handle_key(app: &mut AppState, key: KeyEvent) -> Option<BackendCommand> {
    match app.input_mode {
        InputMode::Normal => handle_normal_key(app, key),
        InputMode::Search => {
            handle_search_key(app, key);
            None
        }
        InputMode::Form => handle_form_key(app, key),
        InputMode::Modal => {
            handle_modal_key(app, key.code);
            None
        }
    }
}

fn handle_normal_key(app: &mut AppState, key: KeyEvent) -> Option<BackendCommand> {
    let action = app.keymap.resolve(&key)?;
    if let Some(field) = action.sort_field() {
        app.view.sort = Some(SortKey::toggle(app.view.sort, field));
        apply_view(app);
        return None;
    }
    match action {
        KeyAction::Quit => app.should_quit = true,
        KeyAction::OpenHelp => {
            app.modal = Some(ModalState::Help { scroll: 0 });
            app.input_mode = InputMode::Modal;
        }
        KeyAction::StartSearch => app.input_mode = InputMode::Search,
        KeyAction::NewUser => open_form(app, FormDraft::create()),
        KeyAction::EditSelection => {
            if let Some(user) = app.selected_user() {
                let draft = FormDraft::edit(user);
                open_form(app, draft);
            }
        }
        KeyAction::DeleteSelection => {
            let id = app.selected_user()?.id.clone();
            app.status = Some(StatusMessage::info(format!("deleting {id}…")));
            let request = app.next_request_id();
            return Some(BackendCommand::Mutate { request, mutation: Mutation::Delete { id } });
        }
        KeyAction::ShowDetails => {
            if let Some(user) = app.selected_user() {
                let message = format!(
                    "Id: {}\nFirst name: {}\nLast name: {}\nEmail: {}\nAddress: {}",
                    user.id, user.first_name, user.last_name, user.email, user.address
                );
                app.modal = Some(ModalState::Info { message });
                app.input_mode = InputMode::Modal;
            }
        }
        KeyAction::Refresh => return Some(BackendCommand::Refresh),
        KeyAction::MoveUp => app.selected_index = app.selected_index.saturating_sub(1),
        KeyAction::MoveDown => {
            if app.selected_index + 1 < app.users.len() {
                app.selected_index += 1;
            }
        }
        KeyAction::PageUp => {
            app.selected_index = app.selected_index.saturating_sub(app.rows_per_page.max(1));
        }
        KeyAction::PageDown => {
            let next = app.selected_index.saturating_add(app.rows_per_page.max(1));
            app.selected_index = next.min(app.users.len().saturating_sub(1));
        }
        KeyAction::SortFirstName
        | KeyAction::SortLastName
        | KeyAction::SortEmail
        | KeyAction::SortAddress
        | KeyAction::Ignore => {}
    }
    None
}

/// Printable input for text fields; Ctrl chords are not text.
fn typed_char(key: KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => Some(c),
        _ => None,
    }
}

/// Live filtering: every edit to the query recomputes the view.
fn handle_search_key(app: &mut AppState, key: KeyEvent) {
    if let Some(c) = typed_char(key) {
        app.view.search_query.push(c);
        apply_view(app);
        return;
    }
    match key.code {
        KeyCode::Enter => app.input_mode = InputMode::Normal,
        KeyCode::Esc => {
            app.view.search_query.clear();
            app.input_mode = InputMode::Normal;
            apply_view(app);
        }
        KeyCode::Backspace => {
            app.view.search_query.pop();
            apply_view(app);
        }
        _ => {}
    }
}

fn handle_form_key(app: &mut AppState, key: KeyEvent) -> Option<BackendCommand> {
    if key.code == KeyCode::Esc {
        close_form(app);
        return None;
    }
    if app.view.form.as_ref()?.submitting() {
        return None;
    }
    if key.code == KeyCode::Enter {
        let request = app.next_request_id();
        let mutation = app.view.form.as_mut()?.submit(request);
        app.status = Some(StatusMessage::info("saving…"));
        return Some(BackendCommand::Mutate { request, mutation });
    }
    let draft = app.view.form.as_mut()?;
    if let Some(c) = typed_char(key) {
        draft.insert_char(c);
        return None;
    }
    match key.code {
        KeyCode::Tab | KeyCode::Down => draft.focus_next(),
        KeyCode::BackTab | KeyCode::Up => draft.focus_prev(),
        KeyCode::Backspace => draft.backspace(),
        _ => {}
    }
    None
}

fn handle_modal_key(app: &mut AppState, code: KeyCode) {
    match &mut app.modal {
        Some(ModalState::Help { scroll }) => match code {
            KeyCode::Up | KeyCode::Char('k') => *scroll = scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => *scroll = scroll.saturating_add(1),
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('?') => close_modal(app),
            _ => {}
        },
        Some(ModalState::Info { .. }) => {
            if matches!(code, KeyCode::Esc | KeyCode::Enter) {
                close_modal(app);
            }
        }
        None => app.input_mode = InputMode::Normal,
    }
}

fn open_form(app: &mut AppState, draft: FormDraft) {
    app.view.form = Some(draft);
    app.input_mode = InputMode::Form;
}

/// Discard the draft (and its editing target) without writing.
fn close_form(app: &mut AppState) {
    app.view.form = None;
    app.input_mode = InputMode::Normal;
}

fn close_modal(app: &mut AppState) {
    app.modal = None;
    app.input_mode = InputMode::Normal;
}

/// Fold one backend event into the state.
pub fn apply_backend_event(app: &mut AppState, ev: BackendEvent) {
    match ev {
        BackendEvent::Snapshot(users) => {
            tracing::trace!(count = users.len(), "snapshot received");
            app.snapshot = users;
            app.sync = SyncStatus::Fresh { at: Instant::now() };
            apply_view(app);
        }
        BackendEvent::FetchFailed(error) => {
            // keep the last good snapshot on screen
            app.sync = SyncStatus::Stale { error };
        }
        BackendEvent::MutationSucceeded { request, kind } => {
            // only the draft that issued this write may close
            if app.view.form.as_ref().is_some_and(|d| d.awaits(request)) {
                close_form(app);
            }
            app.status = Some(StatusMessage::info(match kind {
                MutationKind::Create => "user created",
                MutationKind::Update => "user saved",
                MutationKind::Delete => "user deleted",
            }));
        }
        BackendEvent::MutationFailed { request, kind, message } => {
            if let Some(draft) = app.view.form.as_mut().filter(|d| d.awaits(request)) {
                draft.pending = None;
            }
            let what = match kind {
                MutationKind::Create => "create",
                MutationKind::Update => "save",
                MutationKind::Delete => "delete",
            };
            app.status = Some(StatusMessage::error(format!("{what} failed: {message}")));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Theme;
    use crate::app::keymap::Keymap;
    use crate::app::form::FormMode;
    use crate::backend::RequestId;
    use crate::model::{User, UserField, UserFields};
    use crate::search::SortDirection;
    use crossterm::event::KeyModifiers;

    fn mk_app(users: Vec<User>) -> AppState {
        let mut app = AppState::new("http://test", Theme::dark(), Keymap::default());
        apply_backend_event(&mut app, BackendEvent::Snapshot(users));
        app
    }

    fn user(id: &str, first: &str, last: &str) -> User {
        User::from_parts(id, UserFields::new(first, last, format!("{first}@x.io"), "Somewhere"))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    /// Split a write command into its request id and mutation.
    fn write_of(cmd: Option<BackendCommand>) -> (RequestId, Mutation) {
        match cmd {
            Some(BackendCommand::Mutate { request, mutation }) => (request, mutation),
            other => panic!("expected a write, got {other:?}"),
        }
    }

    fn type_str(app: &mut AppState, s: &str) {
        for c in s.chars() {
            assert_eq!(handle_key(app, key(KeyCode::Char(c))), None);
        }
    }

    #[test]
    fn search_filters_live_and_esc_clears() {
        let mut app = mk_app(vec![user("1", "Bob", "Zed"), user("2", "Amy", "Lee")]);
        handle_key(&mut app, key(KeyCode::Char('/')));
        assert_eq!(app.input_mode, InputMode::Search);
        type_str(&mut app, "ze");
        assert_eq!(app.users.len(), 1);
        assert_eq!(app.users[0].first_name, "Bob");

        handle_key(&mut app, key(KeyCode::Esc));
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.view.search_query.is_empty());
        assert_eq!(app.users.len(), 2);
    }

    #[test]
    fn sort_keys_toggle_direction() {
        let mut app = mk_app(vec![user("1", "Bob", "Zed"), user("2", "Amy", "Lee")]);
        handle_key(&mut app, key(KeyCode::Char('1')));
        assert_eq!(app.users[0].first_name, "Amy");
        handle_key(&mut app, key(KeyCode::Char('1')));
        assert_eq!(app.view.sort.map(|k| k.direction), Some(SortDirection::Descending));
        assert_eq!(app.users[0].first_name, "Bob");
        handle_key(&mut app, key(KeyCode::Char('2')));
        assert_eq!(app.view.sort, Some(SortKey::ascending(UserField::LastName)));
        assert_eq!(app.users[0].last_name, "Lee");
    }

    #[test]
    fn add_opens_create_form_and_submit_emits_create() {
        let mut app = mk_app(vec![]);
        handle_key(&mut app, key(KeyCode::Char('a')));
        assert_eq!(app.input_mode, InputMode::Form);
        assert_eq!(app.view.form.as_ref().map(|d| d.mode()), Some(FormMode::Create));

        type_str(&mut app, "A");
        handle_key(&mut app, key(KeyCode::Tab));
        type_str(&mut app, "B");
        handle_key(&mut app, key(KeyCode::Tab));
        type_str(&mut app, "c@d.com");
        handle_key(&mut app, key(KeyCode::Tab));
        type_str(&mut app, "Addr");

        let (request, mutation) = write_of(handle_key(&mut app, key(KeyCode::Enter)));
        assert_eq!(mutation, Mutation::Create(UserFields::new("A", "B", "c@d.com", "Addr")));
        // stays open until the backend confirms
        assert!(app.view.form.as_ref().is_some_and(|d| d.submitting()));

        apply_backend_event(&mut app, BackendEvent::MutationSucceeded { request, kind: MutationKind::Create });
        assert!(app.view.form.is_none());
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn edit_prefills_and_emits_update_for_row() {
        let mut app = mk_app(vec![user("5", "Amy", "Lee")]);
        handle_key(&mut app, key(KeyCode::Char('e')));
        assert_eq!(app.view.form.as_ref().map(|d| d.mode()), Some(FormMode::Edit));
        handle_key(&mut app, key(KeyCode::Backspace));
        handle_key(&mut app, key(KeyCode::Backspace));
        type_str(&mut app, "ice");

        let (request, mutation) = write_of(handle_key(&mut app, key(KeyCode::Enter)));
        match mutation {
            Mutation::Update { id, fields } => {
                assert_eq!(id, "5");
                assert_eq!(fields.first_name, "Aice");
                assert_eq!(fields.last_name, "Lee");
            }
            other => panic!("unexpected mutation {other:?}"),
        }
        apply_backend_event(&mut app, BackendEvent::MutationSucceeded { request, kind: MutationKind::Update });
        assert!(app.view.form.is_none());
    }

    #[test]
    fn failed_submit_keeps_draft_for_retry() {
        let mut app = mk_app(vec![]);
        handle_key(&mut app, key(KeyCode::Char('n')));
        type_str(&mut app, "Zoe");
        let (request, _) = write_of(handle_key(&mut app, key(KeyCode::Enter)));
        apply_backend_event(
            &mut app,
            BackendEvent::MutationFailed { request, kind: MutationKind::Create, message: "connection refused".into() },
        );
        let draft = app.view.form.as_ref().expect("form stays open");
        assert!(!draft.submitting());
        assert_eq!(draft.fields.first_name, "Zoe");
        assert_eq!(app.input_mode, InputMode::Form);
        assert!(app.status.as_ref().is_some_and(|s| s.is_error));
    }

    #[test]
    fn in_flight_draft_ignores_edits_and_resubmit() {
        let mut app = mk_app(vec![]);
        handle_key(&mut app, key(KeyCode::Char('a')));
        type_str(&mut app, "Al");
        assert!(handle_key(&mut app, key(KeyCode::Enter)).is_some());
        assert_eq!(handle_key(&mut app, key(KeyCode::Enter)), None);
        handle_key(&mut app, key(KeyCode::Char('x')));
        assert_eq!(app.view.form.as_ref().map(|d| d.fields.first_name.as_str()), Some("Al"));
    }

    #[test]
    fn unrelated_failure_does_not_rearm_pending_draft() {
        let mut app = mk_app(vec![user("7", "Bob", "Zed")]);
        handle_key(&mut app, key(KeyCode::Char('a')));
        type_str(&mut app, "Z");
        let (create, _) = write_of(handle_key(&mut app, key(KeyCode::Enter)));

        // a delete issued earlier fails while the create is still in flight
        apply_backend_event(
            &mut app,
            BackendEvent::MutationFailed {
                request: RequestId(create.0 + 100),
                kind: MutationKind::Delete,
                message: "404".into(),
            },
        );
        assert!(app.view.form.as_ref().is_some_and(|d| d.awaits(create)));
        assert!(app.status.as_ref().is_some_and(|s| s.is_error));
        // no second create goes out
        assert_eq!(handle_key(&mut app, key(KeyCode::Enter)), None);
    }

    #[test]
    fn late_success_from_cancelled_form_leaves_newer_form_open() {
        let mut app = mk_app(vec![user("5", "Amy", "Lee")]);
        handle_key(&mut app, key(KeyCode::Char('a')));
        type_str(&mut app, "Old");
        let (stale, _) = write_of(handle_key(&mut app, key(KeyCode::Enter)));
        handle_key(&mut app, key(KeyCode::Esc));

        handle_key(&mut app, key(KeyCode::Char('e')));
        let (current, _) = write_of(handle_key(&mut app, key(KeyCode::Enter)));
        assert_ne!(stale, current);

        apply_backend_event(&mut app, BackendEvent::MutationSucceeded { request: stale, kind: MutationKind::Create });
        assert!(app.view.form.as_ref().is_some_and(|d| d.awaits(current)));
        assert_eq!(app.input_mode, InputMode::Form);

        apply_backend_event(&mut app, BackendEvent::MutationSucceeded { request: current, kind: MutationKind::Update });
        assert!(app.view.form.is_none());
    }

    #[test]
    fn ctrl_chords_are_not_typed_into_text_fields() {
        let mut app = mk_app(vec![user("1", "Bob", "Zed")]);
        handle_key(&mut app, key(KeyCode::Char('a')));
        type_str(&mut app, "Al");
        handle_key(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(app.view.form.as_ref().map(|d| d.fields.first_name.as_str()), Some("Al"));
        // shifted letters are still text
        handle_key(&mut app, KeyEvent::new(KeyCode::Char('X'), KeyModifiers::SHIFT));
        assert_eq!(app.view.form.as_ref().map(|d| d.fields.first_name.as_str()), Some("AlX"));
        handle_key(&mut app, key(KeyCode::Esc));

        handle_key(&mut app, key(KeyCode::Char('/')));
        handle_key(&mut app, KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert!(app.view.search_query.is_empty());
    }

    #[test]
    fn cancel_discards_draft_without_command() {
        let mut app = mk_app(vec![user("5", "Amy", "Lee")]);
        handle_key(&mut app, key(KeyCode::Enter));
        assert_eq!(handle_key(&mut app, key(KeyCode::Esc)), None);
        assert!(app.view.form.is_none());
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn delete_targets_selected_row_without_confirmation() {
        let mut app = mk_app(vec![user("6", "Amy", "Lee"), user("7", "Bob", "Zed")]);
        handle_key(&mut app, key(KeyCode::Down));
        let (_, mutation) = write_of(handle_key(&mut app, key(KeyCode::Char('d'))));
        assert_eq!(mutation, Mutation::Delete { id: "7".into() });
        // row stays until the refreshed snapshot arrives
        assert_eq!(app.users.len(), 2);
    }

    #[test]
    fn delete_on_empty_list_is_noop() {
        let mut app = mk_app(vec![]);
        assert_eq!(handle_key(&mut app, key(KeyCode::Delete)), None);
    }

    #[test]
    fn fetch_failure_keeps_last_snapshot() {
        let mut app = mk_app(vec![user("1", "Bob", "Zed")]);
        apply_backend_event(&mut app, BackendEvent::FetchFailed("timeout".into()));
        assert_eq!(app.users.len(), 1);
        assert!(matches!(app.sync, SyncStatus::Stale { .. }));
    }

    #[test]
    fn snapshot_clamps_selection() {
        let mut app = mk_app(vec![user("1", "A", ""), user("2", "B", ""), user("3", "C", "")]);
        app.selected_index = 2;
        apply_backend_event(&mut app, BackendEvent::Snapshot(vec![user("1", "A", "")]));
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn details_shows_id_in_info_modal() {
        let mut app = mk_app(vec![user("65a1", "Amy", "Lee")]);
        handle_key(&mut app, key(KeyCode::Char('i')));
        match &app.modal {
            Some(ModalState::Info { message }) => assert!(message.contains("Id: 65a1")),
            other => panic!("unexpected modal {other:?}"),
        }
        handle_key(&mut app, key(KeyCode::Enter));
        assert!(app.modal.is_none());
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn refresh_and_quit_keys() {
        let mut app = mk_app(vec![]);
        assert_eq!(handle_key(&mut app, key(KeyCode::Char('r'))), Some(BackendCommand::Refresh));
        handle_key(&mut app, key(KeyCode::Char('?')));
        assert_eq!(app.input_mode, InputMode::Modal);
        handle_key(&mut app, key(KeyCode::Esc));
        assert_eq!(app.input_mode, InputMode::Normal);
        handle_key(&mut app, key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }
}
