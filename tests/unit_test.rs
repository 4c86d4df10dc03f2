// Unit tests for userbook
// These tests drive the public API only: view derivation and the key/event controller.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use userbook::app::keymap::Keymap;
use userbook::app::update::{apply_backend_event, handle_key};
use userbook::app::{AppState, InputMode, SyncStatus, Theme};
use userbook::backend::{BackendCommand, BackendEvent, Mutation, MutationKind, RequestId};
use userbook::search::{SortDirection, SortKey, derive_view, matches_query};
use userbook::{User, UserField, UserFields};

fn user(id: &str, first: &str, last: &str, email: &str, address: &str) -> User {
    User::from_parts(id, UserFields::new(first, last, email, address))
}

fn roster() -> Vec<User> {
    vec![
        user("1", "bob", "Young", "bob@y.io", "9 Elm"),
        user("2", "Amy", "Zed", "amy@z.io", "1 Oak"),
        user("3", "carl", "Xu", "carl@x.io", "5 Pine"),
        user("4", "Bob", "Abel", "b.abel@a.io", "2 Zed Rd"),
    ]
}

fn app_with(users: Vec<User>) -> AppState {
    let mut app = AppState::new("test", Theme::dark(), Keymap::default());
    apply_backend_event(&mut app, BackendEvent::Snapshot(users));
    app
}

fn press(app: &mut AppState, code: KeyCode) -> Option<BackendCommand> {
    handle_key(app, KeyEvent::new(code, KeyModifiers::NONE))
}

fn type_str(app: &mut AppState, s: &str) {
    for c in s.chars() {
        press(app, KeyCode::Char(c));
    }
}

fn write_of(cmd: Option<BackendCommand>) -> (RequestId, Mutation) {
    match cmd {
        Some(BackendCommand::Mutate { request, mutation }) => (request, mutation),
        other => panic!("expected a write, got {other:?}"),
    }
}

fn ids(users: &[User]) -> Vec<&str> {
    users.iter().map(|u| u.id.as_str()).collect()
}

#[cfg(test)]
mod view_tests {
    use super::*;

    #[test]
    fn filtered_view_is_subset_in_snapshot_order() {
        let snapshot = roster();
        let view = derive_view(&snapshot, "o", None);
        assert!(view.iter().all(|u| matches_query(u, "o")));
        let positions: Vec<usize> = view
            .iter()
            .map(|u| snapshot.iter().position(|s| s.id == u.id).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn query_hits_any_field() {
        let snapshot = roster();
        // "zed" is a last name for Amy and part of an address for Bob Abel
        assert_eq!(ids(&derive_view(&snapshot, "zed", None)), vec!["2", "4"]);
        assert_eq!(ids(&derive_view(&snapshot, "@X.IO", None)), vec!["3"]);
        assert!(derive_view(&snapshot, "nobody", None).is_empty());
    }

    #[test]
    fn sort_is_case_insensitive_and_stable() {
        let snapshot = roster();
        let asc = derive_view(&snapshot, "", Some(SortKey::ascending(UserField::FirstName)));
        // both Bobs compare equal and keep snapshot order
        assert_eq!(ids(&asc), vec!["2", "1", "4", "3"]);

        let desc = SortKey { field: UserField::FirstName, direction: SortDirection::Descending };
        assert_eq!(ids(&derive_view(&snapshot, "", Some(desc))), vec!["3", "1", "4", "2"]);
    }

    #[test]
    fn filter_then_sort() {
        let view = derive_view(&roster(), "bob", Some(SortKey::ascending(UserField::LastName)));
        assert_eq!(ids(&view), vec!["4", "1"]);
    }

    #[test]
    fn snapshot_is_untouched() {
        let snapshot = roster();
        let before = snapshot.clone();
        let _ = derive_view(&snapshot, "amy", Some(SortKey::ascending(UserField::Email)));
        assert_eq!(snapshot, before);
    }
}

#[cfg(test)]
mod controller_tests {
    use super::*;

    #[test]
    fn search_survives_refresh() {
        let mut app = app_with(roster());
        press(&mut app, KeyCode::Char('/'));
        type_str(&mut app, "bob");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(ids(&app.users), vec!["1", "4"]);

        let mut next = roster();
        next.push(user("5", "Bobbie", "New", "bn@n.io", "7 Ash"));
        apply_backend_event(&mut app, BackendEvent::Snapshot(next));
        assert_eq!(ids(&app.users), vec!["1", "4", "5"]);
        assert_eq!(app.view.search_query, "bob");
    }

    #[test]
    fn sort_key_twice_flips_direction() {
        let mut app = app_with(roster());
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(ids(&app.users), vec!["4", "3", "1", "2"]);
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(ids(&app.users), vec!["2", "1", "3", "4"]);
    }

    #[test]
    fn create_round_trip_through_events() {
        let mut app = app_with(Vec::new());
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.input_mode, InputMode::Form);
        type_str(&mut app, "Dee");
        press(&mut app, KeyCode::Tab);
        type_str(&mut app, "Ray");
        press(&mut app, KeyCode::Tab);
        type_str(&mut app, "d@r.io");
        press(&mut app, KeyCode::Tab);
        type_str(&mut app, "4 Bay");

        let (request, mutation) = write_of(press(&mut app, KeyCode::Enter));
        let expected = UserFields::new("Dee", "Ray", "d@r.io", "4 Bay");
        assert_eq!(mutation, Mutation::Create(expected.clone()));
        // stays open until the write is confirmed
        assert!(app.view.form.is_some());

        apply_backend_event(&mut app, BackendEvent::Snapshot(vec![User::from_parts("9", expected)]));
        apply_backend_event(&mut app, BackendEvent::MutationSucceeded { request, kind: MutationKind::Create });
        assert!(app.view.form.is_none());
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(ids(&app.users), vec!["9"]);
    }

    #[test]
    fn edit_sends_update_for_selected_id() {
        let mut app = app_with(roster());
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('e'));
        let form = app.view.form.as_ref().unwrap();
        assert_eq!(form.fields.first_name, "Amy");

        press(&mut app, KeyCode::Backspace);
        type_str(&mut app, "ie");
        let (_, mutation) = write_of(press(&mut app, KeyCode::Enter));
        match mutation {
            Mutation::Update { id, fields } => {
                assert_eq!(id, "2");
                assert_eq!(fields.first_name, "Amie");
                assert_eq!(fields.last_name, "Zed");
            }
            other => panic!("unexpected mutation {other:?}"),
        }
    }

    #[test]
    fn failed_write_keeps_form_for_retry() {
        let mut app = app_with(Vec::new());
        press(&mut app, KeyCode::Char('n'));
        type_str(&mut app, "X");
        let (first, _) = write_of(press(&mut app, KeyCode::Enter));
        apply_backend_event(
            &mut app,
            BackendEvent::MutationFailed { request: first, kind: MutationKind::Create, message: "500".into() },
        );
        let form = app.view.form.as_ref().unwrap();
        assert!(!form.submitting());
        assert_eq!(form.fields.first_name, "X");
        assert!(app.status.as_ref().unwrap().is_error);

        // retry sends the same draft again under a new request id
        let (retry, mutation) = write_of(press(&mut app, KeyCode::Enter));
        assert_ne!(retry, first);
        assert!(matches!(mutation, Mutation::Create(_)));
    }

    #[test]
    fn delete_targets_row_under_cursor_in_view() {
        let mut app = app_with(roster());
        press(&mut app, KeyCode::Char('3'));
        // sorted by email: amy, b.abel, bob, carl
        press(&mut app, KeyCode::Down);
        let (_, mutation) = write_of(press(&mut app, KeyCode::Char('d')));
        assert_eq!(mutation, Mutation::Delete { id: "4".into() });
    }

    #[test]
    fn delete_outcome_leaves_pending_create_alone() {
        let mut app = app_with(roster());
        let (delete, _) = write_of(press(&mut app, KeyCode::Char('d')));
        press(&mut app, KeyCode::Char('a'));
        type_str(&mut app, "Z");
        let (create, _) = write_of(press(&mut app, KeyCode::Enter));

        apply_backend_event(
            &mut app,
            BackendEvent::MutationFailed { request: delete, kind: MutationKind::Delete, message: "gone".into() },
        );
        assert!(app.view.form.as_ref().is_some_and(|d| d.awaits(create)));
        assert_eq!(press(&mut app, KeyCode::Enter), None);

        apply_backend_event(&mut app, BackendEvent::MutationSucceeded { request: delete, kind: MutationKind::Delete });
        assert!(app.view.form.is_some());
    }

    #[test]
    fn fetch_failure_keeps_last_snapshot() {
        let mut app = app_with(roster());
        apply_backend_event(&mut app, BackendEvent::FetchFailed("connection refused".into()));
        assert_eq!(app.users.len(), 4);
        assert!(matches!(app.sync, SyncStatus::Stale { .. }));

        apply_backend_event(&mut app, BackendEvent::Snapshot(roster()));
        assert!(matches!(app.sync, SyncStatus::Fresh { .. }));
    }
}
