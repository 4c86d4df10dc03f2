//! Derived view over the snapshot: case-insensitive search plus column sort.
//!
//! The view is always recomputed from scratch out of (snapshot, query, sort key).

use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::model::{User, UserField};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

/// Active sort column and direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: UserField,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn ascending(field: UserField) -> Self {
        Self { field, direction: SortDirection::Ascending }
    }

    /// Column click: the active field flips direction, any other field starts ascending.
    pub fn toggle(current: Option<SortKey>, field: UserField) -> SortKey {
        match current {
            Some(key) if key.field == field => SortKey { field, direction: key.direction.flip() },
            _ => SortKey::ascending(field),
        }
    }
}

/// True if any of the four text fields contains `query`, ignoring case.
pub fn matches_query(user: &User, query: &str) -> bool {
    let q = query.to_lowercase();
    matches_lowered(user, &q)
}

fn matches_lowered(user: &User, q: &str) -> bool {
    q.is_empty()
        || UserField::ALL
            .iter()
            .any(|f| user.field(*f).to_lowercase().contains(q))
}

/// Stable sort by the lowercased value of `key.field`.
pub fn sort_users(users: &mut Vec<User>, key: SortKey) {
    let mut keyed: Vec<(String, User)> = users
        .drain(..)
        .map(|u| (u.field(key.field).to_lowercase(), u))
        .collect();
    keyed.sort_by(|a, b| match key.direction {
        SortDirection::Ascending => a.0.cmp(&b.0),
        SortDirection::Descending => b.0.cmp(&a.0),
    });
    users.extend(keyed.into_iter().map(|(_, u)| u));
}

/// Filter `snapshot` by `query`, then order by `sort` if one is set.
pub fn derive_view(snapshot: &[User], query: &str, sort: Option<SortKey>) -> Vec<User> {
    let q = query.to_lowercase();
    let mut view: Vec<User> = snapshot
        .iter()
        .filter(|u| matches_lowered(u, &q))
        .cloned()
        .collect();
    if let Some(key) = sort {
        sort_users(&mut view, key);
    }
    view
}

/// Recompute `app.users` and keep the selection in range.
pub fn apply_view(app: &mut AppState) {
    app.users = derive_view(&app.snapshot, &app.view.search_query, app.view.sort);
    app.selected_index = app.selected_index.min(app.users.len().saturating_sub(1));
}
