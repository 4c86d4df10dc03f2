//! Create/edit form draft held while the user modal is open.

use serde::{Deserialize, Serialize};

use crate::backend::{Mutation, RequestId};
use crate::model::{User, UserField, UserFields};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

/// Transient input state for one modal session.
///
/// `editing` selects the mode: `None` creates a new record, `Some(user)`
/// replaces that record on submit. No validation happens here; whatever was
/// typed is sent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormDraft {
    pub fields: UserFields,
    pub editing: Option<User>,
    pub focus: UserField,
    /// Write in flight for this draft, if any.
    pub pending: Option<RequestId>,
}

impl FormDraft {
    pub fn create() -> Self {
        Self::default()
    }

    pub fn edit(user: &User) -> Self {
        Self {
            fields: user.fields(),
            editing: Some(user.clone()),
            ..Self::default()
        }
    }

    pub fn mode(&self) -> FormMode {
        if self.editing.is_some() {
            FormMode::Edit
        } else {
            FormMode::Create
        }
    }

    pub fn title(&self) -> &'static str {
        match self.mode() {
            FormMode::Create => "Add user",
            FormMode::Edit => "Edit user",
        }
    }

    pub fn submitting(&self) -> bool {
        self.pending.is_some()
    }

    /// True if `request` is the write this draft is waiting on.
    pub fn awaits(&self, request: RequestId) -> bool {
        self.pending == Some(request)
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
    }

    pub fn insert_char(&mut self, c: char) {
        self.fields.get_mut(self.focus).push(c);
    }

    pub fn backspace(&mut self) {
        self.fields.get_mut(self.focus).pop();
    }

    /// Build the write request for this draft and mark it in flight.
    ///
    /// The draft stays intact until the backend reports success, so a failed
    /// write can be retried from the same modal.
    pub fn submit(&mut self, request: RequestId) -> Mutation {
        self.pending = Some(request);
        match &self.editing {
            None => Mutation::Create(self.fields.clone()),
            Some(user) => Mutation::Update {
                id: user.id.clone(),
                fields: self.fields.clone(),
            },
        }
    }
}
