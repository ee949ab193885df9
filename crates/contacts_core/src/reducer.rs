//! Pure state transitions for the contact screen.

use shared::domain::{Contact, SortType};

/// Immutable view snapshot handed to the display layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactState {
    pub contacts: Vec<Contact>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub phone_number: String,
    pub is_adding_contact: bool,
    pub is_first_name_missing: bool,
    pub is_phone_number_missing: bool,
    pub sort_type: SortType,
    /// True until the query for `sort_type` has delivered its first result.
    pub is_loading: bool,
}

impl Default for ContactState {
    fn default() -> Self {
        Self {
            contacts: Vec::new(),
            first_name: String::new(),
            last_name: None,
            phone_number: String::new(),
            is_adding_contact: false,
            is_first_name_missing: false,
            is_phone_number_missing: false,
            sort_type: SortType::default(),
            is_loading: true,
        }
    }
}

impl ContactState {
    pub fn with_contacts(&self, contacts: Vec<Contact>) -> Self {
        Self {
            contacts,
            is_loading: false,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactEvent {
    ShowDialog,
    HideDialog,
    SetFirstName(String),
    SetLastName(String),
    /// Callers filter with [`shared::domain::accept_phone_input`] first.
    SetPhoneNumber(String),
    SortContact(SortType),
    DeleteContact(Contact),
    SaveContact,
}

impl ContactEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ShowDialog => "show_dialog",
            Self::HideDialog => "hide_dialog",
            Self::SetFirstName(_) => "set_first_name",
            Self::SetLastName(_) => "set_last_name",
            Self::SetPhoneNumber(_) => "set_phone_number",
            Self::SortContact(_) => "sort_contact",
            Self::DeleteContact(_) => "delete_contact",
            Self::SaveContact => "save_contact",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCommand {
    Upsert(Contact),
    Delete(Contact),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: ContactState,
    pub command: Option<StoreCommand>,
    /// Set when the live query has to be re-subscribed.
    pub sort_change: Option<SortType>,
}

impl Transition {
    fn state(state: ContactState) -> Self {
        Self {
            state,
            command: None,
            sort_change: None,
        }
    }
}

pub fn reduce(state: &ContactState, event: ContactEvent) -> Transition {
    match event {
        ContactEvent::ShowDialog => Transition::state(ContactState {
            is_adding_contact: true,
            ..state.clone()
        }),
        ContactEvent::HideDialog => Transition::state(ContactState {
            is_adding_contact: false,
            ..state.clone()
        }),
        ContactEvent::SetFirstName(first_name) => Transition::state(ContactState {
            first_name,
            is_first_name_missing: false,
            ..state.clone()
        }),
        ContactEvent::SetLastName(last_name) => Transition::state(ContactState {
            last_name: Some(last_name),
            ..state.clone()
        }),
        ContactEvent::SetPhoneNumber(phone_number) => Transition::state(ContactState {
            phone_number,
            is_phone_number_missing: false,
            ..state.clone()
        }),
        ContactEvent::SortContact(sort_type) => {
            // Re-selecting the active order keeps the current subscription.
            if sort_type == state.sort_type {
                return Transition::state(state.clone());
            }
            Transition {
                state: ContactState {
                    sort_type,
                    is_loading: true,
                    ..state.clone()
                },
                command: None,
                sort_change: Some(sort_type),
            }
        }
        ContactEvent::DeleteContact(contact) => Transition {
            state: state.clone(),
            command: Some(StoreCommand::Delete(contact)),
            sort_change: None,
        },
        ContactEvent::SaveContact => save_draft(state),
    }
}

fn save_draft(state: &ContactState) -> Transition {
    let is_first_name_missing = state.first_name.trim().is_empty();
    let is_phone_number_missing = state.phone_number.trim().is_empty();

    if is_first_name_missing || is_phone_number_missing {
        return Transition::state(ContactState {
            is_first_name_missing,
            is_phone_number_missing,
            ..state.clone()
        });
    }

    let contact = Contact::new(
        state.first_name.clone(),
        state.last_name.clone(),
        state.phone_number.clone(),
    );

    Transition {
        state: ContactState {
            is_adding_contact: false,
            first_name: String::new(),
            last_name: None,
            phone_number: String::new(),
            is_first_name_missing: false,
            is_phone_number_missing: false,
            ..state.clone()
        },
        command: Some(StoreCommand::Upsert(contact)),
        sort_change: None,
    }
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
