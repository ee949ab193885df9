//! Drives the contact view model the way the screen would: one intent per
//! gesture, then wait for the snapshot that reflects it.

use anyhow::{anyhow, bail, Context, Result};
use contacts_core::{ContactEvent, ContactState, ContactViewModel};
use shared::domain::{accept_phone_input, Contact, ContactId, SortType};
use tokio::sync::watch;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactCommand {
    Add {
        first_name: String,
        last_name: Option<String>,
        phone: String,
    },
    List {
        sort: SortType,
    },
    Delete {
        id: ContactId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Added(Contact),
    Listed,
    Deleted(Contact),
    NothingToDelete(ContactId),
}

pub async fn run_command(
    view_model: &ContactViewModel,
    command: ContactCommand,
) -> Result<(Outcome, ContactState)> {
    let mut state = view_model.subscribe();
    let loaded = settle(&mut state, |s| !s.is_loading).await?;

    match command {
        ContactCommand::Add {
            first_name,
            last_name,
            phone,
        } => {
            accept_phone_input(&phone).with_context(|| format!("rejected phone number '{phone}'"))?;
            let known: Vec<Option<ContactId>> = loaded.contacts.iter().map(|c| c.id).collect();

            view_model.on_event(ContactEvent::ShowDialog).await?;
            view_model
                .on_event(ContactEvent::SetFirstName(first_name))
                .await?;
            if let Some(last_name) = last_name {
                view_model
                    .on_event(ContactEvent::SetLastName(last_name))
                    .await?;
            }
            view_model
                .on_event(ContactEvent::SetPhoneNumber(phone))
                .await?;
            view_model.on_event(ContactEvent::SaveContact).await?;

            let snapshot = settle(&mut state, |s| {
                s.is_first_name_missing
                    || s.is_phone_number_missing
                    || s.contacts.iter().any(|c| !known.contains(&c.id))
            })
            .await?;
            if snapshot.is_first_name_missing || snapshot.is_phone_number_missing {
                bail!("{}", missing_fields_message(&snapshot));
            }

            let added = snapshot
                .contacts
                .iter()
                .find(|c| !known.contains(&c.id))
                .cloned()
                .ok_or_else(|| anyhow!("saved contact missing from snapshot"))?;
            info!(contact_id = ?added.id, "added contact");
            Ok((Outcome::Added(added), snapshot))
        }
        ContactCommand::List { sort } => {
            view_model.on_event(ContactEvent::SortContact(sort)).await?;
            let snapshot = settle(&mut state, |s| s.sort_type == sort && !s.is_loading).await?;
            Ok((Outcome::Listed, snapshot))
        }
        ContactCommand::Delete { id } => {
            let Some(contact) = loaded.contacts.iter().find(|c| c.id == Some(id)).cloned() else {
                debug!(contact_id = %id, "no contact to delete");
                return Ok((Outcome::NothingToDelete(id), loaded));
            };

            view_model
                .on_event(ContactEvent::DeleteContact(contact.clone()))
                .await?;
            let snapshot = settle(&mut state, |s| s.contacts.iter().all(|c| c.id != Some(id))).await?;
            info!(contact_id = %id, "deleted contact");
            Ok((Outcome::Deleted(contact), snapshot))
        }
    }
}

fn missing_fields_message(state: &ContactState) -> String {
    let missing: Vec<&str> = [
        (state.is_first_name_missing, "first name"),
        (state.is_phone_number_missing, "phone number"),
    ]
    .into_iter()
    .filter_map(|(missing, field)| missing.then_some(field))
    .collect();
    format!("contact not saved; missing {}", missing.join(" and "))
}

async fn settle(
    state: &mut watch::Receiver<ContactState>,
    ready: impl FnMut(&ContactState) -> bool,
) -> Result<ContactState> {
    let snapshot = state
        .wait_for(ready)
        .await
        .map_err(|_| anyhow!("contact view model stopped before the snapshot settled"))?;
    Ok(snapshot.clone())
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
