//! Text and JSON rendering of contact snapshots.

use std::fmt::Write as _;

use contacts_core::ContactState;
use shared::domain::Contact;

pub fn render_contact(contact: &Contact) -> String {
    let id = contact
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{id:>4}  {:<2}  {:<24}  {}",
        contact.initials(),
        contact.display_name(),
        contact.phone_number
    )
}

pub fn render_table(state: &ContactState) -> String {
    let mut out = format!("sorted by {}\n", state.sort_type);
    if state.contacts.is_empty() {
        out.push_str("no contacts\n");
        return out;
    }
    for contact in &state.contacts {
        let _ = writeln!(out, "{}", render_contact(contact));
    }
    out
}

pub fn render_json(state: &ContactState) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&state.contacts)?)
}
