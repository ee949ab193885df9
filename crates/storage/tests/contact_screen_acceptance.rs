use std::{sync::Arc, time::Duration};

use contacts_core::{ContactEvent, ContactState, ContactViewModel};
use shared::domain::{Contact, SortType};
use storage::Storage;
use tokio::sync::watch;

async fn settled(
    state: &mut watch::Receiver<ContactState>,
    ready: impl FnMut(&ContactState) -> bool,
) -> ContactState {
    tokio::time::timeout(Duration::from_secs(5), state.wait_for(ready))
        .await
        .expect("snapshot in time")
        .expect("view model running")
        .clone()
}

async fn add(view_model: &ContactViewModel, first: &str, last: &str, phone: &str) {
    for event in [
        ContactEvent::ShowDialog,
        ContactEvent::SetFirstName(first.into()),
        ContactEvent::SetLastName(last.into()),
        ContactEvent::SetPhoneNumber(phone.into()),
        ContactEvent::SaveContact,
    ] {
        view_model.on_event(event).await.expect("intent");
    }
}

#[tokio::test]
async fn first_contact_is_saved_and_listed_by_first_name() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let view_model = ContactViewModel::spawn(Arc::new(storage.clone()));
    let mut state = view_model.subscribe();

    let empty = settled(&mut state, |s| !s.is_loading).await;
    assert!(empty.contacts.is_empty());

    view_model.on_event(ContactEvent::ShowDialog).await.expect("intent");
    view_model
        .on_event(ContactEvent::SetFirstName("Ada".into()))
        .await
        .expect("intent");
    view_model
        .on_event(ContactEvent::SetPhoneNumber("+15551234".into()))
        .await
        .expect("intent");
    view_model.on_event(ContactEvent::SaveContact).await.expect("intent");

    let snapshot = settled(&mut state, |s| !s.contacts.is_empty()).await;
    let saved = &snapshot.contacts[0];
    assert_eq!(
        Contact {
            id: None,
            ..saved.clone()
        },
        Contact::new("Ada", None, "+15551234")
    );
    assert!(saved.id.is_some());
    assert!(!snapshot.is_adding_contact);
    assert!(!snapshot.is_first_name_missing);
    assert!(!snapshot.is_phone_number_missing);

    view_model.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn switching_sort_reorders_the_snapshot() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let view_model = ContactViewModel::spawn(Arc::new(storage.clone()));
    let mut state = view_model.subscribe();

    add(&view_model, "Grace", "Hopper", "+2").await;
    add(&view_model, "Cher", "", "+3").await;
    add(&view_model, "Ada", "Lovelace", "+1").await;
    let by_first = settled(&mut state, |s| s.contacts.len() == 3).await;
    let names: Vec<_> = by_first.contacts.iter().map(Contact::display_name).collect();
    assert_eq!(names, ["Ada Lovelace", "Cher", "Grace Hopper"]);

    view_model
        .on_event(ContactEvent::SortContact(SortType::LastName))
        .await
        .expect("intent");
    let by_last = settled(&mut state, |s| {
        s.sort_type == SortType::LastName && !s.is_loading
    })
    .await;
    let names: Vec<_> = by_last.contacts.iter().map(Contact::display_name).collect();
    assert_eq!(names, ["Cher", "Grace Hopper", "Ada Lovelace"]);

    view_model
        .on_event(ContactEvent::SortContact(SortType::PhoneNumber))
        .await
        .expect("intent");
    let by_phone = settled(&mut state, |s| {
        s.sort_type == SortType::PhoneNumber && !s.is_loading
    })
    .await;
    let phones: Vec<_> = by_phone
        .contacts
        .iter()
        .map(|c| c.phone_number.as_str())
        .collect();
    assert_eq!(phones, ["+1", "+2", "+3"]);

    view_model.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn contacts_survive_reopening_a_file_database() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let database_url = format!(
        "sqlite://{}",
        temp_root
            .path()
            .join("contacts.db")
            .to_string_lossy()
            .replace('\\', "/")
    );

    {
        let storage = Storage::new(&database_url).await.expect("db");
        let view_model = ContactViewModel::spawn(Arc::new(storage.clone()));
        add(&view_model, "Ada", "", "+15551234").await;
        view_model.shutdown().await.expect("shutdown flushes the write");
        storage.pool().close().await;
    }

    let reopened = Storage::new(&database_url).await.expect("reopen");
    let contacts = reopened
        .list_contacts(SortType::FirstName)
        .await
        .expect("list");
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].first_name, "Ada");
    assert_eq!(contacts[0].last_name, None);
}
