//! In-process stores for exercising the query and the view model.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::{stream, StreamExt};
use shared::domain::{Contact, ContactId, SortType};
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::store::{ContactStore, ContactStream};

/// Live store over a vector, re-emitting on every write.
pub struct MemoryStore {
    rows: Arc<Mutex<Vec<Contact>>>,
    next_id: Mutex<i64>,
    revision: watch::Sender<u64>,
    pub upserts: Mutex<Vec<Contact>>,
    pub deletes: Mutex<Vec<Contact>>,
    fail_writes: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            rows: Arc::new(Mutex::new(Vec::new())),
            next_id: Mutex::new(1),
            revision,
            upserts: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            fail_writes: None,
        }
    }

    pub fn failing(err: impl Into<String>) -> Self {
        Self {
            fail_writes: Some(err.into()),
            ..Self::new()
        }
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts.lock().expect("upserts").len()
    }

    fn ordered(rows: &[Contact], sort: SortType) -> Vec<Contact> {
        let mut rows = rows.to_vec();
        match sort {
            SortType::FirstName => rows.sort_by(|a, b| a.first_name.cmp(&b.first_name)),
            SortType::LastName => rows.sort_by(|a, b| a.last_name.cmp(&b.last_name)),
            SortType::PhoneNumber => rows.sort_by(|a, b| a.phone_number.cmp(&b.phone_number)),
        }
        rows
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn upsert_contact(&self, contact: &Contact) -> Result<ContactId> {
        self.upserts.lock().expect("upserts").push(contact.clone());
        if let Some(err) = &self.fail_writes {
            return Err(anyhow!(err.clone()));
        }
        let id = match contact.id {
            Some(id) => id,
            None => {
                let mut next_id = self.next_id.lock().expect("next id");
                let id = ContactId(*next_id);
                *next_id += 1;
                id
            }
        };
        {
            let mut rows = self.rows.lock().expect("rows");
            rows.retain(|row| row.id != Some(id));
            rows.push(contact.clone().with_id(id));
        }
        self.revision.send_modify(|revision| *revision += 1);
        Ok(id)
    }

    async fn delete_contact(&self, contact: &Contact) -> Result<()> {
        self.deletes.lock().expect("deletes").push(contact.clone());
        if let Some(err) = &self.fail_writes {
            return Err(anyhow!(err.clone()));
        }
        if let Some(id) = contact.id {
            self.rows.lock().expect("rows").retain(|row| row.id != Some(id));
        }
        self.revision.send_modify(|revision| *revision += 1);
        Ok(())
    }

    fn contacts(&self, sort: SortType) -> ContactStream {
        let rows = Arc::clone(&self.rows);
        let revision = self.revision.subscribe();
        stream::unfold(
            (rows, revision, true),
            move |(rows, mut revision, first)| async move {
                if !first && revision.changed().await.is_err() {
                    return None;
                }
                let ordered = Self::ordered(&rows.lock().expect("rows"), sort);
                Some((Ok(ordered), (rows, revision, false)))
            },
        )
        .boxed()
    }
}

type EmissionSender = mpsc::UnboundedSender<Result<Vec<Contact>>>;

/// Store whose live queries only emit what the test pushes into them.
#[derive(Default)]
pub struct ScriptedStore {
    subscriptions: Mutex<HashMap<SortType, Vec<EmissionSender>>>,
}

impl ScriptedStore {
    pub fn subscription_count(&self, sort: SortType) -> usize {
        self.subscriptions
            .lock()
            .expect("subscriptions")
            .get(&sort)
            .map_or(0, Vec::len)
    }

    /// Waits for the latest subscription to `sort` and returns its feed.
    pub async fn feed(&self, sort: SortType) -> EmissionSender {
        for _ in 0..200 {
            let latest = self
                .subscriptions
                .lock()
                .expect("subscriptions")
                .get(&sort)
                .and_then(|feeds| feeds.last().cloned());
            if let Some(feed) = latest {
                return feed;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("no subscription for {sort}");
    }
}

#[async_trait]
impl ContactStore for ScriptedStore {
    async fn upsert_contact(&self, _contact: &Contact) -> Result<ContactId> {
        Ok(ContactId(1))
    }

    async fn delete_contact(&self, _contact: &Contact) -> Result<()> {
        Ok(())
    }

    fn contacts(&self, sort: SortType) -> ContactStream {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscriptions
            .lock()
            .expect("subscriptions")
            .entry(sort)
            .or_default()
            .push(tx);
        UnboundedReceiverStream::new(rx).boxed()
    }
}

pub fn contact(id: i64, first: &str, last: Option<&str>, phone: &str) -> Contact {
    Contact::new(first, last.map(str::to_string), phone).with_id(ContactId(id))
}
