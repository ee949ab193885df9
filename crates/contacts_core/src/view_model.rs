//! Actor that owns the contact screen state.
//!
//! Intents are processed one at a time. Store writes run as independent
//! tasks; the contact list only changes when the live query re-emits.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tokio::{
    sync::{mpsc, watch},
    task::{JoinHandle, JoinSet},
};
use tracing::{debug, error, trace};

use crate::{
    query::SortedContactQuery,
    reducer::{reduce, ContactEvent, ContactState, StoreCommand, Transition},
    store::ContactStore,
};

const EVENT_QUEUE_CAPACITY: usize = 64;

pub struct ContactViewModel {
    events: mpsc::Sender<ContactEvent>,
    state: watch::Receiver<ContactState>,
    task: JoinHandle<Result<()>>,
}

impl ContactViewModel {
    /// Starts the actor on the current tokio runtime.
    pub fn spawn(store: Arc<dyn ContactStore>) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ContactState::default());
        let task = tokio::spawn(run(store, events_rx, state_tx));
        Self {
            events: events_tx,
            state: state_rx,
            task,
        }
    }

    pub async fn on_event(&self, event: ContactEvent) -> Result<()> {
        let intent = event.name();
        self.events
            .send(event)
            .await
            .map_err(|_| anyhow!("contact view model stopped; dropped {intent} intent"))?;
        debug!(intent, "queued contact intent");
        Ok(())
    }

    /// New receivers see the latest snapshot immediately.
    pub fn subscribe(&self) -> watch::Receiver<ContactState> {
        self.state.clone()
    }

    pub fn state(&self) -> ContactState {
        self.state.borrow().clone()
    }

    /// Closes intake, waits for in-flight writes and reports the first fatal
    /// store or query failure.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.events);
        self.task
            .await
            .context("contact view model task panicked")?
    }
}

async fn run(
    store: Arc<dyn ContactStore>,
    mut events: mpsc::Receiver<ContactEvent>,
    state_tx: watch::Sender<ContactState>,
) -> Result<()> {
    let (emission_tx, mut emissions) = mpsc::unbounded_channel();
    let mut query = SortedContactQuery::new(Arc::clone(&store), emission_tx);
    let mut state = state_tx.borrow().clone();
    let mut writes = JoinSet::new();
    query.select(state.sort_type);

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    break;
                };
                let Transition {
                    state: next,
                    command,
                    sort_change,
                } = reduce(&state, event);
                if let Some(sort) = sort_change {
                    query.select(sort);
                }
                if let Some(command) = command {
                    spawn_write(&mut writes, Arc::clone(&store), command);
                }
                publish(&state_tx, &mut state, next);
            }
            Some(emission) = emissions.recv() => {
                if !query.is_current(&emission) {
                    trace!(
                        generation = emission.generation,
                        current = query.generation(),
                        "dropping stale contact query emission"
                    );
                    continue;
                }
                let contacts = emission.contacts.with_context(|| {
                    format!("live contact query ordered by {} failed", emission.sort)
                })?;
                let next = state.with_contacts(contacts);
                publish(&state_tx, &mut state, next);
            }
            Some(joined) = writes.join_next(), if !writes.is_empty() => {
                joined.context("contact store write task panicked")??;
            }
        }
    }

    while let Some(joined) = writes.join_next().await {
        joined.context("contact store write task panicked")??;
    }
    Ok(())
}

fn spawn_write(writes: &mut JoinSet<Result<()>>, store: Arc<dyn ContactStore>, command: StoreCommand) {
    writes.spawn(async move {
        let result = match &command {
            StoreCommand::Upsert(contact) => store
                .upsert_contact(contact)
                .await
                .map(|id| debug!(contact_id = %id, "upserted contact")),
            StoreCommand::Delete(contact) => store.delete_contact(contact).await.map(|()| {
                debug!(contact_id = ?contact.id, "deleted contact");
            }),
        };
        if let Err(err) = &result {
            error!(error = %err, command = ?command, "contact store write failed");
        }
        result
    });
}

fn publish(state_tx: &watch::Sender<ContactState>, current: &mut ContactState, next: ContactState) {
    if *current == next {
        return;
    }
    *current = next;
    state_tx.send_replace(current.clone());
}

#[cfg(test)]
#[path = "tests/view_model_tests.rs"]
mod tests;
