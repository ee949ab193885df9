//! Sort-aware live query: exactly one store subscription at a time, tagged
//! with a generation so a consumer can drop anything from a replaced sort.

use std::sync::Arc;

use anyhow::Result;
use futures::StreamExt;
use shared::domain::{Contact, SortType};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::debug;

use crate::store::ContactStore;

#[derive(Debug)]
pub struct QueryEmission {
    pub generation: u64,
    pub sort: SortType,
    pub contacts: Result<Vec<Contact>>,
}

pub struct SortedContactQuery {
    store: Arc<dyn ContactStore>,
    sink: mpsc::UnboundedSender<QueryEmission>,
    generation: u64,
    sort: SortType,
    task: Option<JoinHandle<()>>,
}

impl SortedContactQuery {
    pub fn new(store: Arc<dyn ContactStore>, sink: mpsc::UnboundedSender<QueryEmission>) -> Self {
        Self {
            store,
            sink,
            generation: 0,
            sort: SortType::default(),
            task: None,
        }
    }

    /// Cancels the running subscription and starts one for `sort`.
    ///
    /// Must be called from inside a tokio runtime. Returns the new generation.
    pub fn select(&mut self, sort: SortType) -> u64 {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.generation += 1;
        self.sort = sort;

        let generation = self.generation;
        let mut stream = self.store.contacts(sort);
        let sink = self.sink.clone();
        debug!(generation, sort = %sort, "subscribing to contact query");

        self.task = Some(tokio::spawn(async move {
            while let Some(contacts) = stream.next().await {
                let failed = contacts.is_err();
                let emission = QueryEmission {
                    generation,
                    sort,
                    contacts,
                };
                if sink.send(emission).is_err() || failed {
                    break;
                }
            }
        }));

        generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn sort(&self) -> SortType {
        self.sort
    }

    pub fn is_current(&self, emission: &QueryEmission) -> bool {
        emission.generation == self.generation
    }
}

impl Drop for SortedContactQuery {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/query_tests.rs"]
mod tests;
