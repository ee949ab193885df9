use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use shared::domain::{Contact, ContactId, SortType};

/// Live result set: the full ordered list on subscribe and again after every write.
pub type ContactStream = BoxStream<'static, Result<Vec<Contact>>>;

#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Inserts when `contact.id` is absent, otherwise replaces the row with that id.
    async fn upsert_contact(&self, contact: &Contact) -> Result<ContactId>;
    /// Removes the row matching `contact.id`. Missing rows are not an error.
    async fn delete_contact(&self, contact: &Contact) -> Result<()>;
    fn contacts(&self, sort: SortType) -> ContactStream;
}
