use anyhow::{Context, Result};
use async_trait::async_trait;
use contacts_core::store::{ContactStore, ContactStream};
use futures::{stream, StreamExt};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
    time::Duration,
};
use tokio::sync::watch;
use tracing::debug;

use shared::domain::{Contact, ContactId, SortType};

const MEMORY_DATABASE_URL: &str = "sqlite::memory:";

/// SQLite-backed contact table with live queries.
///
/// Every successful write bumps `revision`; each live query holds a receiver
/// and re-runs its ordered select when the revision moves.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
    revision: Arc<watch::Sender<u64>>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool_options = if database_url.starts_with(MEMORY_DATABASE_URL) {
            // Each in-memory connection is its own database; keep exactly one alive.
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open contact database '{database_url}'"))?;

        let (revision, _) = watch::channel(0);
        let storage = Self {
            pool,
            revision: Arc::new(revision),
        };
        storage.ensure_contacts_table().await?;
        Ok(storage)
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    async fn ensure_contacts_table(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS contacts (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                first_name   TEXT NOT NULL,
                last_name    TEXT,
                phone_number TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to ensure contacts table exists")?;
        Ok(())
    }

    pub async fn list_contacts(&self, sort: SortType) -> Result<Vec<Contact>> {
        fetch_contacts(&self.pool, sort).await
    }

    pub fn contacts_ordered_by_first_name(&self) -> ContactStream {
        self.live_contacts(SortType::FirstName)
    }

    pub fn contacts_ordered_by_last_name(&self) -> ContactStream {
        self.live_contacts(SortType::LastName)
    }

    pub fn contacts_ordered_by_phone_number(&self) -> ContactStream {
        self.live_contacts(SortType::PhoneNumber)
    }

    /// Emits the full ordered table on first poll and again after every write.
    /// The stream ends after a failed select or once the storage is dropped.
    pub fn live_contacts(&self, sort: SortType) -> ContactStream {
        let pool = self.pool.clone();
        let revision = self.revision.subscribe();
        stream::unfold(Some((pool, revision, true)), move |cursor| async move {
            let (pool, mut revision, first) = cursor?;
            if !first && revision.changed().await.is_err() {
                return None;
            }
            match fetch_contacts(&pool, sort).await {
                Ok(contacts) => Some((Ok(contacts), Some((pool, revision, false)))),
                Err(err) => Some((Err(err), None)),
            }
        })
        .boxed()
    }

    fn notify_changed(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}

async fn fetch_contacts(pool: &Pool<Sqlite>, sort: SortType) -> Result<Vec<Contact>> {
    let rows = sqlx::query(ordered_select(sort))
        .fetch_all(pool)
        .await
        .with_context(|| format!("failed to list contacts ordered by {sort}"))?;
    Ok(rows.iter().map(contact_from_row).collect())
}

fn ordered_select(sort: SortType) -> &'static str {
    match sort {
        SortType::FirstName => {
            "SELECT id, first_name, last_name, phone_number FROM contacts
             ORDER BY first_name ASC, id ASC"
        }
        // Contacts without a last name come first.
        SortType::LastName => {
            "SELECT id, first_name, last_name, phone_number FROM contacts
             ORDER BY last_name IS NOT NULL, last_name ASC, id ASC"
        }
        SortType::PhoneNumber => {
            "SELECT id, first_name, last_name, phone_number FROM contacts
             ORDER BY phone_number ASC, id ASC"
        }
    }
}

fn contact_from_row(r: &SqliteRow) -> Contact {
    Contact {
        id: Some(ContactId(r.get::<i64, _>(0))),
        first_name: r.get::<String, _>(1),
        last_name: r.get::<Option<String>, _>(2),
        phone_number: r.get::<String, _>(3),
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with(MEMORY_DATABASE_URL) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[async_trait]
impl ContactStore for Storage {
    async fn upsert_contact(&self, contact: &Contact) -> Result<ContactId> {
        let rec = sqlx::query(
            "INSERT INTO contacts (id, first_name, last_name, phone_number) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                phone_number = excluded.phone_number
             RETURNING id",
        )
        .bind(contact.id.map(|id| id.0))
        .bind(contact.first_name.as_str())
        .bind(contact.last_name.as_deref())
        .bind(contact.phone_number.as_str())
        .fetch_one(&self.pool)
        .await
        .context("failed to upsert contact")?;
        let id = ContactId(rec.get::<i64, _>(0));
        debug!(contact_id = %id, replaced = contact.id.is_some(), "stored contact row");
        self.notify_changed();
        Ok(id)
    }

    async fn delete_contact(&self, contact: &Contact) -> Result<()> {
        if let Some(id) = contact.id {
            let result = sqlx::query("DELETE FROM contacts WHERE id = ?")
                .bind(id.0)
                .execute(&self.pool)
                .await
                .context("failed to delete contact")?;
            debug!(contact_id = %id, rows = result.rows_affected(), "deleted contact row");
        }
        self.notify_changed();
        Ok(())
    }

    fn contacts(&self, sort: SortType) -> ContactStream {
        self.live_contacts(sort)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
