//! PostgreSQL store
//!
//! Documents live in a single `documents` table. A row trigger issues
//! `NOTIFY gamepart_documents, '<collection>'` on every change, and each
//! subscription re-reads its collection whenever that notification arrives.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, postgres::PgListener, query, query_as};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::store::{
    Batch, Collection, Document, DocumentStore, Snapshot, StoreError, Subscription, Write,
};

const LIST_DOCUMENTS_SQL: &str = include_str!("sql/list_documents.sql");
const UPSERT_DOCUMENT_SQL: &str = include_str!("sql/upsert_document.sql");
const DELETE_DOCUMENT_SQL: &str = include_str!("sql/delete_document.sql");

/// Notification channel the `documents` trigger publishes to.
pub const NOTIFY_CHANNEL: &str = "gamepart_documents";

/// SQLSTATE for `insufficient_privilege`.
const INSUFFICIENT_PRIVILEGE: &str = "42501";

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        let denied = error
            .as_database_error()
            .and_then(|database_error| database_error.code())
            .is_some_and(|code| code == INSUFFICIENT_PRIVILEGE);

        if denied {
            Self::PermissionDenied(error.to_string())
        } else {
            Self::Unavailable(error.to_string())
        }
    }
}

/// Documents in PostgreSQL with `LISTEN`/`NOTIFY` push.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn list_documents(pool: &PgPool, collection: Collection) -> Result<Vec<Document>, StoreError> {
    let rows: Vec<(String, serde_json::Value)> = query_as::<Postgres, (String, serde_json::Value)>(
        LIST_DOCUMENTS_SQL,
    )
    .bind(collection.name())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, body)| Document { id, body })
        .collect())
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get_all(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        list_documents(&self.pool, collection).await
    }

    async fn put(&self, collection: Collection, document: Document) -> Result<(), StoreError> {
        query(UPSERT_DOCUMENT_SQL)
            .bind(collection.name())
            .bind(document.id)
            .bind(document.body)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        query(DELETE_DOCUMENT_SQL)
            .bind(collection.name())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn commit(&self, batch: Batch) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for write in batch.writes() {
            match write {
                Write::Put {
                    collection,
                    document,
                } => {
                    query(UPSERT_DOCUMENT_SQL)
                        .bind(collection.name())
                        .bind(&document.id)
                        .bind(&document.body)
                        .execute(&mut *tx)
                        .await?;
                }
                Write::Delete { collection, id } => {
                    query(DELETE_DOCUMENT_SQL)
                        .bind(collection.name())
                        .bind(id)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit().await?;

        Ok(())
    }

    async fn subscribe(
        &self,
        collection: Collection,
    ) -> Result<Option<Subscription>, StoreError> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(NOTIFY_CHANNEL).await?;

        let (sender, receiver) = mpsc::unbounded_channel();

        let initial = list_documents(&self.pool, collection).await?;

        sender
            .send(Snapshot {
                collection,
                documents: initial,
            })
            .map_err(|error| StoreError::Unavailable(error.to_string()))?;

        let pool = self.pool.clone();

        let task = tokio::spawn(async move {
            loop {
                let notification = match listener.recv().await {
                    Ok(notification) => notification,
                    Err(error) => {
                        warn!(%error, collection = collection.name(), "document listener stopped");
                        break;
                    }
                };

                if notification.payload() != collection.name() {
                    continue;
                }

                match list_documents(&pool, collection).await {
                    Ok(documents) => {
                        debug!(
                            collection = collection.name(),
                            documents = documents.len(),
                            "delivering snapshot"
                        );

                        if sender
                            .send(Snapshot {
                                collection,
                                documents,
                            })
                            .is_err()
                        {
                            break;
                        }
                    }
                    Err(error) => {
                        warn!(%error, collection = collection.name(), "failed to refresh snapshot");
                    }
                }
            }
        });

        Ok(Some(Subscription::with_task(receiver, task)))
    }
}
