use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{types::Json, PgPool};
use std::marker::PhantomData;
use uuid::Uuid;

use crate::database::manager::{is_valid_collection_name, quote_identifier, DatabaseError};

/// A catalog record stored whole in its collection's `body` column.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static {
    /// Table holding the documents
    const COLLECTION: &'static str;
    /// Name used in client messages ("Product not found")
    const LABEL: &'static str;

    fn id(&self) -> Uuid;

    /// Category value indexed next to the body for filtering
    fn category(&self) -> &'static str;
}

#[async_trait]
pub trait DocumentStore<T: Document>: Send + Sync {
    /// All documents, oldest first, optionally restricted to one category
    async fn list(&self, category: Option<&str>) -> Result<Vec<T>, DatabaseError>;

    async fn find(&self, id: Uuid) -> Result<Option<T>, DatabaseError>;

    async fn insert(&self, doc: &T) -> Result<(), DatabaseError>;

    /// Overwrite an existing document; `false` when the id is unknown
    async fn replace(&self, doc: &T) -> Result<bool, DatabaseError>;

    /// Delete and return the removed document
    async fn remove(&self, id: Uuid) -> Result<Option<T>, DatabaseError>;
}

pub struct PgDocumentStore<T> {
    table: String,
    pool: PgPool,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: Document> PgDocumentStore<T> {
    pub fn new(pool: PgPool) -> Result<Self, DatabaseError> {
        if !is_valid_collection_name(T::COLLECTION) {
            return Err(DatabaseError::InvalidCollection(T::COLLECTION.to_string()));
        }
        Ok(Self {
            table: quote_identifier(T::COLLECTION),
            pool,
            _phantom: PhantomData,
        })
    }
}

#[async_trait]
impl<T: Document> DocumentStore<T> for PgDocumentStore<T> {
    async fn list(&self, category: Option<&str>) -> Result<Vec<T>, DatabaseError> {
        let sql = format!(
            "SELECT body FROM {} WHERE ($1::text IS NULL OR category = $1) ORDER BY created_at, id",
            self.table
        );
        let rows: Vec<(Json<T>,)> = sqlx::query_as(&sql)
            .bind(category)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(Json(doc),)| doc).collect())
    }

    async fn find(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        let sql = format!("SELECT body FROM {} WHERE id = $1", self.table);
        let row: Option<(Json<T>,)> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(Json(doc),)| doc))
    }

    async fn insert(&self, doc: &T) -> Result<(), DatabaseError> {
        let sql = format!(
            "INSERT INTO {} (id, category, body) VALUES ($1, $2, $3)",
            self.table
        );
        sqlx::query(&sql)
            .bind(doc.id())
            .bind(doc.category())
            .bind(Json(doc))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn replace(&self, doc: &T) -> Result<bool, DatabaseError> {
        let sql = format!(
            "UPDATE {} SET category = $2, body = $3, updated_at = now() WHERE id = $1",
            self.table
        );
        let result = sqlx::query(&sql)
            .bind(doc.id())
            .bind(doc.category())
            .bind(Json(doc))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE id = $1 RETURNING body", self.table);
        let row: Option<(Json<T>,)> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(Json(doc),)| doc))
    }
}
