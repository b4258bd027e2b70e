use anyhow::Result;
use mongodb::{Client, Collection, IndexModel};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use super::traits::{IntoIndexes, PreSave};
use crate::error::ServiceError;

/// Wrapper type for MongoDB collections providing additional functionality.
///
/// This struct wraps a MongoDB collection and provides methods for managing
/// indices and implementing the `MongoDbAPI` trait.
///
/// # Type Parameters
///
/// * `T` - The type representing documents in the collection. Must implement
///         necessary traits for serialization, deserialization, indexing and the
///         pre-save hook.
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + for<'de> Deserialize<'de> + Unpin + Send + Sync + Default + IntoIndexes + PreSave,
{
    /// The underlying MongoDB collection
    pub inner: Collection<T>,
    /// Collection indices
    indices: Vec<IndexModel>,
}

impl<T> MongoCollection<T>
where
    T: Serialize
        + for<'de> Deserialize<'de>
        + Unpin
        + Send
        + Sync
        + Default
        + Debug
        + IntoIndexes
        + PreSave,
{
    /// Creates a new `MongoCollection` instance and applies the defined indices.
    ///
    /// # Arguments
    ///
    /// * `client` - MongoDB client instance
    /// * `db_name` - Name of the database
    /// * `collection_name` - Name of the collection
    ///
    // NB: Each `mongodb::Client` clone is an alias of an Arc type and allows for multiple references of the same connection pool.
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, ServiceError> {
        log::debug!(
            "Creating new MongoDB collection: {}.{}",
            db_name,
            collection_name
        );
        let collection = client.database(db_name).collection::<T>(collection_name);

        let mut mongo_collection = MongoCollection {
            inner: collection,
            indices: vec![],
        };

        // Apply indices during initialization
        mongo_collection.apply_indexing().await.map_err(|e| {
            log::error!(
                "Failed to apply indices to collection {}.{}: {}",
                db_name,
                collection_name,
                e
            );
            ServiceError::internal(
                format!("Failed to apply indices: {}", e),
                Some(format!("Collection: {}.{}", db_name, collection_name)),
            )
        })?;

        log::info!(
            "Successfully created MongoDB collection {}.{}",
            db_name,
            collection_name
        );
        Ok(mongo_collection)
    }

    /// Name of the wrapped collection
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Indices applied to the collection so far
    pub fn indices(&self) -> &[IndexModel] {
        &self.indices
    }

    /// Applies the defined indices to the MongoDB collection.
    ///
    /// This method creates the indices defined by the collection's type `T`
    /// through its implementation of `IntoIndexes`. Re-applying an identical
    /// index set is a no-op on the server.
    pub async fn apply_indexing(&mut self) -> Result<&mut Self> {
        log::debug!("Applying indices to collection {}", self.name());
        let schema_indices = T::default().into_indices().map_err(|e| {
            log::error!("Failed to get indices from schema: {}", e);
            e
        })?;

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| {
                log::debug!("Adding index: {:?} with options: {:?}", keys, opts);
                IndexModel::builder()
                    .keys(keys)
                    .options(Some(opts.unwrap_or_default()))
                    .build()
            })
            .collect();

        if indices.is_empty() {
            log::info!("No indices to apply for collection {}", self.name());
            return Ok(self);
        }

        self.inner
            .create_indexes(indices.clone())
            .await
            .map_err(|e| {
                log::error!("Failed to create indices: {}", e);
                e
            })?;
        self.indices = indices;
        log::info!(
            "Successfully applied {} indices to collection {}",
            self.indices.len(),
            self.name()
        );

        Ok(self)
    }

    /// Helper method to handle MongoDB errors consistently
    pub fn handle_db_error(&self, operation: &str, error: mongodb::error::Error) -> ServiceError {
        log::error!(
            "MongoDB {} operation on {} failed: {}",
            operation,
            self.name(),
            error
        );
        ServiceError::database(
            error,
            Some(self.name().to_string()),
            Some(operation.to_string()),
        )
    }

    /// Helper method to handle internal errors consistently
    pub fn handle_internal_error(operation: &str, error: impl std::fmt::Display) -> ServiceError {
        log::error!("Internal error during {}: {}", operation, error);
        ServiceError::internal(error.to_string(), Some(operation.to_string()))
    }
}
