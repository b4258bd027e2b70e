use async_trait::async_trait;
use bson::{oid::ObjectId, Document};
use futures::stream::TryStreamExt;
use mongodb::{options::UpdateModifications, results::UpdateResult};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use super::{
    collection::MongoCollection,
    traits::{IntoIndexes, PreSave},
};
use crate::error::ServiceError;

/// Matched/modified counts of an update or replace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched_count: u64,
    pub modified_count: u64,
}

impl From<UpdateResult> for UpdateOutcome {
    fn from(result: UpdateResult) -> Self {
        Self {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
        }
    }
}

/// Core trait defining MongoDB operations for a collection of type `T`.
///
/// This trait provides a standardized interface for common MongoDB operations
/// including aggregation, querying, insertion, and updates.
///
/// # Type Parameters
///
/// * `T` - The type representing documents in the collection. Must be serializable,
///         deserializable, and thread-safe.
#[async_trait]
pub trait MongoDbAPI<T>
where
    T: Serialize + for<'de> Deserialize<'de> + Unpin + Send + Sync,
{
    /// The error type returned by operations in this trait.
    type Error;

    /// Executes an aggregation pipeline and returns the results.
    ///
    /// # Arguments
    ///
    /// * `pipeline` - Vector of aggregation pipeline stages as BSON documents
    ///
    /// # Returns
    ///
    /// A vector of documents of type `R` representing the aggregation results
    async fn aggregate<R: for<'de> Deserialize<'de>>(
        &self,
        pipeline: Vec<Document>,
    ) -> Result<Vec<R>, Self::Error>;

    /// Retrieves a single document matching the filter criteria from collection.
    ///
    /// # Returns
    ///
    /// An optional document of type `T` if found
    async fn get_one_from(&self, filter: Document) -> Result<Option<T>, Self::Error>;

    /// Retrieves multiple documents matching the filter criteria from collection.
    async fn get_many_from(&self, filter: Document) -> Result<Vec<T>, Self::Error>;

    /// Counts the documents matching the filter criteria.
    async fn count_in(&self, filter: Document) -> Result<u64, Self::Error>;

    /// Inserts a single document into the collection.
    ///
    /// The document's `PreSave` hook runs first and its effects stay visible
    /// on `item` after the call.
    ///
    /// # Returns
    ///
    /// The ObjectId of the inserted document
    async fn insert_one_into(&self, item: &mut T) -> Result<ObjectId, Self::Error>;

    /// Replaces the single document matching `query` with `item`, running the
    /// `PreSave` hook first.
    async fn replace_one_within(
        &self,
        query: Document,
        item: &mut T,
    ) -> Result<UpdateOutcome, Self::Error>;

    /// Updates a single document matching the query criteria in the collection.
    ///
    /// Partial updates skip the `PreSave` hook.
    async fn update_one_within(
        &self,
        query: Document,
        updated_doc: UpdateModifications,
    ) -> Result<UpdateOutcome, Self::Error>;

    /// Deletes a single document matching the query criteria from the collection.
    ///
    /// # Returns
    ///
    /// The number of deleted documents (0 or 1)
    async fn delete_one_from(&self, query: Document) -> Result<u64, Self::Error>;
}

#[async_trait]
impl<T> MongoDbAPI<T> for MongoCollection<T>
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
    type Error = ServiceError;

    async fn aggregate<R>(&self, pipeline: Vec<Document>) -> Result<Vec<R>, Self::Error>
    where
        R: for<'de> Deserialize<'de>,
    {
        log::debug!("Executing aggregation pipeline: {:?}", pipeline);
        let cursor = self
            .inner
            .aggregate(pipeline)
            .await
            .map_err(|e| self.handle_db_error("aggregate", e))?;

        let results_doc: Vec<bson::Document> = cursor
            .try_collect()
            .await
            .map_err(|e| self.handle_db_error("aggregate collect", e))?;

        let results: Vec<R> = results_doc
            .into_iter()
            .map(|doc| bson::from_document::<R>(doc))
            .collect::<Result<Vec<R>, _>>()
            .map_err(|e| Self::handle_internal_error("aggregate deserialize", e))?;

        log::debug!("Aggregation returned {} results", results.len());
        Ok(results)
    }

    async fn get_one_from(&self, filter: Document) -> Result<Option<T>, Self::Error> {
        log::debug!("Getting one document with filter: {:?}", filter);
        let item = self
            .inner
            .find_one(filter)
            .await
            .map_err(|e| self.handle_db_error("get_one_from", e))?;

        if item.is_none() {
            log::debug!("No document found matching filter");
        }
        Ok(item)
    }

    async fn get_many_from(&self, filter: Document) -> Result<Vec<T>, Self::Error> {
        log::debug!("Getting multiple documents with filter: {:?}", filter);
        let cursor = self
            .inner
            .find(filter)
            .await
            .map_err(|e| self.handle_db_error("get_many_from", e))?;

        let results: Vec<T> = cursor
            .try_collect()
            .await
            .map_err(|e| self.handle_db_error("get_many_from collect", e))?;

        log::debug!("Found {} documents", results.len());
        Ok(results)
    }

    async fn count_in(&self, filter: Document) -> Result<u64, Self::Error> {
        log::debug!("Counting documents with filter: {:?}", filter);
        self.inner
            .count_documents(filter)
            .await
            .map_err(|e| self.handle_db_error("count_in", e))
    }

    async fn insert_one_into(&self, item: &mut T) -> Result<ObjectId, Self::Error> {
        log::debug!("Inserting new document into {}", self.name());
        item.pre_save();

        let result = self
            .inner
            .insert_one(&*item)
            .await
            .map_err(|e| self.handle_db_error("insert_one_into", e))?;

        let mongo_id = result.inserted_id.as_object_id().ok_or_else(|| {
            Self::handle_internal_error("insert_one_into", "Failed to read inserted ID from result")
        })?;

        log::info!("Successfully inserted document with ID: {}", mongo_id);
        Ok(mongo_id)
    }

    async fn replace_one_within(
        &self,
        query: Document,
        item: &mut T,
    ) -> Result<UpdateOutcome, Self::Error> {
        log::debug!("Replacing single document - Query: {:?}", query);
        item.pre_save();

        let result = self
            .inner
            .replace_one(query, &*item)
            .await
            .map_err(|e| self.handle_db_error("replace_one_within", e))?;

        log::info!(
            "Replaced document (matched: {}, modified: {})",
            result.matched_count,
            result.modified_count
        );
        Ok(result.into())
    }

    async fn update_one_within(
        &self,
        query: Document,
        updated_doc: UpdateModifications,
    ) -> Result<UpdateOutcome, Self::Error> {
        log::debug!("Updating single document - Query: {:?}", query);

        let result = self
            .inner
            .update_one(query, updated_doc)
            .await
            .map_err(|e| self.handle_db_error("update_one_within", e))?;

        log::info!(
            "Updated document (matched: {}, modified: {})",
            result.matched_count,
            result.modified_count
        );
        Ok(result.into())
    }

    async fn delete_one_from(&self, query: Document) -> Result<u64, Self::Error> {
        log::debug!("Deleting document with query: {:?}", query);
        let result = self
            .inner
            .delete_one(query)
            .await
            .map_err(|e| self.handle_db_error("delete_one_from", e))?;

        log::info!("Deleted document (deleted count: {})", result.deleted_count);
        Ok(result.deleted_count)
    }
}
