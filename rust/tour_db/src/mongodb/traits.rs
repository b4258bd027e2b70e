use anyhow::Result;
use bson::Document;
use mongodb::options::IndexOptions;

/// Trait for defining MongoDB indices for a collection.
///
/// Implementors of this trait can define the indices that should be created
/// for their corresponding MongoDB collection.
pub trait IntoIndexes {
    /// Converts the implementation into a vector of index definitions.
    ///
    /// # Returns
    ///
    /// A vector of tuples containing the index specification document and optional index options
    fn into_indices(self) -> Result<Vec<(Document, Option<IndexOptions>)>>;
}

/// Hook run by the collection wrapper right before a document is inserted
/// or replaced as a whole. Partial updates never go through it.
pub trait PreSave {
    fn pre_save(&mut self) {}
}
