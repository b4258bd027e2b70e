use anyhow::Result;
use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::mongodb::traits::{IntoIndexes, PreSave};

/// Collection name for review documents
pub const REVIEW_COLLECTION_NAME: &str = "reviews";

/// Review document schema. Tours never store their reviews; they are joined
/// in by matching `tour` against the tour's `_id`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub review: String,
    pub rating: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    /// Reviewed tour
    pub tour: ObjectId,
    /// Author
    pub user: ObjectId,
}

impl IntoIndexes for Review {
    /// Defines MongoDB indices for the Review collection
    ///
    /// Creates indices for:
    /// - tour + user (unique, one review per user and tour)
    fn into_indices(self) -> Result<Vec<(Document, Option<IndexOptions>)>> {
        let tour_user_index_doc = doc! { "tour": 1, "user": 1 };
        let tour_user_index_opts = Some(
            IndexOptions::builder()
                .name(Some("tour_user_unique".to_string()))
                .unique(Some(true))
                .build(),
        );
        Ok(vec![(tour_user_index_doc, tour_user_index_opts)])
    }
}

impl PreSave for Review {
    fn pre_save(&mut self) {
        if self.created_at.is_none() {
            self.created_at = Some(DateTime::now());
        }
    }
}
