use anyhow::Result;
use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::mongodb::traits::{IntoIndexes, PreSave};

/// Collection name for user documents
pub const USER_COLLECTION_NAME: &str = "users";

/// Fields never handed out when a user is embedded into another document
pub const USER_HIDDEN_FIELDS: [&str; 2] = ["__v", "passwordChangedAt"];

/// Enumeration of possible user roles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum UserRole {
    #[default]
    User,
    Guide,
    LeadGuide,
    Admin,
}

/// User document schema, limited to what tours need from it.
///
/// Users are owned by the accounts side of the application; tours only hold
/// their ids in `guides`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// MongoDB ObjectId of the user document
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_changed_at: Option<DateTime>,
    // document revision marker
    #[serde(rename = "__v", default)]
    pub version: i32,
}

/// The public part of a user, as embedded into a populated tour.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub _id: ObjectId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default)]
    pub role: UserRole,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            _id: user._id.unwrap_or_default(),
            name: user.name,
            email: user.email,
            photo: user.photo,
            role: user.role,
        }
    }
}

/// Projection that strips [`USER_HIDDEN_FIELDS`]
pub fn user_summary_projection() -> Document {
    let mut projection = Document::new();
    for field in USER_HIDDEN_FIELDS {
        projection.insert(field, 0);
    }
    projection
}

impl IntoIndexes for User {
    /// Defines MongoDB indices for the User collection
    ///
    /// Creates indices for:
    /// - email (unique)
    fn into_indices(self) -> Result<Vec<(Document, Option<IndexOptions>)>> {
        let email_index_doc = doc! { "email": 1 };
        let email_index_opts = Some(
            IndexOptions::builder()
                .name(Some("email_unique".to_string()))
                .unique(Some(true))
                .build(),
        );
        Ok(vec![(email_index_doc, email_index_opts)])
    }
}

impl PreSave for User {}
