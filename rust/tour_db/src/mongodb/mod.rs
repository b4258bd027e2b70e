pub mod api;
pub mod collection;
pub mod traits;

pub use api::{MongoDbAPI, UpdateOutcome};
pub use collection::MongoCollection;
pub use traits::{IntoIndexes, PreSave};

/// Default local MongoDB URL used when no connection string is configured
pub const DEFAULT_MONGODB_URL: &str = "mongodb://127.0.0.1:27017";

/// Returns the MongoDB connection URL from environment variables.
///
/// # Returns
///
/// - If `MONGO_URI` environment variable is set, returns its value
/// - Otherwise, returns the default local MongoDB URL: "mongodb://127.0.0.1:27017"
pub fn get_mongodb_url() -> String {
    std::env::var("MONGO_URI").unwrap_or_else(|_| DEFAULT_MONGODB_URL.to_string())
}
