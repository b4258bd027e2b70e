use config::{Config, Environment};
use dotenv::dotenv;
use mongodb::{options::ClientOptions, Client as MongoDBClient};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::mongodb::get_mongodb_url;
use crate::schemas::{
    DATABASE_NAME, REVIEW_COLLECTION_NAME, TOUR_COLLECTION_NAME, USER_COLLECTION_NAME,
};

/// Where the tour-booking collections live.
///
/// Every field can be overridden with a `TOURS_`-prefixed environment
/// variable (eg. `TOURS_DATABASE_NAME`). The connection string falls back to
/// `MONGO_URI`, then to a local server.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DbConfig {
    /// connection string for mongodb
    pub mongo_uri: String,
    pub database_name: String,
    pub tour_collection: String,
    pub user_collection: String,
    pub review_collection: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            mongo_uri: get_mongodb_url(),
            database_name: DATABASE_NAME.to_string(),
            tour_collection: TOUR_COLLECTION_NAME.to_string(),
            user_collection: USER_COLLECTION_NAME.to_string(),
            review_collection: REVIEW_COLLECTION_NAME.to_string(),
        }
    }
}

pub fn load_config() -> Result<DbConfig, config::ConfigError> {
    dotenv().ok();
    build_config(Environment::with_prefix("TOURS"))
}

fn build_config(environment: Environment) -> Result<DbConfig, config::ConfigError> {
    let defaults = DbConfig::default();
    let settings = Config::builder()
        .set_default("mongo_uri", defaults.mongo_uri)?
        .set_default("database_name", defaults.database_name)?
        .set_default("tour_collection", defaults.tour_collection)?
        .set_default("user_collection", defaults.user_collection)?
        .set_default("review_collection", defaults.review_collection)?
        .add_source(environment)
        .build()?;

    settings.try_deserialize()
}

/// Opens a client for the configured server.
// NB: the client holds a connection pool; clone it rather than connecting again.
pub async fn connect(config: &DbConfig) -> Result<MongoDBClient, ServiceError> {
    log::debug!("Connecting to MongoDB for database {}", config.database_name);
    let options = ClientOptions::parse(config.mongo_uri.clone()).await?;
    Ok(MongoDBClient::with_options(options)?)
}
