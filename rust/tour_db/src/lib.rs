//! MongoDB data layer for tours: document schemas, validation, the query
//! builder and the repository that ties them together.
//!
//! ```rust,no_run
//! use tour_db::{config, query::TourQuery, repository::TourRepository};
//!
//! async fn example() -> Result<(), tour_db::error::ServiceError> {
//!     let config = config::DbConfig::default();
//!     let client = config::connect(&config).await?;
//!     let tours = TourRepository::connect(&client, &config).await?;
//!
//!     // secret tours stay hidden and guides come back populated
//!     let cheapest = tours
//!         .find(TourQuery::new().sort(bson::doc! { "price": 1 }).limit(5))
//!         .await?;
//!     println!("{} tours", cheapest.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod mongodb;
pub mod query;
pub mod repository;
pub mod schemas;
pub mod validation;

#[cfg(test)]
mod tests;

pub use error::{FieldViolation, ServiceError, ValidationReport};
pub use query::{DistanceUnit, LatLng, TourQuery};
pub use repository::{GuideLookup, ReviewLookup, TourRepository};
pub use validation::{NewTour, TourUpdate};
