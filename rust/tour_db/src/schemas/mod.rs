pub mod location;
pub mod review;
pub mod tour;
pub mod user;

pub use location::{Location, PointType};
pub use review::{Review, REVIEW_COLLECTION_NAME};
pub use tour::{
    round_rating, tour_slug, Difficulty, Tour, TourDistance, TourView, TOUR_COLLECTION_NAME,
};
pub use user::{User, UserRole, UserSummary, USER_COLLECTION_NAME};

/// Default name of the database holding the tour-booking collections
pub const DATABASE_NAME: &str = "tour_booking";
