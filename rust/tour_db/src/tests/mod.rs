#![allow(dead_code)]

use bson::{oid::ObjectId, DateTime};
use std::sync::Arc;

use crate::repository::TourRepository;
use crate::schemas::{Location, Review, User, UserRole};
use crate::validation::NewTour;


#[cfg(feature = "tests_integration_mongodb")]
pub mod mongod;

use memory::{MemoryCollection, MemoryReviews, MemoryUsers};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn forest_hiker() -> NewTour {
    NewTour {
        name: Some("The Forest Hiker".to_string()),
        duration: Some(5),
        max_group_size: Some(25),
        difficulty: Some("easy".to_string()),
        ratings_average: Some(4.7),
        ratings_quantity: Some(37),
        price: Some(397.0),
        summary: Some("Breathtaking hike through the Canadian Banff National Park".to_string()),
        description: Some("Lorem ipsum dolor sit amet".to_string()),
        image_cover: Some("tour-1-cover.jpg".to_string()),
        images: vec!["tour-1-1.jpg".to_string(), "tour-1-2.jpg".to_string()],
        start_location: Some(
            Location::point(-115.570154, 51.178456)
                .with_description("Banff, CAN")
                .with_address("224 Banff Ave, Banff, AB, Canada"),
        ),
        locations: vec![Location::point(-116.214531, 51.417611)
            .with_description("Banff National Park")
            .on_day(1)],
        ..Default::default()
    }
}

pub fn sea_explorer() -> NewTour {
    NewTour {
        name: Some("The Sea Explorer".to_string()),
        duration: Some(7),
        max_group_size: Some(15),
        difficulty: Some("medium".to_string()),
        price: Some(497.0),
        price_discount: Some(450.0),
        summary: Some("Exploring the jaw-dropping US east coast by foot and by boat".to_string()),
        image_cover: Some("tour-2-cover.jpg".to_string()),
        start_location: Some(Location::point(-80.185942, 25.774772).with_description("Miami, USA")),
        ..Default::default()
    }
}

pub fn secret_retreat() -> NewTour {
    NewTour {
        name: Some("The Hidden Valley Retreat".to_string()),
        duration: Some(3),
        max_group_size: Some(6),
        difficulty: Some("difficult".to_string()),
        price: Some(1997.0),
        summary: Some("Invitation only".to_string()),
        image_cover: Some("tour-9-cover.jpg".to_string()),
        secret_tour: Some(true),
        ..Default::default()
    }
}

pub fn guide(name: &str, role: UserRole) -> User {
    User {
        _id: Some(ObjectId::new()),
        name: name.to_string(),
        email: format!("{}@example.io", name.to_lowercase().replace(' ', ".")),
        photo: Some("user-default.jpg".to_string()),
        role,
        password_changed_at: Some(DateTime::now()),
        version: 2,
    }
}

pub fn review(tour: ObjectId, user: ObjectId, text: &str, rating: f64) -> Review {
    Review {
        _id: Some(ObjectId::new()),
        review: text.to_string(),
        rating,
        created_at: Some(DateTime::now()),
        tour,
        user,
    }
}

pub fn memory_repository(
    users: Vec<User>,
    reviews: Vec<Review>,
) -> TourRepository<MemoryCollection> {
    TourRepository::new(
        MemoryCollection::new(),
        Arc::new(MemoryUsers::with(users)),
        Arc::new(MemoryReviews::with(reviews)),
    )
}
