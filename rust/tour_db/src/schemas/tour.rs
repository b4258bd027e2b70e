use anyhow::Result;
use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumString};
use validator::Validate;

use super::location::Location;
use super::review::Review;
use super::user::UserSummary;
use crate::error::{ServiceError, ValidationReport};
use crate::mongodb::traits::{IntoIndexes, PreSave};

/// Collection name for tour documents
pub const TOUR_COLLECTION_NAME: &str = "tours";

pub const DEFAULT_RATINGS_AVERAGE: f64 = 4.5;
pub const NAME_MIN_LENGTH: usize = 10;
pub const NAME_MAX_LENGTH: usize = 40;

pub const DIFFICULTY_MESSAGE: &str = "Difficulty is either: easy, medium, difficult";

#[derive(
    Serialize, Deserialize, EnumString, Display, Debug, Clone, Copy, PartialEq, Eq, Hash, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Difficult,
}

/// Tour document schema
#[derive(Serialize, Deserialize, Validate, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    /// MongoDB ObjectId of the tour document
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    #[validate(length(
        min = 10,
        max = 40,
        message = "A tour name must have between 10 and 40 characters"
    ))]
    pub name: String,
    /// Always `tour_slug(name)` once the document went through `PreSave`
    #[serde(default)]
    pub slug: String,
    /// Length of the tour in days
    pub duration: i32,
    pub max_group_size: i32,
    pub difficulty: Difficulty,
    #[serde(default = "default_ratings_average")]
    #[validate(range(min = 1.0, max = 5.0, message = "Rating must be between 1.0 and 5.0"))]
    pub ratings_average: f64,
    #[serde(default)]
    pub ratings_quantity: i32,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_discount: Option<f64>,
    #[validate(length(min = 1, message = "A tour must have a summary"))]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(length(min = 1, message = "A tour must have a cover image"))]
    pub image_cover: String,
    #[serde(default)]
    pub images: Vec<String>,
    /// Stamped once on insert; left out of default reads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default)]
    pub start_dates: Vec<DateTime>,
    #[serde(default)]
    pub secret_tour: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_location: Option<Location>,
    #[serde(default)]
    pub locations: Vec<Location>,
    /// Ids of the users guiding this tour
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub guides: Vec<ObjectId>,
}

fn default_ratings_average() -> f64 {
    DEFAULT_RATINGS_AVERAGE
}

impl Default for Tour {
    fn default() -> Self {
        Self {
            _id: None,
            name: Default::default(),
            slug: Default::default(),
            duration: 0,
            max_group_size: 0,
            difficulty: Difficulty::default(),
            ratings_average: DEFAULT_RATINGS_AVERAGE,
            ratings_quantity: 0,
            price: 0.0,
            price_discount: None,
            summary: Default::default(),
            description: None,
            image_cover: Default::default(),
            images: vec![],
            created_at: None,
            start_dates: vec![],
            secret_tour: false,
            start_location: None,
            locations: vec![],
            guides: vec![],
        }
    }
}

/// Lower-cased, hyphenated form of a tour name used in urls
pub fn tour_slug(name: &str) -> String {
    slug::slugify(name)
}

/// Rounds a rating to one decimal place
pub fn round_rating(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub(crate) fn discount_message(discount: f64) -> String {
    format!("Discount price ({}) should be below regular price", discount)
}

impl Tour {
    /// Duration expressed in weeks
    pub fn duration_weeks(&self) -> f64 {
        f64::from(self.duration) / 7.0
    }

    /// Sets the average rating, rounded to one decimal place
    pub fn set_ratings_average(&mut self, value: f64) {
        self.ratings_average = round_rating(value);
    }

    /// Re-applies the setters inputs go through: trimmed text fields and a
    /// rounded rating.
    pub fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.summary = self.summary.trim().to_string();
        self.image_cover = self.image_cover.trim().to_string();
        self.description = self
            .description
            .take()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        self.set_ratings_average(self.ratings_average);
    }

    /// Validates the whole document, as required before a full save.
    ///
    /// Every violated field is collected before returning.
    pub fn validate_document(&self) -> Result<(), ServiceError> {
        let mut report = match Validate::validate(self) {
            Ok(()) => ValidationReport::new(),
            Err(errors) => errors.into(),
        };

        if let Some(discount) = self.price_discount {
            if discount >= self.price {
                report.add("priceDiscount", discount_message(discount));
            }
        }
        if let Some(start_location) = &self.start_location {
            start_location.check("startLocation", &mut report);
        }
        for location in &self.locations {
            location.check("locations", &mut report);
        }

        report.into_result()
    }
}

impl IntoIndexes for Tour {
    /// Defines MongoDB indices for the Tour collection
    ///
    /// Creates indices for:
    /// - name (unique)
    /// - price ascending + ratingsAverage descending
    /// - slug
    /// - startLocation (2dsphere, for proximity queries)
    fn into_indices(self) -> Result<Vec<(Document, Option<IndexOptions>)>> {
        let mut indices = vec![];

        let name_index_doc = doc! { "name": 1 };
        let name_index_opts = Some(
            IndexOptions::builder()
                .name(Some("name_unique".to_string()))
                .unique(Some(true))
                .build(),
        );
        indices.push((name_index_doc, name_index_opts));

        let price_index_doc = doc! { "price": 1, "ratingsAverage": -1 };
        let price_index_opts = Some(
            IndexOptions::builder()
                .name(Some("price_ratings_index".to_string()))
                .build(),
        );
        indices.push((price_index_doc, price_index_opts));

        let slug_index_doc = doc! { "slug": 1 };
        let slug_index_opts = Some(
            IndexOptions::builder()
                .name(Some("slug_index".to_string()))
                .build(),
        );
        indices.push((slug_index_doc, slug_index_opts));

        let geo_index_doc = doc! { "startLocation": "2dsphere" };
        let geo_index_opts = Some(
            IndexOptions::builder()
                .name(Some("start_location_2dsphere".to_string()))
                .build(),
        );
        indices.push((geo_index_doc, geo_index_opts));

        Ok(indices)
    }
}

impl PreSave for Tour {
    fn pre_save(&mut self) {
        self.slug = tour_slug(&self.name);
        if self.created_at.is_none() {
            self.created_at = Some(DateTime::now());
        }
    }
}

/// A tour as handed to readers: the stored document plus derived fields and
/// whatever references the query asked to resolve.
///
/// `tour` always keeps the stored guide ids, so it can be saved back as is.
#[derive(Clone, Debug, PartialEq)]
pub struct TourView {
    pub tour: Tour,
    /// Resolved guides, when the query populated them
    pub guides: Option<Vec<UserSummary>>,
    pub duration_weeks: f64,
    pub reviews: Option<Vec<Review>>,
}

// Serialized shape of a view; populated guides stand in for the ids
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderedTour<'a> {
    #[serde(flatten)]
    tour: &'a Tour,
    #[serde(skip_serializing_if = "Option::is_none")]
    guides: Option<&'a Vec<UserSummary>>,
    duration_weeks: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    reviews: Option<&'a Vec<Review>>,
}

impl TourView {
    fn rendered<'a>(&'a self, tour: &'a Tour) -> RenderedTour<'a> {
        RenderedTour {
            tour,
            guides: self.guides.as_ref(),
            duration_weeks: self.duration_weeks,
            reviews: self.reviews.as_ref(),
        }
    }
}

impl Serialize for TourView {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.guides.is_some() {
            let tour = Tour {
                guides: vec![],
                ..self.tour.clone()
            };
            self.rendered(&tour).serialize(serializer)
        } else {
            self.rendered(&self.tour).serialize(serializer)
        }
    }
}

impl TourView {
    /// Wraps a tour without resolving anything
    pub fn new(tour: Tour) -> Self {
        Self {
            duration_weeks: tour.duration_weeks(),
            tour,
            guides: None,
            reviews: None,
        }
    }

    /// Resolves the guide ids into the matching summaries, in the tour's order.
    /// Ids missing from `users` are left out.
    pub fn populate_guides(&mut self, users: &HashMap<ObjectId, UserSummary>) {
        let ids = &self.tour.guides;
        let resolved: Vec<UserSummary> = ids
            .iter()
            .filter_map(|id| users.get(id).cloned())
            .collect();
        if resolved.len() < ids.len() {
            log::debug!(
                "Tour {:?}: {} of {} guides did not resolve",
                self.tour._id,
                ids.len() - resolved.len(),
                ids.len()
            );
        }
        self.guides = Some(resolved);
    }

    pub fn attach_reviews(&mut self, reviews: Vec<Review>) {
        self.reviews = Some(reviews);
    }

    /// Guide ids as stored on the tour, whether or not they were populated
    pub fn guide_ids(&self) -> &[ObjectId] {
        &self.tour.guides
    }

    pub fn into_tour(self) -> Tour {
        self.tour
    }
}

/// Distance of a tour's start location from a reference point
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TourDistance {
    #[serde(rename = "_id")]
    pub _id: ObjectId,
    pub name: String,
    pub distance: f64,
}
