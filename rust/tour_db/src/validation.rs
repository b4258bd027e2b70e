//! Input documents for creating and partially updating tours.
//!
//! Inputs arrive loosely typed (every field optional) so that a single pass
//! can report every missing or invalid field at once. Only a fully valid
//! input turns into a typed [`Tour`] or an update document.

use bson::{oid::ObjectId, Bson, DateTime, Document};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

use crate::error::{ServiceError, ValidationReport};
use crate::schemas::tour::{discount_message, DEFAULT_RATINGS_AVERAGE, DIFFICULTY_MESSAGE};
use crate::schemas::{round_rating, tour_slug, Difficulty, Location, Tour};

/// Payload for creating a tour.
#[derive(Serialize, Deserialize, Validate, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewTour {
    #[validate(
        required(message = "A tour must have a name"),
        length(
            min = 10,
            max = 40,
            message = "A tour name must have between 10 and 40 characters"
        )
    )]
    pub name: Option<String>,
    #[validate(required(message = "A tour must have a duration"))]
    pub duration: Option<i32>,
    #[validate(required(message = "A tour must have a group size"))]
    pub max_group_size: Option<i32>,
    /// Checked against [`Difficulty`] after the derived rules run
    pub difficulty: Option<String>,
    #[validate(range(min = 1.0, max = 5.0, message = "Rating must be between 1.0 and 5.0"))]
    pub ratings_average: Option<f64>,
    pub ratings_quantity: Option<i32>,
    #[validate(required(message = "A tour must have a price"))]
    pub price: Option<f64>,
    pub price_discount: Option<f64>,
    #[validate(required(message = "A tour must have a summary"))]
    pub summary: Option<String>,
    pub description: Option<String>,
    #[validate(required(message = "A tour must have a cover image"))]
    pub image_cover: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub start_dates: Vec<chrono::DateTime<Utc>>,
    pub secret_tour: Option<bool>,
    pub start_location: Option<Location>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub guides: Vec<ObjectId>,
}

// Trims and drops blank strings, so blank required fields count as missing
fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn check_difficulty(value: Option<&str>, report: &mut ValidationReport) -> Option<Difficulty> {
    match value {
        None => {
            report.add("difficulty", "A tour must have a difficulty");
            None
        }
        Some(raw) => match Difficulty::from_str(raw) {
            Ok(difficulty) => Some(difficulty),
            Err(_) => {
                report.add("difficulty", DIFFICULTY_MESSAGE);
                None
            }
        },
    }
}

fn check_locations(
    start_location: Option<&Location>,
    locations: &[Location],
    report: &mut ValidationReport,
) {
    if let Some(start_location) = start_location {
        start_location.check("startLocation", report);
    }
    for location in locations {
        location.check("locations", report);
    }
}

fn to_bson_dates(dates: Vec<chrono::DateTime<Utc>>) -> Vec<DateTime> {
    dates.into_iter().map(DateTime::from_chrono).collect()
}

impl NewTour {
    /// Applies the setters that run before validation: trimming and rating rounding.
    fn normalized(mut self) -> Self {
        self.name = trimmed(self.name);
        self.summary = trimmed(self.summary);
        self.description = trimmed(self.description);
        self.image_cover = trimmed(self.image_cover);
        self.ratings_average = self.ratings_average.map(round_rating);
        self
    }

    /// Validates the input and builds the tour to insert.
    ///
    /// The returned tour already carries its slug; `createdAt` is stamped when
    /// it is inserted.
    pub fn into_tour(self) -> Result<Tour, ServiceError> {
        let input = self.normalized();

        let mut report = match Validate::validate(&input) {
            Ok(()) => ValidationReport::new(),
            Err(errors) => errors.into(),
        };
        let difficulty = check_difficulty(input.difficulty.as_deref(), &mut report);
        if let (Some(discount), Some(price)) = (input.price_discount, input.price) {
            if discount >= price {
                report.add("priceDiscount", discount_message(discount));
            }
        }
        check_locations(input.start_location.as_ref(), &input.locations, &mut report);
        report.into_result()?;

        let (
            Some(name),
            Some(duration),
            Some(max_group_size),
            Some(difficulty),
            Some(price),
            Some(summary),
            Some(image_cover),
        ) = (
            input.name,
            input.duration,
            input.max_group_size,
            difficulty,
            input.price,
            input.summary,
            input.image_cover,
        )
        else {
            return Err(ServiceError::internal(
                "Required tour field missing after validation",
                Some("NewTour::into_tour".to_string()),
            ));
        };

        Ok(Tour {
            _id: None,
            slug: tour_slug(&name),
            name,
            duration,
            max_group_size,
            difficulty,
            ratings_average: input
                .ratings_average
                .unwrap_or(DEFAULT_RATINGS_AVERAGE),
            ratings_quantity: input.ratings_quantity.unwrap_or_default(),
            price,
            price_discount: input.price_discount,
            summary,
            description: input.description,
            image_cover,
            images: input.images,
            created_at: None,
            start_dates: to_bson_dates(input.start_dates),
            secret_tour: input.secret_tour.unwrap_or(false),
            start_location: input.start_location,
            locations: input.locations,
            guides: input.guides,
        })
    }
}

/// Payload for a partial update. Only the fields present are validated and set.
#[derive(Serialize, Deserialize, Validate, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TourUpdate {
    #[validate(length(
        min = 10,
        max = 40,
        message = "A tour name must have between 10 and 40 characters"
    ))]
    pub name: Option<String>,
    pub duration: Option<i32>,
    pub max_group_size: Option<i32>,
    pub difficulty: Option<String>,
    #[validate(range(min = 1.0, max = 5.0, message = "Rating must be between 1.0 and 5.0"))]
    pub ratings_average: Option<f64>,
    pub ratings_quantity: Option<i32>,
    pub price: Option<f64>,
    pub price_discount: Option<f64>,
    #[validate(length(min = 1, message = "A tour must have a summary"))]
    pub summary: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "A tour must have a cover image"))]
    pub image_cover: Option<String>,
    pub images: Option<Vec<String>>,
    pub start_dates: Option<Vec<chrono::DateTime<Utc>>>,
    pub secret_tour: Option<bool>,
    pub start_location: Option<Location>,
    pub locations: Option<Vec<Location>>,
    pub guides: Option<Vec<ObjectId>>,
}

impl TourUpdate {
    fn normalized(mut self) -> Self {
        // blank values stay present so the length rules reject them
        self.name = self.name.map(|s| s.trim().to_string());
        self.summary = self.summary.map(|s| s.trim().to_string());
        self.image_cover = self.image_cover.map(|s| s.trim().to_string());
        self.description = trimmed(self.description);
        self.ratings_average = self.ratings_average.map(round_rating);
        self
    }

    /// Validates the present fields and builds the `$set` document.
    ///
    /// A new `name` also sets the matching `slug`. The discount rule is only
    /// enforced when the update carries both `price` and `priceDiscount`; the
    /// stored price is not consulted.
    ///
    /// Returns an empty document when nothing would change.
    pub fn into_set_document(self) -> Result<Document, ServiceError> {
        let input = self.normalized();

        let mut report = match Validate::validate(&input) {
            Ok(()) => ValidationReport::new(),
            Err(errors) => errors.into(),
        };
        let difficulty = match input.difficulty.as_deref() {
            Some(raw) => check_difficulty(Some(raw), &mut report),
            None => None,
        };
        if let (Some(discount), Some(price)) = (input.price_discount, input.price) {
            if discount >= price {
                report.add("priceDiscount", discount_message(discount));
            }
        }
        check_locations(
            input.start_location.as_ref(),
            input.locations.as_deref().unwrap_or_default(),
            &mut report,
        );
        report.into_result()?;

        let mut set = Document::new();
        if let Some(name) = input.name {
            set.insert("slug", tour_slug(&name));
            set.insert("name", name);
        }
        if let Some(duration) = input.duration {
            set.insert("duration", duration);
        }
        if let Some(max_group_size) = input.max_group_size {
            set.insert("maxGroupSize", max_group_size);
        }
        if let Some(difficulty) = difficulty {
            set.insert("difficulty", difficulty.to_string());
        }
        if let Some(ratings_average) = input.ratings_average {
            set.insert("ratingsAverage", ratings_average);
        }
        if let Some(ratings_quantity) = input.ratings_quantity {
            set.insert("ratingsQuantity", ratings_quantity);
        }
        if let Some(price) = input.price {
            set.insert("price", price);
        }
        if let Some(price_discount) = input.price_discount {
            set.insert("priceDiscount", price_discount);
        }
        if let Some(summary) = input.summary {
            set.insert("summary", summary);
        }
        if let Some(description) = input.description {
            set.insert("description", description);
        }
        if let Some(image_cover) = input.image_cover {
            set.insert("imageCover", image_cover);
        }
        if let Some(images) = input.images {
            set.insert("images", images);
        }
        if let Some(start_dates) = input.start_dates {
            set.insert("startDates", to_bson_dates(start_dates));
        }
        if let Some(secret_tour) = input.secret_tour {
            set.insert("secretTour", secret_tour);
        }
        if let Some(start_location) = input.start_location {
            set.insert("startLocation", bson::to_bson(&start_location)?);
        }
        if let Some(locations) = input.locations {
            set.insert("locations", bson::to_bson(&locations)?);
        }
        if let Some(guides) = input.guides {
            set.insert(
                "guides",
                guides.into_iter().map(Bson::ObjectId).collect::<Vec<Bson>>(),
            );
        }

        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forest_hiker() -> NewTour {
        NewTour {
            name: Some("The Forest Hiker".to_string()),
            duration: Some(5),
            max_group_size: Some(25),
            difficulty: Some("easy".to_string()),
            price: Some(397.0),
            summary: Some("Breathtaking hike through the Canadian Banff National Park".to_string()),
            image_cover: Some("tour-1-cover.jpg".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn valid_input_builds_tour_with_slug_and_defaults() {
        let tour = forest_hiker().into_tour().unwrap();
        assert_eq!(tour.slug, "the-forest-hiker");
        assert_eq!(tour.difficulty, Difficulty::Easy);
        assert_eq!(tour.ratings_average, 4.5);
        assert_eq!(tour.ratings_quantity, 0);
        assert!(!tour.secret_tour);
        assert!(tour.created_at.is_none());
    }

    #[test]
    fn name_is_trimmed_before_length_check() {
        let tour = NewTour {
            name: Some("   The Forest Hiker   ".to_string()),
            ..forest_hiker()
        }
        .into_tour()
        .unwrap();
        assert_eq!(tour.name, "The Forest Hiker");

        // 9 characters once trimmed
        let err = NewTour {
            name: Some("  Too short  ".to_string()),
            ..forest_hiker()
        }
        .into_tour()
        .unwrap_err();
        assert_eq!(err.validation_report().unwrap().fields(), vec!["name"]);
    }

    #[test]
    fn name_length_bounds() {
        let too_long = "x".repeat(41);
        let longest = "y".repeat(40);
        for name in ["Short one", too_long.as_str()] {
            let err = NewTour {
                name: Some(name.to_string()),
                ..forest_hiker()
            }
            .into_tour()
            .unwrap_err();
            assert!(err.validation_report().unwrap().has_field("name"), "{name}");
        }
        for name in ["Ten chars!", longest.as_str()] {
            assert!(NewTour {
                name: Some(name.to_string()),
                ..forest_hiker()
            }
            .into_tour()
            .is_ok());
        }
    }

    #[test]
    fn discount_must_be_below_price() {
        for discount in [397.0, 500.0] {
            let err = NewTour {
                price_discount: Some(discount),
                ..forest_hiker()
            }
            .into_tour()
            .unwrap_err();
            let report = err.validation_report().unwrap();
            assert_eq!(report.fields(), vec!["priceDiscount"]);
            assert!(report.violations[0].message.contains("should be below regular price"));
        }

        let tour = NewTour {
            price_discount: Some(100.0),
            ..forest_hiker()
        }
        .into_tour()
        .unwrap();
        assert_eq!(tour.price_discount, Some(100.0));
    }

    #[test]
    fn rating_is_rounded_before_range_check() {
        let tour = NewTour {
            ratings_average: Some(4.666),
            ..forest_hiker()
        }
        .into_tour()
        .unwrap();
        assert_eq!(tour.ratings_average, 4.7);

        // rounds down onto the upper bound
        assert!(NewTour {
            ratings_average: Some(5.04),
            ..forest_hiker()
        }
        .into_tour()
        .is_ok());

        for rating in [0.9, 5.2] {
            let err = NewTour {
                ratings_average: Some(rating),
                ..forest_hiker()
            }
            .into_tour()
            .unwrap_err();
            assert!(err.validation_report().unwrap().has_field("ratingsAverage"));
        }
    }

    #[test]
    fn empty_input_reports_every_required_field() {
        let err = NewTour::default().into_tour().unwrap_err();
        let report = err.validation_report().unwrap();
        assert_eq!(
            report.fields(),
            vec![
                "difficulty",
                "duration",
                "imageCover",
                "maxGroupSize",
                "name",
                "price",
                "summary",
            ]
        );
    }

    #[test]
    fn blank_strings_count_as_missing() {
        let err = NewTour {
            summary: Some("   ".to_string()),
            ..forest_hiker()
        }
        .into_tour()
        .unwrap_err();
        assert_eq!(err.validation_report().unwrap().fields(), vec!["summary"]);
    }

    #[test]
    fn difficulty_must_be_in_enum() {
        let err = NewTour {
            difficulty: Some("extreme".to_string()),
            ..forest_hiker()
        }
        .into_tour()
        .unwrap_err();
        let report = err.validation_report().unwrap();
        assert_eq!(report.violations[0].field, "difficulty");
        assert_eq!(report.violations[0].message, DIFFICULTY_MESSAGE);
    }

    #[test]
    fn deserializes_camel_case_json() {
        let input: NewTour = serde_json::from_str(
            r#"{
                "name": "The Snow Adventurer",
                "duration": 4,
                "maxGroupSize": 10,
                "difficulty": "difficult",
                "price": 997,
                "summary": "Exciting adventure in the snow with snowboarding and skiing",
                "imageCover": "tour-3-cover.jpg",
                "startDates": ["2021-01-05T10:00:00Z", "2021-02-12T10:00:00Z"],
                "startLocation": {
                    "type": "Point",
                    "coordinates": [-106.822318, 39.190872],
                    "address": "419 S Mill St, Aspen, CO 81611, USA",
                    "description": "Aspen, USA"
                },
                "locations": [
                    { "type": "Point", "coordinates": [-106.855385, 39.182677], "description": "Aspen Highlands", "day": 1 }
                ]
            }"#,
        )
        .unwrap();
        let tour = input.into_tour().unwrap();
        assert_eq!(tour.slug, "the-snow-adventurer");
        assert_eq!(tour.start_dates.len(), 2);
        assert_eq!(tour.locations[0].day, Some(1));
        assert_eq!(tour.start_location.unwrap().lat(), 39.190872);
    }

    #[test]
    fn update_sets_slug_with_new_name() {
        let set = TourUpdate {
            name: Some("  The City Wanderer ".to_string()),
            ..Default::default()
        }
        .into_set_document()
        .unwrap();
        assert_eq!(set.get_str("name").unwrap(), "The City Wanderer");
        assert_eq!(set.get_str("slug").unwrap(), "the-city-wanderer");
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn update_rounds_rating_and_validates_present_fields_only() {
        let set = TourUpdate {
            ratings_average: Some(4.666),
            difficulty: Some("medium".to_string()),
            ..Default::default()
        }
        .into_set_document()
        .unwrap();
        assert_eq!(set.get_f64("ratingsAverage").unwrap(), 4.7);
        assert_eq!(set.get_str("difficulty").unwrap(), "medium");
        assert!(!set.contains_key("slug"));

        let err = TourUpdate {
            name: Some("tiny".to_string()),
            summary: Some(" ".to_string()),
            difficulty: Some("hard".to_string()),
            ..Default::default()
        }
        .into_set_document()
        .unwrap_err();
        assert_eq!(
            err.validation_report().unwrap().fields(),
            vec!["difficulty", "name", "summary"]
        );
    }

    #[test]
    fn update_discount_is_only_checked_against_price_in_the_same_update() {
        // the stored price is unknown here, so a lone discount passes
        let set = TourUpdate {
            price_discount: Some(5000.0),
            ..Default::default()
        }
        .into_set_document()
        .unwrap();
        assert_eq!(set.get_f64("priceDiscount").unwrap(), 5000.0);

        let err = TourUpdate {
            price: Some(100.0),
            price_discount: Some(150.0),
            ..Default::default()
        }
        .into_set_document()
        .unwrap_err();
        assert!(err.validation_report().unwrap().has_field("priceDiscount"));
    }

    #[test]
    fn empty_update_changes_nothing() {
        assert!(TourUpdate::default().into_set_document().unwrap().is_empty());
    }
}
