use bson::{doc, oid::ObjectId, Document};
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumString};

use crate::error::{ServiceError, ValidationReport};

/// Filter hiding secret tours from regular retrieval
pub fn visible_tours_filter() -> Document {
    doc! { "secretTour": { "$ne": true } }
}

/// Unit used for radius searches and reported distances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Km,
    Mi,
}

impl DistanceUnit {
    /// Earth radius in this unit, to turn a distance into radians
    pub fn earth_radius(&self) -> f64 {
        match self {
            DistanceUnit::Km => 6378.1,
            DistanceUnit::Mi => 3963.2,
        }
    }

    /// Factor converting the meters reported by `$geoNear` into this unit
    pub fn meters_multiplier(&self) -> f64 {
        match self {
            DistanceUnit::Km => 0.001,
            DistanceUnit::Mi => 0.000621371,
        }
    }

    /// Distance converted to radians, as `$centerSphere` expects
    pub fn to_radians(&self, distance: f64) -> f64 {
        distance / self.earth_radius()
    }
}

/// A reference point, written `lat,lng`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// GeoJSON order: `[lng, lat]`
    pub fn coordinates(&self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

impl FromStr for LatLng {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            let mut report = ValidationReport::new();
            report.add(
                "latlng",
                "Please provide latitude and longitude in the format lat,lng",
            );
            ServiceError::Validation(report)
        };
        let (lat, lng) = s.split_once(',').ok_or_else(invalid)?;
        let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
        let lng: f64 = lng.trim().parse().map_err(|_| invalid())?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(invalid());
        }
        Ok(Self { lat, lng })
    }
}

/// Describes one tour retrieval.
///
/// Secret tours are filtered out and guides populated unless the caller opts
/// out explicitly. `createdAt` is left out of results unless selected.
#[derive(Debug, Clone, PartialEq)]
pub struct TourQuery {
    filter: Document,
    include_secret: bool,
    populate_guides: bool,
    with_reviews: bool,
    select_created_at: bool,
    sort: Option<Document>,
    skip: Option<i64>,
    limit: Option<i64>,
}

impl Default for TourQuery {
    fn default() -> Self {
        Self {
            filter: Document::new(),
            include_secret: false,
            populate_guides: true,
            with_reviews: false,
            select_created_at: false,
            sort: None,
            skip: None,
            limit: None,
        }
    }
}

impl TourQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: ObjectId) -> Self {
        Self::new().filter(doc! { "_id": id })
    }

    pub fn by_slug(slug: &str) -> Self {
        Self::new().filter(doc! { "slug": slug })
    }

    /// Adds conditions to the filter; a repeated key replaces the earlier one
    pub fn filter(mut self, filter: Document) -> Self {
        self.filter.extend(filter);
        self
    }

    /// Restricts results to tours starting within `distance` of `center`
    pub fn within(self, center: LatLng, distance: f64, unit: DistanceUnit) -> Self {
        let radius = unit.to_radians(distance);
        self.filter(doc! {
            "startLocation": {
                "$geoWithin": { "$centerSphere": [center.coordinates().to_vec(), radius] }
            }
        })
    }

    /// Lets secret tours through
    pub fn include_secret(mut self) -> Self {
        self.include_secret = true;
        self
    }

    /// Leaves `guides` as plain ids
    pub fn without_guides(mut self) -> Self {
        self.populate_guides = false;
        self
    }

    /// Joins each tour's reviews into the result
    pub fn with_reviews(mut self) -> Self {
        self.with_reviews = true;
        self
    }

    pub fn select_created_at(mut self) -> Self {
        self.select_created_at = true;
        self
    }

    pub fn sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn skip(mut self, skip: i64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn includes_secret(&self) -> bool {
        self.include_secret
    }

    pub fn populates_guides(&self) -> bool {
        self.populate_guides
    }

    pub fn includes_reviews(&self) -> bool {
        self.with_reviews
    }

    /// Caller filter combined with the secret-tour filter
    pub fn match_document(&self) -> Document {
        match (self.include_secret, self.filter.is_empty()) {
            (true, _) => self.filter.clone(),
            (false, true) => visible_tours_filter(),
            (false, false) => doc! { "$and": [visible_tours_filter(), self.filter.clone()] },
        }
    }

    /// Aggregation pipeline fetching the matching tours
    pub fn pipeline(&self) -> Vec<Document> {
        let mut pipeline = vec![
            doc! { "$match": self.match_document() },
            doc! { "$sort": self.sort.clone().unwrap_or(doc! { "_id": 1 }) },
        ];
        if let Some(skip) = self.skip {
            pipeline.push(doc! { "$skip": skip });
        }
        if let Some(limit) = self.limit {
            pipeline.push(doc! { "$limit": limit });
        }
        if !self.select_created_at {
            pipeline.push(doc! { "$project": { "createdAt": 0 } });
        }
        pipeline
    }
}

/// Aggregation pipeline listing every visible tour with its distance from
/// `center`, nearest first.
///
/// `$geoNear` has to open the pipeline, so the secret-tour filter goes into
/// its `query` option.
pub fn distances_pipeline(center: LatLng, unit: DistanceUnit) -> Vec<Document> {
    vec![
        doc! {
            "$geoNear": {
                "near": { "type": "Point", "coordinates": center.coordinates().to_vec() },
                "distanceField": "distance",
                "distanceMultiplier": unit.meters_multiplier(),
                "query": visible_tours_filter(),
                "spherical": true,
            }
        },
        doc! { "$project": { "name": 1, "distance": 1 } },
    ]
}
