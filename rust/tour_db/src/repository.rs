use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use mongodb::{options::UpdateModifications, Client as MongoDBClient};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use crate::config::DbConfig;
use crate::error::ServiceError;
use crate::mongodb::{MongoCollection, MongoDbAPI};
use crate::query::{distances_pipeline, DistanceUnit, LatLng, TourQuery};
use crate::schemas::user::user_summary_projection;
use crate::schemas::{Review, Tour, TourDistance, TourView, User, UserSummary};
use crate::validation::{NewTour, TourUpdate};

/// Resolves guide ids into the public part of the referenced users.
#[async_trait]
pub trait GuideLookup: Send + Sync {
    /// Returns the summaries of the users that exist among `ids`, in no particular order
    async fn find_guides(&self, ids: &[ObjectId]) -> Result<Vec<UserSummary>, ServiceError>;
}

/// Finds the reviews written about a set of tours.
#[async_trait]
pub trait ReviewLookup: Send + Sync {
    async fn find_reviews_for(&self, tour_ids: &[ObjectId]) -> Result<Vec<Review>, ServiceError>;
}

#[async_trait]
impl GuideLookup for MongoCollection<User> {
    async fn find_guides(&self, ids: &[ObjectId]) -> Result<Vec<UserSummary>, ServiceError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        self.aggregate::<UserSummary>(vec![
            doc! { "$match": { "_id": { "$in": ids.to_vec() } } },
            doc! { "$project": user_summary_projection() },
        ])
        .await
    }
}

#[async_trait]
impl ReviewLookup for MongoCollection<Review> {
    async fn find_reviews_for(&self, tour_ids: &[ObjectId]) -> Result<Vec<Review>, ServiceError> {
        if tour_ids.is_empty() {
            return Ok(vec![]);
        }
        self.aggregate::<Review>(vec![
            doc! { "$match": { "tour": { "$in": tour_ids.to_vec() } } },
            doc! { "$sort": { "createdAt": -1 } },
        ])
        .await
    }
}

/// Entry point for everything stored about tours.
///
/// Writes validate before touching the database; reads go through a
/// [`TourQuery`], which decides whether secret tours are visible and which
/// references get resolved.
#[derive(Clone)]
pub struct TourRepository<C = MongoCollection<Tour>> {
    tours: C,
    guides: Arc<dyn GuideLookup>,
    reviews: Arc<dyn ReviewLookup>,
}

impl TourRepository {
    /// Opens the tour, user and review collections and applies their indices.
    pub async fn connect(client: &MongoDBClient, config: &DbConfig) -> Result<Self, ServiceError> {
        let tours =
            MongoCollection::<Tour>::new(client, &config.database_name, &config.tour_collection)
                .await?;
        let users =
            MongoCollection::<User>::new(client, &config.database_name, &config.user_collection)
                .await?;
        let reviews = MongoCollection::<Review>::new(
            client,
            &config.database_name,
            &config.review_collection,
        )
        .await?;

        Ok(Self::new(tours, Arc::new(users), Arc::new(reviews)))
    }
}

impl<C> TourRepository<C>
where
    C: MongoDbAPI<Tour, Error = ServiceError> + Send + Sync,
{
    pub fn new(tours: C, guides: Arc<dyn GuideLookup>, reviews: Arc<dyn ReviewLookup>) -> Self {
        Self {
            tours,
            guides,
            reviews,
        }
    }

    /// The underlying tour collection
    pub fn collection(&self) -> &C {
        &self.tours
    }

    /// Validates `input` and inserts it as a new tour.
    ///
    /// Returns the stored document, including its id, slug and creation time.
    pub async fn create(&self, input: NewTour) -> Result<Tour, ServiceError> {
        let mut tour = input.into_tour()?;
        let id = self.tours.insert_one_into(&mut tour).await?;
        tour._id = Some(id);
        log::info!("Created tour '{}' ({})", tour.name, id);
        Ok(tour)
    }

    /// Replaces a stored tour with `tour` after validating the whole document.
    ///
    /// Text fields are trimmed, the rating rounded and the slug derived again
    /// from the name on the way in. `createdAt` always keeps the stored value,
    /// so a tour read without it can be saved back.
    pub async fn save(&self, mut tour: Tour) -> Result<Tour, ServiceError> {
        let id = tour
            ._id
            .ok_or_else(|| ServiceError::not_found("Cannot save a tour without an id"))?;
        tour.normalize();
        tour.validate_document()?;

        let Some(stored) = self.tours.get_one_from(doc! { "_id": id }).await? else {
            return Err(ServiceError::not_found(format!("No tour with id {}", id)));
        };
        tour.created_at = stored.created_at.or(tour.created_at);

        let outcome = self
            .tours
            .replace_one_within(doc! { "_id": id }, &mut tour)
            .await?;
        if outcome.matched_count == 0 {
            return Err(ServiceError::not_found(format!("No tour with id {}", id)));
        }
        Ok(tour)
    }

    /// Applies a partial update to the visible tour with `id`.
    pub async fn update(
        &self,
        id: ObjectId,
        update: TourUpdate,
    ) -> Result<Option<TourView>, ServiceError> {
        self.update_matching(TourQuery::by_id(id), update).await
    }

    /// Applies a partial update to the first tour matched by `query` and
    /// returns it as `query` would read it.
    ///
    /// Returns `None` when nothing matches; secret tours only match when the
    /// query includes them.
    pub async fn update_matching(
        &self,
        query: TourQuery,
        update: TourUpdate,
    ) -> Result<Option<TourView>, ServiceError> {
        let set = update.into_set_document()?;

        let Some(target) = self.tours.get_one_from(query.match_document()).await? else {
            return Ok(None);
        };
        let id = target._id.ok_or_else(|| {
            ServiceError::internal("Stored tour has no id", Some("update".to_string()))
        })?;

        if !set.is_empty() {
            self.tours
                .update_one_within(
                    doc! { "_id": id },
                    UpdateModifications::Document(doc! { "$set": set }),
                )
                .await?;
        }

        let mut reread = TourQuery::by_id(id).include_secret();
        if !query.populates_guides() {
            reread = reread.without_guides();
        }
        if query.includes_reviews() {
            reread = reread.with_reviews();
        }
        self.find_one(reread).await
    }

    /// Deletes the tour with `id`, secret or not.
    ///
    /// Returns whether a tour was removed.
    pub async fn delete(&self, id: ObjectId) -> Result<bool, ServiceError> {
        let deleted = self.tours.delete_one_from(doc! { "_id": id }).await?;
        Ok(deleted > 0)
    }

    pub async fn find(&self, query: TourQuery) -> Result<Vec<TourView>, ServiceError> {
        let started = Instant::now();
        let tours = self.tours.aggregate::<Tour>(query.pipeline()).await?;
        let views = self.resolve(tours, &query).await?;
        log::debug!(
            "Tour query returned {} tours in {} ms",
            views.len(),
            started.elapsed().as_millis()
        );
        Ok(views)
    }

    pub async fn find_one(&self, query: TourQuery) -> Result<Option<TourView>, ServiceError> {
        Ok(self.find(query.limit(1)).await?.into_iter().next())
    }

    pub async fn find_by_id(&self, id: ObjectId) -> Result<Option<TourView>, ServiceError> {
        self.find_one(TourQuery::by_id(id)).await
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<TourView>, ServiceError> {
        self.find_one(TourQuery::by_slug(slug)).await
    }

    pub async fn count(&self, query: &TourQuery) -> Result<u64, ServiceError> {
        let started = Instant::now();
        let count = self.tours.count_in(query.match_document()).await?;
        log::debug!(
            "Tour count returned {} in {} ms",
            count,
            started.elapsed().as_millis()
        );
        Ok(count)
    }

    /// Visible tours whose start location lies within `distance` of `center`
    pub async fn tours_within(
        &self,
        center: LatLng,
        distance: f64,
        unit: DistanceUnit,
    ) -> Result<Vec<TourView>, ServiceError> {
        self.find(TourQuery::new().within(center, distance, unit))
            .await
    }

    /// Every visible tour with its distance from `center`, nearest first
    pub async fn distances_from(
        &self,
        center: LatLng,
        unit: DistanceUnit,
    ) -> Result<Vec<TourDistance>, ServiceError> {
        let started = Instant::now();
        let distances = self
            .tours
            .aggregate::<TourDistance>(distances_pipeline(center, unit))
            .await?;
        log::debug!(
            "Distance query from {} returned {} tours in {} ms",
            center,
            distances.len(),
            started.elapsed().as_millis()
        );
        Ok(distances)
    }

    /// Reviews written about the tour with `id`, newest first
    pub async fn reviews_for(&self, id: ObjectId) -> Result<Vec<Review>, ServiceError> {
        self.reviews.find_reviews_for(&[id]).await
    }

    async fn resolve(
        &self,
        tours: Vec<Tour>,
        query: &TourQuery,
    ) -> Result<Vec<TourView>, ServiceError> {
        let mut views: Vec<TourView> = tours.into_iter().map(TourView::new).collect();

        if query.populates_guides() {
            let ids: Vec<ObjectId> = views
                .iter()
                .flat_map(|view| view.guide_ids().iter().copied())
                .collect::<HashSet<ObjectId>>()
                .into_iter()
                .collect();
            let users: HashMap<ObjectId, UserSummary> = if ids.is_empty() {
                HashMap::new()
            } else {
                self.guides
                    .find_guides(&ids)
                    .await?
                    .into_iter()
                    .map(|user| (user._id, user))
                    .collect()
            };
            for view in views.iter_mut() {
                view.populate_guides(&users);
            }
        }

        if query.includes_reviews() {
            let ids: Vec<ObjectId> = views.iter().filter_map(|view| view.tour._id).collect();
            let mut by_tour: HashMap<ObjectId, Vec<Review>> = HashMap::new();
            for review in self.reviews.find_reviews_for(&ids).await? {
                by_tour.entry(review.tour).or_default().push(review);
            }
            for view in views.iter_mut() {
                let reviews = view
                    .tour
                    ._id
                    .and_then(|id| by_tour.remove(&id))
                    .unwrap_or_default();
                view.attach_reviews(reviews);
            }
        }

        Ok(views)
    }
}
