//! In-memory rating aggregate store.

use parking_lot::RwLock;
use std::collections::HashMap;

/// Running rating aggregate for one laptop. `average = sum / count`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rating {
    pub count: u32,
    pub sum: f64,
}

/// Storage interface for rating aggregates.
pub trait RatingStore: Send + Sync {
    /// Records one score and returns the post-update aggregate.
    ///
    /// The aggregate is created lazily on the first score for a laptop id
    /// and never reset. There is no user-visible error path.
    fn add(&self, laptop_id: &str, score: f64) -> Rating;
}

/// In-memory [`RatingStore`].
#[derive(Default)]
pub struct InMemoryRatingStore {
    ratings: RwLock<HashMap<String, Rating>>,
}

impl InMemoryRatingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RatingStore for InMemoryRatingStore {
    fn add(&self, laptop_id: &str, score: f64) -> Rating {
        let mut ratings = self.ratings.write();
        let rating = ratings.entry(laptop_id.to_owned()).or_default();
        rating.count += 1;
        rating.sum += score;
        *rating
    }
}
