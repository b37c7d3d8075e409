//! Client-side state for ratings. Besides the main collection (latest ratings), ratings are
//! grouped by the store they belong to as each store's ratings get loaded.
use crate::list_filter::RatingListCriteria;
use crate::model::{MAX_SCORE, Rating, RatingId, StoreId};
use engine::handle::Slice;
use engine::request::{
    OperationKey, RequestState, RequestTracker, Settled, Settlement, StalePolicy, Ticket,
};
use engine::selector::{self, Page};
use engine::store::EntityStore;
use engine::{Listing, PageInfo};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Fetching one store's ratings is tracked per store, so loading two stores at once does not
/// make one of them stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RatingOperation {
    FetchRatings,
    FetchStoreRatings(StoreId),
    FetchRating,
    CreateRating,
    UpdateRating,
    DeleteRating,
    LikeRating,
}

impl OperationKey for RatingOperation {
    fn name(&self) -> &'static str {
        match self {
            RatingOperation::FetchRatings => "fetchRatings",
            RatingOperation::FetchStoreRatings(_) => "fetchStoreRatings",
            RatingOperation::FetchRating => "fetchRating",
            RatingOperation::CreateRating => "createRating",
            RatingOperation::UpdateRating => "updateRating",
            RatingOperation::DeleteRating => "deleteRating",
            RatingOperation::LikeRating => "likeRating",
        }
    }

    fn supersedable(&self) -> bool {
        matches!(
            self,
            RatingOperation::FetchRatings
                | RatingOperation::FetchStoreRatings(_)
                | RatingOperation::FetchRating
        )
    }
}

/// Score breakdown of one store's loaded ratings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingSummary {
    pub count: u64,
    pub average: f64,
    /// Number of ratings per score, index 0 holding the 1 star ratings.
    pub histogram: [u64; MAX_SCORE as usize],
}

impl RatingSummary {
    fn of<'a>(ratings: impl IntoIterator<Item = &'a Rating>) -> Self {
        let mut histogram = [0; MAX_SCORE as usize];
        let mut count = 0;
        let mut sum = 0u64;
        for rating in ratings {
            count += 1;
            sum += u64::from(rating.score);
            if let Some(bucket) = usize::from(rating.score)
                .checked_sub(1)
                .and_then(|i| histogram.get_mut(i))
            {
                *bucket += 1;
            }
        }
        let average = if count == 0 {
            0.0
        } else {
            sum as f64 / count as f64
        };
        Self {
            count,
            average,
            histogram,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RatingSlice {
    store: EntityStore<Rating, StoreId>,
    requests: RequestTracker<RatingOperation>,
    page_info: Option<PageInfo>,
    store_page_info: HashMap<StoreId, PageInfo>,
}

impl Slice for RatingSlice {
    type Operation = RatingOperation;

    fn requests(&mut self) -> &mut RequestTracker<RatingOperation> {
        &mut self.requests
    }
}

impl RatingSlice {
    pub fn new(policy: StalePolicy) -> Self {
        Self {
            requests: RequestTracker::new(policy),
            ..Default::default()
        }
    }

    pub fn begin(&mut self, operation: RatingOperation) -> Ticket<RatingOperation> {
        self.requests.begin(operation)
    }

    pub fn settle_fetch_ratings(
        &mut self,
        ticket: Ticket<RatingOperation>,
        result: Result<Listing<Rating>, String>,
    ) -> Settlement {
        match self.requests.settle(ticket, result) {
            Settled::Fulfilled(listing) => {
                self.store.replace_all(listing.data);
                self.page_info = listing.pagination;
                Settlement::Fulfilled
            }
            other => other.settlement(),
        }
    }

    pub fn settle_fetch_store_ratings(
        &mut self,
        ticket: Ticket<RatingOperation>,
        store_id: StoreId,
        result: Result<Listing<Rating>, String>,
    ) -> Settlement {
        match self.requests.settle(ticket, result) {
            Settled::Fulfilled(listing) => {
                let (belonging, foreign): (Vec<_>, Vec<_>) = listing
                    .data
                    .into_iter()
                    .partition(|rating| rating.store_id == store_id);
                if !foreign.is_empty() {
                    debug!(%store_id, skipped = foreign.len(), "ignoring ratings of other stores");
                }
                self.store.set_group(store_id, belonging);
                match listing.pagination {
                    Some(info) => self.store_page_info.insert(store_id, info),
                    None => self.store_page_info.remove(&store_id),
                };
                Settlement::Fulfilled
            }
            other => other.settlement(),
        }
    }

    pub fn settle_fetch_rating(
        &mut self,
        ticket: Ticket<RatingOperation>,
        result: Result<Rating, String>,
    ) -> Settlement {
        match self.requests.settle(ticket, result) {
            Settled::Fulfilled(rating) => {
                self.store.select(rating);
                Settlement::Fulfilled
            }
            other => other.settlement(),
        }
    }

    pub fn settle_create(
        &mut self,
        ticket: Ticket<RatingOperation>,
        result: Result<Rating, String>,
    ) -> Settlement {
        match self.requests.settle(ticket, result) {
            Settled::Fulfilled(rating) => {
                let store_id = rating.store_id;
                self.store.prepend_to_group(&store_id, rating.clone());
                self.store.insert_one(rating);
                Settlement::Fulfilled
            }
            other => other.settlement(),
        }
    }

    /// Used for both updates and likes, which answer with the whole rating.
    pub fn settle_patch(
        &mut self,
        ticket: Ticket<RatingOperation>,
        result: Result<Rating, String>,
    ) -> Settlement {
        match self.requests.settle(ticket, result) {
            Settled::Fulfilled(rating) => {
                let id = rating.id;
                if self.store.patch_one(&id, rating).is_none() {
                    debug!(%id, "patched rating is not loaded, nothing to update");
                }
                Settlement::Fulfilled
            }
            other => other.settlement(),
        }
    }

    pub fn settle_delete(
        &mut self,
        ticket: Ticket<RatingOperation>,
        id: RatingId,
        result: Result<(), String>,
    ) -> Settlement {
        match self.requests.settle(ticket, result) {
            Settled::Fulfilled(()) => {
                if self.store.remove_one(&id).is_none() {
                    debug!(%id, "deleted rating is not loaded, nothing to remove");
                }
                Settlement::Fulfilled
            }
            other => other.settlement(),
        }
    }

    /// Drops everything loaded for `store_id`, e.g. once the store itself is gone.
    /// Ratings of that store are removed from the main collection as well.
    pub fn forget_store(&mut self, store_id: StoreId) -> usize {
        let mut forgotten = self
            .store
            .remove_group(&store_id)
            .unwrap_or_default()
            .into_iter()
            .map(|rating| rating.id)
            .collect::<HashSet<_>>();
        let listed = self
            .store
            .iter()
            .filter(|rating| rating.store_id == store_id)
            .map(|rating| rating.id)
            .collect::<Vec<_>>();
        for id in listed {
            self.store.remove_one(&id);
            forgotten.insert(id);
        }
        self.store_page_info.remove(&store_id);
        self.requests.forget(RatingOperation::FetchStoreRatings(store_id));
        forgotten.len()
    }

    pub fn request(&self, operation: RatingOperation) -> RequestState {
        self.requests.state(operation)
    }

    pub fn error(&self, operation: RatingOperation) -> Option<&str> {
        self.requests.error(operation)
    }

    pub fn is_loading(&self) -> bool {
        self.requests.is_loading()
    }

    pub fn page_info(&self) -> Option<PageInfo> {
        self.page_info
    }

    pub fn store_page_info(&self, store_id: StoreId) -> Option<PageInfo> {
        self.store_page_info.get(&store_id).copied()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn ratings(&self) -> Vec<Rating> {
        self.store.iter().cloned().collect()
    }

    pub fn rating(&self, id: RatingId) -> Option<Rating> {
        self.store.get(&id).cloned()
    }

    pub fn selected(&self) -> Option<Rating> {
        self.store.selected().cloned()
    }

    pub fn is_store_loaded(&self, store_id: StoreId) -> bool {
        self.store.has_group(&store_id)
    }

    /// `None` until the store's ratings have been fetched.
    pub fn store_ratings(&self, store_id: StoreId) -> Option<Vec<Rating>> {
        self.store
            .group(&store_id)
            .map(|ratings| ratings.cloned().collect())
    }

    pub fn view(&self, criteria: &RatingListCriteria) -> Page<Rating> {
        selector::select(self.store.iter(), criteria)
    }

    pub fn store_view(&self, store_id: StoreId, criteria: &RatingListCriteria) -> Option<Page<Rating>> {
        self.store
            .group(&store_id)
            .map(|ratings| selector::select(ratings, criteria))
    }

    pub fn summary(&self, store_id: StoreId) -> Option<RatingSummary> {
        self.store.group(&store_id).map(RatingSummary::of)
    }
}
