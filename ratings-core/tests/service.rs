use engine::error::RemoteMessage;
use engine::request::{RequestStatus, Settlement, StalePolicy};
use engine::{Listing, Pagination};
use error_stack::Report;
use ratings_core::list_filter::{RatingFilter, RatingSort};
use ratings_core::model::{NewRating, PatchRating, Rating, RatingId, StoreId};
use ratings_core::result::{OptRepoResult, RatingRepoError, RepoResult};
use ratings_core::service::RatingService;
use ratings_core::slice::RatingOperation;
use ratings_core::{RatingEngine, RatingRepository};
use engine::selector::Sort;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

type Gate = oneshot::Receiver<()>;

#[derive(Default)]
struct FakeRepo {
    store_lists: Mutex<HashMap<StoreId, VecDeque<(Option<Gate>, RepoResult<Listing<Rating>>)>>>,
    stored: Mutex<Vec<Rating>>,
    remote_calls: Mutex<usize>,
    fail_deletes: bool,
}

impl FakeRepo {
    fn with_stored(ratings: Vec<Rating>) -> Self {
        Self {
            stored: Mutex::new(ratings),
            ..Default::default()
        }
    }

    fn script_gated_store_list(&self, store_id: StoreId, ratings: Vec<Rating>) -> oneshot::Sender<()> {
        let (open, gate) = oneshot::channel();
        self.store_lists
            .lock()
            .unwrap()
            .entry(store_id)
            .or_default()
            .push_back((Some(gate), Ok(Listing::unpaged(ratings))));
        open
    }

    fn remote_calls(&self) -> usize {
        *self.remote_calls.lock().unwrap()
    }

    fn called(&self) {
        *self.remote_calls.lock().unwrap() += 1;
    }
}

impl RatingRepository for FakeRepo {
    async fn list(&self, _pagination: Pagination) -> RepoResult<Listing<Rating>> {
        self.called();
        Ok(Listing::unpaged(self.stored.lock().unwrap().clone()))
    }

    async fn list_for_store(
        &self,
        store_id: StoreId,
        _pagination: Pagination,
    ) -> RepoResult<Listing<Rating>> {
        self.called();
        let scripted = self
            .store_lists
            .lock()
            .unwrap()
            .get_mut(&store_id)
            .and_then(VecDeque::pop_front);
        match scripted {
            Some((gate, result)) => {
                if let Some(gate) = gate {
                    gate.await.expect("gate opened");
                }
                result
            }
            None => Ok(Listing::unpaged(
                self.stored
                    .lock()
                    .unwrap()
                    .iter()
                    .filter(|r| r.store_id == store_id)
                    .cloned()
                    .collect(),
            )),
        }
    }

    async fn get(&self, id: RatingId) -> OptRepoResult<Rating> {
        self.called();
        Ok(self.stored.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn create(&self, new_rating: NewRating) -> RepoResult<Rating> {
        self.called();
        let mut stored = self.stored.lock().unwrap();
        let rating = Rating::create(RatingId(stored.len() as u64 + 100), new_rating);
        stored.push(rating.clone());
        Ok(rating)
    }

    async fn patch(&self, id: RatingId, patch: PatchRating) -> OptRepoResult<Rating> {
        self.called();
        let mut stored = self.stored.lock().unwrap();
        Ok(stored.iter_mut().find(|r| r.id == id).map(|rating| {
            patch.apply(rating);
            rating.clone()
        }))
    }

    async fn delete(&self, id: RatingId) -> OptRepoResult<()> {
        self.called();
        if self.fail_deletes {
            return Err(Report::new(RatingRepoError::Delete)
                .attach(RemoteMessage("you can only delete your own ratings".into())));
        }
        let mut stored = self.stored.lock().unwrap();
        let before = stored.len();
        stored.retain(|r| r.id != id);
        Ok((stored.len() != before).then_some(()))
    }

    async fn like(&self, id: RatingId) -> OptRepoResult<Rating> {
        self.called();
        let mut stored = self.stored.lock().unwrap();
        Ok(stored.iter_mut().find(|r| r.id == id).map(|rating| {
            rating.likes += 1;
            rating.clone()
        }))
    }
}

#[derive(Clone)]
struct TestEngine {
    repo: Arc<FakeRepo>,
}

impl RatingEngine for TestEngine {
    type Repo = Arc<FakeRepo>;

    fn repo(&self) -> Self::Repo {
        Arc::clone(&self.repo)
    }
}

fn service(repo: FakeRepo, policy: StalePolicy) -> (RatingService<TestEngine>, Arc<FakeRepo>) {
    let repo = Arc::new(repo);
    let engine = TestEngine {
        repo: Arc::clone(&repo),
    };
    (RatingService::new(engine, policy, 10), repo)
}

fn rating(id: u64, store: u64, score: u8) -> Rating {
    Rating::create(RatingId(id), NewRating::new(StoreId(store), "user", score))
}

fn ids(ratings: &[Rating]) -> Vec<u64> {
    ratings.iter().map(|r| r.id.0).collect()
}

async fn wait_for_store_dispatch(service: &RatingService<TestEngine>, store_id: StoreId, generation: u64) {
    while service
        .request(RatingOperation::FetchStoreRatings(store_id))
        .await
        .generation()
        < generation
    {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn store_ratings_feed_the_summary() {
    let repo = FakeRepo::with_stored(vec![rating(1, 1, 5), rating(2, 1, 3), rating(3, 2, 1)]);
    let (service, _) = service(repo, StalePolicy::default());

    assert!(service.summary(StoreId(1)).await.is_none());
    let settlement = service
        .fetch_store_ratings(StoreId(1), Pagination::default())
        .await;

    assert_eq!(Settlement::Fulfilled, settlement);
    let summary = service.summary(StoreId(1)).await.unwrap();
    assert_eq!(2, summary.count);
    assert_eq!(4.0, summary.average);
    assert_eq!(
        RequestStatus::Fulfilled,
        service
            .request(RatingOperation::FetchStoreRatings(StoreId(1)))
            .await
            .status
    );
    assert_eq!(
        RequestStatus::Idle,
        service
            .request(RatingOperation::FetchStoreRatings(StoreId(2)))
            .await
            .status
    );
}

#[tokio::test]
async fn overlapping_fetches_of_different_stores_both_apply() {
    let repo = FakeRepo::default();
    let open_first = repo.script_gated_store_list(StoreId(1), vec![rating(1, 1, 5)]);
    let open_second = repo.script_gated_store_list(StoreId(2), vec![rating(2, 2, 4)]);
    let (service, _) = service(repo, StalePolicy::LatestDispatch);

    let first = tokio::spawn({
        let service = service.clone();
        async move { service.fetch_store_ratings(StoreId(1), Pagination::default()).await }
    });
    wait_for_store_dispatch(&service, StoreId(1), 1).await;
    let second = tokio::spawn({
        let service = service.clone();
        async move { service.fetch_store_ratings(StoreId(2), Pagination::default()).await }
    });
    wait_for_store_dispatch(&service, StoreId(2), 1).await;

    open_second.send(()).unwrap();
    assert_eq!(Settlement::Fulfilled, second.await.unwrap());
    open_first.send(()).unwrap();
    assert_eq!(Settlement::Fulfilled, first.await.unwrap());

    let (first_store, second_store) = service
        .read(|slice| (slice.store_ratings(StoreId(1)), slice.store_ratings(StoreId(2))))
        .await;
    assert_eq!(vec![1], ids(&first_store.unwrap()));
    assert_eq!(vec![2], ids(&second_store.unwrap()));
}

#[tokio::test]
async fn overlapping_fetches_of_same_store_keep_latest() {
    let repo = FakeRepo::default();
    let open_first = repo.script_gated_store_list(StoreId(1), vec![rating(1, 1, 5)]);
    let open_second = repo.script_gated_store_list(StoreId(1), vec![rating(2, 1, 4)]);
    let (service, _) = service(repo, StalePolicy::LatestDispatch);

    let first = tokio::spawn({
        let service = service.clone();
        async move { service.fetch_store_ratings(StoreId(1), Pagination::default()).await }
    });
    wait_for_store_dispatch(&service, StoreId(1), 1).await;
    let second = tokio::spawn({
        let service = service.clone();
        async move { service.fetch_store_ratings(StoreId(1), Pagination::default()).await }
    });
    wait_for_store_dispatch(&service, StoreId(1), 2).await;

    open_second.send(()).unwrap();
    assert_eq!(Settlement::Fulfilled, second.await.unwrap());
    open_first.send(()).unwrap();
    assert_eq!(Settlement::Stale, first.await.unwrap());

    let ratings = service.read(|slice| slice.store_ratings(StoreId(1))).await;
    assert_eq!(vec![2], ids(&ratings.unwrap()));
}

#[tokio::test]
async fn like_updates_every_view() {
    let repo = FakeRepo::with_stored(vec![rating(1, 1, 5), rating(2, 1, 3)]);
    let (service, _) = service(repo, StalePolicy::default());
    service.fetch_ratings(Pagination::default()).await;
    service.fetch_store_ratings(StoreId(1), Pagination::default()).await;
    service.fetch_rating(RatingId(2)).await;

    let settlement = service.like_rating(RatingId(2)).await;

    assert_eq!(Settlement::Fulfilled, settlement);
    let criteria = service
        .criteria(Pagination::default())
        .sorted(Sort::descending(RatingSort::Likes));
    let page = service.store_view(StoreId(1), &criteria).await.unwrap();
    assert_eq!(vec![2, 1], ids(&page.items));
    assert_eq!(1, service.read(|slice| slice.selected()).await.unwrap().likes);
    assert_eq!(1, service.read(|slice| slice.rating(RatingId(2))).await.unwrap().likes);
}

#[tokio::test]
async fn like_of_unknown_rating_is_rejected() {
    let (service, _) = service(FakeRepo::default(), StalePolicy::default());

    let settlement = service.like_rating(RatingId(9)).await;

    assert_eq!(Settlement::Rejected("rating 9 not found".into()), settlement);
}

#[tokio::test]
async fn invalid_rating_never_reaches_remote() {
    let (service, repo) = service(FakeRepo::default(), StalePolicy::default());

    let settlement = service
        .create_rating(NewRating::new(StoreId(1), "user", 0))
        .await;

    assert_eq!(
        Settlement::Rejected("score must be between 1 and 5, got 0".into()),
        settlement
    );
    assert_eq!(0, repo.remote_calls());
    assert_eq!(
        Some("score must be between 1 and 5, got 0".to_owned()),
        service.request(RatingOperation::CreateRating).await.error
    );
}

#[tokio::test]
async fn invalid_patch_never_reaches_remote() {
    let (service, repo) = service(FakeRepo::with_stored(vec![rating(1, 1, 5)]), StalePolicy::default());

    let settlement = service
        .update_rating(RatingId(1), PatchRating::score(7))
        .await;

    assert!(!settlement.is_fulfilled());
    assert_eq!(0, repo.remote_calls());
}

#[tokio::test]
async fn created_rating_joins_loaded_store() {
    let repo = FakeRepo::with_stored(vec![rating(1, 1, 5)]);
    let (service, _) = service(repo, StalePolicy::default());
    service.fetch_store_ratings(StoreId(1), Pagination::default()).await;

    let settlement = service
        .create_rating(NewRating::new(StoreId(1), "someone", 2).with_text("slow service"))
        .await;

    assert_eq!(Settlement::Fulfilled, settlement);
    let ratings = service.read(|slice| slice.store_ratings(StoreId(1))).await;
    assert_eq!(vec![101, 1], ids(&ratings.unwrap()));
    let summary = service.summary(StoreId(1)).await.unwrap();
    assert_eq!(3.5, summary.average);
}

#[tokio::test]
async fn rejected_delete_keeps_rating_and_reports_remote_message() {
    let repo = FakeRepo {
        fail_deletes: true,
        ..FakeRepo::with_stored(vec![rating(1, 1, 5)])
    };
    let (service, _) = service(repo, StalePolicy::default());
    service.fetch_ratings(Pagination::default()).await;

    let settlement = service.delete_rating(RatingId(1)).await;

    assert_eq!(
        Settlement::Rejected("you can only delete your own ratings".into()),
        settlement
    );
    assert_eq!(1, service.read(|slice| slice.len()).await);
    assert_eq!(
        Some("you can only delete your own ratings".to_owned()),
        service.clear_error(RatingOperation::DeleteRating).await
    );
    assert_eq!(
        RequestStatus::Idle,
        service.request(RatingOperation::DeleteRating).await.status
    );
}

#[tokio::test]
async fn filtered_view_over_latest_ratings() {
    let repo = FakeRepo::with_stored(vec![rating(1, 1, 5), rating(2, 2, 2), rating(3, 3, 4)]);
    let (service, _) = service(repo, StalePolicy::default());
    service.fetch_ratings(Pagination::default()).await;

    let criteria = service
        .criteria(Pagination::with_page_size(1, 1))
        .with(RatingFilter::MinScore(4))
        .sorted(Sort::ascending(RatingSort::Score));
    let page = service.view(&criteria).await;

    assert_eq!(vec![3], ids(&page.items));
    assert_eq!(2, page.total);
    assert_eq!(2, page.page_count);
}

#[tokio::test]
async fn forgetting_a_store_drops_its_ratings() {
    let repo = FakeRepo::with_stored(vec![rating(1, 1, 5), rating(2, 2, 2)]);
    let (service, _) = service(repo, StalePolicy::default());
    service.fetch_ratings(Pagination::default()).await;
    service.fetch_store_ratings(StoreId(1), Pagination::default()).await;

    assert_eq!(1, service.forget_store(StoreId(1)).await);

    assert!(service.summary(StoreId(1)).await.is_none());
    assert_eq!(vec![2], ids(&service.read(|slice| slice.ratings()).await));
}
