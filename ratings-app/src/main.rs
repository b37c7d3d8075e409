use app::{AppError, AppResult};
use categories_core::list_filter::{CategoryFilter, CategorySort, CategoryStatus};
use categories_core::service::CategoryService;
use categories_core::{CategoryEngine, CategoryRepository};
use config::Config;
use dotenv::dotenv;
use engine::Pagination;
use engine::request::Settlement;
use engine::selector::Sort;
use error_stack::ResultExt;
use error_stack::fmt::ColorMode;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use ratings_core::list_filter::RatingSort;
use ratings_core::model::StoreId;
use ratings_core::service::RatingService;
use ratings_core::{RatingEngine, RatingRepository};
use repositories::http::ApiClient;
use repositories::http::categories::CategoryRepo;
use repositories::http::ratings::RatingRepo;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

mod app;
mod config;

#[tokio::main]
async fn main() {
    match try_main().await {
        Ok(_) => info!("ratings client shutting down"),
        Err(e) => {
            error!("ratings client exited with error: {e:?}");
        }
    }
}

fn init_logging() {
    error_stack::Report::set_color_mode(ColorMode::None);

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_env("RATINGS_LOG"))
        .init();
}

fn setup_recorder() -> AppResult<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .change_context(AppError)
        .attach("failed to install metrics recorder")
}

async fn try_main() -> AppResult<()> {
    init_logging();

    if let Err(e) = dotenv() {
        warn!("failed to load .env file: {e}");
    }

    let config = Config::from_env()?;
    debug!(?config, "loaded config");

    let metrics = if config.metrics {
        Some(setup_recorder()?)
    } else {
        None
    };

    let api = ApiClient::new(&config.api_url).change_context(AppError)?;
    let categories = CategoryService::new(
        ApiEngine::new(CategoryRepo::new(api.clone())),
        config.stale_policy,
        config.page_size,
    );
    let ratings = RatingService::new(
        ApiEngine::new(RatingRepo::new(api)),
        config.stale_policy,
        config.page_size,
    );

    tokio::spawn(log_changes("categories", categories.subscribe()));
    tokio::spawn(log_changes("ratings", ratings.subscribe()));

    browse(&categories, &ratings, config.store_id).await;

    if let Some(handle) = metrics {
        info!("request metrics:\n{}", handle.render());
    }
    Ok(())
}

async fn log_changes(slice: &'static str, mut changes: watch::Receiver<u64>) {
    while changes.changed().await.is_ok() {
        let revision = *changes.borrow_and_update();
        debug!(slice, revision, "slice changed");
    }
}

#[instrument(skip_all)]
async fn browse<C, R>(categories: &CategoryService<C>, ratings: &RatingService<R>, store_id: Option<StoreId>)
where
    C: CategoryEngine,
    R: RatingEngine,
{
    let (fetched_categories, fetched_ratings) = tokio::join!(
        categories.fetch_categories(Pagination::default()),
        ratings.fetch_ratings(Pagination::default()),
    );
    log_settlement("fetchCategories", &fetched_categories);
    log_settlement("fetchRatings", &fetched_ratings);

    let counts = categories.counts().await;
    info!(total = counts.total, active = counts.active, inactive = counts.inactive, "category counts");

    let criteria = categories
        .criteria(Pagination::default())
        .with(CategoryFilter::Status(CategoryStatus::Active))
        .sorted(Sort::descending(CategorySort::StoreCount));
    let page = categories.view(&criteria).await;
    for category in &page.items {
        info!(id = %category.id, name = %category.name, stores = category.store_count, "active category");
    }

    let roots = categories.read(|slice| slice.roots()).await;
    let orphans = categories.read(|slice| slice.orphans()).await;
    info!(roots = roots.len(), orphans = orphans.len(), "category tree");

    let latest = ratings
        .view(&ratings.criteria(Pagination::default()).sorted(Sort::descending(RatingSort::CreatedAt)))
        .await;
    info!(shown = latest.items.len(), total = latest.total, "latest ratings");

    let Some(store_id) = store_id else {
        return;
    };
    log_settlement(
        "fetchStoreRatings",
        &ratings.fetch_store_ratings(store_id, Pagination::default()).await,
    );
    if let Some(summary) = ratings.summary(store_id).await {
        info!(%store_id, count = summary.count, average = summary.average, histogram = ?summary.histogram, "store rating summary");
    }
    let most_liked = ratings
        .store_view(
            store_id,
            &ratings.criteria(Pagination::default()).sorted(Sort::descending(RatingSort::Likes)),
        )
        .await;
    for rating in most_liked.iter().flat_map(|page| &page.items) {
        info!(id = %rating.id, score = rating.score, likes = rating.likes, "store rating");
    }
}

fn log_settlement(operation: &str, settlement: &Settlement) {
    match settlement {
        Settlement::Fulfilled => info!(operation, "fulfilled"),
        Settlement::Rejected(message) => warn!(operation, %message, "rejected"),
        Settlement::Stale => debug!(operation, "superseded"),
    }
}

#[derive(Debug, Clone)]
struct ApiEngine<T> {
    repo: T,
}

impl<T> ApiEngine<T> {
    fn new(repo: T) -> Self {
        Self { repo }
    }
}

impl<T> CategoryEngine for ApiEngine<T>
where
    T: CategoryRepository + Clone + Send + Sync + 'static,
{
    type Repo = T;

    fn repo(&self) -> Self::Repo {
        self.repo.clone()
    }
}

impl<T> RatingEngine for ApiEngine<T>
where
    T: RatingRepository + Clone + Send + Sync + 'static,
{
    type Repo = T;

    fn repo(&self) -> Self::Repo {
        self.repo.clone()
    }
}
