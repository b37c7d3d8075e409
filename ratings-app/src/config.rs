use crate::app::{AppError, AppResult};
use engine::request::StalePolicy;
use error_stack::{IntoReport, ResultExt};
use ratings_core::model::StoreId;
use std::str::FromStr;

const API_URL: &str = "RATINGS_API_URL";
const PAGE_SIZE: &str = "RATINGS_PAGE_SIZE";
const STALE_POLICY: &str = "RATINGS_STALE_POLICY";
const STORE_ID: &str = "RATINGS_STORE_ID";
const METRICS: &str = "RATINGS_METRICS";

const DEFAULT_PAGE_SIZE: u64 = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub page_size: u64,
    pub stale_policy: StalePolicy,
    pub store_id: Option<StoreId>,
    pub metrics: bool,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Empty values count as unset.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_url = var(API_URL)
            .ok_or_else(|| AppError.into_report())
            .attach_with(|| format!("{API_URL} is missing"))?;

        let page_size = parse_or(var(PAGE_SIZE), PAGE_SIZE, DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(AppError.into_report()).attach_with(|| format!("{PAGE_SIZE} must be at least 1"));
        }

        Ok(Self {
            api_url,
            page_size,
            stale_policy: parse_or(var(STALE_POLICY), STALE_POLICY, StalePolicy::default())?,
            store_id: var(STORE_ID)
                .map(|value| parse(&value, STORE_ID).map(StoreId))
                .transpose()?,
            metrics: parse_or(var(METRICS), METRICS, false)?,
        })
    }
}

fn parse<T>(value: &str, name: &str) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .change_context(AppError)
        .attach_with(|| format!("{name} has an invalid value '{value}'"))
}

fn parse_or<T>(value: Option<String>, name: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.map_or(Ok(default), |value| parse(&value, name))
}
