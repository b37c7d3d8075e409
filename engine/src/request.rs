//! Lifecycle tracking for named asynchronous operations.
//!
//! Every dispatch of an operation takes a [`Ticket`] from [`RequestTracker::begin`]
//! and hands it back through [`RequestTracker::settle`] once the remote call
//! finished. The tracker decides whether the outcome still counts: tickets
//! that were cancelled, or (under [`StalePolicy::LatestDispatch`]) superseded
//! by a newer dispatch of the same read operation, come back as [`Settled::Stale`]
//! and leave the tracked state alone. Mutations are never superseded, since the
//! remote API applied every one of them.
use crate::metrics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::str::FromStr;
use tracing::{debug, warn};

pub trait OperationKey: Copy + Eq + Hash + Debug {
    fn name(&self) -> &'static str;

    /// Whether a newer dispatch makes older responses worthless. True for reads;
    /// mutations return false so every fulfilled one gets merged.
    fn supersedable(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Idle,
    Pending,
    Fulfilled,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RequestState {
    pub status: RequestStatus,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(skip)]
    generation: u64,
    #[serde(skip)]
    cancelled_through: u64,
}

impl RequestState {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// What to do with a response when a newer dispatch of the same operation exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalePolicy {
    /// Only the most recent dispatch of an operation may settle it.
    #[default]
    LatestDispatch,
    /// Responses apply in the order they complete, so the last one to resolve wins
    /// even if it was dispatched first.
    CompletionOrder,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown stale policy '{0}', expected 'latest' or 'completion'")]
pub struct UnknownStalePolicy(String);

impl FromStr for StalePolicy {
    type Err = UnknownStalePolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest" | "latest_dispatch" => Ok(StalePolicy::LatestDispatch),
            "completion" | "completion_order" => Ok(StalePolicy::CompletionOrder),
            _ => Err(UnknownStalePolicy(s.to_owned())),
        }
    }
}

/// Proof that an operation was dispatched. Settling consumes it.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a ticket has to be settled or the operation stays pending"]
pub struct Ticket<K> {
    key: K,
    generation: u64,
}

impl<K: Copy> Ticket<K> {
    pub fn key(&self) -> K {
        self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Outcome of settling a ticket, carrying the fulfilled value so it can be merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled<T> {
    Fulfilled(T),
    Rejected(String),
    Stale,
}

impl<T> Settled<T> {
    pub fn settlement(&self) -> Settlement {
        match self {
            Settled::Fulfilled(_) => Settlement::Fulfilled,
            Settled::Rejected(message) => Settlement::Rejected(message.clone()),
            Settled::Stale => Settlement::Stale,
        }
    }
}

/// What a dispatched operation ended up doing to the tracked state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Settlement {
    Fulfilled,
    Rejected(String),
    Stale,
}

impl Settlement {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Settlement::Fulfilled)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Settlement::Rejected(message) => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestTracker<K> {
    states: HashMap<K, RequestState>,
    policy: StalePolicy,
    /// Generations are unique across keys, so a forgotten key never reissues one.
    issued: u64,
}

impl<K: OperationKey> Default for RequestTracker<K> {
    fn default() -> Self {
        Self::new(StalePolicy::default())
    }
}

impl<K: OperationKey> RequestTracker<K> {
    pub fn new(policy: StalePolicy) -> Self {
        Self {
            states: HashMap::new(),
            policy,
            issued: 0,
        }
    }

    pub fn policy(&self) -> StalePolicy {
        self.policy
    }

    /// Marks `key` as pending and clears its previous error.
    pub fn begin(&mut self, key: K) -> Ticket<K> {
        self.issued += 1;
        let state = self.states.entry(key).or_default();
        state.generation = self.issued;
        state.status = RequestStatus::Pending;
        state.error = None;

        debug!(operation = key.name(), generation = state.generation, "operation started");
        metrics::record_started(key.name());

        Ticket {
            key,
            generation: state.generation,
        }
    }

    /// Whether settling `ticket` right now would change the tracked state.
    pub fn is_current(&self, ticket: &Ticket<K>) -> bool {
        let Some(state) = self.states.get(&ticket.key) else {
            return false;
        };
        if ticket.generation <= state.cancelled_through {
            return false;
        }
        match self.policy {
            StalePolicy::LatestDispatch => {
                !ticket.key.supersedable() || ticket.generation == state.generation
            }
            StalePolicy::CompletionOrder => true,
        }
    }

    pub fn settle<T>(&mut self, ticket: Ticket<K>, result: Result<T, String>) -> Settled<T> {
        match result {
            Ok(value) => self.fulfill(ticket, value),
            Err(message) => self.reject(ticket, message),
        }
    }

    pub fn fulfill<T>(&mut self, ticket: Ticket<K>, value: T) -> Settled<T> {
        if !self.is_current(&ticket) {
            return self.discard(ticket);
        }
        let state = self.states.entry(ticket.key).or_default();
        state.status = RequestStatus::Fulfilled;
        state.error = None;
        state.last_updated = Some(Utc::now());

        debug!(operation = ticket.key.name(), generation = ticket.generation, "operation fulfilled");
        metrics::record_settled(ticket.key.name(), metrics::FULFILLED);
        Settled::Fulfilled(value)
    }

    /// Records `message` as the user facing error of the operation. Stored data is left as is.
    pub fn reject<T>(&mut self, ticket: Ticket<K>, message: impl Into<String>) -> Settled<T> {
        if !self.is_current(&ticket) {
            return self.discard(ticket);
        }
        let message = message.into();
        let state = self.states.entry(ticket.key).or_default();
        state.status = RequestStatus::Rejected;
        state.error = Some(message.clone());
        state.last_updated = Some(Utc::now());

        warn!(operation = ticket.key.name(), generation = ticket.generation, error = %message, "operation rejected");
        metrics::record_settled(ticket.key.name(), metrics::REJECTED);
        Settled::Rejected(message)
    }

    /// Rejects `key` without dispatching it, e.g. on invalid input. Outstanding tickets
    /// stay valid.
    pub fn refuse(&mut self, key: K, message: impl Into<String>) -> Settlement {
        let message = message.into();
        let state = self.states.entry(key).or_default();
        state.status = RequestStatus::Rejected;
        state.error = Some(message.clone());
        state.last_updated = Some(Utc::now());

        warn!(operation = key.name(), error = %message, "operation refused");
        metrics::record_settled(key.name(), metrics::REJECTED);
        Settlement::Rejected(message)
    }

    /// Drops everything tracked for `key`. Tickets still out for it become stale.
    pub fn forget(&mut self, key: K) -> Option<RequestState> {
        self.states.remove(&key)
    }

    /// Makes every ticket issued so far for `key` stale. Returns whether the operation was pending.
    pub fn cancel(&mut self, key: K) -> bool {
        let Some(state) = self.states.get_mut(&key) else {
            return false;
        };
        state.cancelled_through = state.generation;
        let was_pending = state.is_pending();
        if was_pending {
            state.status = RequestStatus::Idle;
            debug!(operation = key.name(), "pending operation cancelled");
        }
        was_pending
    }

    /// Dismisses the error of a rejected operation, returning it to idle.
    pub fn clear_error(&mut self, key: K) -> Option<String> {
        let state = self.states.get_mut(&key)?;
        let error = state.error.take()?;
        if state.status == RequestStatus::Rejected {
            state.status = RequestStatus::Idle;
        }
        Some(error)
    }

    pub fn state(&self, key: K) -> RequestState {
        self.states.get(&key).cloned().unwrap_or_default()
    }

    pub fn status(&self, key: K) -> RequestStatus {
        self.states
            .get(&key)
            .map(|s| s.status)
            .unwrap_or_default()
    }

    pub fn error(&self, key: K) -> Option<&str> {
        self.states.get(&key).and_then(|s| s.error.as_deref())
    }

    pub fn is_pending(&self, key: K) -> bool {
        self.status(key) == RequestStatus::Pending
    }

    /// Whether any operation is still waiting on the remote API.
    pub fn is_loading(&self) -> bool {
        self.states.values().any(RequestState::is_pending)
    }

    pub fn errors(&self) -> impl Iterator<Item = (K, &str)> {
        self.states
            .iter()
            .filter_map(|(key, state)| state.error.as_deref().map(|e| (*key, e)))
    }

    fn discard<T>(&self, ticket: Ticket<K>) -> Settled<T> {
        warn!(
            operation = ticket.key.name(),
            generation = ticket.generation,
            "discarding response of a superseded or cancelled dispatch"
        );
        metrics::record_settled(ticket.key.name(), metrics::STALE);
        Settled::Stale
    }
}
