//! Paginated trip search anchored at the device position.
//!
//! Results accumulate page by page. Changing filters or sort order resets
//! the session without fetching; the next [`TripSearch::search`] starts over
//! from page 1. Only one fetch runs at a time: a call made while another is
//! in flight returns [`SearchOutcome::Skipped`] without any I/O.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::CoreError;
use crate::location::{LocationProvider, LocationService};

use super::api::TripApi;
use super::config::SearchConfig;
use super::types::{
    SearchFiltersPatch, SearchQuery, SearchState, SearchStatus, SortBy, SortOrder, TripSummary,
};

/// What a search call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// A page was fetched and `added` trips appended.
    Fetched { added: usize },
    /// Nothing was fetched: another fetch was in flight, or no more pages.
    Skipped,
    /// A page arrived after the session was reset and was thrown away.
    Discarded,
}

struct Inner {
    state: SearchState,
    selected: Option<TripSummary>,
    last_error: Option<String>,
    /// Bumped on every reset; a fetch only commits if it is unchanged.
    generation: u64,
}

/// Trip search session.
pub struct TripSearch<A, L> {
    api: Arc<A>,
    location: Arc<LocationProvider<L>>,
    config: SearchConfig,
    in_flight: AtomicBool,
    inner: Mutex<Inner>,
}

/// Holds the in-flight flag; dropping it (including on cancellation) clears it.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<A, L> TripSearch<A, L>
where
    A: TripApi,
    L: LocationService,
{
    pub fn new(api: Arc<A>, location: Arc<LocationProvider<L>>, config: SearchConfig) -> Self {
        let state = SearchState::new(config.filters.clone(), config.sort_by, config.sort_order);
        Self {
            api,
            location,
            config,
            in_flight: AtomicBool::new(false),
            inner: Mutex::new(Inner {
                state,
                selected: None,
                last_error: None,
                generation: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the next page around the current position.
    ///
    /// `extra` parameters are added to the query, replacing any built-in
    /// parameter of the same name. On failure the accumulated results and
    /// page counter are left as they were.
    pub async fn search(&self, extra: &[(String, String)]) -> Result<SearchOutcome, CoreError> {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            debug!("search already in flight, skipping");
            return Ok(SearchOutcome::Skipped);
        };
        self.lock().last_error = None;

        let fix = match self.location.current_fix(self.config.accuracy).await {
            Ok(fix) => fix,
            Err(e) => {
                self.lock().last_error = Some(e.to_string());
                return Err(e);
            }
        };

        let (query, generation) = {
            let inner = self.lock();
            let query = SearchQuery {
                anchor: fix.coordinate,
                filters: &inner.state.filters,
                sort_by: inner.state.sort_by,
                sort_order: inner.state.sort_order,
                page: inner.state.page,
                extra,
            };
            (query.to_query_pairs(), inner.generation)
        };

        let result = self.api.search_trips(&query).await;

        let mut inner = self.lock();
        if inner.generation != generation {
            debug!(generation, current = inner.generation, "discarding stale search page");
            return Ok(SearchOutcome::Discarded);
        }

        match result {
            Ok(page) => {
                let added = page.trips.len();
                inner.state.results.extend(page.trips);
                inner.state.has_more = page.has_more;
                inner.state.page += 1;
                debug!(
                    added,
                    total = inner.state.results.len(),
                    next_page = inner.state.page,
                    has_more = page.has_more,
                    "search page appended"
                );
                Ok(SearchOutcome::Fetched { added })
            }
            Err(e) => {
                inner.last_error = Some(e.to_string());
                Err(CoreError::SearchFailed(e))
            }
        }
    }

    /// Fetch the next page unless a fetch is running or the server said
    /// there are no more.
    pub async fn load_more(&self) -> Result<SearchOutcome, CoreError> {
        if self.in_flight.load(Ordering::Acquire) || !self.lock().state.has_more {
            return Ok(SearchOutcome::Skipped);
        }
        self.search(&[]).await
    }

    /// Merge a filter change and reset the session. Does not fetch.
    ///
    /// Invalid filters are rejected and leave the session untouched.
    pub fn update_filters(&self, patch: SearchFiltersPatch) -> Result<(), CoreError> {
        let mut inner = self.lock();
        let filters = patch.apply(&inner.state.filters);
        filters.validate()?;
        inner.state.filters = filters;
        Self::reset_locked(&mut inner);
        Ok(())
    }

    /// Change the sort order and reset the session. Does not fetch.
    pub fn update_sort(&self, sort_by: SortBy, sort_order: SortOrder) {
        let mut inner = self.lock();
        inner.state.sort_by = sort_by;
        inner.state.sort_order = sort_order;
        Self::reset_locked(&mut inner);
    }

    /// Clear results and start again from page 1, keeping filters and sort.
    pub fn reset(&self) {
        Self::reset_locked(&mut self.lock());
    }

    fn reset_locked(inner: &mut Inner) {
        inner.state.reset();
        inner.last_error = None;
        inner.generation += 1;
    }

    pub fn select_trip(&self, trip: TripSummary) {
        self.lock().selected = Some(trip);
    }

    pub fn selected_trip(&self) -> Option<TripSummary> {
        self.lock().selected.clone()
    }

    /// Fetch one trip and make it the selected trip.
    pub async fn trip_details(&self, trip_id: &str) -> Result<TripSummary, CoreError> {
        match self.api.get_trip(trip_id).await {
            Ok(trip) => {
                self.lock().selected = Some(trip.clone());
                Ok(trip)
            }
            Err(e) => {
                self.lock().last_error = Some(e.to_string());
                Err(CoreError::Network(e))
            }
        }
    }

    pub fn status(&self) -> SearchStatus {
        let inner = self.lock();
        SearchStatus {
            is_loading: self.in_flight.load(Ordering::Acquire),
            has_more: inner.state.has_more,
            total_trips: inner.state.results.len(),
            current_page: inner.state.page,
            last_error: inner.last_error.clone(),
        }
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> SearchState {
        self.lock().state.clone()
    }
}
