//! Trip search engine and the trip API client.

mod api;
mod config;
mod search;
mod types;

pub use api::{HttpTripApi, TripApi};
pub use config::SearchConfig;
pub use search::{SearchOutcome, TripSearch};
pub use types::{
    LocationReport, Place, SearchFilters, SearchFiltersPatch, SearchPage, SearchQuery,
    SearchState, SearchStatus, SortBy, SortOrder, TripSummary,
};
