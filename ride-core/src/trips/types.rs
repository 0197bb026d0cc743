//! Trip API records, search filters and query construction.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::geo::Coordinate;
use crate::location::LocationSample;

/// A trip endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub address: String,
    pub coordinates: Coordinate,
}

/// A trip as returned by the trip API.
///
/// Fields the engine does not interpret are kept in `extra` so they survive
/// a round trip to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSummary {
    pub id: String,
    #[serde(default)]
    pub driver_id: Option<String>,
    #[serde(default)]
    pub from: Option<Place>,
    #[serde(default)]
    pub to: Option<Place>,
    /// Departure, in whatever format the backend uses
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub seats: Option<u32>,
    #[serde(default)]
    pub available_seats: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
    /// `pending`, `active`, `completed` or `cancelled`
    #[serde(default)]
    pub status: Option<String>,
    /// Distance from the search anchor in kilometers
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub driver_rating: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub trips: Vec<TripSummary>,
    #[serde(default)]
    pub has_more: bool,
}

/// Body of a live location report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationReport {
    pub latitude: f64,
    pub longitude: f64,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl From<&LocationSample> for LocationReport {
    fn from(sample: &LocationSample) -> Self {
        Self {
            latitude: sample.coordinate.latitude(),
            longitude: sample.coordinate.longitude(),
            speed: sample.speed,
            heading: sample.heading,
            timestamp: sample.timestamp,
        }
    }
}

/// Sort key understood by the search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Price,
    Distance,
    Rating,
    Time,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Price => "price",
            SortBy::Distance => "distance",
            SortBy::Rating => "rating",
            SortBy::Time => "time",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Search filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    pub date: Option<NaiveDate>,
    /// Preferred departure time, `HH:MM`
    pub time: Option<String>,
    pub seats: u32,
    pub price_min: f64,
    pub price_max: Option<f64>,
    pub min_rating: f64,
    pub max_distance_km: f64,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            date: None,
            time: None,
            seats: 1,
            price_min: 0.0,
            price_max: None,
            min_rating: 0.0,
            max_distance_km: 50.0,
        }
    }
}

impl SearchFilters {
    /// Check value ranges.
    pub fn validate(&self) -> Result<(), CoreError> {
        let invalid = |msg: String| Err(CoreError::InvalidFilters(msg));

        if self.seats == 0 {
            return invalid("seats must be at least 1".to_string());
        }
        if !(0.0..=5.0).contains(&self.min_rating) {
            return invalid(format!("minimum rating {} is outside 0..=5", self.min_rating));
        }
        if !non_negative(self.price_min) {
            return invalid(format!("minimum price {} is negative", self.price_min));
        }
        if let Some(max) = self.price_max
            && !non_negative(max - self.price_min)
        {
            return invalid(format!(
                "maximum price {max} is below minimum price {}",
                self.price_min
            ));
        }
        if !non_negative(self.max_distance_km) {
            return invalid(format!("maximum distance {} is negative", self.max_distance_km));
        }
        Ok(())
    }
}

/// False for negative values and NaN.
fn non_negative(value: f64) -> bool {
    value >= 0.0
}

/// A partial update of [`SearchFilters`]. Unset fields keep their value.
///
/// Nullable filters take an `Option` so they can be cleared:
/// `SearchFiltersPatch::new().date(None)` removes the date filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFiltersPatch {
    date: Option<Option<NaiveDate>>,
    time: Option<Option<String>>,
    seats: Option<u32>,
    price_min: Option<f64>,
    price_max: Option<Option<f64>>,
    min_rating: Option<f64>,
    max_distance_km: Option<f64>,
}

impl SearchFiltersPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn date(mut self, date: Option<NaiveDate>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn time(mut self, time: Option<String>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn seats(mut self, seats: u32) -> Self {
        self.seats = Some(seats);
        self
    }

    pub fn price_min(mut self, price: f64) -> Self {
        self.price_min = Some(price);
        self
    }

    pub fn price_max(mut self, price: Option<f64>) -> Self {
        self.price_max = Some(price);
        self
    }

    pub fn min_rating(mut self, rating: f64) -> Self {
        self.min_rating = Some(rating);
        self
    }

    pub fn max_distance_km(mut self, km: f64) -> Self {
        self.max_distance_km = Some(km);
        self
    }

    /// Merge onto `filters`, returning the result unvalidated.
    pub fn apply(&self, filters: &SearchFilters) -> SearchFilters {
        SearchFilters {
            date: self.date.unwrap_or(filters.date),
            time: self.time.clone().unwrap_or_else(|| filters.time.clone()),
            seats: self.seats.unwrap_or(filters.seats),
            price_min: self.price_min.unwrap_or(filters.price_min),
            price_max: self.price_max.unwrap_or(filters.price_max),
            min_rating: self.min_rating.unwrap_or(filters.min_rating),
            max_distance_km: self.max_distance_km.unwrap_or(filters.max_distance_km),
        }
    }
}

/// Everything that goes into one search request.
#[derive(Debug, Clone)]
pub struct SearchQuery<'a> {
    pub anchor: Coordinate,
    pub filters: &'a SearchFilters,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub page: u32,
    /// Caller-supplied parameters, replacing same-named ones
    pub extra: &'a [(String, String)],
}

impl SearchQuery<'_> {
    /// Query string pairs in a stable order. Absent filters are omitted.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let f = self.filters;
        let mut pairs: Vec<(String, String)> = vec![
            ("latitude".into(), self.anchor.latitude().to_string()),
            ("longitude".into(), self.anchor.longitude().to_string()),
        ];

        if let Some(date) = f.date {
            pairs.push(("date".into(), date.format("%Y-%m-%d").to_string()));
        }
        if let Some(time) = &f.time {
            pairs.push(("time".into(), time.clone()));
        }
        pairs.push(("seats".into(), f.seats.to_string()));
        pairs.push(("minPrice".into(), f.price_min.to_string()));
        if let Some(max) = f.price_max {
            pairs.push(("maxPrice".into(), max.to_string()));
        }
        pairs.push(("minRating".into(), f.min_rating.to_string()));
        pairs.push(("maxDistance".into(), f.max_distance_km.to_string()));
        pairs.push(("sortBy".into(), self.sort_by.as_str().into()));
        pairs.push(("sortOrder".into(), self.sort_order.as_str().into()));
        pairs.push(("page".into(), self.page.to_string()));

        for (key, value) in self.extra {
            match pairs.iter_mut().find(|(k, _)| k == key) {
                Some(existing) => existing.1 = value.clone(),
                None => pairs.push((key.clone(), value.clone())),
            }
        }

        pairs
    }
}

/// Accumulated search state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchState {
    pub results: Vec<TripSummary>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    /// Next page to request, starting at 1
    pub page: u32,
    pub has_more: bool,
    pub filters: SearchFilters,
}

impl SearchState {
    pub fn new(filters: SearchFilters, sort_by: SortBy, sort_order: SortOrder) -> Self {
        Self {
            results: Vec::new(),
            sort_by,
            sort_order,
            page: 1,
            has_more: true,
            filters,
        }
    }

    /// Drop accumulated results and start again from page 1.
    pub(crate) fn reset(&mut self) {
        self.results.clear();
        self.page = 1;
        self.has_more = true;
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new(SearchFilters::default(), SortBy::default(), SortOrder::default())
    }
}

/// Progress summary of a search session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStatus {
    pub is_loading: bool,
    pub has_more: bool,
    pub total_trips: usize,
    pub current_page: u32,
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::coord;

    fn value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
        pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn trip_keeps_unknown_fields() {
        let json = r#"{
            "id": "t1",
            "driverId": "d7",
            "from": {"address": "A", "coordinates": {"latitude": 55.0, "longitude": 37.0}},
            "price": 450,
            "availableSeats": 2,
            "status": "active",
            "car": {"model": "Lada"},
            "createdAt": "2024-03-01T12:00:00Z"
        }"#;

        let trip: TripSummary = serde_json::from_str(json).unwrap();

        assert_eq!(trip.driver_id.as_deref(), Some("d7"));
        assert_eq!(trip.price, Some(450.0));
        assert_eq!(trip.available_seats, Some(2));
        assert_eq!(trip.from.unwrap().coordinates, coord(55.0, 37.0));
        assert_eq!(trip.extra["car"]["model"], "Lada");
        assert!(trip.extra.contains_key("createdAt"));
        assert!(!trip.extra.contains_key("price"));
    }

    #[test]
    fn page_reads_has_more() {
        let page: SearchPage =
            serde_json::from_str(r#"{"trips": [{"id": "a"}], "hasMore": true}"#).unwrap();
        assert!(page.has_more);
        assert_eq!(page.trips[0].id, "a");

        let page: SearchPage = serde_json::from_str(r#"{"trips": []}"#).unwrap();
        assert!(!page.has_more);
    }

    #[test]
    fn default_query() {
        let filters = SearchFilters::default();
        let query = SearchQuery {
            anchor: coord(55.75, 37.61),
            filters: &filters,
            sort_by: SortBy::Price,
            sort_order: SortOrder::Asc,
            page: 1,
            extra: &[],
        };

        let pairs = query.to_query_pairs();

        assert_eq!(value(&pairs, "latitude"), Some("55.75"));
        assert_eq!(value(&pairs, "longitude"), Some("37.61"));
        assert_eq!(value(&pairs, "seats"), Some("1"));
        assert_eq!(value(&pairs, "minPrice"), Some("0"));
        assert_eq!(value(&pairs, "minRating"), Some("0"));
        assert_eq!(value(&pairs, "maxDistance"), Some("50"));
        assert_eq!(value(&pairs, "sortBy"), Some("price"));
        assert_eq!(value(&pairs, "sortOrder"), Some("asc"));
        assert_eq!(value(&pairs, "page"), Some("1"));
        assert_eq!(value(&pairs, "maxPrice"), None);
        assert_eq!(value(&pairs, "date"), None);
        assert_eq!(value(&pairs, "time"), None);
    }

    #[test]
    fn query_with_filters_and_overrides() {
        let filters = SearchFilters {
            date: NaiveDate::from_ymd_opt(2024, 3, 15),
            time: Some("08:30".into()),
            price_max: Some(1200.5),
            ..SearchFilters::default()
        };
        let extra = vec![
            ("seats".to_string(), "3".to_string()),
            ("driverId".to_string(), "d7".to_string()),
        ];
        let query = SearchQuery {
            anchor: coord(1.0, 2.0),
            filters: &filters,
            sort_by: SortBy::Rating,
            sort_order: SortOrder::Desc,
            page: 4,
            extra: &extra,
        };

        let pairs = query.to_query_pairs();

        assert_eq!(value(&pairs, "date"), Some("2024-03-15"));
        assert_eq!(value(&pairs, "time"), Some("08:30"));
        assert_eq!(value(&pairs, "maxPrice"), Some("1200.5"));
        assert_eq!(value(&pairs, "seats"), Some("3"));
        assert_eq!(value(&pairs, "driverId"), Some("d7"));
        assert_eq!(value(&pairs, "sortOrder"), Some("desc"));
        assert_eq!(value(&pairs, "page"), Some("4"));
        assert_eq!(pairs.iter().filter(|(k, _)| k == "seats").count(), 1);
    }

    #[test]
    fn patch_merges_and_clears() {
        let filters = SearchFilters {
            date: NaiveDate::from_ymd_opt(2024, 3, 15),
            ..SearchFilters::default()
        };

        let merged = SearchFiltersPatch::new()
            .seats(2)
            .date(None)
            .price_max(Some(800.0))
            .apply(&filters);

        assert_eq!(merged.seats, 2);
        assert_eq!(merged.date, None);
        assert_eq!(merged.price_max, Some(800.0));
        assert_eq!(merged.max_distance_km, 50.0);
    }

    #[test]
    fn validation() {
        assert!(SearchFilters::default().validate().is_ok());

        let bad = [
            SearchFiltersPatch::new().seats(0),
            SearchFiltersPatch::new().min_rating(5.5),
            SearchFiltersPatch::new().min_rating(-1.0),
            SearchFiltersPatch::new().price_min(-10.0),
            SearchFiltersPatch::new().price_min(500.0).price_max(Some(100.0)),
            SearchFiltersPatch::new().max_distance_km(-1.0),
            SearchFiltersPatch::new().max_distance_km(f64::NAN),
        ];
        for patch in bad {
            let filters = patch.apply(&SearchFilters::default());
            assert!(
                matches!(filters.validate(), Err(CoreError::InvalidFilters(_))),
                "{filters:?} should be rejected"
            );
        }
    }

    #[test]
    fn report_from_sample() {
        let ts = DateTime::parse_from_rfc3339("2024-03-15T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let sample = LocationSample::new(coord(55.75, 37.61), ts).with_speed(12.5);

        let json = serde_json::to_value(LocationReport::from(&sample)).unwrap();

        assert_eq!(json["latitude"], 55.75);
        assert_eq!(json["longitude"], 37.61);
        assert_eq!(json["speed"], 12.5);
        assert!(json["heading"].is_null());
        assert_eq!(json["timestamp"], "2024-03-15T10:00:00Z");
    }
}
