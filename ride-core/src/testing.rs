//! Fixtures and mock collaborators shared by the unit tests.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, TimeDelta, Utc};
use futures::StreamExt;
use futures::channel::mpsc;
use serde_json::{Value, json};
use tokio::sync::Notify;

use crate::backend::BackendError;
use crate::directions::{DirectionsBackend, DirectionsRoute};
use crate::geo::Coordinate;
use crate::location::{
    Accuracy, DeviceError, GeocodeResult, GeocodingBackend, LocationSample, LocationService,
    PermissionKind, PermissionStatus, SampleStream, WatchOptions,
};
use crate::trips::{LocationReport, SearchPage, TripApi, TripSummary};

pub(crate) fn coord(lat: f64, lng: f64) -> Coordinate {
    Coordinate::new(lat, lng).unwrap()
}

/// A sample `north_m` meters north of (0, 0), `secs` seconds after a fixed epoch.
pub(crate) fn sample_at(north_m: f64, secs: i64) -> LocationSample {
    let epoch = DateTime::parse_from_rfc3339("2024-03-15T10:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    LocationSample::new(
        coord(north_m / 111_195.0, 0.0),
        epoch + TimeDelta::seconds(secs),
    )
}

pub(crate) fn place(address: &str, lat: f64, lng: f64) -> GeocodeResult {
    GeocodeResult {
        address: address.to_string(),
        coordinate: coord(lat, lng),
        place_id: format!("place:{address}"),
        components: BTreeMap::new(),
    }
}

/// A directions route over (38.5, -120.2) → (40.7, -120.95) → (43.252, -126.453)
/// with two steps and the given leg totals.
pub(crate) fn route_json(distance: u64, duration: u64) -> Value {
    json!({
        "summary": "I-5 N",
        "overview_polyline": {"points": "_p~iF~ps|U_ulLnnqC_mqNvxq`@"},
        "bounds": {
            "northeast": {"lat": 43.252, "lng": -120.2},
            "southwest": {"lat": 38.5, "lng": -126.453}
        },
        "legs": [{
            "distance": {"value": distance, "text": "route"},
            "duration": {"value": duration, "text": "route"},
            "start_address": "Origin",
            "end_address": "Destination",
            "steps": [
                {
                    "distance": {"value": 2000},
                    "duration": {"value": 300},
                    "html_instructions": "Turn <b>left</b>",
                    "polyline": {"points": "_p~iF~ps|U_ulLnnqC"},
                    "start_location": {"lat": 38.5, "lng": -120.2},
                    "end_location": {"lat": 40.7, "lng": -120.95},
                    "travel_mode": "DRIVING",
                    "maneuver": "turn-left"
                },
                {
                    "distance": {"value": 2200},
                    "duration": {"value": 480},
                    "html_instructions": "Continue",
                    "polyline": {"points": "_mqNvxq`@"},
                    "start_location": {"lat": 40.7, "lng": -120.95},
                    "end_location": {"lat": 43.252, "lng": -126.453},
                    "travel_mode": "DRIVING"
                }
            ]
        }]
    })
}

pub(crate) fn trip(id: &str) -> TripSummary {
    serde_json::from_value(json!({ "id": id, "price": 500, "availableSeats": 3 })).unwrap()
}

pub(crate) fn page(ids: &[&str], has_more: bool) -> SearchPage {
    SearchPage {
        trips: ids.iter().map(|id| trip(id)).collect(),
        has_more,
    }
}

fn unavailable() -> BackendError {
    BackendError::Api {
        status: 503,
        message: "unavailable".to_string(),
    }
}

/// Mock device location service.
pub(crate) struct MockDevice {
    denied: Mutex<HashSet<PermissionKind>>,
    fix: Option<Coordinate>,
    fix_gate: Option<Notify>,
    fix_started: Notify,
    watcher: Mutex<Option<mpsc::UnboundedSender<LocationSample>>>,
    permission_requests: Mutex<HashMap<PermissionKind, usize>>,
    fix_requests: Mutex<usize>,
    watch_requests: Mutex<usize>,
    background_starts: Mutex<usize>,
    background_stops: Mutex<usize>,
}

impl MockDevice {
    /// Grants everything but has no fix.
    pub(crate) fn new() -> Self {
        Self {
            denied: Mutex::new(HashSet::new()),
            fix: None,
            fix_gate: None,
            fix_started: Notify::new(),
            watcher: Mutex::new(None),
            permission_requests: Mutex::new(HashMap::new()),
            fix_requests: Mutex::new(0),
            watch_requests: Mutex::new(0),
            background_starts: Mutex::new(0),
            background_stops: Mutex::new(0),
        }
    }

    pub(crate) fn with_fix(mut self, coordinate: Coordinate) -> Self {
        self.fix = Some(coordinate);
        self
    }

    /// Fix requests wait for [`release_fix`](Self::release_fix).
    pub(crate) fn gated_fix(mut self) -> Self {
        self.fix_gate = Some(Notify::new());
        self
    }

    pub(crate) fn deny(self, kind: PermissionKind) -> Self {
        self.denied.lock().unwrap().insert(kind);
        self
    }

    pub(crate) fn allow(&self, kind: PermissionKind) {
        self.denied.lock().unwrap().remove(&kind);
    }

    pub(crate) async fn fix_started(&self) {
        self.fix_started.notified().await;
    }

    pub(crate) fn release_fix(&self) {
        if let Some(gate) = &self.fix_gate {
            gate.notify_one();
        }
    }

    /// Push a sample into the active watch, if any.
    pub(crate) fn emit(&self, sample: LocationSample) {
        if let Some(tx) = self.watcher.lock().unwrap().as_ref() {
            let _ = tx.unbounded_send(sample);
        }
    }

    pub(crate) fn permission_requests(&self, kind: PermissionKind) -> usize {
        self.permission_requests
            .lock()
            .unwrap()
            .get(&kind)
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn fix_requests(&self) -> usize {
        *self.fix_requests.lock().unwrap()
    }

    pub(crate) fn watch_requests(&self) -> usize {
        *self.watch_requests.lock().unwrap()
    }

    pub(crate) fn background_starts(&self) -> usize {
        *self.background_starts.lock().unwrap()
    }

    pub(crate) fn background_stops(&self) -> usize {
        *self.background_stops.lock().unwrap()
    }
}

impl LocationService for MockDevice {
    async fn request_permission(&self, kind: PermissionKind) -> PermissionStatus {
        *self.permission_requests.lock().unwrap().entry(kind).or_insert(0) += 1;
        if self.denied.lock().unwrap().contains(&kind) {
            PermissionStatus::Denied
        } else {
            PermissionStatus::Granted
        }
    }

    async fn current_fix(&self, _accuracy: Accuracy) -> Result<LocationSample, DeviceError> {
        *self.fix_requests.lock().unwrap() += 1;

        if let Some(gate) = &self.fix_gate {
            self.fix_started.notify_one();
            gate.notified().await;
        }

        match self.fix {
            Some(coordinate) => Ok(LocationSample::new(coordinate, Utc::now())
                .with_speed(8.5)
                .with_heading(90.0)),
            None => Err(DeviceError::ServicesDisabled),
        }
    }

    async fn watch(&self, _options: &WatchOptions) -> Result<SampleStream, DeviceError> {
        *self.watch_requests.lock().unwrap() += 1;
        let (tx, rx) = mpsc::unbounded();
        *self.watcher.lock().unwrap() = Some(tx);
        Ok(rx.boxed())
    }

    async fn start_background_updates(&self, _options: &WatchOptions) -> Result<(), DeviceError> {
        *self.background_starts.lock().unwrap() += 1;
        Ok(())
    }

    fn stop_background_updates(&self) {
        *self.background_stops.lock().unwrap() += 1;
    }
}

/// Mock geocoding backend keyed by exact address or `"lat,lng"`.
pub(crate) struct MockGeocoder {
    forward: HashMap<String, GeocodeResult>,
    reverse: HashMap<String, GeocodeResult>,
    failing: bool,
    forward_calls: Mutex<usize>,
    reverse_calls: Mutex<usize>,
}

impl MockGeocoder {
    pub(crate) fn new() -> Self {
        Self {
            forward: HashMap::new(),
            reverse: HashMap::new(),
            failing: false,
            forward_calls: Mutex::new(0),
            reverse_calls: Mutex::new(0),
        }
    }

    pub(crate) fn with_address(mut self, address: &str, result: GeocodeResult) -> Self {
        self.forward.insert(address.to_string(), result);
        self
    }

    pub(crate) fn with_reverse(mut self, coordinate: Coordinate, result: GeocodeResult) -> Self {
        self.reverse.insert(coordinate.to_query_string(), result);
        self
    }

    pub(crate) fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub(crate) fn forward_calls(&self) -> usize {
        *self.forward_calls.lock().unwrap()
    }

    pub(crate) fn reverse_calls(&self) -> usize {
        *self.reverse_calls.lock().unwrap()
    }
}

impl GeocodingBackend for MockGeocoder {
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeResult>, BackendError> {
        *self.forward_calls.lock().unwrap() += 1;
        if self.failing {
            return Err(unavailable());
        }
        Ok(self.forward.get(address).cloned().into_iter().collect())
    }

    async fn reverse_geocode(
        &self,
        coordinate: Coordinate,
    ) -> Result<Vec<GeocodeResult>, BackendError> {
        *self.reverse_calls.lock().unwrap() += 1;
        if self.failing {
            return Err(unavailable());
        }
        Ok(self
            .reverse
            .get(&coordinate.to_query_string())
            .cloned()
            .into_iter()
            .collect())
    }
}

/// Mock directions backend returning the same routes for every request.
pub(crate) struct MockDirections {
    routes: Vec<DirectionsRoute>,
    failing: bool,
    requests: Mutex<Vec<(Coordinate, Coordinate)>>,
}

impl MockDirections {
    /// No routes between anything.
    pub(crate) fn new() -> Self {
        Self {
            routes: Vec::new(),
            failing: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_route(mut self, route: Value) -> Self {
        self.routes.push(serde_json::from_value(route).unwrap());
        self
    }

    pub(crate) fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn last_request(&self) -> Option<(Coordinate, Coordinate)> {
        self.requests.lock().unwrap().last().copied()
    }
}

impl DirectionsBackend for MockDirections {
    async fn directions(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Vec<DirectionsRoute>, BackendError> {
        self.requests.lock().unwrap().push((origin, destination));
        if self.failing {
            return Err(unavailable());
        }
        Ok(self.routes.clone())
    }
}

/// Mock trip API serving queued search pages in order.
pub(crate) struct MockTripApi {
    pages: Mutex<VecDeque<Result<SearchPage, BackendError>>>,
    trips: HashMap<String, TripSummary>,
    gate: Option<Notify>,
    search_started: Notify,
    queries: Mutex<Vec<Vec<(String, String)>>>,
    report_failures: Mutex<usize>,
    report_attempts: Mutex<usize>,
    reports: Mutex<Vec<(String, LocationReport)>>,
}

impl MockTripApi {
    pub(crate) fn new() -> Self {
        Self {
            pages: Mutex::new(VecDeque::new()),
            trips: HashMap::new(),
            gate: None,
            search_started: Notify::new(),
            queries: Mutex::new(Vec::new()),
            report_failures: Mutex::new(0),
            report_attempts: Mutex::new(0),
            reports: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_page(self, page: SearchPage) -> Self {
        self.pages.lock().unwrap().push_back(Ok(page));
        self
    }

    pub(crate) fn with_error(self, error: BackendError) -> Self {
        self.pages.lock().unwrap().push_back(Err(error));
        self
    }

    pub(crate) fn with_trip(mut self, trip: TripSummary) -> Self {
        self.trips.insert(trip.id.clone(), trip);
        self
    }

    /// Searches wait for [`release`](Self::release) before answering.
    pub(crate) fn gated(mut self) -> Self {
        self.gate = Some(Notify::new());
        self
    }

    /// The first `n` location reports fail.
    pub(crate) fn failing_reports(self, n: usize) -> Self {
        *self.report_failures.lock().unwrap() = n;
        self
    }

    pub(crate) async fn search_started(&self) {
        self.search_started.notified().await;
    }

    pub(crate) fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub(crate) fn search_calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub(crate) fn queries(&self) -> Vec<Vec<(String, String)>> {
        self.queries.lock().unwrap().clone()
    }

    pub(crate) fn report_attempts(&self) -> usize {
        *self.report_attempts.lock().unwrap()
    }

    pub(crate) fn reports(&self) -> Vec<(String, LocationReport)> {
        self.reports.lock().unwrap().clone()
    }
}

impl TripApi for MockTripApi {
    async fn search_trips(&self, query: &[(String, String)]) -> Result<SearchPage, BackendError> {
        self.queries.lock().unwrap().push(query.to_vec());
        self.search_started.notify_one();

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.pages.lock().unwrap().pop_front().unwrap_or(Ok(SearchPage {
            trips: Vec::new(),
            has_more: false,
        }))
    }

    async fn report_location(
        &self,
        trip_id: &str,
        report: &LocationReport,
    ) -> Result<(), BackendError> {
        *self.report_attempts.lock().unwrap() += 1;

        {
            let mut failures = self.report_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(unavailable());
            }
        }

        self.reports
            .lock()
            .unwrap()
            .push((trip_id.to_string(), report.clone()));
        Ok(())
    }

    async fn get_trip(&self, trip_id: &str) -> Result<TripSummary, BackendError> {
        self.trips.get(trip_id).cloned().ok_or(BackendError::Api {
            status: 404,
            message: "trip not found".to_string(),
        })
    }
}
