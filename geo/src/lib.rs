// Hail
// Copyright 2025 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! APIs to access routing and geocoding information.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use async_trait::async_trait;
use derive_getters::Getters;
use hail_core::model::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[cfg(any(test, feature = "testutils"))]
mod mock;
#[cfg(any(test, feature = "testutils"))]
pub use mock::{MockGeocoder, MockRouter};
mod nominatim;
pub use nominatim::{NominatimGeocoder, NominatimGeocoderOptions};
mod osrm;
pub use osrm::{OsrmRouter, OsrmRouterOptions};

/// Maximum amount of time to wait for any single request to an external service.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that the external routing and geocoding services can raise.
///
/// Failures are kept distinguishable on purpose so that callers and tests can tell a timeout
/// apart from a garbled payload instead of collapsing every problem into an absent result.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum GeoError {
    /// The payload returned by the service could not be understood.
    #[error("Malformed payload: {0}")]
    Malformed(String),

    /// The service answered the request but reported a failure of its own.
    #[error("Service reported failure: {0}")]
    RemoteFailure(String),

    /// The service answered with a non-success HTTP status code.
    #[error("Service returned status {status}: {message}")]
    Status {
        /// Numeric HTTP status code returned by the service.
        status: u16,

        /// Body of the failed response, for diagnostic purposes.
        message: String,
    },

    /// The request did not complete within `REQUEST_TIMEOUT`.
    #[error("Request timed out")]
    Timeout,

    /// The request could not be delivered to the service at all.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type for this module.
pub type GeoResult<T> = Result<T, GeoError>;

/// Converts a `reqwest::Error` to a `GeoError`.
pub(crate) fn reqwest_error_to_geo_error(e: reqwest::Error) -> GeoError {
    if e.is_timeout() {
        GeoError::Timeout
    } else {
        GeoError::Transport(e.to_string())
    }
}

/// Converts a `reqwest::Response` to a `GeoError`.  The response should have a non-OK status.
pub(crate) async fn http_response_to_geo_error(response: reqwest::Response) -> GeoError {
    let status = response.status();
    assert!(!status.is_success(), "Should not have been called on a successful request");

    match response.text().await {
        Ok(text) => GeoError::Status { status: status.as_u16(), message: text },
        Err(e) => GeoError::Status {
            status: status.as_u16(),
            message: format!("failed to get response text due to {}", e),
        },
    }
}

/// A latitude/longitude pair in the WGS 84 coordinate system.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Coordinates {
    /// Latitude in decimal degrees, in the [-90, 90] range.
    latitude: f64,

    /// Longitude in decimal degrees, in the [-180, 180] range.
    longitude: f64,
}

impl Coordinates {
    /// Creates a new coordinate pair, validating that both quantities are within range.
    pub fn new(latitude: f64, longitude: f64) -> ModelResult<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ModelError(format!("Latitude {} is out of range", latitude)));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ModelError(format!("Longitude {} is out of range", longitude)));
        }
        Ok(Self { latitude, longitude })
    }

    /// Returns the latitude in decimal degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Returns the longitude in decimal degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Wire representation of a `Coordinates` before validation.
#[derive(Deserialize)]
struct RawCoordinates {
    /// Latitude as it came in, possibly out of range.
    latitude: f64,

    /// Longitude as it came in, possibly out of range.
    longitude: f64,
}

impl<'de> Deserialize<'de> for Coordinates {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawCoordinates::deserialize(deserializer)?;
        Coordinates::new(raw.latitude, raw.longitude)
            .map_err(|e| serde::de::Error::custom(e.to_string()))
    }
}

/// Routing profile to compute routes with.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RoutingProfile {
    /// Route along the road network for cars.
    #[default]
    Driving,

    /// Route along ways accessible on foot.
    Walking,

    /// Route along ways accessible by bicycle.
    Cycling,
}

impl RoutingProfile {
    /// Returns the name of the profile as the services expect it.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingProfile::Driving => "driving",
            RoutingProfile::Walking => "walking",
            RoutingProfile::Cycling => "cycling",
        }
    }
}

/// One leg of a computed route, covering the stretch between two consecutive waypoints.
#[derive(Clone, Debug, Getters, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    /// Length of the leg in meters.
    distance_meters: f64,

    /// Expected travel time of the leg in seconds.
    duration_seconds: f64,

    /// Names of the most prominent roads along the leg, when known.
    summary: String,
}

impl RouteLeg {
    /// Creates a new leg from its parts.
    pub fn new(distance_meters: f64, duration_seconds: f64, summary: String) -> Self {
        Self { distance_meters, duration_seconds, summary }
    }
}

/// A route computed over an ordered sequence of coordinates.
#[derive(Clone, Debug, Getters, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Total length of the route in meters.
    distance_meters: f64,

    /// Total expected travel time in seconds.
    duration_seconds: f64,

    /// Geometry of the route as a GeoJSON object, suitable for direct rendering.
    geometry: serde_json::Value,

    /// Per-stretch breakdown of the route, one entry per consecutive coordinate pair.
    legs: Vec<RouteLeg>,
}

impl Route {
    /// Creates a new route from its parts.
    pub fn new(
        distance_meters: f64,
        duration_seconds: f64,
        geometry: serde_json::Value,
        legs: Vec<RouteLeg>,
    ) -> Self {
        Self { distance_meters, duration_seconds, geometry, legs }
    }
}

/// Pairwise distances and durations over a set of coordinates.
///
/// Entries are `None` when the service could not find a connection between the two points.
#[derive(Clone, Debug, Getters, PartialEq, Serialize, Deserialize)]
pub struct DistanceMatrix {
    /// Distance in meters from the row's point to the column's point.
    distances: Vec<Vec<Option<f64>>>,

    /// Travel time in seconds from the row's point to the column's point.
    durations: Vec<Vec<Option<f64>>>,
}

impl DistanceMatrix {
    /// Creates a new matrix from its parts.
    pub fn new(distances: Vec<Vec<Option<f64>>>, durations: Vec<Vec<Option<f64>>>) -> Self {
        Self { distances, durations }
    }
}

/// A position snapped onto the road network.
#[derive(Clone, Debug, Getters, PartialEq, Serialize, Deserialize)]
pub struct SnappedPoint {
    /// The snapped position on the road network.
    position: Coordinates,

    /// Distance in meters between the queried position and the snapped one.
    distance_meters: f64,
}

impl SnappedPoint {
    /// Creates a new snapped point from its parts.
    pub fn new(position: Coordinates, distance_meters: f64) -> Self {
        Self { position, distance_meters }
    }
}

/// A place known to the geocoding service.
#[derive(Clone, Debug, Getters, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Position of the place.
    position: Coordinates,

    /// Human-readable description of the place.
    display_name: String,

    /// Relative importance of the place as reported by the service, when known.
    importance: Option<f64>,
}

impl Place {
    /// Creates a new place from its parts.
    pub fn new(position: Coordinates, display_name: String, importance: Option<f64>) -> Self {
        Self { position, display_name, importance }
    }
}

/// Interface to compute routes over the road network.
#[async_trait]
pub trait Router {
    /// Computes a route that visits `coordinates` in order.  The caller must supply at least two
    /// points.
    async fn calculate_route(
        &self,
        coordinates: &[Coordinates],
        profile: RoutingProfile,
    ) -> GeoResult<Route>;

    /// Computes the pairwise distances and durations between all `coordinates`.
    async fn distance_matrix(
        &self,
        coordinates: &[Coordinates],
        profile: RoutingProfile,
    ) -> GeoResult<DistanceMatrix>;

    /// Finds the point of the road network that is closest to `position`.
    async fn nearest_road(
        &self,
        position: Coordinates,
        profile: RoutingProfile,
    ) -> GeoResult<SnappedPoint>;
}

/// Interface to convert between addresses and coordinates.
#[async_trait]
pub trait Geocoder {
    /// Looks up the best match for the free-form `address`, if any.
    async fn geocode(&self, address: &str) -> GeoResult<Option<Place>>;

    /// Looks up the address of the given `position`, if any.
    async fn reverse_geocode(&self, position: Coordinates) -> GeoResult<Option<Place>>;

    /// Searches for places matching `query` within `radius_meters` of `center`.
    async fn search_nearby(
        &self,
        center: Coordinates,
        query: &str,
        radius_meters: u32,
    ) -> GeoResult<Vec<Place>>;
}

/// Formats a distance in meters as a human-readable string, switching to kilometers with one
/// decimal above 1000 m.
pub fn format_distance(distance_meters: f64) -> String {
    if distance_meters >= 1000.0 {
        format!("{:.1} km", distance_meters / 1000.0)
    } else {
        format!("{} m", distance_meters as i64)
    }
}

/// Formats a duration in seconds as a human-readable string, including the hours component only
/// above 3600 s.
pub fn format_duration(duration_seconds: f64) -> String {
    let hours = (duration_seconds / 3600.0) as i64;
    let minutes = ((duration_seconds % 3600.0) / 60.0) as i64;

    if hours > 0 {
        format!("{}h {}min", hours, minutes)
    } else {
        format!("{}min", minutes)
    }
}
