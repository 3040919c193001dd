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

//! Routing API implementation backed by an OSRM server.

use crate::{
    http_response_to_geo_error, reqwest_error_to_geo_error, Coordinates, DistanceMatrix, GeoError,
    GeoResult, Route, RouteLeg, Router, RoutingProfile, SnappedPoint, REQUEST_TIMEOUT,
};
use async_trait::async_trait;
use bytes::Buf;
use hail_core::env::get_optional_var;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

/// Address of the public OSRM demo server, used when no other server is configured.
const DEFAULT_BASE_URL: &str = "http://router.project-osrm.org";

/// Options to configure an `OsrmRouter`.
#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub struct OsrmRouterOptions {
    /// Base URL of the OSRM server to talk to, without a trailing slash.
    pub base_url: String,
}

impl OsrmRouterOptions {
    /// Creates a set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use variables such as `<prefix>_BASE_URL`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        Ok(Self {
            base_url: get_optional_var::<String>(prefix, "BASE_URL")?
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
        })
    }
}

/// Serializes `coordinates` in the `longitude,latitude;...` form that OSRM expects on its URLs.
fn serialize_coordinates(coordinates: &[Coordinates]) -> String {
    coordinates
        .iter()
        .map(|c| format!("{},{}", c.longitude(), c.latitude()))
        .collect::<Vec<String>>()
        .join(";")
}

/// Response from the OSRM service to a route request.
#[derive(Deserialize)]
struct RouteResponse {
    /// Whether the query succeeded (`Ok`) or not (any other value).
    code: String,

    /// Error message when the code is not `Ok`.
    message: Option<String>,

    /// Computed routes, best first, when the code is `Ok`.
    routes: Option<Vec<RawRoute>>,
}

/// One route as encoded within a `RouteResponse`.
#[derive(Deserialize)]
struct RawRoute {
    /// Total distance in meters.
    distance: f64,

    /// Total duration in seconds.
    duration: f64,

    /// GeoJSON geometry of the route.
    geometry: serde_json::Value,

    /// Per-waypoint-pair breakdown of the route.
    legs: Vec<RawLeg>,
}

/// One leg as encoded within a `RawRoute`.
#[derive(Deserialize)]
struct RawLeg {
    /// Distance of the leg in meters.
    distance: f64,

    /// Duration of the leg in seconds.
    duration: f64,

    /// Names of the roads along the leg.
    summary: Option<String>,
}

/// Response from the OSRM service to a table request.
#[derive(Deserialize)]
struct TableResponse {
    /// Whether the query succeeded (`Ok`) or not (any other value).
    code: String,

    /// Error message when the code is not `Ok`.
    message: Option<String>,

    /// Pairwise distances in meters, with nulls for unroutable pairs.
    distances: Option<Vec<Vec<Option<f64>>>>,

    /// Pairwise durations in seconds, with nulls for unroutable pairs.
    durations: Option<Vec<Vec<Option<f64>>>>,
}

/// Response from the OSRM service to a nearest request.
#[derive(Deserialize)]
struct NearestResponse {
    /// Whether the query succeeded (`Ok`) or not (any other value).
    code: String,

    /// Error message when the code is not `Ok`.
    message: Option<String>,

    /// Snapped candidates, best first, when the code is `Ok`.
    waypoints: Option<Vec<RawWaypoint>>,
}

/// One snapped candidate as encoded within a `NearestResponse`.
#[derive(Deserialize)]
struct RawWaypoint {
    /// Snapped position as a `[longitude, latitude]` pair.
    location: [f64; 2],

    /// Distance in meters between the query position and the snapped one.
    distance: f64,
}

/// Router that uses an OSRM server over its public HTTP API.
#[derive(Clone)]
pub struct OsrmRouter {
    /// Base URL of the OSRM server.
    base_url: String,

    /// Asynchronous HTTP client with which to issue the service requests.
    client: Client,
}

impl OsrmRouter {
    /// Creates a new OSRM-backed router using `opts` for configuration.
    pub fn new(opts: OsrmRouterOptions) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| format!("Failed to create the HTTP client: {}", e))?;
        Ok(Self { base_url: opts.base_url, client })
    }

    /// Issues a GET `request` with `query` parameters and deserializes the response into `T`,
    /// converting all failure conditions into their corresponding `GeoError`.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, &str)],
    ) -> GeoResult<T> {
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(reqwest_error_to_geo_error)?;
        match response.status() {
            StatusCode::OK => {
                let bytes = response.bytes().await.map_err(reqwest_error_to_geo_error)?;
                serde_json::from_reader(bytes.reader())
                    .map_err(|e| GeoError::Malformed(e.to_string()))
            }
            _ => Err(http_response_to_geo_error(response).await),
        }
    }
}

#[async_trait]
impl Router for OsrmRouter {
    async fn calculate_route(
        &self,
        coordinates: &[Coordinates],
        profile: RoutingProfile,
    ) -> GeoResult<Route> {
        let url = format!(
            "{}/route/v1/{}/{}",
            self.base_url,
            profile.as_str(),
            serialize_coordinates(coordinates)
        );
        let query = [("overview", "full"), ("geometries", "geojson"), ("steps", "true")];

        let response: RouteResponse = self.get_json(url, &query).await?;
        if response.code != "Ok" {
            return Err(GeoError::RemoteFailure(
                response.message.unwrap_or_else(|| format!("Unexpected code {}", response.code)),
            ));
        }

        let mut routes = response.routes.unwrap_or_default();
        if routes.is_empty() {
            return Err(GeoError::Malformed("Response carried no routes".to_owned()));
        }
        let route = routes.remove(0);

        let legs = route
            .legs
            .into_iter()
            .map(|leg| RouteLeg::new(leg.distance, leg.duration, leg.summary.unwrap_or_default()))
            .collect();
        Ok(Route::new(route.distance, route.duration, route.geometry, legs))
    }

    async fn distance_matrix(
        &self,
        coordinates: &[Coordinates],
        profile: RoutingProfile,
    ) -> GeoResult<DistanceMatrix> {
        let url = format!(
            "{}/table/v1/{}/{}",
            self.base_url,
            profile.as_str(),
            serialize_coordinates(coordinates)
        );
        let query = [("annotations", "duration,distance")];

        let response: TableResponse = self.get_json(url, &query).await?;
        if response.code != "Ok" {
            return Err(GeoError::RemoteFailure(
                response.message.unwrap_or_else(|| format!("Unexpected code {}", response.code)),
            ));
        }

        match (response.distances, response.durations) {
            (Some(distances), Some(durations)) => Ok(DistanceMatrix::new(distances, durations)),
            (_, _) => Err(GeoError::Malformed("Response carried no matrices".to_owned())),
        }
    }

    async fn nearest_road(
        &self,
        position: Coordinates,
        profile: RoutingProfile,
    ) -> GeoResult<SnappedPoint> {
        let url = format!(
            "{}/nearest/v1/{}/{},{}",
            self.base_url,
            profile.as_str(),
            position.longitude(),
            position.latitude()
        );

        let response: NearestResponse = self.get_json(url, &[]).await?;
        if response.code != "Ok" {
            return Err(GeoError::RemoteFailure(
                response.message.unwrap_or_else(|| format!("Unexpected code {}", response.code)),
            ));
        }

        let mut waypoints = response.waypoints.unwrap_or_default();
        if waypoints.is_empty() {
            return Err(GeoError::Malformed("Response carried no waypoints".to_owned()));
        }
        let waypoint = waypoints.remove(0);

        let position = Coordinates::new(waypoint.location[1], waypoint.location[0])
            .map_err(|e| GeoError::Malformed(e.to_string()))?;
        Ok(SnappedPoint::new(position, waypoint.distance))
    }
}
