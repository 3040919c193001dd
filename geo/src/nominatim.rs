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

//! Geocoding API implementation backed by OpenStreetMap Nominatim.

use crate::{
    http_response_to_geo_error, reqwest_error_to_geo_error, Coordinates, GeoError, GeoResult,
    Geocoder, Place, REQUEST_TIMEOUT,
};
use async_trait::async_trait;
use bytes::Buf;
use hail_core::env::get_optional_var;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

/// Address of the public Nominatim instance, used when no other server is configured.
const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// User agent to identify ourselves with, as required by the Nominatim usage policy.
const DEFAULT_USER_AGENT: &str = "hail/0.0";

/// Number of meters covered by one degree of latitude.
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Maximum number of places returned by a nearby search.
const NEARBY_LIMIT: &str = "10";

/// Options to configure a `NominatimGeocoder`.
#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub struct NominatimGeocoderOptions {
    /// Base URL of the Nominatim server to talk to, without a trailing slash.
    pub base_url: String,

    /// User agent to identify ourselves with on every request.
    pub user_agent: String,
}

impl NominatimGeocoderOptions {
    /// Creates a set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use variables such as `<prefix>_BASE_URL` and `<prefix>_USER_AGENT`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        Ok(Self {
            base_url: get_optional_var::<String>(prefix, "BASE_URL")?
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            user_agent: get_optional_var::<String>(prefix, "USER_AGENT")?
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned()),
        })
    }
}

/// Computes the `left,top,right,bottom` bounding box around `center` that covers
/// `radius_meters` in every direction.
///
/// One degree of latitude is about `METERS_PER_DEGREE` meters everywhere; the longitude offset
/// is scaled by the latitude to account for meridian convergence.
fn bounding_box(center: Coordinates, radius_meters: u32) -> (f64, f64, f64, f64) {
    let lat_offset = f64::from(radius_meters) / METERS_PER_DEGREE;
    let lon_offset = f64::from(radius_meters) / (METERS_PER_DEGREE * center.latitude().abs());
    (
        center.longitude() - lon_offset,
        center.latitude() + lat_offset,
        center.longitude() + lon_offset,
        center.latitude() - lat_offset,
    )
}

/// One place as returned by the search and reverse endpoints.
///
/// Nominatim encodes coordinates as strings, so they require parsing before use.
#[derive(Deserialize)]
struct RawPlace {
    /// Latitude of the place as a decimal string.
    lat: String,

    /// Longitude of the place as a decimal string.
    lon: String,

    /// Human-readable description of the place.
    display_name: String,

    /// Relative importance of the place.
    importance: Option<f64>,
}

impl RawPlace {
    /// Validates the raw place and converts it into a `Place`.
    fn into_place(self) -> GeoResult<Place> {
        let latitude = self
            .lat
            .parse::<f64>()
            .map_err(|e| GeoError::Malformed(format!("Invalid latitude {}: {}", self.lat, e)))?;
        let longitude = self
            .lon
            .parse::<f64>()
            .map_err(|e| GeoError::Malformed(format!("Invalid longitude {}: {}", self.lon, e)))?;
        let position = Coordinates::new(latitude, longitude)
            .map_err(|e| GeoError::Malformed(e.to_string()))?;
        Ok(Place::new(position, self.display_name, self.importance))
    }
}

/// Response from the reverse endpoint.  Errors come back as a 200 with no `display_name`.
#[derive(Deserialize)]
struct RawReverse {
    /// Human-readable description of the position, absent when nothing is there.
    display_name: Option<String>,
}

/// Geocoder that uses a Nominatim server over its public HTTP API.
#[derive(Clone)]
pub struct NominatimGeocoder {
    /// Base URL of the Nominatim server.
    base_url: String,

    /// Asynchronous HTTP client with which to issue the service requests.
    client: Client,
}

impl NominatimGeocoder {
    /// Creates a new Nominatim-backed geocoder using `opts` for configuration.
    pub fn new(opts: NominatimGeocoderOptions) -> Result<Self, String> {
        let client = Client::builder()
            .user_agent(opts.user_agent)
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
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> GeoResult<Option<Place>> {
        let url = format!("{}/search", self.base_url);
        let query =
            [("q", address), ("format", "json"), ("addressdetails", "1"), ("limit", "1")];

        let mut places: Vec<RawPlace> = self.get_json(url, &query).await?;
        if places.is_empty() {
            return Ok(None);
        }
        Ok(Some(places.remove(0).into_place()?))
    }

    async fn reverse_geocode(&self, position: Coordinates) -> GeoResult<Option<Place>> {
        let url = format!("{}/reverse", self.base_url);
        let lat = position.latitude().to_string();
        let lon = position.longitude().to_string();
        let query =
            [("lat", lat.as_str()), ("lon", lon.as_str()), ("format", "json"),
             ("addressdetails", "1")];

        let response: RawReverse = self.get_json(url, &query).await?;
        match response.display_name {
            Some(display_name) => Ok(Some(Place::new(position, display_name, None))),
            None => Ok(None),
        }
    }

    async fn search_nearby(
        &self,
        center: Coordinates,
        query: &str,
        radius_meters: u32,
    ) -> GeoResult<Vec<Place>> {
        let (left, top, right, bottom) = bounding_box(center, radius_meters);
        let viewbox = format!("{},{},{},{}", left, top, right, bottom);

        let url = format!("{}/search", self.base_url);
        let query = [
            ("q", query),
            ("format", "json"),
            ("addressdetails", "1"),
            ("limit", NEARBY_LIMIT),
            ("viewbox", viewbox.as_str()),
            ("bounded", "1"),
        ];

        let places: Vec<RawPlace> = self.get_json(url, &query).await?;
        places.into_iter().map(RawPlace::into_place).collect()
    }
}
