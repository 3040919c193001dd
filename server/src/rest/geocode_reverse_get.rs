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

//! API to reverse-geocode a coordinate pair.

use crate::driver::Driver;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use hail_core::rest::{EmptyBody, RestError};
use hail_geo::Coordinates;
use serde::Deserialize;

/// Query parameters accepted by this API.
#[derive(Deserialize)]
#[cfg_attr(test, derive(serde::Serialize))]
pub(crate) struct Params {
    /// Latitude of the position to look up.
    latitude: f64,

    /// Longitude of the position to look up.
    longitude: f64,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Query(params): Query<Params>,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    let position = Coordinates::new(params.latitude, params.longitude)?;
    let place = driver.reverse_geocode(position).await?;
    Ok(Json(place))
}
