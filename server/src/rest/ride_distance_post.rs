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

//! API to compute the distance between a driver's live position and one ride's destination.

use crate::driver::Driver;
use crate::model::RideId;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use hail_core::rest::RestError;
use hail_geo::Coordinates;
use serde::Deserialize;

/// Message carrying the driver's live position.
#[derive(Deserialize)]
#[cfg_attr(test, derive(serde::Serialize))]
pub(crate) struct Request {
    /// Latitude of the driver's position.
    latitude: f64,

    /// Longitude of the driver's position.
    longitude: f64,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(ride_id): Path<i64>,
    Json(request): Json<Request>,
) -> Result<impl IntoResponse, RestError> {
    let position = Coordinates::new(request.latitude, request.longitude)?;
    let route = driver.distance_to_driver(RideId::new(ride_id), position).await?;
    Ok(Json(route))
}
