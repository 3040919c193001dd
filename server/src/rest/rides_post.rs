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

//! API to create a new ride.

use crate::driver::Driver;
use crate::model::UserId;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::{http, Json};
use hail_core::rest::RestError;
use hail_geo::Coordinates;
use serde::Deserialize;

/// Message to request the creation of a ride.
#[derive(Deserialize)]
#[cfg_attr(test, derive(serde::Serialize))]
pub(crate) struct Request {
    /// The passenger requesting the ride.
    passenger_id: UserId,

    /// Free-form description of the pickup point.
    origin: String,

    /// Free-form description of the dropoff point.
    destination: String,

    /// Coordinates of the pickup point, when known.
    origin_position: Option<Coordinates>,

    /// Coordinates of the dropoff point, when known.
    destination_position: Option<Coordinates>,

    /// Ordered intermediate stops between origin and destination.
    waypoints: Option<Vec<Coordinates>>,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Json(request): Json<Request>,
) -> Result<(http::StatusCode, impl IntoResponse), RestError> {
    let ride = driver
        .create_ride(
            request.passenger_id,
            request.origin,
            request.destination,
            request.origin_position,
            request.destination_position,
            request.waypoints.unwrap_or_default(),
        )
        .await?;
    Ok((http::StatusCode::CREATED, Json(ride)))
}
