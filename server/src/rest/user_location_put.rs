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

//! API to record the last known position of one user.

use crate::driver::Driver;
use crate::model::UserId;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use hail_core::rest::RestError;
use hail_geo::Coordinates;
use serde::Deserialize;

/// Message to report a user's position.
#[derive(Deserialize)]
#[cfg_attr(test, derive(serde::Serialize))]
pub(crate) struct Request {
    /// Latitude of the reported position.
    latitude: f64,

    /// Longitude of the reported position.
    longitude: f64,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(user_id): Path<i64>,
    Json(request): Json<Request>,
) -> Result<impl IntoResponse, RestError> {
    let position = Coordinates::new(request.latitude, request.longitude)?;
    let user = driver.update_user_location(UserId::new(user_id), position).await?;
    Ok(Json(user))
}
