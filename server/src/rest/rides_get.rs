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

//! API to get all rides, with optional equality filters.

use crate::db::RideFilter;
use crate::driver::Driver;
use crate::model::{RideStatus, UserId};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use hail_core::rest::{EmptyBody, RestError};
use serde::Deserialize;

/// Query parameters accepted by this API.
#[derive(Deserialize)]
#[cfg_attr(test, derive(Default, serde::Serialize))]
pub(crate) struct Params {
    /// Keep only rides requested by this passenger.
    passenger_id: Option<i64>,

    /// Keep only rides fulfilled by this driver.
    driver_id: Option<i64>,

    /// Keep only rides in this state, validated against the enumeration by the handler.
    status: Option<String>,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Query(params): Query<Params>,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    let status = match params.status.as_deref() {
        Some(status) => Some(RideStatus::parse(status)?),
        None => None,
    };
    let filter = RideFilter {
        passenger_id: params.passenger_id.map(UserId::new),
        driver_id: params.driver_id.map(UserId::new),
        status,
    };
    let rides = driver.list_rides(filter).await?;
    Ok(Json(rides))
}
