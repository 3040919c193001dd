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

//! API to send a message within one ride.

use crate::driver::Driver;
use crate::model::{RideId, UserId};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::{http, Json};
use hail_core::rest::RestError;
use serde::Deserialize;

/// Message to request the creation of an in-ride message.  The receiver is never part of the
/// request; it is always derived as the ride's other party.
#[derive(Deserialize)]
#[cfg_attr(test, derive(serde::Serialize))]
pub(crate) struct Request {
    /// The party writing the message.
    sender_id: UserId,

    /// Body of the message.
    content: String,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(ride_id): Path<i64>,
    Json(request): Json<Request>,
) -> Result<(http::StatusCode, impl IntoResponse), RestError> {
    let message =
        driver.send_message(RideId::new(ride_id), request.sender_id, request.content).await?;
    Ok((http::StatusCode::CREATED, Json(message)))
}
