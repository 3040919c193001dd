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

//! API to update the mutable profile fields of one user.

use crate::driver::{Driver, UserUpdate};
use crate::model::UserId;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use hail_core::model::{EmailAddress, Username};
use hail_core::rest::RestError;
use serde::Deserialize;

/// Message to request a partial update of a user.
#[derive(Deserialize)]
#[cfg_attr(test, derive(Default, serde::Serialize))]
pub(crate) struct Request {
    /// New name for the account.
    username: Option<Username>,

    /// New contact address for the account.
    email: Option<EmailAddress>,

    /// New availability flag for the account.
    is_available: Option<bool>,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(user_id): Path<i64>,
    Json(request): Json<Request>,
) -> Result<impl IntoResponse, RestError> {
    let update = UserUpdate {
        username: request.username,
        email: request.email,
        is_available: request.is_available,
    };
    let user = driver.update_user(UserId::new(user_id), update).await?;
    Ok(Json(user))
}
