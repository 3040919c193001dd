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

//! API to create a new user.

use crate::driver::Driver;
use crate::model::UserType;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::{http, Json};
use hail_core::model::{EmailAddress, Username};
use hail_core::rest::RestError;
use serde::Deserialize;

/// Message to request the creation of a user.
#[derive(Deserialize)]
#[cfg_attr(test, derive(serde::Serialize))]
pub(crate) struct Request {
    /// Name the new account will go by.
    username: Username,

    /// Contact address of the new account.
    email: EmailAddress,

    /// Role of the new account, validated against the known roles by the handler.
    user_type: String,

    /// Whether the user starts out available.  Defaults to false.
    is_available: Option<bool>,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Json(request): Json<Request>,
) -> Result<(http::StatusCode, impl IntoResponse), RestError> {
    let user_type = UserType::parse(&request.user_type)?;
    let user = driver
        .create_user(
            request.username,
            request.email,
            user_type,
            request.is_available.unwrap_or(false),
        )
        .await?;
    Ok((http::StatusCode::CREATED, Json(user)))
}
