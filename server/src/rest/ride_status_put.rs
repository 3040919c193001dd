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

//! API to update the lifecycle status of one ride.

use crate::driver::Driver;
use crate::model::{RideId, RideStatus};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use hail_core::rest::RestError;
use serde::Deserialize;

/// Message to request a status change.
#[derive(Deserialize)]
#[cfg_attr(test, derive(serde::Serialize))]
pub(crate) struct Request {
    /// The new status, validated against the enumeration by the handler.
    status: String,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(ride_id): Path<i64>,
    Json(request): Json<Request>,
) -> Result<impl IntoResponse, RestError> {
    let status = RideStatus::parse(&request.status)?;
    let ride = driver.update_ride_status(RideId::new(ride_id), status).await?;
    Ok(Json(ride))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RideView, UserType};
    use crate::rest::testutils::*;
    use axum::http;
    use hail_core::rest::testutils::*;
    use hail_core::test_payload_must_be_json;

    fn route(ride_id: i64) -> (http::Method, String) {
        (http::Method::PUT, format!("/api/rides/{}/status", ride_id))
    }

    #[tokio::test]
    async fn test_any_member_value_from_any_state() {
        let context = TestContext::setup().await;

        let passenger = context.create_user("passenger1", UserType::Passenger).await;
        let ride = context.create_ride(*passenger.id()).await;

        for status in ["in_progress", "completed", "cancelled", "requested", "accepted"] {
            let response = OneShotBuilder::new(context.app(), route(ride.id().as_i64()))
                .send_json(Request { status: status.to_owned() })
                .await
                .expect_json::<RideView>()
                .await;
            assert_eq!(RideStatus::parse(status).unwrap(), response.status);
        }
    }

    #[tokio::test]
    async fn test_bad_status() {
        let context = TestContext::setup().await;

        let passenger = context.create_user("passenger1", UserType::Passenger).await;
        let ride = context.create_ride(*passenger.id()).await;

        OneShotBuilder::new(context.app(), route(ride.id().as_i64()))
            .send_json(Request { status: "finished".to_owned() })
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("Status must be one of")
            .await;
    }

    #[tokio::test]
    async fn test_not_found() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route(4))
            .send_json(Request { status: "cancelled".to_owned() })
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("Ride 4 not found")
            .await;
    }

    test_payload_must_be_json!(TestContext::setup().await.into_app(), route(1));
}
