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

//! API for a driver to accept one ride.

use crate::driver::Driver;
use crate::model::RideId;
use crate::model::UserId;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use hail_core::rest::RestError;
use serde::Deserialize;

/// Message to request the acceptance of a ride.
#[derive(Deserialize)]
#[cfg_attr(test, derive(serde::Serialize))]
pub(crate) struct Request {
    /// The driver committing to the ride.
    driver_id: UserId,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(ride_id): Path<i64>,
    Json(request): Json<Request>,
) -> Result<impl IntoResponse, RestError> {
    let ride = driver.accept_ride(RideId::new(ride_id), request.driver_id).await?;
    Ok(Json(ride))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RideStatus, RideView, UserType};
    use crate::rest::testutils::*;
    use axum::http;
    use hail_core::rest::testutils::*;
    use hail_core::test_payload_must_be_json;

    fn route(ride_id: i64) -> (http::Method, String) {
        (http::Method::POST, format!("/api/rides/{}/accept", ride_id))
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;

        let passenger = context.create_user("passenger1", UserType::Passenger).await;
        let driver = context.create_user("driver1", UserType::Driver).await;
        let ride = context.create_ride(*passenger.id()).await;

        let response = OneShotBuilder::new(context.app(), route(ride.id().as_i64()))
            .send_json(Request { driver_id: *driver.id() })
            .await
            .expect_json::<RideView>()
            .await;
        assert_eq!(RideStatus::Accepted, response.status);
        assert_eq!(Some(*driver.id()), response.driver_id);
    }

    #[tokio::test]
    async fn test_driver_not_found() {
        let context = TestContext::setup().await;

        let passenger = context.create_user("passenger1", UserType::Passenger).await;
        let ride = context.create_ride(*passenger.id()).await;

        OneShotBuilder::new(context.app(), route(ride.id().as_i64()))
            .send_json(Request { driver_id: UserId::new(99) })
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("Driver 99 not found")
            .await;
    }

    #[tokio::test]
    async fn test_ride_not_found() {
        let context = TestContext::setup().await;

        let driver = context.create_user("driver1", UserType::Driver).await;

        OneShotBuilder::new(context.app(), route(111))
            .send_json(Request { driver_id: *driver.id() })
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("Ride 111 not found")
            .await;
    }

    #[tokio::test]
    async fn test_conflict_when_already_accepted() {
        let context = TestContext::setup().await;

        let passenger = context.create_user("passenger1", UserType::Passenger).await;
        let driver1 = context.create_user("driver1", UserType::Driver).await;
        let driver2 = context.create_user("driver2", UserType::Driver).await;
        let ride = context.create_accepted_ride(*passenger.id(), *driver1.id()).await;

        OneShotBuilder::new(context.app(), route(ride.id().as_i64()))
            .send_json(Request { driver_id: *driver2.id() })
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("not available for acceptance")
            .await;
    }

    test_payload_must_be_json!(TestContext::setup().await.into_app(), route(1));
}
