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

//! API to update the route details of one ride.

use crate::driver::Driver;
use crate::model::{RideId, RideRouteUpdate};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use hail_core::rest::RestError;

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(ride_id): Path<i64>,
    Json(request): Json<RideRouteUpdate>,
) -> Result<impl IntoResponse, RestError> {
    let ride = driver.update_ride_route(RideId::new(ride_id), request).await?;
    Ok(Json(ride))
}

#[cfg(test)]
mod tests {
    use crate::model::{RideRouteUpdate, RideView, UserType};
    use crate::rest::testutils::*;
    use axum::http;
    use hail_core::rest::testutils::*;
    use hail_core::test_payload_must_be_json;
    use hail_geo::Coordinates;

    fn route(ride_id: i64) -> (http::Method, String) {
        (http::Method::PUT, format!("/api/rides/{}/route", ride_id))
    }

    #[tokio::test]
    async fn test_partial_update() {
        let context = TestContext::setup().await;

        let passenger = context.create_user("passenger1", UserType::Passenger).await;
        let ride = context.create_ride(*passenger.id()).await;

        let destination_position = Coordinates::new(-23.59, -46.68).unwrap();
        let request = RideRouteUpdate {
            destination: Some("New destination".to_owned()),
            destination_position: Some(destination_position),
            ..Default::default()
        };
        let response = OneShotBuilder::new(context.app(), route(ride.id().as_i64()))
            .send_json(request)
            .await
            .expect_json::<RideView>()
            .await;

        assert_eq!(ride.origin(), &response.origin);
        assert_eq!("New destination", &response.destination);
        assert_eq!(Some(destination_position), response.destination_position);
        assert_eq!(None, response.origin_position);
    }

    #[tokio::test]
    async fn test_not_found() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route(5))
            .send_json(RideRouteUpdate::default())
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("Ride 5 not found")
            .await;
    }

    test_payload_must_be_json!(TestContext::setup().await.into_app(), route(1));
}
