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

//! API to get the last known position of one user.

use crate::driver::Driver;
use crate::model::UserId;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use hail_core::rest::{EmptyBody, RestError};

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(user_id): Path<i64>,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    let location = driver.get_user_location(UserId::new(user_id)).await?;
    Ok(Json(location))
}

#[cfg(test)]
mod tests {
    use crate::model::{LocationView, UserType};
    use crate::rest::testutils::*;
    use axum::http;
    use hail_core::rest::testutils::*;
    use hail_core::test_payload_must_be_empty;
    use hail_geo::Coordinates;

    fn route(user_id: i64) -> (http::Method, String) {
        (http::Method::GET, format!("/api/users/{}/location", user_id))
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;

        let user = context.create_user("driver1", UserType::Driver).await;
        context
            .driver()
            .update_user_location(*user.id(), Coordinates::new(10.5, 20.5).unwrap())
            .await
            .unwrap();

        let response = OneShotBuilder::new(context.app(), route(user.id().as_i64()))
            .send_empty()
            .await
            .expect_json::<LocationView>()
            .await;
        assert_eq!(10.5, response.latitude);
        assert_eq!(20.5, response.longitude);
    }

    #[tokio::test]
    async fn test_never_recorded() {
        let context = TestContext::setup().await;

        let user = context.create_user("driver1", UserType::Driver).await;

        OneShotBuilder::new(context.app(), route(user.id().as_i64()))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("has no known location")
            .await;
    }

    #[tokio::test]
    async fn test_user_not_found() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route(9))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("User 9 not found")
            .await;
    }

    test_payload_must_be_empty!(TestContext::setup().await.into_app(), route(1));
}
