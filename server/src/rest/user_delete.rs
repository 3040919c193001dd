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

//! API to delete one user.

use crate::driver::Driver;
use crate::model::UserId;
use axum::extract::{Path, State};
use axum::http;
use hail_core::rest::{EmptyBody, RestError};

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(user_id): Path<i64>,
    _: EmptyBody,
) -> Result<http::StatusCode, RestError> {
    driver.delete_user(UserId::new(user_id)).await?;
    Ok(http::StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::db;
    use crate::model::UserType;
    use crate::rest::testutils::*;
    use axum::http;
    use hail_core::db::DbError;
    use hail_core::rest::testutils::*;
    use hail_core::test_payload_must_be_empty;

    fn route(user_id: i64) -> (http::Method, String) {
        (http::Method::DELETE, format!("/api/users/{}", user_id))
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;

        let user = context.create_user("somebody", UserType::Passenger).await;

        OneShotBuilder::new(context.app(), route(user.id().as_i64()))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NO_CONTENT)
            .expect_empty()
            .await;

        assert_eq!(
            DbError::NotFound,
            db::get_user(&mut context.ex().await, *user.id()).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_referenced_user_is_rejected() {
        let context = TestContext::setup().await;

        let passenger = context.create_user("passenger1", UserType::Passenger).await;
        context.create_ride(*passenger.id()).await;

        OneShotBuilder::new(context.app(), route(passenger.id().as_i64()))
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("cannot be deleted")
            .await;
    }

    #[tokio::test]
    async fn test_not_found() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route(44))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("User 44 not found")
            .await;
    }

    test_payload_must_be_empty!(TestContext::setup().await.into_app(), route(1));
}
