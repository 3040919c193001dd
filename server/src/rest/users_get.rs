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

//! API to get all existing users.

use crate::driver::Driver;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use hail_core::rest::{EmptyBody, RestError};

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    let users = driver.list_users().await?;
    Ok(Json(users))
}

#[cfg(test)]
mod tests {
    use crate::model::{UserType, UserView};
    use crate::rest::testutils::*;
    use axum::http;
    use hail_core::rest::testutils::*;
    use hail_core::test_payload_must_be_empty;

    fn route() -> (http::Method, String) {
        (http::Method::GET, "/api/users".to_owned())
    }

    #[tokio::test]
    async fn test_empty() {
        let context = TestContext::setup().await;

        let response = OneShotBuilder::new(context.app(), route())
            .send_empty()
            .await
            .expect_json::<Vec<UserView>>()
            .await;
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn test_some() {
        let context = TestContext::setup().await;

        let user1 = context.create_user("passenger1", UserType::Passenger).await;
        let user2 = context.create_user("driver1", UserType::Driver).await;

        let response = OneShotBuilder::new(context.app(), route())
            .send_empty()
            .await
            .expect_json::<Vec<UserView>>()
            .await;
        assert_eq!(vec![UserView::from(user1), UserView::from(user2)], response);
    }

    test_payload_must_be_empty!(TestContext::setup().await.into_app(), route());
}
