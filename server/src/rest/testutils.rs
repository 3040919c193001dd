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

//! Test utilities for the REST API.

use crate::driver::testutils::TestContext as DriverTestContext;
use crate::model::{Ride, User, UserId, UserType};
use crate::notify::testutils::RecorderNotifier;
use crate::rest::app;
use axum::Router;
use hail_core::clocks::testutils::SettableClock;
use hail_core::db::Executor;
use hail_geo::{MockGeocoder, MockRouter};
use std::path::Path;

/// State for tests that exercise the service through its HTTP surface.
pub(crate) struct TestContext {
    /// The lower-layer context providing the driver and its backing components.
    inner: DriverTestContext,

    /// The router under test.
    app: Router,
}

impl TestContext {
    /// Initializes an app router backed by an in-memory database and mock external services.
    pub(crate) async fn setup() -> Self {
        let inner = DriverTestContext::setup().await;
        let app = app(inner.driver(), Path::new("static"), &[]).unwrap();
        Self { inner, app }
    }

    /// Returns the router under test.
    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    /// Returns the router under test, consuming the context.
    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    /// Returns a driver against the same backing components as the app, for test setup
    /// shortcuts.
    pub(crate) fn driver(&self) -> crate::driver::Driver {
        self.inner.driver()
    }

    /// Returns a direct executor against the backing database.
    pub(crate) async fn ex(&self) -> Executor {
        self.inner.ex().await
    }

    /// Returns the settable clock feeding the app.
    pub(crate) fn clock(&self) -> &SettableClock {
        self.inner.clock()
    }

    /// Returns the mock routing service feeding the app.
    pub(crate) fn router(&self) -> &MockRouter {
        self.inner.router()
    }

    /// Returns the mock geocoding service feeding the app.
    pub(crate) fn geocoder(&self) -> &MockGeocoder {
        self.inner.geocoder()
    }

    /// Returns the recording notifier feeding the app.
    pub(crate) fn notifier(&self) -> &RecorderNotifier {
        self.inner.notifier()
    }

    /// Creates a user with canned details derived from `username`, bypassing the app.
    pub(crate) async fn create_user(&self, username: &str, user_type: UserType) -> User {
        self.inner.create_user(username, user_type).await
    }

    /// Creates a requested ride for `passenger_id` with canned details, bypassing the app.
    pub(crate) async fn create_ride(&self, passenger_id: UserId) -> Ride {
        self.inner.create_ride(passenger_id).await
    }

    /// Creates a ride for `passenger_id` already accepted by `driver_id`, bypassing the app.
    pub(crate) async fn create_accepted_ride(
        &self,
        passenger_id: UserId,
        driver_id: UserId,
    ) -> Ride {
        self.inner.create_accepted_ride(passenger_id, driver_id).await
    }
}
