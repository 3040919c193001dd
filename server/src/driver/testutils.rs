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

//! Test utilities for the business layer.

use crate::db;
use crate::driver::Driver;
use crate::model::{
    Message, MessageId, MessageView, Ride, RideId, User, UserId, UserType,
};
use crate::notify::testutils::RecorderNotifier;
use hail_core::clocks::testutils::SettableClock;
use hail_core::clocks::Clock;
use hail_core::db::{Db, Executor};
use hail_core::model::{EmailAddress, Username};
use hail_geo::{MockGeocoder, MockRouter};
use std::sync::Arc;
use time::macros::datetime;

/// Instant at which all test clocks start.
pub(crate) const START_TIME: time::OffsetDateTime = datetime!(2025-06-12 08:00:00 UTC);

/// State for tests that exercise the driver directly.
pub(crate) struct TestContext {
    /// The database the driver is backed by.
    db: Arc<dyn Db + Send + Sync>,

    /// The settable clock the driver is backed by.
    clock: Arc<SettableClock>,

    /// The mock routing service the driver is backed by.
    router: MockRouter,

    /// The mock geocoding service the driver is backed by.
    geocoder: MockGeocoder,

    /// The recording notifier the driver is backed by.
    notifier: RecorderNotifier,

    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    /// Initializes a driver backed by an in-memory database, a settable clock and mock
    /// external services.
    pub(crate) async fn setup() -> Self {
        let db: Arc<dyn Db + Send + Sync> =
            Arc::from(hail_core::db::sqlite::testutils::setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();

        let clock = Arc::from(SettableClock::new(START_TIME));
        let router = MockRouter::default();
        let geocoder = MockGeocoder::default();
        let notifier = RecorderNotifier::default();

        let driver = Driver::new(
            db.clone(),
            clock.clone(),
            Arc::from(router.clone()),
            Arc::from(geocoder.clone()),
            Arc::from(notifier.clone()),
        );

        Self { db, clock, router, geocoder, notifier, driver }
    }

    /// Returns the driver under test.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Returns a direct executor against the backing database.
    pub(crate) async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    /// Returns the settable clock feeding the driver.
    pub(crate) fn clock(&self) -> &SettableClock {
        &self.clock
    }

    /// Returns the mock routing service feeding the driver.
    pub(crate) fn router(&self) -> &MockRouter {
        &self.router
    }

    /// Returns the mock geocoding service feeding the driver.
    pub(crate) fn geocoder(&self) -> &MockGeocoder {
        &self.geocoder
    }

    /// Returns the recording notifier feeding the driver.
    pub(crate) fn notifier(&self) -> &RecorderNotifier {
        &self.notifier
    }

    /// Creates a user with canned details derived from `username`, bypassing the driver.
    pub(crate) async fn create_user(&self, username: &str, user_type: UserType) -> User {
        db::create_user(
            &mut self.ex().await,
            &Username::new(username).unwrap(),
            &EmailAddress::new(format!("{}@example.com", username)).unwrap(),
            user_type,
            false,
        )
        .await
        .unwrap()
    }

    /// Creates a requested ride for `passenger_id` with canned details, bypassing the driver.
    pub(crate) async fn create_ride(&self, passenger_id: UserId) -> Ride {
        db::create_ride(
            &mut self.ex().await,
            passenger_id,
            "Origin St 1",
            "Destination Ave 2",
            None,
            None,
            &[],
            self.clock.now_utc(),
        )
        .await
        .unwrap()
    }

    /// Creates a ride for `passenger_id` already accepted by `driver_id`, bypassing the driver.
    pub(crate) async fn create_accepted_ride(
        &self,
        passenger_id: UserId,
        driver_id: UserId,
    ) -> Ride {
        let ride = self.create_ride(passenger_id).await;
        let mut ex = self.ex().await;
        assert!(db::accept_ride(&mut ex, *ride.id(), driver_id, self.clock.now_utc())
            .await
            .unwrap());
        db::get_ride(&mut ex, *ride.id()).await.unwrap()
    }
}

/// Returns a standalone message view with canned contents for tests that only need a payload.
pub(crate) fn sample_message_view() -> MessageView {
    let sender = User::new(
        UserId::new(1),
        Username::from("passenger1"),
        EmailAddress::from("passenger1@example.com"),
        UserType::Passenger,
        false,
    );
    let receiver = User::new(
        UserId::new(2),
        Username::from("driver1"),
        EmailAddress::from("driver1@example.com"),
        UserType::Driver,
        true,
    );
    let message = Message::new(
        MessageId::new(1),
        RideId::new(1),
        *sender.id(),
        *receiver.id(),
        "On my way".to_owned(),
        START_TIME,
    );
    MessageView::new(message, sender, receiver)
}
