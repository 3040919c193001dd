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

//! Business logic for the service.

use crate::notify::MessageNotifier;
use hail_core::clocks::Clock;
use hail_core::db::Db;
use hail_geo::{Geocoder, Router};
use std::sync::Arc;

mod geocoding;
mod messages;
mod rides;
#[cfg(test)]
pub(crate) mod testutils;
mod users;
pub(crate) use users::UserUpdate;

/// Business logic.
///
/// The public operations exposed by the driver are all "one shot": when they touch the database,
/// they start and commit a transaction, so it's incorrect for the caller to use two separate
/// calls.  For this reason, these operations consume the driver in an attempt to minimize the
/// possibility of executing two operations.
#[derive(Clone)]
pub(crate) struct Driver {
    /// The database that the driver uses for persistence.
    db: Arc<dyn Db + Send + Sync>,

    /// The clock that all timestamps come from.
    clock: Arc<dyn Clock + Send + Sync>,

    /// The routing service used to compute distances and routes.
    router: Arc<dyn Router + Send + Sync>,

    /// The geocoding service used to convert between addresses and coordinates.
    geocoder: Arc<dyn Geocoder + Send + Sync>,

    /// The best-effort notification hook fired after a message is stored.
    notifier: Arc<dyn MessageNotifier + Send + Sync>,
}

impl Driver {
    /// Creates a new driver backed by the given injected components.
    pub(crate) fn new(
        db: Arc<dyn Db + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
        router: Arc<dyn Router + Send + Sync>,
        geocoder: Arc<dyn Geocoder + Send + Sync>,
        notifier: Arc<dyn MessageNotifier + Send + Sync>,
    ) -> Self {
        Self { db, clock, router, geocoder, notifier }
    }
}
