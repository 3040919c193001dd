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

//! The ride data types and lifecycle rules.

use crate::model::UserId;
use derive_getters::Getters;
use hail_core::model::{ModelError, ModelResult};
use hail_geo::Coordinates;
use serde::{de::Visitor, Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Identifier of a ride.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub(crate) struct RideId(i64);

impl RideId {
    /// Creates a new identifier from its raw database value.
    pub(crate) fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the identifier as the raw value stored in the database.
    pub(crate) fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for RideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of a ride.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum RideStatus {
    /// The passenger asked for the ride and no driver has taken it yet.
    Requested,

    /// A driver committed to the ride.
    Accepted,

    /// The ride is underway.
    InProgress,

    /// The ride finished normally.
    Completed,

    /// The ride was called off.
    Cancelled,
}

impl RideStatus {
    /// Creates a status from its wire representation.
    pub(crate) fn parse(s: &str) -> ModelResult<Self> {
        match s {
            "requested" => Ok(RideStatus::Requested),
            "accepted" => Ok(RideStatus::Accepted),
            "in_progress" => Ok(RideStatus::InProgress),
            "completed" => Ok(RideStatus::Completed),
            "cancelled" => Ok(RideStatus::Cancelled),
            s => Err(ModelError(format!(
                "Status must be one of requested, accepted, in_progress, completed, cancelled; \
                 got '{}'",
                s
            ))),
        }
    }

    /// Returns the wire representation of the status.
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            RideStatus::Requested => "requested",
            RideStatus::Accepted => "accepted",
            RideStatus::InProgress => "in_progress",
            RideStatus::Completed => "completed",
            RideStatus::Cancelled => "cancelled",
        }
    }
}

impl Serialize for RideStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// A deserialization visitor for a `RideStatus`.
struct RideStatusVisitor;

impl Visitor<'_> for RideStatusVisitor {
    type Value = RideStatus;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a ride status")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        RideStatus::parse(v).map_err(|e| E::custom(e.to_string()))
    }
}

impl<'de> Deserialize<'de> for RideStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(RideStatusVisitor)
    }
}

/// Validates a status change from `from` to `to`.
///
/// Acceptance is guarded separately by the conditional update in the persistence layer, and every
/// other pair of states is currently a legal transition: drivers and passengers fix up rides out
/// of order in the field, and the upstream clients rely on that.  Tightening the policy only
/// requires changing this one function.
pub(crate) fn validate_transition(_from: RideStatus, _to: RideStatus) -> ModelResult<()> {
    Ok(())
}

/// A passenger-requested trip and its lifecycle state.
#[derive(Clone, Debug, Getters, PartialEq)]
pub(crate) struct Ride {
    /// Identifier of the ride.
    id: RideId,

    /// The passenger that requested the ride.
    passenger_id: UserId,

    /// The driver fulfilling the ride.  Unset until the ride leaves the requested state.
    driver_id: Option<UserId>,

    /// Free-form description of the pickup point.
    origin: String,

    /// Free-form description of the dropoff point.
    destination: String,

    /// Coordinates of the pickup point, when known.
    origin_position: Option<Coordinates>,

    /// Coordinates of the dropoff point, when known.
    destination_position: Option<Coordinates>,

    /// Ordered intermediate stops between origin and destination.
    waypoints: Vec<Coordinates>,

    /// Lifecycle state of the ride.
    status: RideStatus,

    /// Time at which the ride was requested.
    created_at: OffsetDateTime,

    /// Time of the last mutation to the ride.
    updated_at: OffsetDateTime,
}

impl Ride {
    /// Creates a new ride with no driver, no coordinates and no waypoints.
    pub(crate) fn new(
        id: RideId,
        passenger_id: UserId,
        origin: String,
        destination: String,
        status: RideStatus,
        created_at: OffsetDateTime,
        updated_at: OffsetDateTime,
    ) -> Self {
        Self {
            id,
            passenger_id,
            driver_id: None,
            origin,
            destination,
            origin_position: None,
            destination_position: None,
            waypoints: vec![],
            status,
            created_at,
            updated_at,
        }
    }

    /// Attaches a driver to the ride.
    pub(crate) fn with_driver(mut self, driver_id: UserId) -> Self {
        self.driver_id = Some(driver_id);
        self
    }

    /// Attaches pickup coordinates to the ride.
    pub(crate) fn with_origin_position(mut self, position: Coordinates) -> Self {
        self.origin_position = Some(position);
        self
    }

    /// Attaches dropoff coordinates to the ride.
    pub(crate) fn with_destination_position(mut self, position: Coordinates) -> Self {
        self.destination_position = Some(position);
        self
    }

    /// Attaches intermediate stops to the ride.
    pub(crate) fn with_waypoints(mut self, waypoints: Vec<Coordinates>) -> Self {
        self.waypoints = waypoints;
        self
    }
}

/// A partial update to the route details of a ride.  Fields that are absent are left untouched.
#[derive(Debug, Default, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
pub(crate) struct RideRouteUpdate {
    /// New free-form description of the pickup point.
    pub(crate) origin: Option<String>,

    /// New free-form description of the dropoff point.
    pub(crate) destination: Option<String>,

    /// New coordinates of the pickup point.
    pub(crate) origin_position: Option<Coordinates>,

    /// New coordinates of the dropoff point.
    pub(crate) destination_position: Option<Coordinates>,

    /// New ordered sequence of intermediate stops.
    pub(crate) waypoints: Option<Vec<Coordinates>>,
}
