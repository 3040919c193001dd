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

//! Wire representations of the domain types.
//!
//! Views are assembled explicitly from the entities they aggregate.  A `RideView` embeds the
//! passenger and driver accounts and a `MessageView` embeds the sender and receiver; it is the
//! driver layer's job to fetch those related entities and compose them, so there is no hidden
//! lazy loading anywhere.

use crate::model::{Message, MessageId, Ride, RideId, RideStatus, User, UserId, UserType};
use hail_core::model::{EmailAddress, Username};
use hail_geo::{format_distance, format_duration, Coordinates, Route};
use serde::Serialize;
#[cfg(test)]
use serde::Deserialize;
use time::OffsetDateTime;

/// Wire representation of a user account.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub(crate) struct UserView {
    /// Identifier of the account.
    pub(crate) id: UserId,

    /// Name the account goes by.
    pub(crate) username: Username,

    /// Contact address of the account holder.
    pub(crate) email: EmailAddress,

    /// Role of the account.
    pub(crate) user_type: UserType,

    /// Whether the user is currently willing to take part in rides.
    pub(crate) is_available: bool,

    /// Latitude of the last reported position, if any.
    pub(crate) latitude: Option<f64>,

    /// Longitude of the last reported position, if any.
    pub(crate) longitude: Option<f64>,

    /// Time of the last position report, if any.
    #[serde(with = "time::serde::rfc3339::option")]
    pub(crate) location_updated_at: Option<OffsetDateTime>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        let (latitude, longitude, location_updated_at) = match user.location() {
            Some(location) => (
                Some(location.position().latitude()),
                Some(location.position().longitude()),
                Some(*location.updated_at()),
            ),
            None => (None, None, None),
        };
        Self {
            id: *user.id(),
            username: user.username().clone(),
            email: user.email().clone(),
            user_type: *user.user_type(),
            is_available: *user.is_available(),
            latitude,
            longitude,
            location_updated_at,
        }
    }
}

/// Wire representation of a user's last known location.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub(crate) struct LocationView {
    /// Latitude of the last reported position.
    pub(crate) latitude: f64,

    /// Longitude of the last reported position.
    pub(crate) longitude: f64,

    /// Time of the last position report.
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) updated_at: OffsetDateTime,
}

/// Wire representation of a ride, embedding the accounts of its two parties.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub(crate) struct RideView {
    /// Identifier of the ride.
    pub(crate) id: RideId,

    /// Identifier of the passenger that requested the ride.
    pub(crate) passenger_id: UserId,

    /// Identifier of the driver fulfilling the ride, if any yet.
    pub(crate) driver_id: Option<UserId>,

    /// Free-form description of the pickup point.
    pub(crate) origin: String,

    /// Free-form description of the dropoff point.
    pub(crate) destination: String,

    /// Coordinates of the pickup point, when known.
    pub(crate) origin_position: Option<Coordinates>,

    /// Coordinates of the dropoff point, when known.
    pub(crate) destination_position: Option<Coordinates>,

    /// Ordered intermediate stops between origin and destination.
    pub(crate) waypoints: Vec<Coordinates>,

    /// Lifecycle state of the ride.
    pub(crate) status: RideStatus,

    /// Time at which the ride was requested.
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) created_at: OffsetDateTime,

    /// Time of the last mutation to the ride.
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) updated_at: OffsetDateTime,

    /// Account of the passenger.
    pub(crate) passenger: UserView,

    /// Account of the driver, if any yet.
    pub(crate) driver: Option<UserView>,
}

impl RideView {
    /// Assembles the view of `ride` from the already-fetched `passenger` and `driver` accounts.
    pub(crate) fn new(ride: Ride, passenger: User, driver: Option<User>) -> Self {
        debug_assert_eq!(ride.passenger_id(), passenger.id());
        Self {
            id: *ride.id(),
            passenger_id: *ride.passenger_id(),
            driver_id: *ride.driver_id(),
            origin: ride.origin().clone(),
            destination: ride.destination().clone(),
            origin_position: *ride.origin_position(),
            destination_position: *ride.destination_position(),
            waypoints: ride.waypoints().clone(),
            status: *ride.status(),
            created_at: *ride.created_at(),
            updated_at: *ride.updated_at(),
            passenger: UserView::from(passenger),
            driver: driver.map(UserView::from),
        }
    }
}

/// Wire representation of a message, embedding the accounts of its two parties.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub(crate) struct MessageView {
    /// Identifier of the message.
    pub(crate) id: MessageId,

    /// The ride this message belongs to.
    pub(crate) ride_id: RideId,

    /// Identifier of the party that wrote the message.
    pub(crate) sender_id: UserId,

    /// Identifier of the party the message is addressed to.
    pub(crate) receiver_id: UserId,

    /// Body of the message.
    pub(crate) content: String,

    /// Time at which the message was stored.
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) created_at: OffsetDateTime,

    /// Account of the sender.
    pub(crate) sender: UserView,

    /// Account of the receiver.
    pub(crate) receiver: UserView,
}

impl MessageView {
    /// Assembles the view of `message` from the already-fetched `sender` and `receiver` accounts.
    pub(crate) fn new(message: Message, sender: User, receiver: User) -> Self {
        debug_assert_eq!(message.sender_id(), sender.id());
        debug_assert_eq!(message.receiver_id(), receiver.id());
        Self {
            id: *message.id(),
            ride_id: *message.ride_id(),
            sender_id: *message.sender_id(),
            receiver_id: *message.receiver_id(),
            content: message.content().clone(),
            created_at: *message.created_at(),
            sender: UserView::from(sender),
            receiver: UserView::from(receiver),
        }
    }
}

/// Wire representation of a computed route.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub(crate) struct RouteSummaryView {
    /// Total length of the route in meters.
    pub(crate) distance_meters: f64,

    /// Total expected travel time in seconds.
    pub(crate) duration_seconds: f64,

    /// Human-readable rendering of the distance.
    pub(crate) distance_text: String,

    /// Human-readable rendering of the duration.
    pub(crate) duration_text: String,

    /// Geometry of the route as a GeoJSON object.
    pub(crate) geometry: serde_json::Value,
}

impl From<Route> for RouteSummaryView {
    fn from(route: Route) -> Self {
        Self {
            distance_meters: *route.distance_meters(),
            duration_seconds: *route.duration_seconds(),
            distance_text: format_distance(*route.distance_meters()),
            duration_text: format_duration(*route.duration_seconds()),
            geometry: route.geometry().clone(),
        }
    }
}
