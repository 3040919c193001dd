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

//! The in-ride message data types.

use crate::model::{RideId, UserId};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Identifier of a message.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub(crate) struct MessageId(i64);

impl MessageId {
    /// Creates a new identifier from its raw database value.
    pub(crate) fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the identifier as the raw value stored in the database.
    pub(crate) fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One message exchanged between the two parties of a ride.
///
/// The receiver is always the counterpart of the sender within the ride, and messages are
/// immutable once stored.
#[derive(Clone, Debug, Getters, PartialEq)]
pub(crate) struct Message {
    /// Identifier of the message.
    id: MessageId,

    /// The ride this message belongs to.
    ride_id: RideId,

    /// The party that wrote the message.
    sender_id: UserId,

    /// The party the message is addressed to.
    receiver_id: UserId,

    /// Body of the message.
    content: String,

    /// Time at which the message was stored.
    created_at: OffsetDateTime,
}

impl Message {
    /// Creates a new message from its parts.
    pub(crate) fn new(
        id: MessageId,
        ride_id: RideId,
        sender_id: UserId,
        receiver_id: UserId,
        content: String,
        created_at: OffsetDateTime,
    ) -> Self {
        Self { id, ride_id, sender_id, receiver_id, content, created_at }
    }
}
