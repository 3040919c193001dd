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

//! The user account data types.

use derive_getters::Getters;
use hail_core::model::{EmailAddress, ModelError, ModelResult, Username};
use hail_geo::Coordinates;
use serde::{de::Visitor, Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Identifier of a user account.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub(crate) struct UserId(i64);

impl UserId {
    /// Creates a new identifier from its raw database value.
    pub(crate) fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the identifier as the raw value stored in the database.
    pub(crate) fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The role a user account plays in the system.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum UserType {
    /// A user that requests rides.
    Passenger,

    /// A user that accepts and fulfills rides.
    Driver,
}

impl UserType {
    /// Creates a user type from its wire representation.
    pub(crate) fn parse(s: &str) -> ModelResult<Self> {
        match s {
            "passenger" => Ok(UserType::Passenger),
            "driver" => Ok(UserType::Driver),
            s => {
                Err(ModelError(format!("user_type must be passenger or driver, not '{}'", s)))
            }
        }
    }

    /// Returns the wire representation of the user type.
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            UserType::Passenger => "passenger",
            UserType::Driver => "driver",
        }
    }
}

impl Serialize for UserType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// A deserialization visitor for a `UserType`.
struct UserTypeVisitor;

impl Visitor<'_> for UserTypeVisitor {
    type Value = UserType;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("either passenger or driver")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        UserType::parse(v).map_err(|e| E::custom(e.to_string()))
    }
}

impl<'de> Deserialize<'de> for UserType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(UserTypeVisitor)
    }
}

/// The last position reported by a user.
#[derive(Clone, Copy, Debug, Getters, PartialEq)]
pub(crate) struct UserLocation {
    /// Reported position.
    position: Coordinates,

    /// Time at which the position was reported.
    updated_at: OffsetDateTime,
}

impl UserLocation {
    /// Creates a new location from its parts.
    pub(crate) fn new(position: Coordinates, updated_at: OffsetDateTime) -> Self {
        Self { position, updated_at }
    }
}

/// A user account.
#[derive(Clone, Debug, Getters, PartialEq)]
pub(crate) struct User {
    /// Identifier of the account.
    id: UserId,

    /// Name the account goes by.  Globally unique.
    username: Username,

    /// Contact address of the account holder.  Globally unique.
    email: EmailAddress,

    /// Role of the account.
    user_type: UserType,

    /// Whether the user is currently willing to take part in rides.
    is_available: bool,

    /// Last position reported by the user, if any.
    location: Option<UserLocation>,
}

impl User {
    /// Creates a new user with no known location.
    pub(crate) fn new(
        id: UserId,
        username: Username,
        email: EmailAddress,
        user_type: UserType,
        is_available: bool,
    ) -> Self {
        Self { id, username, email, user_type, is_available, location: None }
    }

    /// Attaches a known location to the user.
    pub(crate) fn with_location(mut self, location: UserLocation) -> Self {
        self.location = Some(location);
        self
    }
}
