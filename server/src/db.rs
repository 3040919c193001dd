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

//! Database abstraction in terms of the operations needed by the server.

use crate::model::{
    Message, MessageId, Ride, RideId, RideStatus, User, UserId, UserLocation, UserType,
};
use hail_core::db::sqlite::{build_timestamp, map_sqlx_error, run_schema, unpack_timestamp};
use hail_core::db::{DbError, DbResult, Executor};
use hail_core::model::{EmailAddress, Username};
use hail_geo::Coordinates;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use time::OffsetDateTime;

#[cfg(test)]
mod tests;

/// Schema to apply to the database at boot time.
const SCHEMA: &str = include_str!("db/sqlite.sql");

/// Initializes the database schema.
pub(crate) async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        Executor::Sqlite(ex) => run_schema(ex, SCHEMA).await,
    }
}

/// Extracts the optional location columns of a user row.
fn location_from_row(row: &SqliteRow) -> DbResult<Option<UserLocation>> {
    let latitude: Option<f64> = row.try_get("latitude").map_err(map_sqlx_error)?;
    let longitude: Option<f64> = row.try_get("longitude").map_err(map_sqlx_error)?;
    let updated_at_secs: Option<i64> =
        row.try_get("location_updated_at_secs").map_err(map_sqlx_error)?;
    let updated_at_nsecs: Option<i64> =
        row.try_get("location_updated_at_nsecs").map_err(map_sqlx_error)?;

    match (latitude, longitude, updated_at_secs, updated_at_nsecs) {
        (Some(latitude), Some(longitude), Some(secs), Some(nsecs)) => {
            let position = Coordinates::new(latitude, longitude)?;
            Ok(Some(UserLocation::new(position, build_timestamp(secs, nsecs)?)))
        }
        (None, None, None, None) => Ok(None),
        (_, _, _, _) => {
            Err(DbError::DataIntegrityError("Inconsistent values for location".to_owned()))
        }
    }
}

impl TryFrom<SqliteRow> for User {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
        let username: String = row.try_get("username").map_err(map_sqlx_error)?;
        let email: String = row.try_get("email").map_err(map_sqlx_error)?;
        let user_type: String = row.try_get("user_type").map_err(map_sqlx_error)?;
        let is_available: bool = row.try_get("is_available").map_err(map_sqlx_error)?;
        let location = location_from_row(&row)?;

        let mut user = User::new(
            UserId::new(id),
            Username::new(username)?,
            EmailAddress::new(email)?,
            UserType::parse(&user_type)?,
            is_available,
        );
        if let Some(location) = location {
            user = user.with_location(location);
        }
        Ok(user)
    }
}

/// Extracts an optional coordinate pair stored as two `prefix`-named columns of a ride row.
fn position_from_row(row: &SqliteRow, prefix: &str) -> DbResult<Option<Coordinates>> {
    let latitude: Option<f64> =
        row.try_get(format!("{}_latitude", prefix).as_str()).map_err(map_sqlx_error)?;
    let longitude: Option<f64> =
        row.try_get(format!("{}_longitude", prefix).as_str()).map_err(map_sqlx_error)?;

    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Ok(Some(Coordinates::new(latitude, longitude)?)),
        (None, None) => Ok(None),
        (_, _) => Err(DbError::DataIntegrityError(format!(
            "Inconsistent values for {} position",
            prefix
        ))),
    }
}

impl TryFrom<SqliteRow> for Ride {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
        let passenger_id: i64 = row.try_get("passenger_id").map_err(map_sqlx_error)?;
        let driver_id: Option<i64> = row.try_get("driver_id").map_err(map_sqlx_error)?;
        let origin: String = row.try_get("origin").map_err(map_sqlx_error)?;
        let destination: String = row.try_get("destination").map_err(map_sqlx_error)?;
        let origin_position = position_from_row(&row, "origin")?;
        let destination_position = position_from_row(&row, "destination")?;
        let waypoints: String = row.try_get("waypoints").map_err(map_sqlx_error)?;
        let status: String = row.try_get("status").map_err(map_sqlx_error)?;
        let created_at_secs: i64 = row.try_get("created_at_secs").map_err(map_sqlx_error)?;
        let created_at_nsecs: i64 = row.try_get("created_at_nsecs").map_err(map_sqlx_error)?;
        let updated_at_secs: i64 = row.try_get("updated_at_secs").map_err(map_sqlx_error)?;
        let updated_at_nsecs: i64 = row.try_get("updated_at_nsecs").map_err(map_sqlx_error)?;

        let waypoints: Vec<Coordinates> = serde_json::from_str(&waypoints)
            .map_err(|e| DbError::DataIntegrityError(format!("Invalid waypoints: {}", e)))?;

        let mut ride = Ride::new(
            RideId::new(id),
            UserId::new(passenger_id),
            origin,
            destination,
            RideStatus::parse(&status)?,
            build_timestamp(created_at_secs, created_at_nsecs)?,
            build_timestamp(updated_at_secs, updated_at_nsecs)?,
        )
        .with_waypoints(waypoints);
        if let Some(driver_id) = driver_id {
            ride = ride.with_driver(UserId::new(driver_id));
        }
        if let Some(position) = origin_position {
            ride = ride.with_origin_position(position);
        }
        if let Some(position) = destination_position {
            ride = ride.with_destination_position(position);
        }
        Ok(ride)
    }
}

impl TryFrom<SqliteRow> for Message {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
        let ride_id: i64 = row.try_get("ride_id").map_err(map_sqlx_error)?;
        let sender_id: i64 = row.try_get("sender_id").map_err(map_sqlx_error)?;
        let receiver_id: i64 = row.try_get("receiver_id").map_err(map_sqlx_error)?;
        let content: String = row.try_get("content").map_err(map_sqlx_error)?;
        let created_at_secs: i64 = row.try_get("created_at_secs").map_err(map_sqlx_error)?;
        let created_at_nsecs: i64 = row.try_get("created_at_nsecs").map_err(map_sqlx_error)?;

        Ok(Message::new(
            MessageId::new(id),
            RideId::new(ride_id),
            UserId::new(sender_id),
            UserId::new(receiver_id),
            content,
            build_timestamp(created_at_secs, created_at_nsecs)?,
        ))
    }
}

/// Creates a new user account.  Uniqueness of the username and email is enforced by the schema.
pub(crate) async fn create_user(
    ex: &mut Executor,
    username: &Username,
    email: &EmailAddress,
    user_type: UserType,
    is_available: bool,
) -> DbResult<User> {
    match ex {
        Executor::Sqlite(ex) => {
            let query_str = "
                INSERT INTO users (username, email, user_type, is_available)
                VALUES (?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(username.as_str())
                .bind(email.as_str())
                .bind(user_type.as_str())
                .bind(is_available)
                .execute(ex.conn())
                .await
                .map_err(map_sqlx_error)?;
            if done.rows_affected() != 1 {
                return Err(DbError::BackendError(
                    "Insertion affected more than one row".to_owned(),
                ));
            }

            Ok(User::new(
                UserId::new(done.last_insert_rowid()),
                username.clone(),
                email.clone(),
                user_type,
                is_available,
            ))
        }
    }
}

/// Gets an existing user by its identifier.
pub(crate) async fn get_user(ex: &mut Executor, id: UserId) -> DbResult<User> {
    match ex {
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM users WHERE id = ?";
            let row = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_one(ex.conn())
                .await
                .map_err(map_sqlx_error)?;
            User::try_from(row)
        }
    }
}

/// Gets all existing users in identifier order.
pub(crate) async fn list_users(ex: &mut Executor) -> DbResult<Vec<User>> {
    match ex {
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM users ORDER BY id";
            let rows = sqlx::query(query_str)
                .fetch_all(ex.conn())
                .await
                .map_err(map_sqlx_error)?;
            rows.into_iter().map(User::try_from).collect()
        }
    }
}

/// Checks whether a user other than `exclude` already holds `username`.
pub(crate) async fn username_exists(
    ex: &mut Executor,
    username: &Username,
    exclude: Option<UserId>,
) -> DbResult<bool> {
    match ex {
        Executor::Sqlite(ex) => {
            let query_str = "SELECT id FROM users WHERE username = ? AND id != ?";
            let maybe_row = sqlx::query(query_str)
                .bind(username.as_str())
                .bind(exclude.map(|id| id.as_i64()).unwrap_or(-1))
                .fetch_optional(ex.conn())
                .await
                .map_err(map_sqlx_error)?;
            Ok(maybe_row.is_some())
        }
    }
}

/// Checks whether a user other than `exclude` already holds `email`.
pub(crate) async fn email_exists(
    ex: &mut Executor,
    email: &EmailAddress,
    exclude: Option<UserId>,
) -> DbResult<bool> {
    match ex {
        Executor::Sqlite(ex) => {
            let query_str = "SELECT id FROM users WHERE email = ? AND id != ?";
            let maybe_row = sqlx::query(query_str)
                .bind(email.as_str())
                .bind(exclude.map(|id| id.as_i64()).unwrap_or(-1))
                .fetch_optional(ex.conn())
                .await
                .map_err(map_sqlx_error)?;
            Ok(maybe_row.is_some())
        }
    }
}

/// Updates the mutable profile fields of an existing user.
pub(crate) async fn update_user(ex: &mut Executor, user: &User) -> DbResult<()> {
    match ex {
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE users SET username = ?, email = ?, is_available = ?
                WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(user.username().as_str())
                .bind(user.email().as_str())
                .bind(*user.is_available())
                .bind(user.id().as_i64())
                .execute(ex.conn())
                .await
                .map_err(map_sqlx_error)?;
            match done.rows_affected() {
                0 => Err(DbError::NotFound),
                1 => Ok(()),
                _ => Err(DbError::BackendError("Update affected more than one row".to_owned())),
            }
        }
    }
}

/// Deletes an existing user.
pub(crate) async fn delete_user(ex: &mut Executor, id: UserId) -> DbResult<()> {
    match ex {
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM users WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(id.as_i64())
                .execute(ex.conn())
                .await
                .map_err(map_sqlx_error)?;
            match done.rows_affected() {
                0 => Err(DbError::NotFound),
                1 => Ok(()),
                _ => Err(DbError::BackendError(
                    "Deletion affected more than one row".to_owned(),
                )),
            }
        }
    }
}

/// Records the last known position of an existing user.
pub(crate) async fn set_user_location(
    ex: &mut Executor,
    id: UserId,
    location: &UserLocation,
) -> DbResult<()> {
    match ex {
        Executor::Sqlite(ex) => {
            let (updated_at_secs, updated_at_nsecs) = unpack_timestamp(*location.updated_at());

            let query_str = "
                UPDATE users SET latitude = ?, longitude = ?,
                    location_updated_at_secs = ?, location_updated_at_nsecs = ?
                WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(location.position().latitude())
                .bind(location.position().longitude())
                .bind(updated_at_secs)
                .bind(updated_at_nsecs)
                .bind(id.as_i64())
                .execute(ex.conn())
                .await
                .map_err(map_sqlx_error)?;
            match done.rows_affected() {
                0 => Err(DbError::NotFound),
                1 => Ok(()),
                _ => Err(DbError::BackendError("Update affected more than one row".to_owned())),
            }
        }
    }
}

/// Counts the rides that reference `id` as either passenger or driver.
pub(crate) async fn count_user_rides(ex: &mut Executor, id: UserId) -> DbResult<i64> {
    match ex {
        Executor::Sqlite(ex) => {
            let query_str =
                "SELECT COUNT(*) AS count FROM rides WHERE passenger_id = ? OR driver_id = ?";
            let row = sqlx::query(query_str)
                .bind(id.as_i64())
                .bind(id.as_i64())
                .fetch_one(ex.conn())
                .await
                .map_err(map_sqlx_error)?;
            row.try_get("count").map_err(map_sqlx_error)
        }
    }
}

/// Creates a new ride in the requested state with no driver.
pub(crate) async fn create_ride(
    ex: &mut Executor,
    passenger_id: UserId,
    origin: &str,
    destination: &str,
    origin_position: Option<Coordinates>,
    destination_position: Option<Coordinates>,
    waypoints: &[Coordinates],
    now: OffsetDateTime,
) -> DbResult<Ride> {
    match ex {
        Executor::Sqlite(ex) => {
            let (now_secs, now_nsecs) = unpack_timestamp(now);
            let raw_waypoints = serde_json::to_string(waypoints)
                .map_err(|e| DbError::DataIntegrityError(format!("Invalid waypoints: {}", e)))?;

            let query_str = "
                INSERT INTO rides (passenger_id, origin, destination,
                    origin_latitude, origin_longitude,
                    destination_latitude, destination_longitude,
                    waypoints, status,
                    created_at_secs, created_at_nsecs, updated_at_secs, updated_at_nsecs)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(passenger_id.as_i64())
                .bind(origin)
                .bind(destination)
                .bind(origin_position.map(|p| p.latitude()))
                .bind(origin_position.map(|p| p.longitude()))
                .bind(destination_position.map(|p| p.latitude()))
                .bind(destination_position.map(|p| p.longitude()))
                .bind(raw_waypoints)
                .bind(RideStatus::Requested.as_str())
                .bind(now_secs)
                .bind(now_nsecs)
                .bind(now_secs)
                .bind(now_nsecs)
                .execute(ex.conn())
                .await
                .map_err(map_sqlx_error)?;
            if done.rows_affected() != 1 {
                return Err(DbError::BackendError(
                    "Insertion affected more than one row".to_owned(),
                ));
            }

            let mut ride = Ride::new(
                RideId::new(done.last_insert_rowid()),
                passenger_id,
                origin.to_owned(),
                destination.to_owned(),
                RideStatus::Requested,
                now,
                now,
            )
            .with_waypoints(waypoints.to_vec());
            if let Some(position) = origin_position {
                ride = ride.with_origin_position(position);
            }
            if let Some(position) = destination_position {
                ride = ride.with_destination_position(position);
            }
            Ok(ride)
        }
    }
}

/// Gets an existing ride by its identifier.
pub(crate) async fn get_ride(ex: &mut Executor, id: RideId) -> DbResult<Ride> {
    match ex {
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM rides WHERE id = ?";
            let row = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_one(ex.conn())
                .await
                .map_err(map_sqlx_error)?;
            Ride::try_from(row)
        }
    }
}

/// Optional equality filters for ride listings.
#[derive(Default)]
pub(crate) struct RideFilter {
    /// Keep only rides requested by this passenger.
    pub(crate) passenger_id: Option<UserId>,

    /// Keep only rides fulfilled by this driver.
    pub(crate) driver_id: Option<UserId>,

    /// Keep only rides in this state.
    pub(crate) status: Option<RideStatus>,
}

/// Gets all rides matching `filter`, most recently created first.
pub(crate) async fn list_rides(ex: &mut Executor, filter: &RideFilter) -> DbResult<Vec<Ride>> {
    match ex {
        Executor::Sqlite(ex) => {
            let mut query_str = "SELECT * FROM rides".to_owned();
            let mut clauses = vec![];
            if filter.passenger_id.is_some() {
                clauses.push("passenger_id = ?");
            }
            if filter.driver_id.is_some() {
                clauses.push("driver_id = ?");
            }
            if filter.status.is_some() {
                clauses.push("status = ?");
            }
            if !clauses.is_empty() {
                query_str += " WHERE ";
                query_str += &clauses.join(" AND ");
            }
            query_str += " ORDER BY created_at_secs DESC, created_at_nsecs DESC, id DESC";

            let mut query = sqlx::query(&query_str);
            if let Some(passenger_id) = filter.passenger_id {
                query = query.bind(passenger_id.as_i64());
            }
            if let Some(driver_id) = filter.driver_id {
                query = query.bind(driver_id.as_i64());
            }
            if let Some(status) = filter.status {
                query = query.bind(status.as_str());
            }

            let rows = query.fetch_all(ex.conn()).await.map_err(map_sqlx_error)?;
            rows.into_iter().map(Ride::try_from).collect()
        }
    }
}

/// Attempts to assign `driver_id` to a ride that is still in the requested state.
///
/// The status check and the write happen in a single conditional update so that two concurrent
/// acceptances cannot both succeed.  Returns false when the ride does not exist or is not in the
/// requested state any more, and the caller must tell those cases apart.
pub(crate) async fn accept_ride(
    ex: &mut Executor,
    id: RideId,
    driver_id: UserId,
    now: OffsetDateTime,
) -> DbResult<bool> {
    match ex {
        Executor::Sqlite(ex) => {
            let (now_secs, now_nsecs) = unpack_timestamp(now);

            let query_str = "
                UPDATE rides SET driver_id = ?, status = ?, updated_at_secs = ?,
                    updated_at_nsecs = ?
                WHERE id = ? AND status = ?";
            let done = sqlx::query(query_str)
                .bind(driver_id.as_i64())
                .bind(RideStatus::Accepted.as_str())
                .bind(now_secs)
                .bind(now_nsecs)
                .bind(id.as_i64())
                .bind(RideStatus::Requested.as_str())
                .execute(ex.conn())
                .await
                .map_err(map_sqlx_error)?;
            match done.rows_affected() {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(DbError::BackendError("Update affected more than one row".to_owned())),
            }
        }
    }
}

/// Writes a new status into an existing ride.
pub(crate) async fn update_ride_status(
    ex: &mut Executor,
    id: RideId,
    status: RideStatus,
    now: OffsetDateTime,
) -> DbResult<()> {
    match ex {
        Executor::Sqlite(ex) => {
            let (now_secs, now_nsecs) = unpack_timestamp(now);

            let query_str = "
                UPDATE rides SET status = ?, updated_at_secs = ?, updated_at_nsecs = ?
                WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(status.as_str())
                .bind(now_secs)
                .bind(now_nsecs)
                .bind(id.as_i64())
                .execute(ex.conn())
                .await
                .map_err(map_sqlx_error)?;
            match done.rows_affected() {
                0 => Err(DbError::NotFound),
                1 => Ok(()),
                _ => Err(DbError::BackendError("Update affected more than one row".to_owned())),
            }
        }
    }
}

/// Writes the route details of an existing ride.
pub(crate) async fn update_ride_route(
    ex: &mut Executor,
    id: RideId,
    origin: &str,
    destination: &str,
    origin_position: Option<Coordinates>,
    destination_position: Option<Coordinates>,
    waypoints: &[Coordinates],
    now: OffsetDateTime,
) -> DbResult<()> {
    match ex {
        Executor::Sqlite(ex) => {
            let (now_secs, now_nsecs) = unpack_timestamp(now);
            let raw_waypoints = serde_json::to_string(waypoints)
                .map_err(|e| DbError::DataIntegrityError(format!("Invalid waypoints: {}", e)))?;

            let query_str = "
                UPDATE rides SET origin = ?, destination = ?,
                    origin_latitude = ?, origin_longitude = ?,
                    destination_latitude = ?, destination_longitude = ?,
                    waypoints = ?, updated_at_secs = ?, updated_at_nsecs = ?
                WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(origin)
                .bind(destination)
                .bind(origin_position.map(|p| p.latitude()))
                .bind(origin_position.map(|p| p.longitude()))
                .bind(destination_position.map(|p| p.latitude()))
                .bind(destination_position.map(|p| p.longitude()))
                .bind(raw_waypoints)
                .bind(now_secs)
                .bind(now_nsecs)
                .bind(id.as_i64())
                .execute(ex.conn())
                .await
                .map_err(map_sqlx_error)?;
            match done.rows_affected() {
                0 => Err(DbError::NotFound),
                1 => Ok(()),
                _ => Err(DbError::BackendError("Update affected more than one row".to_owned())),
            }
        }
    }
}

/// Creates a new message within a ride.
pub(crate) async fn create_message(
    ex: &mut Executor,
    ride_id: RideId,
    sender_id: UserId,
    receiver_id: UserId,
    content: &str,
    now: OffsetDateTime,
) -> DbResult<Message> {
    match ex {
        Executor::Sqlite(ex) => {
            let (now_secs, now_nsecs) = unpack_timestamp(now);

            let query_str = "
                INSERT INTO messages (ride_id, sender_id, receiver_id, content,
                    created_at_secs, created_at_nsecs)
                VALUES (?, ?, ?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(ride_id.as_i64())
                .bind(sender_id.as_i64())
                .bind(receiver_id.as_i64())
                .bind(content)
                .bind(now_secs)
                .bind(now_nsecs)
                .execute(ex.conn())
                .await
                .map_err(map_sqlx_error)?;
            if done.rows_affected() != 1 {
                return Err(DbError::BackendError(
                    "Insertion affected more than one row".to_owned(),
                ));
            }

            Ok(Message::new(
                MessageId::new(done.last_insert_rowid()),
                ride_id,
                sender_id,
                receiver_id,
                content.to_owned(),
                now,
            ))
        }
    }
}

/// Gets all messages of a ride in ascending creation order.
pub(crate) async fn list_messages(ex: &mut Executor, ride_id: RideId) -> DbResult<Vec<Message>> {
    match ex {
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT * FROM messages WHERE ride_id = ?
                ORDER BY created_at_secs ASC, created_at_nsecs ASC, id ASC";
            let rows = sqlx::query(query_str)
                .bind(ride_id.as_i64())
                .fetch_all(ex.conn())
                .await
                .map_err(map_sqlx_error)?;
            rows.into_iter().map(Message::try_from).collect()
        }
    }
}
