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

//! Operations on user accounts.

use crate::db;
use crate::driver::Driver;
use crate::model::{LocationView, User, UserId, UserLocation, UserType, UserView};
use hail_core::clocks::Clock;
use hail_core::db::{DbError, Executor};
use hail_core::driver::{DriverError, DriverResult};
use hail_core::model::{EmailAddress, Username};
use hail_geo::Coordinates;

/// Fields of a user account that can be changed after creation.  Absent fields are left
/// untouched.
#[derive(Debug, Default)]
pub(crate) struct UserUpdate {
    /// New username for the account.
    pub(crate) username: Option<Username>,

    /// New contact address for the account.
    pub(crate) email: Option<EmailAddress>,

    /// New availability flag for the account.
    pub(crate) is_available: Option<bool>,
}

/// Fails with `AlreadyExists` if a user other than `exclude` already holds `username` or
/// `email`.
async fn check_duplicates(
    ex: &mut Executor,
    username: Option<&Username>,
    email: Option<&EmailAddress>,
    exclude: Option<UserId>,
) -> DriverResult<()> {
    if let Some(username) = username {
        if db::username_exists(ex, username, exclude).await? {
            return Err(DriverError::AlreadyExists("Username already exists".to_owned()));
        }
    }
    if let Some(email) = email {
        if db::email_exists(ex, email, exclude).await? {
            return Err(DriverError::AlreadyExists("Email already exists".to_owned()));
        }
    }
    Ok(())
}

/// Gets a user by `id`, translating a missing row into a friendly error.
pub(super) async fn get_user_or_not_found(ex: &mut Executor, id: UserId) -> DriverResult<User> {
    match db::get_user(ex, id).await {
        Ok(user) => Ok(user),
        Err(DbError::NotFound) => Err(DriverError::NotFound(format!("User {} not found", id))),
        Err(e) => Err(e.into()),
    }
}

impl Driver {
    /// Creates a new user account.
    pub(crate) async fn create_user(
        self,
        username: Username,
        email: EmailAddress,
        user_type: UserType,
        is_available: bool,
    ) -> DriverResult<UserView> {
        let mut tx = self.db.begin().await?;
        check_duplicates(tx.ex(), Some(&username), Some(&email), None).await?;
        let user = db::create_user(tx.ex(), &username, &email, user_type, is_available).await?;
        tx.commit().await?;
        Ok(UserView::from(user))
    }

    /// Gets an existing user account.
    pub(crate) async fn get_user(self, id: UserId) -> DriverResult<UserView> {
        let user = get_user_or_not_found(&mut self.db.ex().await?, id).await?;
        Ok(UserView::from(user))
    }

    /// Gets all existing user accounts.
    pub(crate) async fn list_users(self) -> DriverResult<Vec<UserView>> {
        let users = db::list_users(&mut self.db.ex().await?).await?;
        Ok(users.into_iter().map(UserView::from).collect())
    }

    /// Applies `update` to an existing user account.
    pub(crate) async fn update_user(self, id: UserId, update: UserUpdate) -> DriverResult<UserView> {
        let mut tx = self.db.begin().await?;

        let user = get_user_or_not_found(tx.ex(), id).await?;
        check_duplicates(tx.ex(), update.username.as_ref(), update.email.as_ref(), Some(id))
            .await?;

        let mut updated = User::new(
            id,
            update.username.unwrap_or_else(|| user.username().clone()),
            update.email.unwrap_or_else(|| user.email().clone()),
            *user.user_type(),
            update.is_available.unwrap_or(*user.is_available()),
        );
        if let Some(location) = user.location() {
            updated = updated.with_location(*location);
        }
        db::update_user(tx.ex(), &updated).await?;

        tx.commit().await?;
        Ok(UserView::from(updated))
    }

    /// Deletes an existing user account.
    ///
    /// Accounts that any ride still references, as passenger or driver, cannot be deleted.
    pub(crate) async fn delete_user(self, id: UserId) -> DriverResult<()> {
        let mut tx = self.db.begin().await?;

        get_user_or_not_found(tx.ex(), id).await?;
        let rides = db::count_user_rides(tx.ex(), id).await?;
        if rides > 0 {
            return Err(DriverError::Conflict(format!(
                "User {} is referenced by {} ride(s) and cannot be deleted",
                id, rides
            )));
        }
        db::delete_user(tx.ex(), id).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Records the last known position of an existing user.
    pub(crate) async fn update_user_location(
        self,
        id: UserId,
        position: Coordinates,
    ) -> DriverResult<UserView> {
        let location = UserLocation::new(position, self.clock.now_utc());

        let mut tx = self.db.begin().await?;
        match db::set_user_location(tx.ex(), id, &location).await {
            Ok(()) => (),
            Err(DbError::NotFound) => {
                return Err(DriverError::NotFound(format!("User {} not found", id)));
            }
            Err(e) => return Err(e.into()),
        }
        let user = db::get_user(tx.ex(), id).await?;
        tx.commit().await?;

        Ok(UserView::from(user))
    }

    /// Gets the last known position of an existing user.
    pub(crate) async fn get_user_location(self, id: UserId) -> DriverResult<LocationView> {
        let user = get_user_or_not_found(&mut self.db.ex().await?, id).await?;
        match user.location() {
            Some(location) => Ok(LocationView {
                latitude: location.position().latitude(),
                longitude: location.position().longitude(),
                updated_at: *location.updated_at(),
            }),
            None => {
                Err(DriverError::NotFound(format!("User {} has no known location", id)))
            }
        }
    }
}
