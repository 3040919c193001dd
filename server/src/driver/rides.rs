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

//! Operations on rides.

use crate::db::{self, RideFilter};
use crate::driver::Driver;
use crate::model::{
    validate_transition, Ride, RideId, RideRouteUpdate, RideStatus, RideView, RouteSummaryView,
    User, UserId, UserType,
};
use hail_core::clocks::Clock;
use hail_core::db::{DbError, Executor};
use hail_core::driver::{DriverError, DriverResult};
use hail_geo::{Coordinates, Router, RoutingProfile};
use std::collections::HashMap;

/// Gets the user `id` and checks that it has the wanted `user_type`.  Both a missing account and
/// an account of the wrong type surface as "not found" so that callers cannot probe for accounts
/// they should not know about.
pub(super) async fn get_user_of_type(
    ex: &mut Executor,
    id: UserId,
    user_type: UserType,
    role: &str,
) -> DriverResult<User> {
    match db::get_user(ex, id).await {
        Ok(user) if *user.user_type() == user_type => Ok(user),
        Ok(_) | Err(DbError::NotFound) => {
            Err(DriverError::NotFound(format!("{} {} not found", role, id)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Gets the ride `id`, translating a missing row into a friendly error.
pub(super) async fn get_ride_or_not_found(ex: &mut Executor, id: RideId) -> DriverResult<Ride> {
    match db::get_ride(ex, id).await {
        Ok(ride) => Ok(ride),
        Err(DbError::NotFound) => Err(DriverError::NotFound(format!("Ride {} not found", id))),
        Err(e) => Err(e.into()),
    }
}

/// Assembles the view of `ride` by fetching the accounts of its parties.
pub(super) async fn assemble_ride_view(ex: &mut Executor, ride: Ride) -> DriverResult<RideView> {
    let passenger = db::get_user(ex, *ride.passenger_id()).await?;
    let driver = match ride.driver_id() {
        Some(driver_id) => Some(db::get_user(ex, *driver_id).await?),
        None => None,
    };
    Ok(RideView::new(ride, passenger, driver))
}

/// Assembles the views of many `rides`, fetching each referenced account only once.
async fn assemble_ride_views(ex: &mut Executor, rides: Vec<Ride>) -> DriverResult<Vec<RideView>> {
    let mut users: HashMap<UserId, User> = HashMap::default();
    for ride in &rides {
        for id in [Some(*ride.passenger_id()), *ride.driver_id()].into_iter().flatten() {
            if !users.contains_key(&id) {
                users.insert(id, db::get_user(ex, id).await?);
            }
        }
    }

    let mut views = Vec::with_capacity(rides.len());
    for ride in rides {
        let passenger = users
            .get(ride.passenger_id())
            .expect("Users of all rides must have been prefetched")
            .clone();
        let driver = (*ride.driver_id()).map(|id| {
            users.get(&id).expect("Users of all rides must have been prefetched").clone()
        });
        views.push(RideView::new(ride, passenger, driver));
    }
    Ok(views)
}

impl Driver {
    /// Creates a new ride requested by `passenger_id`, in the requested state with no driver.
    pub(crate) async fn create_ride(
        self,
        passenger_id: UserId,
        origin: String,
        destination: String,
        origin_position: Option<Coordinates>,
        destination_position: Option<Coordinates>,
        waypoints: Vec<Coordinates>,
    ) -> DriverResult<RideView> {
        let now = self.clock.now_utc();

        let mut tx = self.db.begin().await?;
        let passenger =
            get_user_of_type(tx.ex(), passenger_id, UserType::Passenger, "Passenger").await?;
        let ride = db::create_ride(
            tx.ex(),
            passenger_id,
            &origin,
            &destination,
            origin_position,
            destination_position,
            &waypoints,
            now,
        )
        .await?;
        tx.commit().await?;

        Ok(RideView::new(ride, passenger, None))
    }

    /// Assigns `driver_id` to a requested ride and moves it to the accepted state.
    pub(crate) async fn accept_ride(
        self,
        ride_id: RideId,
        driver_id: UserId,
    ) -> DriverResult<RideView> {
        let now = self.clock.now_utc();

        let mut tx = self.db.begin().await?;
        get_user_of_type(tx.ex(), driver_id, UserType::Driver, "Driver").await?;

        if !db::accept_ride(tx.ex(), ride_id, driver_id, now).await? {
            // The conditional update did not match: either the ride is gone or it has already
            // left the requested state, and the two cases yield different errors.
            get_ride_or_not_found(tx.ex(), ride_id).await?;
            return Err(DriverError::Conflict(format!(
                "Ride {} is not available for acceptance",
                ride_id
            )));
        }

        let ride = db::get_ride(tx.ex(), ride_id).await?;
        let view = assemble_ride_view(tx.ex(), ride).await?;
        tx.commit().await?;
        Ok(view)
    }

    /// Writes a new status into an existing ride.
    ///
    /// Status values are validated at parse time and transitions go through
    /// `validate_transition`, which is currently permissive on purpose.
    pub(crate) async fn update_ride_status(
        self,
        ride_id: RideId,
        status: RideStatus,
    ) -> DriverResult<RideView> {
        let now = self.clock.now_utc();

        let mut tx = self.db.begin().await?;
        let ride = get_ride_or_not_found(tx.ex(), ride_id).await?;
        validate_transition(*ride.status(), status)?;
        db::update_ride_status(tx.ex(), ride_id, status, now).await?;
        let ride = db::get_ride(tx.ex(), ride_id).await?;
        let view = assemble_ride_view(tx.ex(), ride).await?;
        tx.commit().await?;
        Ok(view)
    }

    /// Applies `update` to the route details of an existing ride.  Only the fields present in
    /// the update are touched.
    pub(crate) async fn update_ride_route(
        self,
        ride_id: RideId,
        update: RideRouteUpdate,
    ) -> DriverResult<RideView> {
        let now = self.clock.now_utc();

        let mut tx = self.db.begin().await?;
        let ride = get_ride_or_not_found(tx.ex(), ride_id).await?;

        let origin = update.origin.unwrap_or_else(|| ride.origin().clone());
        let destination = update.destination.unwrap_or_else(|| ride.destination().clone());
        let origin_position = update.origin_position.or(*ride.origin_position());
        let destination_position =
            update.destination_position.or(*ride.destination_position());
        let waypoints = update.waypoints.unwrap_or_else(|| ride.waypoints().clone());

        db::update_ride_route(
            tx.ex(),
            ride_id,
            &origin,
            &destination,
            origin_position,
            destination_position,
            &waypoints,
            now,
        )
        .await?;
        let ride = db::get_ride(tx.ex(), ride_id).await?;
        let view = assemble_ride_view(tx.ex(), ride).await?;
        tx.commit().await?;
        Ok(view)
    }

    /// Computes the route of an existing ride: origin, then the stored waypoints in order, then
    /// destination.  The ride must have coordinates for both endpoints.
    pub(crate) async fn calculate_route(self, ride_id: RideId) -> DriverResult<RouteSummaryView> {
        let ride = get_ride_or_not_found(&mut self.db.ex().await?, ride_id).await?;

        let (origin, destination) = match (ride.origin_position(), ride.destination_position()) {
            (Some(origin), Some(destination)) => (*origin, *destination),
            (_, _) => {
                return Err(DriverError::InvalidInput(format!(
                    "Ride {} does not have origin and destination coordinates",
                    ride_id
                )));
            }
        };

        let mut coordinates = Vec::with_capacity(ride.waypoints().len() + 2);
        coordinates.push(origin);
        coordinates.extend(ride.waypoints().iter().copied());
        coordinates.push(destination);

        let route = self
            .router
            .calculate_route(&coordinates, RoutingProfile::Driving)
            .await
            .map_err(|e| DriverError::BackendError(format!("Route calculation failed: {}", e)))?;
        Ok(RouteSummaryView::from(route))
    }

    /// Computes the route between a driver's live `position` and the destination of the ride.
    /// The ride must have destination coordinates.
    pub(crate) async fn distance_to_driver(
        self,
        ride_id: RideId,
        position: Coordinates,
    ) -> DriverResult<RouteSummaryView> {
        let ride = get_ride_or_not_found(&mut self.db.ex().await?, ride_id).await?;

        let destination = match ride.destination_position() {
            Some(destination) => *destination,
            None => {
                return Err(DriverError::InvalidInput(format!(
                    "Ride {} does not have destination coordinates",
                    ride_id
                )));
            }
        };

        let route = self
            .router
            .calculate_route(&[position, destination], RoutingProfile::Driving)
            .await
            .map_err(|e| DriverError::BackendError(format!("Route calculation failed: {}", e)))?;
        Ok(RouteSummaryView::from(route))
    }

    /// Gets an existing ride.
    pub(crate) async fn get_ride(self, ride_id: RideId) -> DriverResult<RideView> {
        let mut ex = self.db.ex().await?;
        let ride = get_ride_or_not_found(&mut ex, ride_id).await?;
        assemble_ride_view(&mut ex, ride).await
    }

    /// Gets all rides matching `filter`, most recently created first.
    pub(crate) async fn list_rides(self, filter: RideFilter) -> DriverResult<Vec<RideView>> {
        let mut ex = self.db.ex().await?;
        let rides = db::list_rides(&mut ex, &filter).await?;
        assemble_ride_views(&mut ex, rides).await
    }
}
