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

//! Routing and geocoding implementations backed by in-memory data for testing purposes.

use crate::{
    Coordinates, DistanceMatrix, GeoError, GeoResult, Geocoder, Place, Route, Router,
    RoutingProfile, SnappedPoint,
};
use async_trait::async_trait;
use futures::lock::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Router that returns canned responses and records the queries it receives.
#[derive(Clone, Default)]
pub struct MockRouter {
    /// Canned response for route queries.
    route: Arc<Mutex<Option<Route>>>,

    /// Canned response for matrix queries.
    matrix: Arc<Mutex<Option<DistanceMatrix>>>,

    /// Canned response for nearest queries.
    snapped: Arc<Mutex<Option<SnappedPoint>>>,

    /// Error to return from all queries instead of the canned responses.
    error: Arc<Mutex<Option<GeoError>>>,

    /// Coordinate sequences received by route queries, in order of arrival.
    route_requests: Arc<Mutex<Vec<Vec<Coordinates>>>>,
}

impl MockRouter {
    /// Sets the canned response for route queries.
    pub async fn set_route(&self, route: Route) {
        *self.route.lock().await = Some(route);
    }

    /// Sets the canned response for matrix queries.
    pub async fn set_matrix(&self, matrix: DistanceMatrix) {
        *self.matrix.lock().await = Some(matrix);
    }

    /// Sets the canned response for nearest queries.
    pub async fn set_snapped(&self, snapped: SnappedPoint) {
        *self.snapped.lock().await = Some(snapped);
    }

    /// Makes all queries fail with `error` from now on.
    pub async fn inject_error(&self, error: GeoError) {
        *self.error.lock().await = Some(error);
    }

    /// Returns the coordinate sequences received by route queries so far.
    pub async fn route_requests(&self) -> Vec<Vec<Coordinates>> {
        self.route_requests.lock().await.clone()
    }

    /// Returns the injected error, if any.
    async fn maybe_error(&self) -> GeoResult<()> {
        match self.error.lock().await.as_ref() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Router for MockRouter {
    async fn calculate_route(
        &self,
        coordinates: &[Coordinates],
        _profile: RoutingProfile,
    ) -> GeoResult<Route> {
        self.route_requests.lock().await.push(coordinates.to_vec());
        self.maybe_error().await?;
        match self.route.lock().await.as_ref() {
            Some(route) => Ok(route.clone()),
            None => Err(GeoError::RemoteFailure("No mock route configured".to_owned())),
        }
    }

    async fn distance_matrix(
        &self,
        _coordinates: &[Coordinates],
        _profile: RoutingProfile,
    ) -> GeoResult<DistanceMatrix> {
        self.maybe_error().await?;
        match self.matrix.lock().await.as_ref() {
            Some(matrix) => Ok(matrix.clone()),
            None => Err(GeoError::RemoteFailure("No mock matrix configured".to_owned())),
        }
    }

    async fn nearest_road(
        &self,
        _position: Coordinates,
        _profile: RoutingProfile,
    ) -> GeoResult<SnappedPoint> {
        self.maybe_error().await?;
        match self.snapped.lock().await.as_ref() {
            Some(snapped) => Ok(snapped.clone()),
            None => Err(GeoError::RemoteFailure("No mock snapped point configured".to_owned())),
        }
    }
}

/// Geocoder that resolves addresses against an in-memory map.
#[derive(Clone, Default)]
pub struct MockGeocoder {
    /// Mapping of addresses to places for forward lookups.
    places: Arc<Mutex<HashMap<String, Place>>>,

    /// Canned response for reverse lookups.
    reverse: Arc<Mutex<Option<Place>>>,

    /// Canned response for nearby searches.
    nearby: Arc<Mutex<Vec<Place>>>,

    /// Error to return from all queries instead of the canned responses.
    error: Arc<Mutex<Option<GeoError>>>,
}

impl MockGeocoder {
    /// Registers `place` as the result of forward-geocoding `address`.
    pub async fn add_place<A: Into<String>>(&self, address: A, place: Place) {
        self.places.lock().await.insert(address.into(), place);
    }

    /// Sets the canned response for reverse lookups.
    pub async fn set_reverse(&self, place: Place) {
        *self.reverse.lock().await = Some(place);
    }

    /// Sets the canned response for nearby searches.
    pub async fn set_nearby(&self, places: Vec<Place>) {
        *self.nearby.lock().await = places;
    }

    /// Makes all queries fail with `error` from now on.
    pub async fn inject_error(&self, error: GeoError) {
        *self.error.lock().await = Some(error);
    }

    /// Returns the injected error, if any.
    async fn maybe_error(&self) -> GeoResult<()> {
        match self.error.lock().await.as_ref() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn geocode(&self, address: &str) -> GeoResult<Option<Place>> {
        self.maybe_error().await?;
        Ok(self.places.lock().await.get(address).cloned())
    }

    async fn reverse_geocode(&self, _position: Coordinates) -> GeoResult<Option<Place>> {
        self.maybe_error().await?;
        Ok(self.reverse.lock().await.clone())
    }

    async fn search_nearby(
        &self,
        _center: Coordinates,
        _query: &str,
        _radius_meters: u32,
    ) -> GeoResult<Vec<Place>> {
        self.maybe_error().await?;
        Ok(self.nearby.lock().await.clone())
    }
}
