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

//! Operations backed by the geocoding service.

use crate::driver::Driver;
use hail_core::driver::{DriverError, DriverResult};
use hail_geo::{Coordinates, GeoError, Geocoder, Place};

/// Converts a geocoding failure into the corresponding driver error.
fn geo_error_to_driver_error(e: GeoError) -> DriverError {
    DriverError::BackendError(format!("Geocoding failed: {}", e))
}

impl Driver {
    /// Looks up the best matching place for the free-form `address`.
    pub(crate) async fn geocode_address(self, address: &str) -> DriverResult<Place> {
        match self.geocoder.geocode(address).await {
            Ok(Some(place)) => Ok(place),
            Ok(None) => {
                Err(DriverError::NotFound(format!("No match for address '{}'", address)))
            }
            Err(e) => Err(geo_error_to_driver_error(e)),
        }
    }

    /// Looks up the address of `position`.
    pub(crate) async fn reverse_geocode(self, position: Coordinates) -> DriverResult<Place> {
        match self.geocoder.reverse_geocode(position).await {
            Ok(Some(place)) => Ok(place),
            Ok(None) => Err(DriverError::NotFound(format!(
                "No address at {}, {}",
                position.latitude(),
                position.longitude()
            ))),
            Err(e) => Err(geo_error_to_driver_error(e)),
        }
    }

    /// Searches for places matching `query` within `radius_meters` of `center`.
    pub(crate) async fn search_nearby(
        self,
        center: Coordinates,
        query: &str,
        radius_meters: u32,
    ) -> DriverResult<Vec<Place>> {
        self.geocoder
            .search_nearby(center, query, radius_meters)
            .await
            .map_err(geo_error_to_driver_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;

    #[tokio::test]
    async fn test_geocode_address_ok() {
        let context = TestContext::setup().await;

        let place = Place::new(
            Coordinates::new(-23.5505, -46.6333).unwrap(),
            "Sao Paulo, Brazil".to_owned(),
            Some(0.9),
        );
        context.geocoder().add_place("Sao Paulo", place.clone()).await;

        assert_eq!(place, context.driver().geocode_address("Sao Paulo").await.unwrap());
    }

    #[tokio::test]
    async fn test_geocode_address_no_match() {
        let context = TestContext::setup().await;

        match context.driver().geocode_address("nowhere").await {
            Err(DriverError::NotFound(e)) => assert!(e.contains("No match")),
            e => panic!("Must have failed with a NotFound error but got: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_geocode_address_upstream_failure() {
        let context = TestContext::setup().await;

        context.geocoder().inject_error(GeoError::Timeout).await;

        match context.driver().geocode_address("anywhere").await {
            Err(DriverError::BackendError(e)) => assert!(e.contains("Geocoding failed")),
            e => panic!("Must have failed with a BackendError but got: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_reverse_geocode_ok() {
        let context = TestContext::setup().await;

        let position = Coordinates::new(-23.5505, -46.6333).unwrap();
        let place = Place::new(position, "Avenida Paulista".to_owned(), None);
        context.geocoder().set_reverse(place.clone()).await;

        assert_eq!(place, context.driver().reverse_geocode(position).await.unwrap());
    }

    #[tokio::test]
    async fn test_reverse_geocode_no_match() {
        let context = TestContext::setup().await;

        let position = Coordinates::new(0.0, 0.0).unwrap();
        match context.driver().reverse_geocode(position).await {
            Err(DriverError::NotFound(e)) => assert!(e.contains("No address")),
            e => panic!("Must have failed with a NotFound error but got: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_search_nearby_ok() {
        let context = TestContext::setup().await;

        let center = Coordinates::new(-23.5505, -46.6333).unwrap();
        let places = vec![
            Place::new(Coordinates::new(-23.55, -46.64).unwrap(), "Hospital A".to_owned(), None),
            Place::new(Coordinates::new(-23.56, -46.62).unwrap(), "Hospital B".to_owned(), None),
        ];
        context.geocoder().set_nearby(places.clone()).await;

        assert_eq!(
            places,
            context.driver().search_nearby(center, "hospital", 1000).await.unwrap()
        );
    }
}
