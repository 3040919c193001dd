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

//! Entry point to the REST server.

use crate::driver::Driver;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::Router;
use std::path::Path;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};

mod geocode_get;
mod geocode_nearby_get;
mod geocode_reverse_get;
mod health_get;
mod info_get;
mod ride_accept_post;
mod ride_calculate_route_post;
mod ride_distance_post;
mod ride_get;
mod ride_messages_get;
mod ride_messages_post;
mod ride_route_put;
mod ride_status_put;
mod rides_get;
mod rides_post;
#[cfg(test)]
mod testutils;
mod user_delete;
mod user_get;
mod user_location_get;
mod user_location_put;
mod user_put;
mod users_get;
mod users_post;

/// Creates the router for the application.
///
/// Unmatched paths fall back to the bundled static front-end under `static_dir`, serving its
/// index page for client-side routes.  `cors_origins` is the allow-list of cross-origin callers.
pub(crate) fn app(
    driver: Driver,
    static_dir: &Path,
    cors_origins: &[String],
) -> Result<Router, String> {
    let origins = cors_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|e| format!("Invalid CORS origin '{}': {}", origin, e))
        })
        .collect::<Result<Vec<HeaderValue>, String>>()?;
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    let fallback = ServeDir::new(static_dir)
        .not_found_service(ServeFile::new(static_dir.join("index.html")));

    Ok(Router::new()
        .route("/", get(info_get::handler))
        .route("/health", get(health_get::handler))
        .route("/api/users", get(users_get::handler).post(users_post::handler))
        .route(
            "/api/users/:user_id",
            get(user_get::handler).put(user_put::handler).delete(user_delete::handler),
        )
        .route(
            "/api/users/:user_id/location",
            get(user_location_get::handler).put(user_location_put::handler),
        )
        .route("/api/rides", get(rides_get::handler).post(rides_post::handler))
        .route("/api/rides/:ride_id", get(ride_get::handler))
        .route("/api/rides/:ride_id/accept", post(ride_accept_post::handler))
        .route("/api/rides/:ride_id/status", put(ride_status_put::handler))
        .route("/api/rides/:ride_id/route", put(ride_route_put::handler))
        .route(
            "/api/rides/:ride_id/calculate-route",
            post(ride_calculate_route_post::handler),
        )
        .route("/api/rides/:ride_id/distance-to-driver", post(ride_distance_post::handler))
        .route(
            "/api/rides/:ride_id/messages",
            get(ride_messages_get::handler).post(ride_messages_post::handler),
        )
        .route("/api/geocode", get(geocode_get::handler))
        .route("/api/geocode/reverse", get(geocode_reverse_get::handler))
        .route("/api/geocode/nearby", get(geocode_nearby_get::handler))
        .fallback_service(fallback)
        .layer(cors)
        .with_state(driver))
}
