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

//! REST service implementing the server side of a ride-hailing application.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use hail_core::clocks::SystemClock;
use hail_core::db::Db;
use hail_core::env::get_optional_var;
use hail_geo::{NominatimGeocoder, NominatimGeocoderOptions, OsrmRouter, OsrmRouterOptions};
use std::error::Error;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod db;
mod driver;
use driver::Driver;
mod model;
mod notify;
use notify::{DispatchNotifier, DispatchNotifierOptions};
mod rest;
use rest::app;

/// Port to listen on when none is configured.
const DEFAULT_PORT: u16 = 3000;

/// Database file to open when none is configured.
const DEFAULT_DB_PATH: &str = "data/hail.db";

/// Directory holding the bundled static front-end when none is configured.
const DEFAULT_STATIC_DIR: &str = "static";

/// Cross-origin callers allowed when none are configured.  These cover the bundled front-end
/// dev servers.
const DEFAULT_CORS_ORIGINS: &[&str] =
    &["http://localhost:5173", "http://127.0.0.1:5173", "http://localhost:3000"];

/// Process-wide configuration, gathered once at startup.
#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub struct ServiceOptions {
    /// Port to listen on.
    pub port: u16,

    /// Path to the SQLite database file, created on first boot.
    pub db_path: String,

    /// Directory holding the bundled static front-end.
    pub static_dir: PathBuf,

    /// Allow-list of cross-origin callers.
    pub cors_origins: Vec<String>,
}

impl ServiceOptions {
    /// Creates a set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use variables such as `<prefix>_PORT`, `<prefix>_DB_PATH`,
    /// `<prefix>_STATIC_DIR` and `<prefix>_CORS_ORIGINS` (a comma-separated list).
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let cors_origins = match get_optional_var::<String>(prefix, "CORS_ORIGINS")? {
            Some(raw) => {
                raw.split(',').map(|origin| origin.trim().to_owned()).collect::<Vec<String>>()
            }
            None => DEFAULT_CORS_ORIGINS.iter().map(|origin| (*origin).to_owned()).collect(),
        };
        Ok(Self {
            port: get_optional_var::<u16>(prefix, "PORT")?.unwrap_or(DEFAULT_PORT),
            db_path: get_optional_var::<String>(prefix, "DB_PATH")?
                .unwrap_or_else(|| DEFAULT_DB_PATH.to_owned()),
            static_dir: PathBuf::from(
                get_optional_var::<String>(prefix, "STATIC_DIR")?
                    .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_owned()),
            ),
            cors_origins,
        })
    }
}

/// Instantiates all resources to serve the application as configured by `opts`.
///
/// While it'd be nice to push this responsibility to `main`, doing so would force us to expose
/// many crate-internal types to the public, which in turn would make dead code detection harder.
pub async fn serve(opts: ServiceOptions) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = Path::new(&opts.db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let db: Arc<dyn Db + Send + Sync> =
        Arc::from(hail_core::db::sqlite::connect(&opts.db_path).await?);
    db::init_schema(&mut db.ex().await?).await?;

    let router = OsrmRouter::new(OsrmRouterOptions::from_env("HAIL_OSRM")?)?;
    let geocoder = NominatimGeocoder::new(NominatimGeocoderOptions::from_env("HAIL_NOMINATIM")?)?;
    let notifier = DispatchNotifier::new(DispatchNotifierOptions::from_env("HAIL_NOTIFY")?)?;

    let driver = Driver::new(
        db,
        Arc::from(SystemClock::default()),
        Arc::from(router),
        Arc::from(geocoder),
        Arc::from(notifier),
    );
    let app = app(driver, &opts.static_dir, &opts.cors_origins)?;

    let listener = tokio::net::TcpListener::bind((Ipv4Addr::UNSPECIFIED, opts.port)).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serviceoptions_from_env_all_present() {
        let overrides = [
            ("HAIL_PORT", Some("5000")),
            ("HAIL_DB_PATH", Some("/tmp/test.db")),
            ("HAIL_STATIC_DIR", Some("/srv/static")),
            ("HAIL_CORS_ORIGINS", Some("https://example.com, http://localhost:9000")),
        ];
        temp_env::with_vars(overrides, || {
            let opts = ServiceOptions::from_env("HAIL").unwrap();
            assert_eq!(
                ServiceOptions {
                    port: 5000,
                    db_path: "/tmp/test.db".to_owned(),
                    static_dir: PathBuf::from("/srv/static"),
                    cors_origins: vec![
                        "https://example.com".to_owned(),
                        "http://localhost:9000".to_owned(),
                    ],
                },
                opts
            );
        });
    }

    #[test]
    fn test_serviceoptions_from_env_use_defaults() {
        let overrides: [(&str, Option<&str>); 4] = [
            ("HAIL_PORT", None),
            ("HAIL_DB_PATH", None),
            ("HAIL_STATIC_DIR", None),
            ("HAIL_CORS_ORIGINS", None),
        ];
        temp_env::with_vars(overrides, || {
            let opts = ServiceOptions::from_env("HAIL").unwrap();
            assert_eq!(DEFAULT_PORT, opts.port);
            assert_eq!(DEFAULT_DB_PATH, &opts.db_path);
            assert_eq!(PathBuf::from(DEFAULT_STATIC_DIR), opts.static_dir);
            assert_eq!(DEFAULT_CORS_ORIGINS.len(), opts.cors_origins.len());
        });
    }

    #[test]
    fn test_serviceoptions_from_env_bad_port() {
        temp_env::with_var("HAIL_PORT", Some("not-a-port"), || {
            let err = ServiceOptions::from_env("HAIL").unwrap_err();
            assert!(err.contains("Invalid type in environment variable HAIL_PORT"));
        });
    }
}
