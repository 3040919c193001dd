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

//! Best-effort notification of stored messages to an external dispatcher.

use crate::model::MessageView;
use async_trait::async_trait;
use hail_core::driver::{DriverError, DriverResult};
use hail_core::env::get_optional_var;
use log::debug;
use reqwest::Client;
use std::time::Duration;

/// Maximum amount of time to wait for the dispatcher to answer.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Options to configure a `DispatchNotifier`.
#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub struct DispatchNotifierOptions {
    /// URL of the repository dispatch endpoint to post events to.
    pub url: Option<String>,

    /// Token to authenticate against the dispatch endpoint with.
    pub token: Option<String>,
}

impl DispatchNotifierOptions {
    /// Creates a set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use variables such as `<prefix>_URL` and `<prefix>_TOKEN`.  Notifications are
    /// disabled unless both are present.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        Ok(Self {
            url: get_optional_var::<String>(prefix, "URL")?,
            token: get_optional_var::<String>(prefix, "TOKEN")?,
        })
    }
}

/// Trait to abstract the delivery of message notifications.
#[async_trait]
pub(crate) trait MessageNotifier {
    /// Announces that `message` was stored.
    async fn notify_message_sent(&self, message: &MessageView) -> DriverResult<()>;
}

/// The fully-resolved delivery target of a `DispatchNotifier`.
struct DispatchTarget {
    /// URL of the dispatch endpoint.
    url: String,

    /// Token to authenticate with.
    token: String,
}

/// Notifier that posts a `message_sent` event to a repository dispatch endpoint.
///
/// When no URL or token is configured, the notifier stays quiet and drops all events.
pub(crate) struct DispatchNotifier {
    /// Delivery target, or None when notifications are disabled.
    target: Option<DispatchTarget>,

    /// Asynchronous HTTP client with which to issue the dispatch requests.
    client: Client,
}

impl DispatchNotifier {
    /// Creates a new dispatch notifier using `opts` for configuration.
    pub(crate) fn new(opts: DispatchNotifierOptions) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| format!("Failed to create the HTTP client: {}", e))?;
        let target = match (opts.url, opts.token) {
            (Some(url), Some(token)) => Some(DispatchTarget { url, token }),
            (_, _) => None,
        };
        Ok(Self { target, client })
    }
}

#[async_trait]
impl MessageNotifier for DispatchNotifier {
    async fn notify_message_sent(&self, message: &MessageView) -> DriverResult<()> {
        let target = match &self.target {
            Some(target) => target,
            None => {
                debug!("Notifications are not configured; dropping event for {}", message.id);
                return Ok(());
            }
        };

        let payload = serde_json::json!({
            "event_type": "message_sent",
            "client_payload": message,
        });

        let response = self
            .client
            .post(&target.url)
            .header("Authorization", format!("token {}", target.token))
            .header("Accept", "application/vnd.github.v3+json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                DriverError::BackendError(format!("Dispatch communication failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(DriverError::BackendError(format!(
                "Dispatch endpoint returned status {}",
                response.status()
            )));
        }
        Ok(())
    }
}
