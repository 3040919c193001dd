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

//! Operations on in-ride messages.

use crate::db;
use crate::driver::rides::get_ride_or_not_found;
use crate::driver::Driver;
use crate::model::{MessageView, RideId, User, UserId};
use crate::notify::MessageNotifier;
use hail_core::clocks::Clock;
use hail_core::db::DbError;
use hail_core::driver::{DriverError, DriverResult};
use log::warn;
use std::collections::HashMap;

impl Driver {
    /// Stores a message sent by `sender_id` within the ride `ride_id`.
    ///
    /// The receiver is always derived as the other party of the ride, and the external
    /// notification that follows a successful store never affects the outcome.
    pub(crate) async fn send_message(
        self,
        ride_id: RideId,
        sender_id: UserId,
        content: String,
    ) -> DriverResult<MessageView> {
        let now = self.clock.now_utc();

        let mut tx = self.db.begin().await?;

        let ride = get_ride_or_not_found(tx.ex(), ride_id).await?;

        let sender = match db::get_user(tx.ex(), sender_id).await {
            Ok(sender) => sender,
            Err(DbError::NotFound) => {
                return Err(DriverError::NotFound(format!("Sender {} not found", sender_id)));
            }
            Err(e) => return Err(e.into()),
        };

        let receiver_id = if sender_id == *ride.passenger_id() {
            *ride.driver_id()
        } else if Some(sender_id) == *ride.driver_id() {
            Some(*ride.passenger_id())
        } else {
            return Err(DriverError::Forbidden(format!(
                "User {} is not part of ride {}",
                sender_id, ride_id
            )));
        };
        let receiver_id = receiver_id.ok_or_else(|| {
            DriverError::InvalidInput(format!(
                "Ride {} has no assigned driver yet so the receiver is undefined",
                ride_id
            ))
        })?;

        let message =
            db::create_message(tx.ex(), ride_id, sender_id, receiver_id, &content, now).await?;
        let receiver = db::get_user(tx.ex(), receiver_id).await?;
        tx.commit().await?;

        let view = MessageView::new(message, sender, receiver);

        // Best effort only: a failed notification is logged and otherwise ignored.
        if let Err(e) = self.notifier.notify_message_sent(&view).await {
            warn!("Failed to deliver notification for message {}: {}", view.id, e);
        }

        Ok(view)
    }

    /// Gets all messages of a ride in ascending creation order.
    pub(crate) async fn list_messages(self, ride_id: RideId) -> DriverResult<Vec<MessageView>> {
        let mut ex = self.db.ex().await?;

        get_ride_or_not_found(&mut ex, ride_id).await?;
        let messages = db::list_messages(&mut ex, ride_id).await?;

        let mut users: HashMap<UserId, User> = HashMap::default();
        for message in &messages {
            for id in [*message.sender_id(), *message.receiver_id()] {
                if !users.contains_key(&id) {
                    users.insert(id, db::get_user(&mut ex, id).await?);
                }
            }
        }

        Ok(messages
            .into_iter()
            .map(|message| {
                let sender = users
                    .get(message.sender_id())
                    .expect("Users of all messages must have been prefetched")
                    .clone();
                let receiver = users
                    .get(message.receiver_id())
                    .expect("Users of all messages must have been prefetched")
                    .clone();
                MessageView::new(message, sender, receiver)
            })
            .collect())
    }
}
