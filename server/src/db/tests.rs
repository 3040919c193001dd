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

//! Tests for the database layer.

use super::*;
use hail_core::db::sqlite::SqliteDb;
use hail_core::db::Db;
use time::macros::datetime;

/// Creation time used for entities that don't care about specific timestamps.
const T0: OffsetDateTime = datetime!(2025-06-12 08:00:00 UTC);

/// Initializes an in-memory test database with the schema applied.
async fn setup() -> SqliteDb {
    let db = hail_core::db::sqlite::testutils::setup().await;
    init_schema(&mut db.ex().await.unwrap()).await.unwrap();
    db
}

/// Creates a user with canned details derived from `username`.
async fn make_user(ex: &mut Executor, username: &str, user_type: UserType) -> User {
    create_user(
        ex,
        &Username::new(username).unwrap(),
        &EmailAddress::new(format!("{}@example.com", username)).unwrap(),
        user_type,
        false,
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_create_user_assigns_distinct_ids() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let user1 = make_user(&mut ex, "passenger1", UserType::Passenger).await;
    let user2 = make_user(&mut ex, "driver1", UserType::Driver).await;
    assert_ne!(user1.id(), user2.id());

    assert_eq!(user1, get_user(&mut ex, *user1.id()).await.unwrap());
    assert_eq!(user2, get_user(&mut ex, *user2.id()).await.unwrap());
}

#[tokio::test]
async fn test_create_user_duplicate_username() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    make_user(&mut ex, "somebody", UserType::Passenger).await;

    let err = create_user(
        &mut ex,
        &Username::from("somebody"),
        &EmailAddress::from("other@example.com"),
        UserType::Passenger,
        false,
    )
    .await
    .unwrap_err();
    assert_eq!(DbError::AlreadyExists, err);
}

#[tokio::test]
async fn test_create_user_duplicate_email() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    make_user(&mut ex, "somebody", UserType::Passenger).await;

    let err = create_user(
        &mut ex,
        &Username::from("other"),
        &EmailAddress::from("somebody@example.com"),
        UserType::Passenger,
        false,
    )
    .await
    .unwrap_err();
    assert_eq!(DbError::AlreadyExists, err);
}

#[tokio::test]
async fn test_get_user_not_found() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    assert_eq!(DbError::NotFound, get_user(&mut ex, UserId::new(123)).await.unwrap_err());
}

#[tokio::test]
async fn test_list_users_in_id_order() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let user1 = make_user(&mut ex, "zzz", UserType::Passenger).await;
    let user2 = make_user(&mut ex, "aaa", UserType::Driver).await;

    assert_eq!(vec![user1, user2], list_users(&mut ex).await.unwrap());
}

#[tokio::test]
async fn test_username_and_email_exists_excludes_self() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let user = make_user(&mut ex, "somebody", UserType::Passenger).await;

    assert!(username_exists(&mut ex, user.username(), None).await.unwrap());
    assert!(!username_exists(&mut ex, user.username(), Some(*user.id())).await.unwrap());
    assert!(!username_exists(&mut ex, &Username::from("other"), None).await.unwrap());

    assert!(email_exists(&mut ex, user.email(), None).await.unwrap());
    assert!(!email_exists(&mut ex, user.email(), Some(*user.id())).await.unwrap());
}

#[tokio::test]
async fn test_username_is_case_sensitive() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    make_user(&mut ex, "somebody", UserType::Passenger).await;

    // Duplicate detection uses case-exact equality, so this must be considered distinct.
    assert!(!username_exists(&mut ex, &Username::from("Somebody"), None).await.unwrap());
}

#[tokio::test]
async fn test_update_user_ok() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let user = make_user(&mut ex, "before", UserType::Passenger).await;
    let updated = User::new(
        *user.id(),
        Username::from("after"),
        EmailAddress::from("after@example.com"),
        UserType::Passenger,
        true,
    );
    update_user(&mut ex, &updated).await.unwrap();

    assert_eq!(updated, get_user(&mut ex, *user.id()).await.unwrap());
}

#[tokio::test]
async fn test_update_user_not_found() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let ghost = User::new(
        UserId::new(555),
        Username::from("ghost"),
        EmailAddress::from("ghost@example.com"),
        UserType::Passenger,
        false,
    );
    assert_eq!(DbError::NotFound, update_user(&mut ex, &ghost).await.unwrap_err());
}

#[tokio::test]
async fn test_delete_user_ok() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let user = make_user(&mut ex, "somebody", UserType::Passenger).await;
    delete_user(&mut ex, *user.id()).await.unwrap();
    assert_eq!(DbError::NotFound, get_user(&mut ex, *user.id()).await.unwrap_err());
}

#[tokio::test]
async fn test_delete_user_not_found() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    assert_eq!(DbError::NotFound, delete_user(&mut ex, UserId::new(5)).await.unwrap_err());
}

#[tokio::test]
async fn test_set_user_location_and_read_back() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let user = make_user(&mut ex, "driver1", UserType::Driver).await;
    assert_eq!(None, *get_user(&mut ex, *user.id()).await.unwrap().location());

    let location = UserLocation::new(Coordinates::new(-23.5505, -46.6333).unwrap(), T0);
    set_user_location(&mut ex, *user.id(), &location).await.unwrap();

    let user = get_user(&mut ex, *user.id()).await.unwrap();
    assert_eq!(Some(location), *user.location());
}

#[tokio::test]
async fn test_set_user_location_not_found() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let location = UserLocation::new(Coordinates::new(0.0, 0.0).unwrap(), T0);
    assert_eq!(
        DbError::NotFound,
        set_user_location(&mut ex, UserId::new(3), &location).await.unwrap_err()
    );
}

#[tokio::test]
async fn test_create_ride_defaults() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let passenger = make_user(&mut ex, "passenger1", UserType::Passenger).await;
    let ride =
        create_ride(&mut ex, *passenger.id(), "A", "B", None, None, &[], T0).await.unwrap();

    assert_eq!(RideStatus::Requested, *ride.status());
    assert_eq!(None, *ride.driver_id());
    assert_eq!(T0, *ride.created_at());
    assert_eq!(T0, *ride.updated_at());

    assert_eq!(ride, get_ride(&mut ex, *ride.id()).await.unwrap());
}

#[tokio::test]
async fn test_create_ride_waypoints_round_trip() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let passenger = make_user(&mut ex, "passenger1", UserType::Passenger).await;
    let waypoints = vec![
        Coordinates::new(-23.56, -46.65).unwrap(),
        Coordinates::new(-23.57, -46.66).unwrap(),
        Coordinates::new(-23.58, -46.67).unwrap(),
    ];
    let ride = create_ride(
        &mut ex,
        *passenger.id(),
        "A",
        "B",
        Some(Coordinates::new(-23.55, -46.63).unwrap()),
        Some(Coordinates::new(-23.59, -46.68).unwrap()),
        &waypoints,
        T0,
    )
    .await
    .unwrap();

    let reread = get_ride(&mut ex, *ride.id()).await.unwrap();
    assert_eq!(waypoints, *reread.waypoints());
    assert_eq!(ride, reread);
}

#[tokio::test]
async fn test_get_ride_not_found() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    assert_eq!(DbError::NotFound, get_ride(&mut ex, RideId::new(9)).await.unwrap_err());
}

#[tokio::test]
async fn test_list_rides_newest_first() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let passenger = make_user(&mut ex, "passenger1", UserType::Passenger).await;
    let t1 = T0 + time::Duration::minutes(1);
    let ride1 =
        create_ride(&mut ex, *passenger.id(), "A", "B", None, None, &[], T0).await.unwrap();
    let ride2 =
        create_ride(&mut ex, *passenger.id(), "C", "D", None, None, &[], t1).await.unwrap();

    let rides = list_rides(&mut ex, &RideFilter::default()).await.unwrap();
    assert_eq!(vec![ride2, ride1], rides);
}

#[tokio::test]
async fn test_list_rides_filters() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let passenger1 = make_user(&mut ex, "passenger1", UserType::Passenger).await;
    let passenger2 = make_user(&mut ex, "passenger2", UserType::Passenger).await;
    let driver = make_user(&mut ex, "driver1", UserType::Driver).await;

    let ride1 =
        create_ride(&mut ex, *passenger1.id(), "A", "B", None, None, &[], T0).await.unwrap();
    let ride2 =
        create_ride(&mut ex, *passenger2.id(), "C", "D", None, None, &[], T0).await.unwrap();
    assert!(accept_ride(&mut ex, *ride2.id(), *driver.id(), T0).await.unwrap());

    let rides = list_rides(
        &mut ex,
        &RideFilter { passenger_id: Some(*passenger1.id()), ..Default::default() },
    )
    .await
    .unwrap();
    assert_eq!(vec![ride1.clone()], rides);

    let rides =
        list_rides(&mut ex, &RideFilter { driver_id: Some(*driver.id()), ..Default::default() })
            .await
            .unwrap();
    assert_eq!(1, rides.len());
    assert_eq!(ride2.id(), rides[0].id());

    let rides = list_rides(
        &mut ex,
        &RideFilter { status: Some(RideStatus::Requested), ..Default::default() },
    )
    .await
    .unwrap();
    assert_eq!(vec![ride1], rides);

    let rides = list_rides(
        &mut ex,
        &RideFilter {
            passenger_id: Some(*passenger2.id()),
            status: Some(RideStatus::Accepted),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(1, rides.len());
}

#[tokio::test]
async fn test_accept_ride_only_from_requested() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let passenger = make_user(&mut ex, "passenger1", UserType::Passenger).await;
    let driver1 = make_user(&mut ex, "driver1", UserType::Driver).await;
    let driver2 = make_user(&mut ex, "driver2", UserType::Driver).await;
    let ride =
        create_ride(&mut ex, *passenger.id(), "A", "B", None, None, &[], T0).await.unwrap();

    let t1 = T0 + time::Duration::minutes(1);
    assert!(accept_ride(&mut ex, *ride.id(), *driver1.id(), t1).await.unwrap());

    let ride = get_ride(&mut ex, *ride.id()).await.unwrap();
    assert_eq!(RideStatus::Accepted, *ride.status());
    assert_eq!(Some(*driver1.id()), *ride.driver_id());
    assert_eq!(t1, *ride.updated_at());

    // A second acceptance must not match the conditional update.
    assert!(!accept_ride(&mut ex, *ride.id(), *driver2.id(), t1).await.unwrap());
    let ride = get_ride(&mut ex, *ride.id()).await.unwrap();
    assert_eq!(Some(*driver1.id()), *ride.driver_id());
}

#[tokio::test]
async fn test_accept_ride_missing_ride() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let driver = make_user(&mut ex, "driver1", UserType::Driver).await;
    assert!(!accept_ride(&mut ex, RideId::new(44), *driver.id(), T0).await.unwrap());
}

#[tokio::test]
async fn test_update_ride_status_any_member_value() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let passenger = make_user(&mut ex, "passenger1", UserType::Passenger).await;
    let ride =
        create_ride(&mut ex, *passenger.id(), "A", "B", None, None, &[], T0).await.unwrap();

    let t1 = T0 + time::Duration::minutes(5);
    update_ride_status(&mut ex, *ride.id(), RideStatus::Completed, t1).await.unwrap();
    let ride = get_ride(&mut ex, *ride.id()).await.unwrap();
    assert_eq!(RideStatus::Completed, *ride.status());
    assert_eq!(t1, *ride.updated_at());

    // The persistence layer accepts any enumerated value from any state.
    update_ride_status(&mut ex, *ride.id(), RideStatus::Requested, t1).await.unwrap();
    let ride = get_ride(&mut ex, *ride.id()).await.unwrap();
    assert_eq!(RideStatus::Requested, *ride.status());
}

#[tokio::test]
async fn test_update_ride_status_not_found() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    assert_eq!(
        DbError::NotFound,
        update_ride_status(&mut ex, RideId::new(3), RideStatus::Cancelled, T0)
            .await
            .unwrap_err()
    );
}

#[tokio::test]
async fn test_update_ride_route_rewrites_all_fields() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let passenger = make_user(&mut ex, "passenger1", UserType::Passenger).await;
    let ride =
        create_ride(&mut ex, *passenger.id(), "A", "B", None, None, &[], T0).await.unwrap();

    let origin_position = Coordinates::new(1.0, 2.0).unwrap();
    let waypoints = vec![Coordinates::new(3.0, 4.0).unwrap()];
    let t1 = T0 + time::Duration::minutes(2);
    update_ride_route(
        &mut ex,
        *ride.id(),
        "A2",
        "B2",
        Some(origin_position),
        None,
        &waypoints,
        t1,
    )
    .await
    .unwrap();

    let ride = get_ride(&mut ex, *ride.id()).await.unwrap();
    assert_eq!("A2", ride.origin());
    assert_eq!("B2", ride.destination());
    assert_eq!(Some(origin_position), *ride.origin_position());
    assert_eq!(None, *ride.destination_position());
    assert_eq!(waypoints, *ride.waypoints());
    assert_eq!(t1, *ride.updated_at());
}

#[tokio::test]
async fn test_create_and_list_messages_ascending() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let passenger = make_user(&mut ex, "passenger1", UserType::Passenger).await;
    let driver = make_user(&mut ex, "driver1", UserType::Driver).await;
    let ride =
        create_ride(&mut ex, *passenger.id(), "A", "B", None, None, &[], T0).await.unwrap();
    assert!(accept_ride(&mut ex, *ride.id(), *driver.id(), T0).await.unwrap());

    let t1 = T0 + time::Duration::seconds(10);
    let t2 = T0 + time::Duration::seconds(20);
    let message1 =
        create_message(&mut ex, *ride.id(), *driver.id(), *passenger.id(), "On my way", t1)
            .await
            .unwrap();
    let message2 =
        create_message(&mut ex, *ride.id(), *passenger.id(), *driver.id(), "Thanks", t2)
            .await
            .unwrap();

    assert_eq!(vec![message1, message2], list_messages(&mut ex, *ride.id()).await.unwrap());
}

#[tokio::test]
async fn test_list_messages_empty() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let passenger = make_user(&mut ex, "passenger1", UserType::Passenger).await;
    let ride =
        create_ride(&mut ex, *passenger.id(), "A", "B", None, None, &[], T0).await.unwrap();

    assert!(list_messages(&mut ex, *ride.id()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_message_requires_existing_ride() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let passenger = make_user(&mut ex, "passenger1", UserType::Passenger).await;
    let driver = make_user(&mut ex, "driver1", UserType::Driver).await;

    // The foreign key constraint must reject messages for rides that don't exist.
    let err =
        create_message(&mut ex, RideId::new(77), *passenger.id(), *driver.id(), "hello", T0)
            .await
            .unwrap_err();
    assert_eq!(DbError::NotFound, err);
}
