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

//! Common utilities to interact with an SQLite database.

use crate::db::{Db, DbError, DbResult, Executor, TxExecutor};
use async_trait::async_trait;
use log::warn;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqliteConnection, SqlitePool};
use sqlx::Transaction;
use std::str::FromStr;
use time::OffsetDateTime;

/// Takes a raw SQLx error `e` and converts it to our generic error type.
pub fn map_sqlx_error(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::ColumnDecode { source, .. } => DbError::DataIntegrityError(source.to_string()),
        sqlx::Error::RowNotFound => DbError::NotFound,
        e if e.to_string().contains("FOREIGN KEY constraint failed") => DbError::NotFound,
        e if e.to_string().contains("UNIQUE constraint failed") => DbError::AlreadyExists,
        e => DbError::BackendError(e.to_string()),
    }
}

/// Creates a new connection with foreign key enforcement enabled, creating the database file if
/// it does not yet exist.
pub async fn connect(conn_str: &str) -> DbResult<SqliteDb> {
    let opts = SqliteConnectOptions::from_str(conn_str)
        .map_err(map_sqlx_error)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePool::connect_with(opts).await.map_err(map_sqlx_error)?;
    Ok(SqliteDb { pool })
}

/// A generic database executor implementation for SQLite.
pub enum SqliteExecutor {
    /// An executor backed by a pool.  Operations issued via this executor aren't guaranteed to
    /// happen on the same connection.
    PoolExec(PoolConnection<Sqlite>),

    /// An executor backed by a transaction.
    TxExec(Transaction<'static, Sqlite>),
}

impl SqliteExecutor {
    /// Returns the raw connection backing this executor for use in `sqlx` operations.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        match self {
            SqliteExecutor::PoolExec(conn) => conn,
            SqliteExecutor::TxExec(tx) => tx,
        }
    }

    /// Commits the transaction if this executor is backed by one.
    ///
    /// Calling this on a non-transaction-based executor results in a panic.
    pub(super) async fn commit(self) -> DbResult<()> {
        match self {
            SqliteExecutor::PoolExec(_) => unreachable!("Do not call commit on direct executors"),
            SqliteExecutor::TxExec(tx) => tx.commit().await.map_err(map_sqlx_error),
        }
    }
}

/// A database instance backed by a SQLite database.
pub struct SqliteDb {
    /// Shared SQLite connection pool.  This is a cloneable type that all concurrent
    /// transactions can use concurrently.
    pool: SqlitePool,
}

impl Drop for SqliteDb {
    fn drop(&mut self) {
        if !self.pool.is_closed() {
            warn!("Dropping connection without having called close() first");
        }
    }
}

#[async_trait]
impl Db for SqliteDb {
    async fn ex(&self) -> DbResult<Executor> {
        let conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        Ok(Executor::Sqlite(SqliteExecutor::PoolExec(conn)))
    }

    async fn begin(&self) -> DbResult<TxExecutor> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(TxExecutor(Executor::Sqlite(SqliteExecutor::TxExec(tx))))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Helper function to initialize the database with a schema.
pub async fn run_schema(e: &mut SqliteExecutor, schema: &str) -> DbResult<()> {
    sqlx::raw_sql(schema).execute(e.conn()).await.map_err(map_sqlx_error)?;
    Ok(())
}

/// Converts a timestamp as extracted from the database into an `OffsetDateTime`.
///
/// The input parameters must both be positive.  The reason why their types are `i64`s instead of
/// the `u64` you would expect is because the numeric types exposed by sqlx and SQLite are all
/// signed.  We could simply cast the types and accept negative representations in the database,
/// but that would pose difficulties when attempting to compare timestamps via relation operators
/// in SQL queries.
pub fn build_timestamp(timestamp_sec: i64, timestamp_nsec: i64) -> DbResult<OffsetDateTime> {
    if timestamp_sec < 0 || timestamp_nsec < 0 {
        return Err(DbError::DataIntegrityError(format!(
            "Timestamp cannot have negative quantities: sec={}, nsec={}",
            timestamp_sec, timestamp_nsec
        )));
    }

    match OffsetDateTime::from_unix_timestamp_nanos(
        (i128::from(timestamp_sec) * 1_000_000_000) + (i128::from(timestamp_nsec)),
    ) {
        Ok(timestamp) => Ok(timestamp),
        Err(e) => Err(DbError::DataIntegrityError(format!("Invalid timestamp: {}", e))),
    }
}

/// Converts a timestamp into the seconds and nanoseconds pair needed by the database.
///
/// The timestamp must be positive because `build_timestamp` also expects it to be positive when
/// recovering its values from the database.
pub fn unpack_timestamp(ts: OffsetDateTime) -> (i64, i64) {
    let nanos = ts.unix_timestamp_nanos();
    assert!(nanos >= 0, "Cannot store a negative timestamp into the database");
    let sec = i64::try_from(nanos / 1_000_000_000).expect("Must have fit");
    let nsec = i64::try_from(nanos % 1_000_000_000).expect("Must have fit");
    (sec, nsec)
}

/// Test utilities for the SQLite connection.
#[cfg(any(feature = "testutils", test))]
pub mod testutils {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Counter to assign a unique name to the in-memory database of each test.
    static LAST_DB_ID: AtomicU64 = AtomicU64::new(0);

    /// Initializes the test database.
    ///
    /// Every call returns a fresh in-memory database.  The database is named and uses a shared
    /// cache so that all the connections handed out by the pool observe the same data; a plain
    /// `:memory:` database would give every pooled connection its own separate storage.
    pub async fn setup() -> SqliteDb {
        let _can_fail = env_logger::builder().is_test(true).try_init();
        let id = LAST_DB_ID.fetch_add(1, Ordering::SeqCst);
        connect(&format!("sqlite:file:memdb{}?mode=memory&cache=shared", id)).await.unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_unpack_timestamp_zero() {
        let d = OffsetDateTime::from_unix_timestamp(0).unwrap();
        let (secs, nsecs) = unpack_timestamp(d);
        assert_eq!(0, secs);
        assert_eq!(0, nsecs);
        assert_eq!(Ok(d), build_timestamp(secs, nsecs));
    }

    #[test]
    fn test_build_unpack_timestamp_secs_precision() {
        let d = OffsetDateTime::from_unix_timestamp(123456789i64).unwrap();
        let (secs, nsecs) = unpack_timestamp(d);
        assert_eq!(123456789i64, secs);
        assert_eq!(0, nsecs);
        assert_eq!(Ok(d), build_timestamp(secs, nsecs));
    }

    #[test]
    fn test_build_unpack_timestamp_nsecs_precision() {
        let d = OffsetDateTime::from_unix_timestamp_nanos(1234567899876543215i128).unwrap();
        let (secs, nsecs) = unpack_timestamp(d);
        assert_eq!(1234567899i64, secs);
        assert_eq!(876543215i64, nsecs);
        assert_eq!(Ok(d), build_timestamp(secs, nsecs));
    }

    #[test]
    fn test_build_timestamp_negative() {
        match build_timestamp(-1, 0) {
            Err(DbError::DataIntegrityError(_)) => (),
            e => panic!("Must have failed with a DataIntegrityError but got: {:?}", e),
        }

        match build_timestamp(0, -1) {
            Err(DbError::DataIntegrityError(_)) => (),
            e => panic!("Must have failed with a DataIntegrityError but got: {:?}", e),
        }
    }

    #[test]
    fn test_build_timestamp_too_big() {
        match build_timestamp(123456789123456789i64, 0) {
            Err(_) => (),
            Ok(_) => panic!("Must have failed"),
        }
    }
}
