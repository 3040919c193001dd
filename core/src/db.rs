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

//! Generic abstraction to access the database.
//!
//! The facilities in this module wrap the SQLite backend behind an executor type so that the
//! services' persistence layers are expressed as free functions over an `Executor`, which can
//! transparently be backed by the connection pool or by an open transaction.

use crate::model::ModelError;
use async_trait::async_trait;

pub mod sqlite;

/// Database errors.  Any unexpected errors that come from the database are classified as
/// `BackendError`, but errors we know about have more specific types.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DbError {
    /// Indicates that a request to create an entry failed because it already exists.
    #[error("Already exists")]
    AlreadyExists,

    /// Catch-all error type for unexpected database errors.
    #[error("Database error: {0}")]
    BackendError(String),

    /// Indicates a failure processing the data that already exists in the database.
    #[error("Data integrity error: {0}")]
    DataIntegrityError(String),

    /// Indicates that a requested entry does not exist.
    #[error("Entity not found")]
    NotFound,

    /// Indicates that the database is not available (maybe because of too many active concurrent
    /// connections).
    #[error("Unavailable")]
    Unavailable,
}

impl From<ModelError> for DbError {
    fn from(e: ModelError) -> Self {
        DbError::DataIntegrityError(e.to_string())
    }
}

/// Result type for this module.
pub type DbResult<T> = Result<T, DbError>;

/// A database executor hiding the specific backend in use.
///
/// Note that this can wrap an executor that talks directly to a pool or to an open transaction.
pub enum Executor {
    /// A SQLite executor that can be used in `sqlx` operations.
    Sqlite(sqlite::SqliteExecutor),
}

/// A wrapper for a database executor backed by an open transaction.
pub struct TxExecutor(Executor);

impl TxExecutor {
    /// Returns the executor wrapped by this transaction.
    ///
    /// This would be better called `executor` but this method is used so frequently that it makes
    /// call sites too verbose.
    pub fn ex(&mut self) -> &mut Executor {
        &mut self.0
    }

    /// Commits the transaction.
    pub async fn commit(self) -> DbResult<()> {
        match self.0 {
            Executor::Sqlite(e) => e.commit().await,
        }
    }
}

/// Abstraction over the database connection.
#[async_trait]
pub trait Db {
    /// Obtains an executor for direct access to the pool.
    ///
    /// This would be better called `executor` but this method is used so frequently that it makes
    /// call sites too verbose.
    async fn ex(&self) -> DbResult<Executor>;

    /// Begins a transaction.
    ///
    /// It is the responsibility of the caller to call `commit` on the returned executor.  Otherwise
    /// the transaction is rolled back on drop.
    async fn begin(&self) -> DbResult<TxExecutor>;

    /// Closes the connection pool.
    async fn close(&self);
}
