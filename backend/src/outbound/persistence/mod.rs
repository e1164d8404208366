//! PostgreSQL persistence adapter using Diesel ORM.
//!
//! Provides [`DieselAccountStore`], the durable implementation of the
//! [`AccountStore`](crate::domain::ports::AccountStore) port, backed by
//! `diesel-async` with `bb8` connection pooling.
//!
//! Diesel row structs (`models.rs`) and the table definition (`schema.rs`)
//! stay private to this module.
//!
//! # Example
//!
//! ```no_run
//! use accounts::outbound::persistence::{DbPool, DieselAccountStore, PoolConfig};
//!
//! # async fn wire() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/accounts")).await?;
//! let store = DieselAccountStore::new(pool);
//! # let _ = store;
//! # Ok(())
//! # }
//! ```

mod diesel_account_store;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_account_store::DieselAccountStore;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
