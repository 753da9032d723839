//! Database layer
//!
//! SQLite storage accessed through the [`DatabasePool`] abstraction,
//! code-embedded migrations, and one repository per entity.
//!
//! ```ignore
//! use ya_sites::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config.database).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, DatabasePool, DynDatabasePool, SqliteDatabase};
