//! Reelmatch-DB: Database schema, migrations, and query operations
//!
//! SQLite persistence for libraries, canonical records and the files backing
//! them, using rusqlite with r2d2 connection pooling.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching database schema
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use reelmatch_common::ContentKind;
//! use reelmatch_db::pool::{init_pool, get_conn};
//! use reelmatch_db::queries::libraries;
//!
//! let pool = init_pool("/var/lib/reelmatch/reelmatch.db").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let library = libraries::create_library(
//!     &conn,
//!     "Movies",
//!     ContentKind::Movie,
//!     &["/media/movies".to_string()],
//! )
//! .unwrap();
//! println!("Created library: {}", library.id);
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
