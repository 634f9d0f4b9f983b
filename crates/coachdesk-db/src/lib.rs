//! CoachDesk DB - Database abstractions
//!
//! SQLx-based database layer for the booking backend.
//!
//! # Example
//!
//! ```rust,ignore
//! use coachdesk_db::{create_pool, Repositories};
//!
//! let pool = create_pool("postgres://localhost/coachdesk").await?;
//! coachdesk_db::run_migrations(&pool).await?;
//! let repos = Repositories::new(pool);
//!
//! let product = repos.products.find_by_id(product_id).await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, create_pool_with_options, run_migrations, DbPool, PoolOptions};
pub use repo::*;
