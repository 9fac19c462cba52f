//! Query descriptor construction.
//!
//! ```text
//! QueryBuilder ──build()──▶ Catalog checks ──▶ QueryDescriptor ──▶ QueryExecutor
//!                               │
//!                               └── QueryError (never sent to the store)
//! ```

mod builder;
mod descriptor;
mod error;

pub use builder::QueryBuilder;
pub use descriptor::{
    Expansion, Filter, FilterOp, Pagination, QueryDescriptor, Sort, SortDir,
};
pub use error::{QueryError, QueryResult};
