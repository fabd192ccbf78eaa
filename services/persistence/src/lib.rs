//! Persistence layer
//!
//! Durable write-through storage for order and trade records. The in-memory
//! book owns the truth during a run; this layer exists so terminal history
//! survives restarts and the book can be rebuilt from still-open orders.
//!
//! Two backends implement the same [`Store`] contract: Postgres for
//! deployments and an in-memory store for tests and database-less runs.

pub mod memory;
pub mod postgres;
pub mod retry;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{OrderFilter, Page, PageResult, Store};
