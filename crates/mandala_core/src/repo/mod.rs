//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the storage contract the chart session depends on.
//! - Isolate SQLite and blob encoding details from session orchestration.
//!
//! # Invariants
//! - Repository APIs distinguish "nothing saved" (`Ok(None)`) from corrupt
//!   data (`StoreError::Corrupt`).

pub mod chart_store;
