//! Flutter-facing bindings for the mandala chart core.

pub mod api;
