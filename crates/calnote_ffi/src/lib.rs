//! Flutter-facing bindings for the calendar notes core.

pub mod api;
