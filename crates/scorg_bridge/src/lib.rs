//! Bridge crate between the UI shell and `scorg_core`.

pub mod api;
mod commands;
