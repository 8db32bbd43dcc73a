//! Score chart rendering.

pub mod safmed_chart;
