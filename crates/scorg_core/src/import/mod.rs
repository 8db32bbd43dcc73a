//! Bulk data import.
//!
//! # Responsibility
//! - Bring class sheets exported from spreadsheets into core storage.
//! - Keep imports atomic: a sheet lands completely or not at all.

pub mod csv_import;
