//! Facility Codes Library
//!
//! Identifier generation for facility maintenance records: asset tags built
//! from equipment, floor and location names, per-contract maintenance order
//! codes, floor ordering and frequency aggregation.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Pure generators
pub mod floors;
pub mod frequency;
pub mod orders;
pub mod tags;
pub mod text;

// Persistence and services
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod migrator;
pub mod repositories;
pub mod services;

pub use errors::ServiceError;
pub use floors::{compare_floors, floor_token, FloorOrder};
pub use frequency::most_frequent;
pub use orders::{OrderCode, OrderCodeFormat, OrderCodePattern, OrderKind};
pub use tags::{generate_tag, AssetTag, TagGenerator};
pub use text::normalize;
