//! Identifier allocation services.
//!
//! Each service pairs a pure generator with a persistence port and owns the
//! retry loop that turns a candidate identifier into a stored one.

pub mod asset_tags;
pub mod order_numbers;

pub use asset_tags::{AssetTagService, RegisterAssetRequest, RegisteredAsset};
pub use order_numbers::{OpenOrderRequest, OpenedOrder, OrderNumberService};
