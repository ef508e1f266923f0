//! Persistence ports consumed by the identifier services.
//!
//! Services only see these traits; the process entry point decides whether
//! they are backed by SeaORM or by the in-memory store.

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::orders::{OrderCode, OrderCodePattern, OrderKind};
use crate::tags::AssetTag;

pub mod memory;
pub mod sea_orm_store;

pub use memory::InMemoryStore;
pub use sea_orm_store::SeaOrmStore;

/// Floor and location names an asset is being placed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub location_id: Uuid,
    pub floor_name: String,
    pub location_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewAssetRecord {
    pub id: Uuid,
    pub location_id: Uuid,
    pub name: String,
    pub tag: AssetTag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractRef {
    pub id: Uuid,
    pub acronym: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrderRecord {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub kind: OrderKind,
    pub code: OrderCode,
    pub asset_id: Option<Uuid>,
}

/// Storage operations needed to tag assets.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Floor and location names for a location, or `None` if it does not exist.
    async fn resolve_location(&self, location_id: Uuid) -> Result<Option<Placement>, ServiceError>;

    /// Number of stored tags starting with `prefix`.
    async fn count_tags_with_prefix(&self, prefix: &str) -> Result<u64, ServiceError>;

    /// Persists an asset. A tag already in use fails with
    /// [`ServiceError::DuplicateIdentifier`] and leaves the store unchanged.
    async fn insert_asset(&self, record: NewAssetRecord) -> Result<(), ServiceError>;
}

/// Storage operations needed to number maintenance orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_contract_by_acronym(
        &self,
        acronym: &str,
    ) -> Result<Option<ContractRef>, ServiceError>;

    /// Highest number `pattern` reads from the codes already stored for a
    /// contract and kind. Codes the pattern does not match are ignored.
    async fn max_order_number(
        &self,
        contract_id: Uuid,
        kind: OrderKind,
        pattern: &OrderCodePattern,
    ) -> Result<Option<i64>, ServiceError>;

    /// Atomically increments and returns the counter for a contract and kind.
    ///
    /// The first call for a scope starts from [`OrderStore::max_order_number`]
    /// so numbering continues from records created before counters existed.
    async fn next_sequence_value(
        &self,
        contract_id: Uuid,
        kind: OrderKind,
        pattern: &OrderCodePattern,
    ) -> Result<i64, ServiceError>;

    /// Persists an order. A code already in use fails with
    /// [`ServiceError::DuplicateIdentifier`].
    async fn insert_order(&self, record: NewOrderRecord) -> Result<(), ServiceError>;
}
