use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{AssetStore, ContractRef, NewAssetRecord, NewOrderRecord, OrderStore, Placement};
use crate::errors::ServiceError;
use crate::orders::{OrderCodePattern, OrderKind};

#[derive(Debug, Default)]
struct MemoryState {
    placements: HashMap<Uuid, Placement>,
    contracts: HashMap<String, ContractRef>,
    tags: HashSet<String>,
    assets: Vec<NewAssetRecord>,
    order_codes: HashSet<String>,
    orders: Vec<(Uuid, OrderKind, String)>,
    counters: HashMap<(Uuid, OrderKind), i64>,
}

impl MemoryState {
    fn max_order_number(
        &self,
        contract_id: Uuid,
        kind: OrderKind,
        pattern: &OrderCodePattern,
    ) -> Option<i64> {
        self.orders
            .iter()
            .filter(|(contract, order_kind, _)| *contract == contract_id && *order_kind == kind)
            .filter_map(|(_, _, code)| pattern.parse(code))
            .max()
    }
}

/// Process-local store with the same uniqueness rules as the database.
///
/// Every operation takes a single lock, so each call is atomic on its own
/// while sequences of calls can still interleave like concurrent requests.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a location on a floor and returns its id.
    pub async fn add_location(&self, floor_name: &str, location_name: &str) -> Uuid {
        let location_id = Uuid::new_v4();
        self.state.lock().await.placements.insert(
            location_id,
            Placement {
                location_id,
                floor_name: floor_name.to_string(),
                location_name: location_name.to_string(),
            },
        );
        location_id
    }

    pub async fn add_contract(&self, acronym: &str) -> ContractRef {
        let contract = ContractRef {
            id: Uuid::new_v4(),
            acronym: acronym.to_string(),
        };
        self.state
            .lock()
            .await
            .contracts
            .insert(acronym.to_string(), contract.clone());
        contract
    }

    /// Stores an order code issued before counters existed.
    pub async fn add_legacy_order(&self, contract_id: Uuid, kind: OrderKind, code: &str) {
        let mut state = self.state.lock().await;
        state.order_codes.insert(code.to_string());
        state.orders.push((contract_id, kind, code.to_string()));
    }

    /// Tags in insertion order.
    pub async fn tags(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .assets
            .iter()
            .map(|asset| asset.tag.to_string())
            .collect()
    }

    /// Order codes in insertion order.
    pub async fn order_codes(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .orders
            .iter()
            .map(|(_, _, code)| code.clone())
            .collect()
    }
}

#[async_trait]
impl AssetStore for InMemoryStore {
    async fn resolve_location(&self, location_id: Uuid) -> Result<Option<Placement>, ServiceError> {
        Ok(self.state.lock().await.placements.get(&location_id).cloned())
    }

    async fn count_tags_with_prefix(&self, prefix: &str) -> Result<u64, ServiceError> {
        let state = self.state.lock().await;
        Ok(state.tags.iter().filter(|tag| tag.starts_with(prefix)).count() as u64)
    }

    async fn insert_asset(&self, record: NewAssetRecord) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        if !state.tags.insert(record.tag.to_string()) {
            return Err(ServiceError::DuplicateIdentifier {
                identifier: record.tag.into_string(),
            });
        }
        state.assets.push(record);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn find_contract_by_acronym(
        &self,
        acronym: &str,
    ) -> Result<Option<ContractRef>, ServiceError> {
        Ok(self.state.lock().await.contracts.get(acronym).cloned())
    }

    async fn max_order_number(
        &self,
        contract_id: Uuid,
        kind: OrderKind,
        pattern: &OrderCodePattern,
    ) -> Result<Option<i64>, ServiceError> {
        Ok(self.state.lock().await.max_order_number(contract_id, kind, pattern))
    }

    async fn next_sequence_value(
        &self,
        contract_id: Uuid,
        kind: OrderKind,
        pattern: &OrderCodePattern,
    ) -> Result<i64, ServiceError> {
        let mut state = self.state.lock().await;
        let seed = state.max_order_number(contract_id, kind, pattern).unwrap_or(0);
        let counter = state.counters.entry((contract_id, kind)).or_insert(seed);
        *counter += 1;
        Ok(*counter)
    }

    async fn insert_order(&self, record: NewOrderRecord) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        let code = record.code.into_string();
        if !state.order_codes.insert(code.clone()) {
            return Err(ServiceError::DuplicateIdentifier { identifier: code });
        }
        state.orders.push((record.contract_id, record.kind, code));
        Ok(())
    }
}
