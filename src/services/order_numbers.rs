use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::config::IdentifierConfig;
use crate::errors::ServiceError;
use crate::orders::{OrderCode, OrderCodeFormat, OrderCodePattern, OrderKind};
use crate::repositories::{ContractRef, NewOrderRecord, OrderStore};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OpenOrderRequest {
    #[validate(length(min = 1, max = 32))]
    pub contract_acronym: String,
    pub kind: OrderKind,
    pub asset_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenedOrder {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub kind: OrderKind,
    pub number: i64,
    pub code: OrderCode,
}

/// Numbers maintenance orders per contract and order kind.
///
/// Numbers come from an atomic counter in the store, so concurrent callers
/// never share one. A code collision can still happen when a record was
/// written outside the counter; the service then draws the next number.
#[derive(Clone)]
pub struct OrderNumberService {
    store: Arc<dyn OrderStore>,
    format: OrderCodeFormat,
    max_attempts: u32,
}

impl OrderNumberService {
    pub fn new(store: Arc<dyn OrderStore>, format: OrderCodeFormat, max_attempts: u32) -> Self {
        Self {
            store,
            format,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn from_config(store: Arc<dyn OrderStore>, cfg: &IdentifierConfig) -> Self {
        Self::new(store, OrderCodeFormat::from(cfg), cfg.max_insert_attempts)
    }

    pub fn format(&self) -> &OrderCodeFormat {
        &self.format
    }

    async fn resolve_contract(&self, acronym: &str) -> Result<ContractRef, ServiceError> {
        let acronym = acronym.trim();
        if acronym.is_empty() {
            return Err(ServiceError::ValidationError(
                "contract acronym must not be empty".to_string(),
            ));
        }

        self.store
            .find_contract_by_acronym(acronym)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("contract {}", acronym)))
    }

    fn code_pattern(
        &self,
        contract: &ContractRef,
        kind: OrderKind,
    ) -> Result<OrderCodePattern, ServiceError> {
        self.format.pattern(&contract.acronym, kind).map_err(|e| {
            ServiceError::InternalError(format!(
                "order code pattern for contract {}: {}",
                contract.acronym, e
            ))
        })
    }

    async fn allocate(
        &self,
        contract: &ContractRef,
        kind: OrderKind,
        pattern: &OrderCodePattern,
    ) -> Result<(i64, OrderCode), ServiceError> {
        let number = self
            .store
            .next_sequence_value(contract.id, kind, pattern)
            .await?;
        Ok((number, self.format.render(&contract.acronym, kind, number)))
    }

    /// Allocates the next number for a contract and kind and renders its code
    /// without storing an order.
    ///
    /// The counter is advanced even though nothing is stored, so each call
    /// consumes a number and the next order skips it.
    #[instrument(skip(self))]
    pub async fn next_order_number(
        &self,
        contract_acronym: &str,
        kind: OrderKind,
    ) -> Result<OrderCode, ServiceError> {
        let contract = self.resolve_contract(contract_acronym).await?;
        let pattern = self.code_pattern(&contract, kind)?;
        let (_, code) = self.allocate(&contract, kind, &pattern).await?;
        counter!("facility_codes.order_numbers.allocated", 1);
        Ok(code)
    }

    #[instrument(
        skip(self, request),
        fields(contract = %request.contract_acronym, kind = %request.kind)
    )]
    pub async fn open_order(&self, request: OpenOrderRequest) -> Result<OpenedOrder, ServiceError> {
        request.validate()?;
        let contract = self.resolve_contract(&request.contract_acronym).await?;
        let pattern = self.code_pattern(&contract, request.kind)?;

        let id = Uuid::new_v4();
        for attempt in 1..=self.max_attempts {
            let (number, code) = self.allocate(&contract, request.kind, &pattern).await?;
            counter!("facility_codes.order_numbers.allocated", 1);

            let record = NewOrderRecord {
                id,
                contract_id: contract.id,
                kind: request.kind,
                code: code.clone(),
                asset_id: request.asset_id,
            };

            match self.store.insert_order(record).await {
                Ok(()) => {
                    info!(%code, attempt, "Maintenance order opened");
                    return Ok(OpenedOrder {
                        id,
                        contract_id: contract.id,
                        kind: request.kind,
                        number,
                        code,
                    });
                }
                Err(err) if err.is_duplicate() => {
                    counter!("facility_codes.order_numbers.collisions", 1);
                    warn!(%code, attempt, "Order code already taken; drawing the next number");
                }
                Err(err) => return Err(err),
            }
        }

        error!(attempts = self.max_attempts, "Order numbering kept colliding");
        Err(ServiceError::Conflict(format!(
            "could not allocate a unique {} order code for contract {} after {} attempts",
            request.kind, contract.acronym, self.max_attempts
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryStore;
    use assert_matches::assert_matches;

    async fn setup() -> (Arc<InMemoryStore>, OrderNumberService, ContractRef) {
        let store = Arc::new(InMemoryStore::new());
        let contract = store.add_contract("ACME").await;
        let service = OrderNumberService::from_config(store.clone(), &IdentifierConfig::default());
        (store, service, contract)
    }

    fn request(acronym: &str, kind: OrderKind) -> OpenOrderRequest {
        OpenOrderRequest {
            contract_acronym: acronym.to_string(),
            kind,
            asset_id: None,
        }
    }

    #[tokio::test]
    async fn numbers_follow_contract_and_kind() {
        let (_, service, _) = setup().await;

        let p1 = service.open_order(request("ACME", OrderKind::Preventive)).await.unwrap();
        let p2 = service.open_order(request("ACME", OrderKind::Preventive)).await.unwrap();
        let c1 = service.open_order(request("ACME", OrderKind::Corrective)).await.unwrap();

        assert_eq!(p1.code.as_str(), "OMP-ACME-00001");
        assert_eq!(p2.code.as_str(), "OMP-ACME-00002");
        assert_eq!(c1.code.as_str(), "OMC-ACME-00001");
        assert_eq!(p2.number, 2);
    }

    #[tokio::test]
    async fn continues_after_legacy_codes() {
        let (store, service, contract) = setup().await;
        store
            .add_legacy_order(contract.id, OrderKind::Corrective, "OMC-ACME-00120")
            .await;

        let code = service
            .next_order_number("ACME", OrderKind::Corrective)
            .await
            .unwrap();
        assert_eq!(code.as_str(), "OMC-ACME-00121");
    }

    #[tokio::test]
    async fn skips_codes_written_outside_the_counter() {
        let (store, service, contract) = setup().await;
        let first = service.open_order(request("ACME", OrderKind::Preventive)).await.unwrap();
        // Written without going through the counter.
        store
            .add_legacy_order(Uuid::new_v4(), OrderKind::Preventive, "OMP-ACME-00002")
            .await;

        let second = service.open_order(request("ACME", OrderKind::Preventive)).await.unwrap();
        assert_eq!(first.code.as_str(), "OMP-ACME-00001");
        assert_eq!(second.code.as_str(), "OMP-ACME-00003");
        assert_eq!(second.contract_id, contract.id);
    }

    #[tokio::test]
    async fn kinds_never_share_codes() {
        let (_, service, _) = setup().await;
        for _ in 0..5 {
            service.open_order(request("ACME", OrderKind::Corrective)).await.unwrap();
        }

        let preventive = service.open_order(request("ACME", OrderKind::Preventive)).await.unwrap();
        assert_eq!(preventive.number, 1);
        assert_eq!(preventive.code.as_str(), "OMP-ACME-00001");
    }

    #[tokio::test]
    async fn continues_legacy_codes_in_a_custom_layout() {
        let store = Arc::new(InMemoryStore::new());
        let contract = store.add_contract("TRT2").await;
        store
            .add_legacy_order(contract.id, OrderKind::Corrective, "00120-TRT2-OMC")
            .await;
        let config = IdentifierConfig {
            order_code_template: "{number}-{acronym}-{marker}".into(),
            ..IdentifierConfig::default()
        };
        let service = OrderNumberService::from_config(store.clone(), &config);

        let opened = service.open_order(request("TRT2", OrderKind::Corrective)).await.unwrap();
        assert_eq!(opened.number, 121);
        assert_eq!(opened.code.as_str(), "00121-TRT2-OMC");
    }

    #[tokio::test]
    async fn previewing_consumes_a_number() {
        let (_, service, _) = setup().await;
        let preview = service
            .next_order_number("ACME", OrderKind::Preventive)
            .await
            .unwrap();
        let opened = service.open_order(request("ACME", OrderKind::Preventive)).await.unwrap();

        assert_eq!(preview.as_str(), "OMP-ACME-00001");
        assert_eq!(opened.code.as_str(), "OMP-ACME-00002");
    }

    #[tokio::test]
    async fn unknown_contract_is_not_found() {
        let (store, service, _) = setup().await;
        let err = service
            .open_order(request("NOPE", OrderKind::Preventive))
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::NotFound(ref msg) if msg.contains("NOPE"));
        assert!(store.order_codes().await.is_empty());
    }

    #[tokio::test]
    async fn blank_acronym_is_rejected() {
        let (_, service, _) = setup().await;
        let err = service
            .next_order_number("  ", OrderKind::Corrective)
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(_));
    }
}
