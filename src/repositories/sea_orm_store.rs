use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QuerySelect, Set, SqlErr, TransactionError, TransactionTrait,
};
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{AssetStore, ContractRef, NewAssetRecord, NewOrderRecord, OrderStore, Placement};
use crate::entities::{asset, contract, floor, location, maintenance_order, order_counter};
use crate::errors::ServiceError;
use crate::orders::{OrderCodePattern, OrderKind};

/// Two passes cover the case where a concurrent allocation created the
/// counter row between our update and our insert.
const COUNTER_ALLOCATION_PASSES: usize = 2;

/// SeaORM-backed implementation of the persistence ports.
#[derive(Debug, Clone)]
pub struct SeaOrmStore {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn increment_counter(
        &self,
        contract_id: Uuid,
        kind: OrderKind,
        pattern: &OrderCodePattern,
    ) -> Result<i64, TransactionError<DbErr>> {
        let key = order_counter::scope_key(contract_id, kind);
        let pattern = pattern.clone();

        self.db
            .transaction::<_, i64, DbErr>(move |txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let updated = order_counter::Entity::update_many()
                        .col_expr(
                            order_counter::Column::Value,
                            Expr::col(order_counter::Column::Value).add(1),
                        )
                        .col_expr(order_counter::Column::UpdatedAt, Expr::value(now))
                        .filter(order_counter::Column::ScopeKey.eq(key.clone()))
                        .exec(txn)
                        .await?;

                    if updated.rows_affected == 0 {
                        let seed = max_code_number(txn, contract_id, kind, &pattern)
                            .await?
                            .unwrap_or(0);
                        let value = seed + 1;
                        order_counter::ActiveModel {
                            scope_key: Set(key),
                            contract_id: Set(contract_id),
                            kind: Set(kind),
                            value: Set(value),
                            updated_at: Set(now),
                        }
                        .insert(txn)
                        .await?;
                        debug!(contract_id = %contract_id, %kind, seed, "Order counter created");
                        return Ok(value);
                    }

                    order_counter::Entity::find_by_id(key.clone())
                        .one(txn)
                        .await?
                        .map(|counter| counter.value)
                        .ok_or_else(|| DbErr::RecordNotFound(format!("order counter {key}")))
                })
            })
            .await
    }
}

/// Highest number `pattern` reads from the stored codes of a contract and kind.
async fn max_code_number<C: ConnectionTrait>(
    conn: &C,
    contract_id: Uuid,
    kind: OrderKind,
    pattern: &OrderCodePattern,
) -> Result<Option<i64>, DbErr> {
    let codes: Vec<String> = maintenance_order::Entity::find()
        .select_only()
        .column(maintenance_order::Column::Code)
        .filter(maintenance_order::Column::ContractId.eq(contract_id))
        .filter(maintenance_order::Column::Kind.eq(kind))
        .into_tuple()
        .all(conn)
        .await?;

    Ok(codes
        .iter()
        .filter_map(|code| pattern.parse(code))
        .max())
}

#[async_trait]
impl AssetStore for SeaOrmStore {
    #[instrument(skip(self))]
    async fn resolve_location(&self, location_id: Uuid) -> Result<Option<Placement>, ServiceError> {
        let found = location::Entity::find_by_id(location_id)
            .find_also_related(floor::Entity)
            .one(self.get_db())
            .await
            .map_err(ServiceError::DatabaseError)?;

        match found {
            None => Ok(None),
            Some((location, Some(floor))) => Ok(Some(Placement {
                location_id: location.id,
                floor_name: floor.name,
                location_name: location.name,
            })),
            Some((location, None)) => Err(ServiceError::NotFound(format!(
                "floor {} of location {}",
                location.floor_id, location.id
            ))),
        }
    }

    async fn count_tags_with_prefix(&self, prefix: &str) -> Result<u64, ServiceError> {
        asset::Entity::find()
            .filter(asset::Column::Tag.starts_with(prefix))
            .count(self.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    async fn insert_asset(&self, record: NewAssetRecord) -> Result<(), ServiceError> {
        let tag = record.tag.into_string();
        asset::ActiveModel {
            id: Set(record.id),
            location_id: Set(record.location_id),
            name: Set(record.name),
            tag: Set(tag.clone()),
            created_at: Set(Utc::now()),
        }
        .insert(self.get_db())
        .await
        .map(|_| ())
        .map_err(|e| ServiceError::from_insert(e, &tag))
    }
}

#[async_trait]
impl OrderStore for SeaOrmStore {
    async fn find_contract_by_acronym(
        &self,
        acronym: &str,
    ) -> Result<Option<ContractRef>, ServiceError> {
        let found = contract::Entity::find()
            .filter(contract::Column::Acronym.eq(acronym))
            .one(self.get_db())
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(found.map(|contract| ContractRef {
            id: contract.id,
            acronym: contract.acronym,
        }))
    }

    async fn max_order_number(
        &self,
        contract_id: Uuid,
        kind: OrderKind,
        pattern: &OrderCodePattern,
    ) -> Result<Option<i64>, ServiceError> {
        max_code_number(self.get_db(), contract_id, kind, pattern)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    #[instrument(skip(self, pattern))]
    async fn next_sequence_value(
        &self,
        contract_id: Uuid,
        kind: OrderKind,
        pattern: &OrderCodePattern,
    ) -> Result<i64, ServiceError> {
        let mut pass = 1;
        loop {
            match self.increment_counter(contract_id, kind, pattern).await {
                Ok(value) => return Ok(value),
                Err(TransactionError::Transaction(err))
                    if pass < COUNTER_ALLOCATION_PASSES
                        && matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
                {
                    debug!(contract_id = %contract_id, %kind, "Counter row created concurrently; retrying");
                    pass += 1;
                }
                Err(TransactionError::Connection(err)) | Err(TransactionError::Transaction(err)) => {
                    return Err(ServiceError::DatabaseError(err))
                }
            }
        }
    }

    async fn insert_order(&self, record: NewOrderRecord) -> Result<(), ServiceError> {
        let code = record.code.into_string();
        maintenance_order::ActiveModel {
            id: Set(record.id),
            contract_id: Set(record.contract_id),
            kind: Set(record.kind),
            code: Set(code.clone()),
            asset_id: Set(record.asset_id),
            created_at: Set(Utc::now()),
        }
        .insert(self.get_db())
        .await
        .map(|_| ())
        .map_err(|e| ServiceError::from_insert(e, &code))
    }
}
