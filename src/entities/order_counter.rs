use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::orders::OrderKind;

/// Last order number issued per contract and kind. Incremented in place so
/// allocation is a single atomic update instead of a scan of existing codes.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_counters")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub scope_key: String,
    pub contract_id: Uuid,
    pub kind: OrderKind,
    pub value: i64,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Counter row key for one contract and order kind.
pub fn scope_key(contract_id: Uuid, kind: OrderKind) -> String {
    format!("{contract_id}:{kind}")
}
