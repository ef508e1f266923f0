use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contracts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub acronym: String,
    pub name: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::building::Entity")]
    Buildings,
    #[sea_orm(has_many = "super::maintenance_order::Entity")]
    MaintenanceOrders,
}

impl Related<super::building::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Buildings.def()
    }
}

impl Related<super::maintenance_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MaintenanceOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
