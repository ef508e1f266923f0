use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_facility_tables::Migration),
            Box::new(m20240101_000002_create_maintenance_order_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_facility_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_facility_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Contracts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Contracts::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Contracts::Acronym)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Contracts::Name).string().not_null())
                        .col(
                            ColumnDef::new(Contracts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Buildings::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Buildings::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Buildings::ContractId).uuid().not_null())
                        .col(ColumnDef::new(Buildings::Name).string().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_buildings_contract_id")
                                .from(Buildings::Table, Buildings::ContractId)
                                .to(Contracts::Table, Contracts::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Floors::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Floors::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Floors::BuildingId).uuid().not_null())
                        .col(ColumnDef::new(Floors::Name).string().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_floors_building_id")
                                .from(Floors::Table, Floors::BuildingId)
                                .to(Buildings::Table, Buildings::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Locations::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Locations::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Locations::FloorId).uuid().not_null())
                        .col(ColumnDef::new(Locations::Name).string().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_locations_floor_id")
                                .from(Locations::Table, Locations::FloorId)
                                .to(Floors::Table, Floors::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Assets::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Assets::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Assets::LocationId).uuid().not_null())
                        .col(ColumnDef::new(Assets::Name).string().not_null())
                        .col(ColumnDef::new(Assets::Tag).string().not_null())
                        .col(
                            ColumnDef::new(Assets::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_assets_location_id")
                                .from(Assets::Table, Assets::LocationId)
                                .to(Locations::Table, Locations::Id),
                        )
                        .to_owned(),
                )
                .await?;

            // Arbiter for concurrent tag allocation
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_assets_tag_unique")
                        .table(Assets::Table)
                        .col(Assets::Tag)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_assets_location_id")
                        .table(Assets::Table)
                        .col(Assets::LocationId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Assets::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Locations::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Floors::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Buildings::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Contracts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Contracts {
        Table,
        Id,
        Acronym,
        Name,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Buildings {
        Table,
        Id,
        ContractId,
        Name,
    }

    #[derive(DeriveIden)]
    enum Floors {
        Table,
        Id,
        BuildingId,
        Name,
    }

    #[derive(DeriveIden)]
    enum Locations {
        Table,
        Id,
        FloorId,
        Name,
    }

    #[derive(DeriveIden)]
    enum Assets {
        Table,
        Id,
        LocationId,
        Name,
        Tag,
        CreatedAt,
    }
}

mod m20240101_000002_create_maintenance_order_tables {

    use super::m20240101_000001_create_facility_tables::Contracts;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_maintenance_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(MaintenanceOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MaintenanceOrders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MaintenanceOrders::ContractId).uuid().not_null())
                        .col(ColumnDef::new(MaintenanceOrders::Kind).string().not_null())
                        .col(ColumnDef::new(MaintenanceOrders::Code).string().not_null())
                        .col(ColumnDef::new(MaintenanceOrders::AssetId).uuid().null())
                        .col(
                            ColumnDef::new(MaintenanceOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_maintenance_orders_contract_id")
                                .from(MaintenanceOrders::Table, MaintenanceOrders::ContractId)
                                .to(Contracts::Table, Contracts::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_maintenance_orders_code_unique")
                        .table(MaintenanceOrders::Table)
                        .col(MaintenanceOrders::Code)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_maintenance_orders_contract_kind")
                        .table(MaintenanceOrders::Table)
                        .col(MaintenanceOrders::ContractId)
                        .col(MaintenanceOrders::Kind)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderCounters::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderCounters::ScopeKey)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderCounters::ContractId).uuid().not_null())
                        .col(ColumnDef::new(OrderCounters::Kind).string().not_null())
                        .col(
                            ColumnDef::new(OrderCounters::Value)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(OrderCounters::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderCounters::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(MaintenanceOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum MaintenanceOrders {
        Table,
        Id,
        ContractId,
        Kind,
        Code,
        AssetId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum OrderCounters {
        Table,
        ScopeKey,
        ContractId,
        Kind,
        Value,
        UpdatedAt,
    }
}
