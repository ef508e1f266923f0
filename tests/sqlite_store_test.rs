use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::Utc;
use facility_codes::config::IdentifierConfig;
use facility_codes::db;
use facility_codes::entities::{building, contract, floor, location, maintenance_order};
use facility_codes::errors::ServiceError;
use facility_codes::orders::{OrderCodeFormat, OrderKind};
use facility_codes::repositories::{AssetStore, NewAssetRecord, OrderStore, SeaOrmStore};
use facility_codes::services::{AssetTagService, OpenOrderRequest, OrderNumberService, RegisterAssetRequest};
use facility_codes::tags::generate_tag;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use uuid::Uuid;

async fn setup_store() -> (Arc<DatabaseConnection>, SeaOrmStore) {
    let pool = db::establish_connection("sqlite::memory:")
        .await
        .expect("db connect");
    db::run_migrations(&pool).await.expect("migrations");
    let db = Arc::new(pool);
    (db.clone(), SeaOrmStore::new(db))
}

async fn seed_contract(db: &DatabaseConnection, acronym: &str) -> Uuid {
    let id = Uuid::new_v4();
    contract::ActiveModel {
        id: Set(id),
        acronym: Set(acronym.to_string()),
        name: Set(format!("Contrato {acronym}")),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert contract");
    id
}

/// Seeds contract -> building -> floor -> location and returns the location id.
async fn seed_location(
    db: &DatabaseConnection,
    contract_id: Uuid,
    floor_name: &str,
    location_name: &str,
) -> Uuid {
    let building_id = Uuid::new_v4();
    building::ActiveModel {
        id: Set(building_id),
        contract_id: Set(contract_id),
        name: Set("Bloco A".into()),
    }
    .insert(db)
    .await
    .expect("insert building");

    let floor_id = Uuid::new_v4();
    floor::ActiveModel {
        id: Set(floor_id),
        building_id: Set(building_id),
        name: Set(floor_name.to_string()),
    }
    .insert(db)
    .await
    .expect("insert floor");

    let location_id = Uuid::new_v4();
    location::ActiveModel {
        id: Set(location_id),
        floor_id: Set(floor_id),
        name: Set(location_name.to_string()),
    }
    .insert(db)
    .await
    .expect("insert location");
    location_id
}

#[tokio::test]
async fn resolves_placement_through_floor() {
    let (db, store) = setup_store().await;
    let contract_id = seed_contract(&db, "ACME").await;
    let location_id = seed_location(&db, contract_id, "Subsolo 1", "Garagem").await;

    let placement = store
        .resolve_location(location_id)
        .await
        .unwrap()
        .expect("placement");
    assert_eq!(placement.floor_name, "Subsolo 1");
    assert_eq!(placement.location_name, "Garagem");

    assert!(store.resolve_location(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn unique_tag_constraint_reports_duplicate() {
    let (db, store) = setup_store().await;
    let contract_id = seed_contract(&db, "ACME").await;
    let location_id = seed_location(&db, contract_id, "Térreo", "Recepção").await;
    let tag = generate_tag("Split Recepção", "Térreo", "Recepção", 0);

    let record = NewAssetRecord {
        id: Uuid::new_v4(),
        location_id,
        name: "Split Recepção".into(),
        tag: tag.clone(),
    };
    store.insert_asset(record.clone()).await.expect("first insert");

    let err = store
        .insert_asset(NewAssetRecord {
            id: Uuid::new_v4(),
            ..record
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::DuplicateIdentifier { ref identifier } if identifier == tag.as_str());
    assert_eq!(store.count_tags_with_prefix("ACS-").await.unwrap(), 1);
}

#[tokio::test]
async fn asset_service_numbers_tags_per_prefix() {
    let (db, store) = setup_store().await;
    let contract_id = seed_contract(&db, "ACME").await;
    let location_id = seed_location(&db, contract_id, "2º Andar", "Sala Técnica").await;
    let service = AssetTagService::from_config(Arc::new(store), &IdentifierConfig::default());

    let mut tags = vec![];
    for name in ["Quadro elétrico", "Nobreak 10kVA", "Painel de automação"] {
        let registered = service
            .register_asset(RegisterAssetRequest {
                location_id,
                name: name.into(),
            })
            .await
            .expect("register");
        tags.push(registered.tag.into_string());
    }

    assert_eq!(
        tags,
        vec![
            "QDR-2-SALA-TECNICA-0001",
            "UPS-2-SALA-TECNICA-0001",
            "QDR-2-SALA-TECNICA-0002",
        ]
    );
}

#[tokio::test]
async fn counter_seeds_from_legacy_orders() {
    let (db, store) = setup_store().await;
    let contract_id = seed_contract(&db, "ACME").await;
    maintenance_order::ActiveModel {
        id: Set(Uuid::new_v4()),
        contract_id: Set(contract_id),
        kind: Set(OrderKind::Preventive),
        code: Set("OMP-ACME-00057".into()),
        asset_id: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(db.as_ref())
    .await
    .expect("insert legacy order");

    let format = OrderCodeFormat::default();
    let preventive = format.pattern("ACME", OrderKind::Preventive).unwrap();
    let corrective = format.pattern("ACME", OrderKind::Corrective).unwrap();

    assert_eq!(
        store
            .max_order_number(contract_id, OrderKind::Preventive, &preventive)
            .await
            .unwrap(),
        Some(57)
    );
    assert_eq!(
        store
            .next_sequence_value(contract_id, OrderKind::Preventive, &preventive)
            .await
            .unwrap(),
        58
    );
    assert_eq!(
        store
            .next_sequence_value(contract_id, OrderKind::Preventive, &preventive)
            .await
            .unwrap(),
        59
    );
    assert_eq!(
        store
            .next_sequence_value(contract_id, OrderKind::Corrective, &corrective)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn order_service_persists_codes() {
    let (db, store) = setup_store().await;
    seed_contract(&db, "HOSP").await;
    let service = OrderNumberService::from_config(Arc::new(store.clone()), &IdentifierConfig::default());

    let opened = service
        .open_order(OpenOrderRequest {
            contract_acronym: "HOSP".into(),
            kind: OrderKind::Corrective,
            asset_id: None,
        })
        .await
        .expect("open order");
    assert_eq!(opened.code.as_str(), "OMC-HOSP-00001");
    let corrective = service.format().pattern("HOSP", OrderKind::Corrective).unwrap();
    assert_eq!(
        store
            .max_order_number(opened.contract_id, OrderKind::Corrective, &corrective)
            .await
            .unwrap(),
        Some(1)
    );

    let err = service
        .open_order(OpenOrderRequest {
            contract_acronym: "NONE".into(),
            kind: OrderKind::Corrective,
            asset_id: None,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn counter_seed_reads_numbers_through_the_template() {
    let (db, store) = setup_store().await;
    let contract_id = seed_contract(&db, "TRT2").await;
    maintenance_order::ActiveModel {
        id: Set(Uuid::new_v4()),
        contract_id: Set(contract_id),
        kind: Set(OrderKind::Preventive),
        code: Set("00120-TRT2-OMP".into()),
        asset_id: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(db.as_ref())
    .await
    .expect("insert legacy order");

    let config = IdentifierConfig {
        order_code_template: "{number}-{acronym}-{marker}".into(),
        ..IdentifierConfig::default()
    };
    let service = OrderNumberService::from_config(Arc::new(store), &config);
    let opened = service
        .open_order(OpenOrderRequest {
            contract_acronym: "TRT2".into(),
            kind: OrderKind::Preventive,
            asset_id: None,
        })
        .await
        .expect("open order");

    assert_eq!(opened.number, 121);
    assert_eq!(opened.code.as_str(), "00121-TRT2-OMP");
}
