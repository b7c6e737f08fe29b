// src/db/pg_tests.rs
//
// Propriedades que só o Postgres garante. Cada teste recebe um banco novo
// (DATABASE_URL aponta para o servidor): `cargo test -- --ignored`.

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{
        migrations::{self, COLUMN_REPAIRS},
        migrator::{Migrator, PgSchemaTarget},
        user_repo::NewUser,
        AuditRepository, EquipmentRepository, HistoryRepository, SettingsRepository, UserRepository,
    },
    models::{
        approval::ApprovalStatus,
        auth::{User, UserRole},
        equipment::EquipmentInput,
        history::ChangeType,
    },
    services::{
        auth::hash_password, equipment_service::EquipmentService, import_service::ImportService,
    },
};

async fn migrate(pool: &PgPool) -> User {
    let admin_hash = hash_password("admin-teste", 4).await.unwrap();
    Migrator::new(
        PgSchemaTarget::new(pool.clone()),
        COLUMN_REPAIRS,
        migrations::all(&admin_hash),
    )
    .fail_closed(true)
    .run()
    .await
    .unwrap();

    UserRepository::new(pool.clone())
        .find_by_username("admin")
        .await
        .unwrap()
        .unwrap()
}

async fn operator(pool: &PgPool) -> User {
    UserRepository::new(pool.clone())
        .create(
            pool,
            NewUser {
                username: "operador",
                real_name: "Operador",
                email: "operador@empresa.com",
                password_hash: "$2b$04$hash",
                role: UserRole::User,
                is_2fa_enabled: false,
                avatar_url: None,
            },
        )
        .await
        .unwrap()
}

fn equipment_service(pool: &PgPool) -> EquipmentService {
    EquipmentService::new(
        EquipmentRepository::new(pool.clone()),
        HistoryRepository::new(pool.clone()),
        AuditRepository::new(pool.clone()),
        pool.clone(),
    )
}

fn import_service(pool: &PgPool) -> ImportService {
    ImportService::new(
        EquipmentRepository::new(pool.clone()),
        HistoryRepository::new(pool.clone()),
        AuditRepository::new(pool.clone()),
        SettingsRepository::new(pool.clone()),
        pool.clone(),
    )
}

fn row(serial: &str, usuario: &str) -> EquipmentInput {
    EquipmentInput {
        equipamento: Some("Notebook".into()),
        serial: Some(serial.into()),
        usuario_atual: Some(usuario.into()),
        ..Default::default()
    }
}

#[sqlx::test(migrations = false)]
#[ignore = "requer Postgres (DATABASE_URL)"]
async fn listing_shows_only_approved_items(pool: PgPool) {
    let admin = migrate(&pool).await;
    let user = operator(&pool).await;
    let service = equipment_service(&pool);

    let pending = service.create(&user, row("P1", "Alice")).await.unwrap();
    let approved = service.create(&admin, row("A1", "Bob")).await.unwrap();
    assert_eq!(pending.approval_status, ApprovalStatus::PendingApproval);

    let ids: Vec<i32> = service.list().await.unwrap().iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![approved.id]);
}

#[sqlx::test(migrations = false)]
#[ignore = "requer Postgres (DATABASE_URL)"]
async fn deleting_equipment_removes_its_history(pool: PgPool) {
    let admin = migrate(&pool).await;
    let service = equipment_service(&pool);
    let history = HistoryRepository::new(pool.clone());

    let created = service.create(&admin, row("S1", "Alice")).await.unwrap();
    service
        .update(&admin, created.id, EquipmentInput {
            usuario_atual: Some("Bob".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(history.list_by_equipment(created.id).await.unwrap().len(), 2);

    service.delete(&admin, created.id).await.unwrap();
    assert!(history.list_all(&pool).await.unwrap().is_empty());
}

#[sqlx::test(migrations = false)]
#[ignore = "requer Postgres (DATABASE_URL)"]
async fn full_replacement_restarts_ids(pool: PgPool) {
    let admin = migrate(&pool).await;
    let service = equipment_service(&pool);
    for serial in ["X1", "X2", "X3"] {
        service.create(&admin, row(serial, "Alice")).await.unwrap();
    }

    import_service(&pool)
        .full_replacement(&admin, vec![row(" N1 ", "Alice"), row("N2", "Bob")])
        .await
        .unwrap();

    let rows = EquipmentRepository::new(pool.clone()).list_all(&pool).await.unwrap();
    let ids: Vec<i32> = rows.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(rows[0].serial.as_deref(), Some("N1"));
    assert!(HistoryRepository::new(pool.clone()).list_all(&pool).await.unwrap().is_empty());
}

#[sqlx::test(migrations = false)]
#[ignore = "requer Postgres (DATABASE_URL)"]
async fn duplicate_serial_or_asset_tag_is_a_database_error(pool: PgPool) {
    let admin = migrate(&pool).await;
    let service = equipment_service(&pool);

    let mut first = row("S1", "Alice");
    first.patrimonio = Some("PAT-1".into());
    service.create(&admin, first).await.unwrap();

    let same_serial = service.create(&admin, row("S1", "Bob")).await;
    assert!(matches!(same_serial, Err(AppError::DatabaseError(_))));

    let mut same_tag = row("S2", "Bob");
    same_tag.patrimonio = Some("PAT-1".into());
    let result = service.create(&admin, same_tag).await;
    assert!(matches!(result, Err(AppError::DatabaseError(_))));

    // Vários itens sem serial convivem
    for _ in 0..2 {
        let no_serial = EquipmentInput {
            equipamento: Some("Monitor".into()),
            ..Default::default()
        };
        service.create(&admin, no_serial).await.unwrap();
    }
}

#[sqlx::test(migrations = false)]
#[ignore = "requer Postgres (DATABASE_URL)"]
async fn periodic_merge_writes_one_history_row_per_change(pool: PgPool) {
    let admin = migrate(&pool).await;
    let importer = import_service(&pool);
    let history = HistoryRepository::new(pool.clone());

    let seeded = equipment_service(&pool)
        .create(&admin, row("S1", "Alice"))
        .await
        .unwrap();

    let response = importer
        .periodic_update(&admin, vec![row("S1", "Bob"), row("S2", "Carol")])
        .await
        .unwrap();
    assert_eq!(response.summary.updated, 1);
    assert_eq!(response.summary.created, 1);

    let updates = history.list_by_equipment(seeded.id).await.unwrap();
    let auto: Vec<_> = updates
        .iter()
        .filter(|h| h.change_type == ChangeType::UpdateAuto.as_str())
        .collect();
    assert_eq!(auto.len(), 1);
    assert_eq!(auto[0].from_value.as_deref(), Some("Alice"));
    assert_eq!(auto[0].to_value.as_deref(), Some("Bob"));

    let all = history.list_all(&pool).await.unwrap();
    let imported: Vec<_> = all
        .iter()
        .filter(|h| h.change_type == ChangeType::CreateImport.as_str())
        .collect();
    assert_eq!(imported.len(), 1);
    let total = all.len();

    // Mesmo lote de novo, e com o serial acolchoado: nada muda
    let rerun = importer
        .periodic_update(&admin, vec![row("S1", "Bob"), row(" S1 ", "Bob"), row("S2", "Carol")])
        .await
        .unwrap();
    assert_eq!(rerun.summary.unchanged, 3);
    assert_eq!(rerun.summary.updated + rerun.summary.created, 0);
    assert_eq!(history.list_all(&pool).await.unwrap().len(), total);

    let stored = EquipmentRepository::new(pool.clone()).list_all(&pool).await.unwrap();
    assert!(stored.iter().all(|e| e.serial.as_deref().is_some_and(|s| s == s.trim())));
}
