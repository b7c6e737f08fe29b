// src/db/migrator.rs

use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::migrations::{ColumnRepair, Migration},
};

/// Operações de esquema que o migrador precisa. Separado do pool para
/// permitir testar a ordem e a idempotência sem banco.
#[async_trait]
pub trait SchemaTarget: Send + Sync {
    async fn ensure_ledger(&self) -> Result<(), AppError>;
    async fn applied_ids(&self) -> Result<BTreeSet<i32>, AppError>;
    async fn table_exists(&self, table: &str) -> Result<bool, AppError>;
    async fn column_exists(&self, table: &str, column: &str) -> Result<bool, AppError>;
    async fn add_column(&self, repair: &ColumnRepair) -> Result<(), AppError>;
    /// Executa o corpo (multi-statement) e registra o id, na mesma transação.
    async fn apply(&self, migration: &Migration) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgSchemaTarget {
    pool: PgPool,
}

impl PgSchemaTarget {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SchemaTarget for PgSchemaTarget {
    async fn ensure_ledger(&self) -> Result<(), AppError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS migrations (
                id INT PRIMARY KEY,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn applied_ids(&self) -> Result<BTreeSet<i32>, AppError> {
        let ids: Vec<i32> = sqlx::query_scalar("SELECT id FROM migrations")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().collect())
    }

    async fn table_exists(&self, table: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = current_schema() AND table_name = $1
            )",
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn column_exists(&self, table: &str, column: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                SELECT 1 FROM information_schema.columns
                WHERE table_schema = current_schema() AND table_name = $1 AND column_name = $2
            )",
        )
        .bind(table)
        .bind(column)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn add_column(&self, repair: &ColumnRepair) -> Result<(), AppError> {
        // Nomes vêm da lista fixa de reparos, nunca de entrada externa.
        let sql = format!(
            "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} {}",
            repair.table, repair.column, repair.definition
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    async fn apply(&self, migration: &Migration) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let conn: &mut sqlx::PgConnection = &mut tx;
        sqlx::Executor::execute(&mut *conn, sqlx::raw_sql(&migration.sql)).await?;
        sqlx::query("INSERT INTO migrations (id) VALUES ($1)")
            .bind(migration.id)
            .execute(&mut *conn)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Resultado de uma execução completa (reparo + ledger).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub repaired: Vec<String>,
    pub applied: Vec<i32>,
    pub failed: Vec<i32>,
    pub repair_failures: Vec<String>,
}

pub struct Migrator<T: SchemaTarget> {
    target: T,
    repairs: Vec<ColumnRepair>,
    migrations: Vec<Migration>,
    fail_closed: bool,
}

impl<T: SchemaTarget> Migrator<T> {
    pub fn new(target: T, repairs: &[ColumnRepair], mut migrations: Vec<Migration>) -> Self {
        migrations.sort_by_key(|m| m.id);
        Self {
            target,
            repairs: repairs.to_vec(),
            migrations,
            fail_closed: false,
        }
    }

    /// Interrompe no primeiro passo com erro em vez de seguir adiante.
    pub fn fail_closed(mut self, fail_closed: bool) -> Self {
        self.fail_closed = fail_closed;
        self
    }

    pub async fn run(&self) -> Result<MigrationReport, AppError> {
        let mut report = MigrationReport::default();

        tracing::info!("Verificando esquema crítico (auto-reparo)...");
        self.repair_pass(&mut report).await?;

        tracing::info!("Verificando migrações do banco de dados...");
        self.ledger_pass(&mut report).await?;

        tracing::info!(
            "Migrações concluídas: {} aplicadas, {} falharam, {} colunas reparadas.",
            report.applied.len(),
            report.failed.len(),
            report.repaired.len()
        );
        Ok(report)
    }

    async fn repair_pass(&self, report: &mut MigrationReport) -> Result<(), AppError> {
        for repair in &self.repairs {
            let label = format!("{}.{}", repair.table, repair.column);
            match self.repair_column(repair).await {
                Ok(true) => {
                    tracing::info!("Auto-reparo: coluna {} adicionada.", label);
                    report.repaired.push(label);
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!("Auto-reparo falhou para {}: {}", label, e);
                    if self.fail_closed {
                        return Err(e);
                    }
                    report.repair_failures.push(label);
                }
            }
        }
        Ok(())
    }

    // Ok(true) quando a coluna foi adicionada.
    async fn repair_column(&self, repair: &ColumnRepair) -> Result<bool, AppError> {
        if !self.target.table_exists(repair.table).await? {
            return Ok(false);
        }
        if self.target.column_exists(repair.table, repair.column).await? {
            return Ok(false);
        }
        self.target.add_column(repair).await?;
        Ok(true)
    }

    async fn ledger_pass(&self, report: &mut MigrationReport) -> Result<(), AppError> {
        // Sem ledger não há como saber o que já rodou: este erro sempre propaga.
        self.target.ensure_ledger().await?;
        let applied = self.target.applied_ids().await?;

        for migration in self.migrations.iter().filter(|m| !applied.contains(&m.id)) {
            tracing::info!("Executando migração {} ({})...", migration.id, migration.description);
            match self.target.apply(migration).await {
                Ok(()) => {
                    tracing::info!("Migração {} concluída.", migration.id);
                    report.applied.push(migration.id);
                }
                Err(e) => {
                    tracing::error!("Migração {} falhou: {}", migration.id, e);
                    if self.fail_closed {
                        return Err(e);
                    }
                    report.failed.push(migration.id);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::{
        collections::{HashMap, HashSet},
        sync::Mutex,
    };

    // Banco em memória: tabelas/colunas existentes + ledger + log de escritas.
    #[derive(Default)]
    struct FakeSchema {
        columns: Mutex<HashMap<String, HashSet<String>>>,
        ledger: Mutex<BTreeSet<i32>>,
        failing: HashSet<i32>,
        alters: Mutex<Vec<String>>,
        executed: Mutex<Vec<i32>>,
    }

    impl FakeSchema {
        fn with_table(self, table: &str, columns: &[&str]) -> Self {
            self.columns.lock().unwrap().insert(
                table.to_string(),
                columns.iter().map(|c| c.to_string()).collect(),
            );
            self
        }

        fn failing_on(mut self, id: i32) -> Self {
            self.failing.insert(id);
            self
        }
    }

    #[async_trait]
    impl<'a> SchemaTarget for &'a FakeSchema {
        async fn ensure_ledger(&self) -> Result<(), AppError> {
            Ok(())
        }

        async fn applied_ids(&self) -> Result<BTreeSet<i32>, AppError> {
            Ok(self.ledger.lock().unwrap().clone())
        }

        async fn table_exists(&self, table: &str) -> Result<bool, AppError> {
            Ok(self.columns.lock().unwrap().contains_key(table))
        }

        async fn column_exists(&self, table: &str, column: &str) -> Result<bool, AppError> {
            Ok(self
                .columns
                .lock()
                .unwrap()
                .get(table)
                .is_some_and(|cols| cols.contains(column)))
        }

        async fn add_column(&self, repair: &ColumnRepair) -> Result<(), AppError> {
            if repair.column == "quebrada" {
                return Err(AppError::BadRequest("coluna inválida".into()));
            }
            self.alters
                .lock()
                .unwrap()
                .push(format!("{}.{}", repair.table, repair.column));
            self.columns
                .lock()
                .unwrap()
                .entry(repair.table.to_string())
                .or_default()
                .insert(repair.column.to_string());
            Ok(())
        }

        async fn apply(&self, migration: &Migration) -> Result<(), AppError> {
            self.executed.lock().unwrap().push(migration.id);
            if self.failing.contains(&migration.id) {
                return Err(AppError::BadRequest(format!("falha na {}", migration.id)));
            }
            self.ledger.lock().unwrap().insert(migration.id);
            Ok(())
        }
    }

    const REPAIRS: &[ColumnRepair] = &[
        ColumnRepair { table: "equipment", column: "brand", definition: "VARCHAR(255)" },
        ColumnRepair { table: "equipment", column: "model", definition: "VARCHAR(255)" },
        ColumnRepair { table: "users", column: "avatar_url", definition: "TEXT" },
    ];

    fn migrations() -> Vec<Migration> {
        vec![
            Migration { id: 3, description: "c", sql: "SELECT 3".into() },
            Migration { id: 1, description: "a", sql: "SELECT 1".into() },
            Migration { id: 2, description: "b", sql: "SELECT 2".into() },
        ]
    }

    #[tokio::test]
    async fn applies_pending_migrations_in_ascending_order() {
        let fake = FakeSchema::default();
        let report = Migrator::new(&fake, &[], migrations()).run().await.unwrap();

        assert_eq!(report.applied, vec![1, 2, 3]);
        assert_eq!(*fake.executed.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn skips_ids_already_in_the_ledger() {
        let fake = FakeSchema::default();
        fake.ledger.lock().unwrap().extend([1, 2]);

        let report = Migrator::new(&fake, &[], migrations()).run().await.unwrap();

        assert_eq!(report.applied, vec![3]);
    }

    #[tokio::test]
    async fn failed_migration_does_not_block_the_next_ones() {
        let fake = FakeSchema::default().failing_on(2);

        let report = Migrator::new(&fake, &[], migrations()).run().await.unwrap();

        assert_eq!(report.applied, vec![1, 3]);
        assert_eq!(report.failed, vec![2]);
        assert!(!fake.ledger.lock().unwrap().contains(&2));
    }

    #[tokio::test]
    async fn fail_closed_stops_at_the_first_error() {
        let fake = FakeSchema::default().failing_on(2);

        let result = Migrator::new(&fake, &[], migrations())
            .fail_closed(true)
            .run()
            .await;

        assert!(result.is_err());
        assert_eq!(*fake.executed.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn repair_adds_only_missing_columns_of_existing_tables() {
        let fake = FakeSchema::default().with_table("equipment", &["id", "brand"]);

        let report = Migrator::new(&fake, REPAIRS, Vec::new()).run().await.unwrap();

        // users não existe: nada a reparar
        assert_eq!(report.repaired, vec!["equipment.model".to_string()]);
        assert_eq!(*fake.alters.lock().unwrap(), vec!["equipment.model".to_string()]);
    }

    #[tokio::test]
    async fn repair_failure_is_logged_and_skipped() {
        let repairs = [
            ColumnRepair { table: "equipment", column: "quebrada", definition: "???" },
            ColumnRepair { table: "equipment", column: "model", definition: "VARCHAR(255)" },
        ];
        let fake = FakeSchema::default().with_table("equipment", &["id"]);

        let report = Migrator::new(&fake, &repairs, Vec::new()).run().await.unwrap();

        assert_eq!(report.repair_failures, vec!["equipment.quebrada".to_string()]);
        assert_eq!(report.repaired, vec!["equipment.model".to_string()]);
    }

    #[tokio::test]
    async fn second_run_is_a_no_op() {
        let fake = FakeSchema::default()
            .with_table("equipment", &["id"])
            .with_table("users", &["id"]);

        Migrator::new(&fake, REPAIRS, migrations()).run().await.unwrap();
        let alters_after_first = fake.alters.lock().unwrap().len();

        let report = Migrator::new(&fake, REPAIRS, migrations()).run().await.unwrap();

        assert_eq!(report, MigrationReport::default());
        assert_eq!(fake.alters.lock().unwrap().len(), alters_after_first);
        assert_eq!(fake.ledger.lock().unwrap().len(), 3);
    }
}
