// src/common/db_utils.rs

use sqlx::{Executor, Postgres, QueryBuilder};

use crate::{
    common::error::AppError,
    models::{
        approval::ApprovalStatus,
        equipment::{EquipmentStatus, TermCondition},
    },
};

// ---
// Colunas permitidas
// ---
// Os INSERT/UPDATE dinâmicos só aceitam colunas de um enum fechado por entidade.
// O nome que vai para o SQL vem sempre do enum, nunca do payload.
pub trait Column: Copy + std::fmt::Debug {
    fn name(self) -> &'static str;
}

/// Valor tipado de uma coluna, pronto para `push_bind`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnValue {
    Text(String),
    Status(EquipmentStatus),
    Term(TermCondition),
}

impl ColumnValue {
    /// Representação textual usada na comparação do merge e no histórico.
    pub fn as_text(&self) -> String {
        match self {
            ColumnValue::Text(text) => text.clone(),
            ColumnValue::Status(status) => status.as_str().to_string(),
            ColumnValue::Term(term) => term.as_str().to_string(),
        }
    }
}

/// Metadados de linha que o servidor controla (nunca vêm do payload).
#[derive(Debug, Clone)]
pub struct RowMeta {
    /// Só é preenchido na restauração de backup.
    pub id: Option<i32>,
    pub approval_status: ApprovalStatus,
    pub rejection_reason: Option<String>,
    pub created_by_id: Option<i32>,
}

impl RowMeta {
    pub fn new(approval_status: ApprovalStatus, created_by_id: Option<i32>) -> Self {
        Self {
            id: None,
            approval_status,
            rejection_reason: None,
            created_by_id,
        }
    }
}

fn push_value(builder: &mut QueryBuilder<'_, Postgres>, value: ColumnValue) {
    match value {
        ColumnValue::Text(text) => {
            builder.push_bind(text);
        }
        ColumnValue::Status(status) => {
            builder.push_bind(status);
        }
        ColumnValue::Term(term) => {
            builder.push_bind(term);
        }
    }
}

/// Monta `INSERT INTO <table> (...) VALUES (...) RETURNING *`.
pub fn build_insert<C: Column>(
    table: &'static str,
    columns: Vec<(C, ColumnValue)>,
    meta: RowMeta,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("INSERT INTO ");
    builder.push(table).push(" (");

    if meta.id.is_some() {
        builder.push("id, ");
    }
    for (column, _) in &columns {
        builder.push(column.name()).push(", ");
    }
    builder.push("approval_status, rejection_reason, created_by_id) VALUES (");

    if let Some(id) = meta.id {
        builder.push_bind(id).push(", ");
    }
    for (_, value) in columns {
        push_value(&mut builder, value);
        builder.push(", ");
    }
    builder
        .push_bind(meta.approval_status)
        .push(", ")
        .push_bind(meta.rejection_reason)
        .push(", ")
        .push_bind(meta.created_by_id)
        .push(") RETURNING *");

    builder
}

/// Monta `UPDATE <table> SET ... WHERE id = $n RETURNING *`.
/// Retorna `None` quando não há o que atualizar.
pub fn build_update<C: Column>(
    table: &'static str,
    id: i32,
    columns: Vec<(C, ColumnValue)>,
) -> Option<QueryBuilder<'static, Postgres>> {
    if columns.is_empty() {
        return None;
    }

    let mut builder = QueryBuilder::new("UPDATE ");
    builder.push(table).push(" SET ");

    for (index, (column, value)) in columns.into_iter().enumerate() {
        if index > 0 {
            builder.push(", ");
        }
        builder.push(column.name()).push(" = ");
        push_value(&mut builder, value);
    }

    builder.push(" WHERE id = ").push_bind(id).push(" RETURNING *");
    Some(builder)
}

/// Reposiciona o contador de identidade no maior id existente (+1).
pub async fn reseed_identity<'e, E>(executor: E, table: &'static str) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        "SELECT setval(pg_get_serial_sequence('{table}', 'id'), \
         COALESCE((SELECT MAX(id) FROM {table}), 0) + 1, false)"
    );
    sqlx::query(&sql).execute(executor).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::equipment::EquipmentColumn;
    use pretty_assertions::assert_eq;

    #[test]
    fn insert_lists_only_the_given_columns() {
        let builder = build_insert(
            "equipment",
            vec![
                (EquipmentColumn::Equipamento, ColumnValue::Text("Notebook".into())),
                (EquipmentColumn::Serial, ColumnValue::Text("S1".into())),
                (EquipmentColumn::Status, ColumnValue::Status(EquipmentStatus::InUse)),
            ],
            RowMeta::new(ApprovalStatus::Approved, Some(7)),
        );

        assert_eq!(
            builder.sql(),
            "INSERT INTO equipment (equipamento, serial, status, approval_status, rejection_reason, created_by_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *"
        );
    }

    #[test]
    fn insert_with_explicit_id_for_restores() {
        let mut meta = RowMeta::new(ApprovalStatus::Rejected, None);
        meta.id = Some(42);
        let builder = build_insert(
            "equipment",
            vec![(EquipmentColumn::Equipamento, ColumnValue::Text("Monitor".into()))],
            meta,
        );

        assert_eq!(
            builder.sql(),
            "INSERT INTO equipment (id, equipamento, approval_status, rejection_reason, created_by_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *"
        );
    }

    #[test]
    fn update_sets_each_column_and_filters_by_id() {
        let builder = build_update(
            "equipment",
            3,
            vec![
                (EquipmentColumn::UsuarioAtual, ColumnValue::Text("Bob".into())),
                (EquipmentColumn::Setor, ColumnValue::Text("TI".into())),
            ],
        )
        .expect("há colunas para atualizar");

        assert_eq!(
            builder.sql(),
            "UPDATE equipment SET usuario_atual = $1, setor = $2 WHERE id = $3 RETURNING *"
        );
    }

    #[test]
    fn update_without_columns_is_skipped() {
        let columns: Vec<(EquipmentColumn, ColumnValue)> = Vec::new();
        assert!(build_update("equipment", 1, columns).is_none());
    }

    #[test]
    fn enum_values_render_as_their_labels() {
        assert_eq!(ColumnValue::Status(EquipmentStatus::Maintenance).as_text(), "Manutenção");
        assert_eq!(ColumnValue::Term(TermCondition::Pending).as_text(), "Pendente");
        assert_eq!(ColumnValue::Text("abc".into()).as_text(), "abc");
    }
}
