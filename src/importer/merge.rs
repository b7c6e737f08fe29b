// src/importer/merge.rs

use crate::{
    common::db_utils::ColumnValue,
    models::equipment::{Equipment, EquipmentColumn, EquipmentInput},
};

/// Alteração de um único campo, já com os textos para o histórico.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub column: EquipmentColumn,
    pub value: ColumnValue,
    pub from_value: String,
    pub to_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergePlan {
    /// Serial novo: insere a linha inteira.
    Insert,
    /// Serial existente com pelo menos um campo diferente.
    Update {
        equipment_id: i32,
        changes: Vec<FieldChange>,
    },
    /// Nada mudou: nenhuma escrita, nenhum histórico.
    Unchanged,
}

/// Compara a linha recebida com a atual (como texto), campo a campo.
/// Só entram no plano os campos presentes na entrada e diferentes do atual.
pub fn plan_merge(current: Option<&Equipment>, incoming: &EquipmentInput) -> MergePlan {
    let Some(current) = current else {
        return MergePlan::Insert;
    };

    let changes: Vec<FieldChange> = incoming
        .columns()
        .into_iter()
        .filter_map(|(column, value)| {
            let to_value = value.as_text();
            let from_value = current.text_of(column);
            if from_value.as_deref() == Some(to_value.as_str()) {
                return None;
            }
            Some(FieldChange {
                column,
                value,
                from_value: from_value.unwrap_or_default(),
                to_value,
            })
        })
        .collect();

    if changes.is_empty() {
        MergePlan::Unchanged
    } else {
        MergePlan::Update {
            equipment_id: current.id,
            changes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{approval::ApprovalStatus, equipment::EquipmentStatus};
    use pretty_assertions::assert_eq;

    fn stored(serial: &str, usuario: Option<&str>) -> Equipment {
        let mut row: Equipment = serde_json::from_value(serde_json::json!({
            "id": 10,
            "equipamento": "Notebook",
            "approvalStatus": "approved"
        }))
        .unwrap();
        row.serial = Some(serial.to_string());
        row.usuario_atual = usuario.map(str::to_string);
        row
    }

    fn incoming(serial: &str, usuario: Option<&str>) -> EquipmentInput {
        EquipmentInput {
            serial: Some(serial.to_string()),
            usuario_atual: usuario.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn unknown_serial_is_an_insert() {
        assert_eq!(plan_merge(None, &incoming("S9", Some("Alice"))), MergePlan::Insert);
    }

    #[test]
    fn changed_field_produces_exactly_one_change() {
        let current = stored("S1", Some("Alice"));
        let plan = plan_merge(Some(&current), &incoming("S1", Some("Bob")));

        assert_eq!(
            plan,
            MergePlan::Update {
                equipment_id: 10,
                changes: vec![FieldChange {
                    column: EquipmentColumn::UsuarioAtual,
                    value: ColumnValue::Text("Bob".into()),
                    from_value: "Alice".into(),
                    to_value: "Bob".into(),
                }],
            }
        );
    }

    #[test]
    fn identical_row_is_unchanged() {
        let current = stored("S1", Some("Alice"));
        assert_eq!(
            plan_merge(Some(&current), &incoming("S1", Some("Alice"))),
            MergePlan::Unchanged
        );
    }

    #[test]
    fn padded_serial_is_unchanged_once_normalized() {
        let current = stored("S1", Some("Alice"));
        let mut row = incoming(" S1 ", Some("Alice"));

        // Sem normalizar, o próprio serial apareceria como mudança
        let MergePlan::Update { changes, .. } = plan_merge(Some(&current), &row) else {
            panic!("esperava Update");
        };
        assert_eq!(changes[0].column, EquipmentColumn::Serial);

        row.normalize_serial();
        assert_eq!(plan_merge(Some(&current), &row), MergePlan::Unchanged);
    }

    #[test]
    fn absent_fields_are_never_compared() {
        let current = stored("S1", Some("Alice"));
        assert_eq!(plan_merge(Some(&current), &incoming("S1", None)), MergePlan::Unchanged);
    }

    #[test]
    fn empty_current_value_is_recorded_as_empty_text() {
        let current = stored("S1", None);
        let MergePlan::Update { changes, .. } =
            plan_merge(Some(&current), &incoming("S1", Some("Carol")))
        else {
            panic!("esperava Update");
        };
        assert_eq!(changes[0].from_value, "");
        assert_eq!(changes[0].to_value, "Carol");
    }

    #[test]
    fn enum_fields_compare_by_label() {
        let mut current = stored("S1", None);
        current.status = Some(EquipmentStatus::InUse);
        current.approval_status = ApprovalStatus::Approved;

        let mut same = incoming("S1", None);
        same.status = Some(EquipmentStatus::InUse);
        assert_eq!(plan_merge(Some(&current), &same), MergePlan::Unchanged);

        let mut other = incoming("S1", None);
        other.status = Some(EquipmentStatus::Maintenance);
        let MergePlan::Update { changes, .. } = plan_merge(Some(&current), &other) else {
            panic!("esperava Update");
        };
        assert_eq!(changes[0].from_value, "Em Uso");
        assert_eq!(changes[0].to_value, "Manutenção");
    }

    #[test]
    fn second_pass_over_same_data_is_idempotent() {
        let mut current = stored("S1", Some("Alice"));
        let row = incoming("S1", Some("Bob"));

        if let MergePlan::Update { changes, .. } = plan_merge(Some(&current), &row) {
            for change in changes {
                assert_eq!(change.column, EquipmentColumn::UsuarioAtual);
                current.usuario_atual = Some(change.to_value);
            }
        }
        assert_eq!(plan_merge(Some(&current), &row), MergePlan::Unchanged);
    }
}
