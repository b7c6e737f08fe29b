// src/models/license.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    common::db_utils::{Column, ColumnValue},
    models::approval::ApprovalStatus,
};

// --- Licença de software ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct License {
    pub id: i32,
    #[schema(example = "Microsoft Office 365")]
    pub produto: String,
    #[schema(example = "Assinatura")]
    pub tipo_licenca: Option<String>,
    pub chave_serial: String,
    pub data_expiracao: Option<String>,
    pub usuario: String,
    pub cargo: Option<String>,
    pub setor: Option<String>,
    pub gestor: Option<String>,
    pub centro_custo: Option<String>,
    pub conta_razao: Option<String>,
    pub nome_computador: Option<String>,
    pub numero_chamado: Option<String>,
    pub observacoes: Option<String>,
    pub empresa: Option<String>,
    pub approval_status: ApprovalStatus,
    pub rejection_reason: Option<String>,
    pub created_by_id: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LicenseColumn {
    Produto,
    TipoLicenca,
    ChaveSerial,
    DataExpiracao,
    Usuario,
    Cargo,
    Setor,
    Gestor,
    CentroCusto,
    ContaRazao,
    NomeComputador,
    NumeroChamado,
    Observacoes,
    Empresa,
}

impl LicenseColumn {
    pub const ALL: [LicenseColumn; 14] = [
        Self::Produto,
        Self::TipoLicenca,
        Self::ChaveSerial,
        Self::DataExpiracao,
        Self::Usuario,
        Self::Cargo,
        Self::Setor,
        Self::Gestor,
        Self::CentroCusto,
        Self::ContaRazao,
        Self::NomeComputador,
        Self::NumeroChamado,
        Self::Observacoes,
        Self::Empresa,
    ];
}

impl Column for LicenseColumn {
    fn name(self) -> &'static str {
        match self {
            Self::Produto => "produto",
            Self::TipoLicenca => "tipo_licenca",
            Self::ChaveSerial => "chave_serial",
            Self::DataExpiracao => "data_expiracao",
            Self::Usuario => "usuario",
            Self::Cargo => "cargo",
            Self::Setor => "setor",
            Self::Gestor => "gestor",
            Self::CentroCusto => "centro_custo",
            Self::ContaRazao => "conta_razao",
            Self::NomeComputador => "nome_computador",
            Self::NumeroChamado => "numero_chamado",
            Self::Observacoes => "observacoes",
            Self::Empresa => "empresa",
        }
    }
}

// ---
// Payload: LicenseInput
// ---
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LicenseInput {
    #[validate(length(max = 255, message = "Máximo de 255 caracteres."))]
    #[schema(example = "Microsoft Office 365")]
    pub produto: Option<String>,
    pub tipo_licenca: Option<String>,
    #[validate(length(max = 255, message = "Máximo de 255 caracteres."))]
    pub chave_serial: Option<String>,
    pub data_expiracao: Option<String>,
    #[validate(length(max = 255, message = "Máximo de 255 caracteres."))]
    pub usuario: Option<String>,
    pub cargo: Option<String>,
    pub setor: Option<String>,
    pub gestor: Option<String>,
    pub centro_custo: Option<String>,
    pub conta_razao: Option<String>,
    pub nome_computador: Option<String>,
    pub numero_chamado: Option<String>,
    pub observacoes: Option<String>,
    pub empresa: Option<String>,
}

impl LicenseInput {
    fn value_of(&self, column: LicenseColumn) -> Option<&String> {
        use LicenseColumn as C;
        match column {
            C::Produto => self.produto.as_ref(),
            C::TipoLicenca => self.tipo_licenca.as_ref(),
            C::ChaveSerial => self.chave_serial.as_ref(),
            C::DataExpiracao => self.data_expiracao.as_ref(),
            C::Usuario => self.usuario.as_ref(),
            C::Cargo => self.cargo.as_ref(),
            C::Setor => self.setor.as_ref(),
            C::Gestor => self.gestor.as_ref(),
            C::CentroCusto => self.centro_custo.as_ref(),
            C::ContaRazao => self.conta_razao.as_ref(),
            C::NomeComputador => self.nome_computador.as_ref(),
            C::NumeroChamado => self.numero_chamado.as_ref(),
            C::Observacoes => self.observacoes.as_ref(),
            C::Empresa => self.empresa.as_ref(),
        }
    }

    pub fn columns(&self) -> Vec<(LicenseColumn, ColumnValue)> {
        LicenseColumn::ALL
            .iter()
            .filter_map(|&column| {
                self.value_of(column)
                    .map(|value| (column, ColumnValue::Text(value.clone())))
            })
            .collect()
    }

    // produto, chaveSerial e usuario são NOT NULL na tabela.
    pub fn validate_for_create(&self) -> Result<(), ValidationErrors> {
        self.validate()?;

        let mut errors = ValidationErrors::new();
        let required = [
            ("produto", &self.produto, "O campo 'produto' é obrigatório."),
            ("chaveSerial", &self.chave_serial, "O campo 'chaveSerial' é obrigatório."),
            ("usuario", &self.usuario, "O campo 'usuario' é obrigatório."),
        ];
        for (field, value, message) in required {
            if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
                let mut error = ValidationError::new("required");
                error.message = Some(message.into());
                errors.add(field, error);
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl From<&License> for LicenseInput {
    fn from(row: &License) -> Self {
        Self {
            produto: Some(row.produto.clone()),
            tipo_licenca: row.tipo_licenca.clone(),
            chave_serial: Some(row.chave_serial.clone()),
            data_expiracao: row.data_expiracao.clone(),
            usuario: Some(row.usuario.clone()),
            cargo: row.cargo.clone(),
            setor: row.setor.clone(),
            gestor: row.gestor.clone(),
            centro_custo: row.centro_custo.clone(),
            conta_razao: row.conta_razao.clone(),
            nome_computador: row.nome_computador.clone(),
            numero_chamado: row.numero_chamado.clone(),
            observacoes: row.observacoes.clone(),
            empresa: row.empresa.clone(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LicenseRequest {
    pub license: LicenseInput,
}

// ---
// Totais por produto (app_config['license_totals'])
// ---
// Registro tipado e versionado. O formato antigo (mapa simples) ainda é lido.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LicenseTotals {
    pub version: u32,
    pub totals: BTreeMap<String, i64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredTotals {
    Versioned(LicenseTotals),
    Legacy(BTreeMap<String, i64>),
}

impl Default for LicenseTotals {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            totals: BTreeMap::new(),
        }
    }
}

impl LicenseTotals {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(totals: BTreeMap<String, i64>) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            totals,
        }
    }

    pub fn decode(raw: Option<&str>) -> Self {
        let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
            return Self::default();
        };
        match serde_json::from_str::<StoredTotals>(raw) {
            Ok(StoredTotals::Versioned(totals)) => totals,
            Ok(StoredTotals::Legacy(map)) => Self::new(map),
            Err(e) => {
                tracing::warn!("license_totals ilegível, usando vazio: {}", e);
                Self::default()
            }
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Move o total de `old` para `new` (soma se `new` já existir).
    pub fn rename(&mut self, old: &str, new: &str) {
        if let Some(quantity) = self.totals.remove(old) {
            let total = self.totals.entry(new.to_string()).or_insert(0);
            *total = total.saturating_add(quantity);
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TotalsRequest {
    pub totals: BTreeMap<String, i64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenameProductPayload {
    #[validate(length(min = 1, message = "O nome atual é obrigatório."))]
    pub old_name: String,
    #[validate(length(min = 1, message = "O novo nome é obrigatório."))]
    pub new_name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LicenseImportRequest {
    #[validate(length(min = 1, message = "O produto é obrigatório."))]
    pub product_name: String,
    pub licenses: Vec<LicenseInput>,
}
