// src/models/equipment.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    common::db_utils::{Column, ColumnValue},
    models::approval::ApprovalStatus,
};

// --- Enums ---
// Os rótulos são os mesmos que a UI já usa (português).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "equipment_status")]
pub enum EquipmentStatus {
    #[sqlx(rename = "Estoque")]
    #[serde(rename = "Estoque")]
    Stock,
    #[sqlx(rename = "Em Uso")]
    #[serde(rename = "Em Uso")]
    InUse,
    #[sqlx(rename = "Manutenção")]
    #[serde(rename = "Manutenção")]
    Maintenance,
    #[sqlx(rename = "Descartado")]
    #[serde(rename = "Descartado")]
    Discarded,
}

impl EquipmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EquipmentStatus::Stock => "Estoque",
            EquipmentStatus::InUse => "Em Uso",
            EquipmentStatus::Maintenance => "Manutenção",
            EquipmentStatus::Discarded => "Descartado",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        [Self::Stock, Self::InUse, Self::Maintenance, Self::Discarded]
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(label.trim()))
    }
}

/// Situação do termo de responsabilidade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "term_condition")]
pub enum TermCondition {
    #[sqlx(rename = "N/A")]
    #[serde(rename = "N/A")]
    NotApplicable,
    #[sqlx(rename = "Pendente")]
    #[serde(rename = "Pendente")]
    Pending,
    #[sqlx(rename = "Assinado - Entrega")]
    #[serde(rename = "Assinado - Entrega")]
    SignedDelivery,
    #[sqlx(rename = "Assinado - Devolução")]
    #[serde(rename = "Assinado - Devolução")]
    SignedReturn,
}

impl TermCondition {
    pub fn as_str(self) -> &'static str {
        match self {
            TermCondition::NotApplicable => "N/A",
            TermCondition::Pending => "Pendente",
            TermCondition::SignedDelivery => "Assinado - Entrega",
            TermCondition::SignedReturn => "Assinado - Devolução",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        [Self::NotApplicable, Self::Pending, Self::SignedDelivery, Self::SignedReturn]
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(label.trim()))
    }
}

// --- Equipamento (linha da tabela `equipment`) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Notebook Dell Latitude 5420")]
    pub equipamento: String,
    pub garantia: Option<String>,
    #[schema(example = "PAT-000123")]
    pub patrimonio: Option<String>,
    #[schema(example = "5CG1234XYZ")]
    pub serial: Option<String>,
    pub usuario_atual: Option<String>,
    pub usuario_anterior: Option<String>,
    pub local: Option<String>,
    pub setor: Option<String>,
    pub data_entrega_usuario: Option<String>,
    pub status: Option<EquipmentStatus>,
    pub data_devolucao: Option<String>,
    pub tipo: Option<String>,
    pub nota_compra: Option<String>,
    pub nota_pl_km: Option<String>,
    pub termo_responsabilidade: Option<String>,
    pub foto: Option<String>,
    pub qr_code: Option<String>,
    pub observacoes: Option<String>,
    pub email_colaborador: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub identificador: Option<String>,
    #[serde(rename = "nomeSO")]
    pub nome_so: Option<String>,
    pub memoria_fisica_total: Option<String>,
    pub grupo_politicas: Option<String>,
    pub pais: Option<String>,
    pub cidade: Option<String>,
    pub estado_provincia: Option<String>,
    pub condicao_termo: Option<TermCondition>,
    pub approval_status: ApprovalStatus,
    pub rejection_reason: Option<String>,
    pub created_by_id: Option<i32>,
}

// --- Colunas editáveis ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EquipmentColumn {
    Equipamento,
    Garantia,
    Patrimonio,
    Serial,
    UsuarioAtual,
    UsuarioAnterior,
    Local,
    Setor,
    DataEntregaUsuario,
    Status,
    DataDevolucao,
    Tipo,
    NotaCompra,
    NotaPlKm,
    TermoResponsabilidade,
    Foto,
    QrCode,
    Observacoes,
    EmailColaborador,
    Brand,
    Model,
    Identificador,
    NomeSo,
    MemoriaFisicaTotal,
    GrupoPoliticas,
    Pais,
    Cidade,
    EstadoProvincia,
    CondicaoTermo,
}

impl EquipmentColumn {
    pub const ALL: [EquipmentColumn; 29] = [
        Self::Equipamento,
        Self::Garantia,
        Self::Patrimonio,
        Self::Serial,
        Self::UsuarioAtual,
        Self::UsuarioAnterior,
        Self::Local,
        Self::Setor,
        Self::DataEntregaUsuario,
        Self::Status,
        Self::DataDevolucao,
        Self::Tipo,
        Self::NotaCompra,
        Self::NotaPlKm,
        Self::TermoResponsabilidade,
        Self::Foto,
        Self::QrCode,
        Self::Observacoes,
        Self::EmailColaborador,
        Self::Brand,
        Self::Model,
        Self::Identificador,
        Self::NomeSo,
        Self::MemoriaFisicaTotal,
        Self::GrupoPoliticas,
        Self::Pais,
        Self::Cidade,
        Self::EstadoProvincia,
        Self::CondicaoTermo,
    ];
}

impl Column for EquipmentColumn {
    fn name(self) -> &'static str {
        match self {
            Self::Equipamento => "equipamento",
            Self::Garantia => "garantia",
            Self::Patrimonio => "patrimonio",
            Self::Serial => "serial",
            Self::UsuarioAtual => "usuario_atual",
            Self::UsuarioAnterior => "usuario_anterior",
            Self::Local => "local",
            Self::Setor => "setor",
            Self::DataEntregaUsuario => "data_entrega_usuario",
            Self::Status => "status",
            Self::DataDevolucao => "data_devolucao",
            Self::Tipo => "tipo",
            Self::NotaCompra => "nota_compra",
            Self::NotaPlKm => "nota_pl_km",
            Self::TermoResponsabilidade => "termo_responsabilidade",
            Self::Foto => "foto",
            Self::QrCode => "qr_code",
            Self::Observacoes => "observacoes",
            Self::EmailColaborador => "email_colaborador",
            Self::Brand => "brand",
            Self::Model => "model",
            Self::Identificador => "identificador",
            Self::NomeSo => "nome_so",
            Self::MemoriaFisicaTotal => "memoria_fisica_total",
            Self::GrupoPoliticas => "grupo_politicas",
            Self::Pais => "pais",
            Self::Cidade => "cidade",
            Self::EstadoProvincia => "estado_provincia",
            Self::CondicaoTermo => "condicao_termo",
        }
    }
}

impl Equipment {
    /// Valor atual da coluna como texto (usado pelo merge da importação).
    pub fn text_of(&self, column: EquipmentColumn) -> Option<String> {
        use EquipmentColumn as C;
        match column {
            C::Equipamento => Some(self.equipamento.clone()),
            C::Garantia => self.garantia.clone(),
            C::Patrimonio => self.patrimonio.clone(),
            C::Serial => self.serial.clone(),
            C::UsuarioAtual => self.usuario_atual.clone(),
            C::UsuarioAnterior => self.usuario_anterior.clone(),
            C::Local => self.local.clone(),
            C::Setor => self.setor.clone(),
            C::DataEntregaUsuario => self.data_entrega_usuario.clone(),
            C::Status => self.status.map(|s| s.as_str().to_string()),
            C::DataDevolucao => self.data_devolucao.clone(),
            C::Tipo => self.tipo.clone(),
            C::NotaCompra => self.nota_compra.clone(),
            C::NotaPlKm => self.nota_pl_km.clone(),
            C::TermoResponsabilidade => self.termo_responsabilidade.clone(),
            C::Foto => self.foto.clone(),
            C::QrCode => self.qr_code.clone(),
            C::Observacoes => self.observacoes.clone(),
            C::EmailColaborador => self.email_colaborador.clone(),
            C::Brand => self.brand.clone(),
            C::Model => self.model.clone(),
            C::Identificador => self.identificador.clone(),
            C::NomeSo => self.nome_so.clone(),
            C::MemoriaFisicaTotal => self.memoria_fisica_total.clone(),
            C::GrupoPoliticas => self.grupo_politicas.clone(),
            C::Pais => self.pais.clone(),
            C::Cidade => self.cidade.clone(),
            C::EstadoProvincia => self.estado_provincia.clone(),
            C::CondicaoTermo => self.condicao_termo.map(|t| t.as_str().to_string()),
        }
    }
}

// ---
// Payload: EquipmentInput
// ---
// Esquema explícito: chaves desconhecidas são rejeitadas na desserialização.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EquipmentInput {
    #[validate(length(max = 255, message = "Máximo de 255 caracteres."))]
    #[schema(example = "Notebook Dell Latitude 5420")]
    pub equipamento: Option<String>,
    pub garantia: Option<String>,
    #[validate(length(max = 255, message = "Máximo de 255 caracteres."))]
    pub patrimonio: Option<String>,
    #[validate(length(max = 255, message = "Máximo de 255 caracteres."))]
    #[schema(example = "5CG1234XYZ")]
    pub serial: Option<String>,
    pub usuario_atual: Option<String>,
    pub usuario_anterior: Option<String>,
    pub local: Option<String>,
    pub setor: Option<String>,
    pub data_entrega_usuario: Option<String>,
    pub status: Option<EquipmentStatus>,
    pub data_devolucao: Option<String>,
    pub tipo: Option<String>,
    pub nota_compra: Option<String>,
    pub nota_pl_km: Option<String>,
    pub termo_responsabilidade: Option<String>,
    pub foto: Option<String>,
    pub qr_code: Option<String>,
    pub observacoes: Option<String>,
    #[validate(email(message = "E-mail do colaborador inválido."))]
    pub email_colaborador: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub identificador: Option<String>,
    #[serde(rename = "nomeSO")]
    pub nome_so: Option<String>,
    pub memoria_fisica_total: Option<String>,
    pub grupo_politicas: Option<String>,
    pub pais: Option<String>,
    pub cidade: Option<String>,
    pub estado_provincia: Option<String>,
    pub condicao_termo: Option<TermCondition>,
}

impl EquipmentInput {
    pub fn value_of(&self, column: EquipmentColumn) -> Option<ColumnValue> {
        use EquipmentColumn as C;
        let text = |value: &Option<String>| value.clone().map(ColumnValue::Text);
        match column {
            C::Equipamento => text(&self.equipamento),
            C::Garantia => text(&self.garantia),
            C::Patrimonio => text(&self.patrimonio),
            C::Serial => text(&self.serial),
            C::UsuarioAtual => text(&self.usuario_atual),
            C::UsuarioAnterior => text(&self.usuario_anterior),
            C::Local => text(&self.local),
            C::Setor => text(&self.setor),
            C::DataEntregaUsuario => text(&self.data_entrega_usuario),
            C::Status => self.status.map(ColumnValue::Status),
            C::DataDevolucao => text(&self.data_devolucao),
            C::Tipo => text(&self.tipo),
            C::NotaCompra => text(&self.nota_compra),
            C::NotaPlKm => text(&self.nota_pl_km),
            C::TermoResponsabilidade => text(&self.termo_responsabilidade),
            C::Foto => text(&self.foto),
            C::QrCode => text(&self.qr_code),
            C::Observacoes => text(&self.observacoes),
            C::EmailColaborador => text(&self.email_colaborador),
            C::Brand => text(&self.brand),
            C::Model => text(&self.model),
            C::Identificador => text(&self.identificador),
            C::NomeSo => text(&self.nome_so),
            C::MemoriaFisicaTotal => text(&self.memoria_fisica_total),
            C::GrupoPoliticas => text(&self.grupo_politicas),
            C::Pais => text(&self.pais),
            C::Cidade => text(&self.cidade),
            C::EstadoProvincia => text(&self.estado_provincia),
            C::CondicaoTermo => self.condicao_termo.map(ColumnValue::Term),
        }
    }

    /// Preenche uma coluna a partir de texto (origem: CSV).
    /// Rótulos desconhecidos de status/termo são ignorados.
    pub fn set_text(&mut self, column: EquipmentColumn, value: String) {
        use EquipmentColumn as C;
        let slot = match column {
            C::Equipamento => &mut self.equipamento,
            C::Garantia => &mut self.garantia,
            C::Patrimonio => &mut self.patrimonio,
            C::Serial => &mut self.serial,
            C::UsuarioAtual => &mut self.usuario_atual,
            C::UsuarioAnterior => &mut self.usuario_anterior,
            C::Local => &mut self.local,
            C::Setor => &mut self.setor,
            C::DataEntregaUsuario => &mut self.data_entrega_usuario,
            C::DataDevolucao => &mut self.data_devolucao,
            C::Tipo => &mut self.tipo,
            C::NotaCompra => &mut self.nota_compra,
            C::NotaPlKm => &mut self.nota_pl_km,
            C::TermoResponsabilidade => &mut self.termo_responsabilidade,
            C::Foto => &mut self.foto,
            C::QrCode => &mut self.qr_code,
            C::Observacoes => &mut self.observacoes,
            C::EmailColaborador => &mut self.email_colaborador,
            C::Brand => &mut self.brand,
            C::Model => &mut self.model,
            C::Identificador => &mut self.identificador,
            C::NomeSo => &mut self.nome_so,
            C::MemoriaFisicaTotal => &mut self.memoria_fisica_total,
            C::GrupoPoliticas => &mut self.grupo_politicas,
            C::Pais => &mut self.pais,
            C::Cidade => &mut self.cidade,
            C::EstadoProvincia => &mut self.estado_provincia,
            C::Status => {
                self.status = EquipmentStatus::from_label(&value).or(self.status);
                return;
            }
            C::CondicaoTermo => {
                self.condicao_termo = TermCondition::from_label(&value).or(self.condicao_termo);
                return;
            }
        };
        *slot = Some(value);
    }

    /// Colunas presentes no payload, na ordem canônica.
    pub fn columns(&self) -> Vec<(EquipmentColumn, ColumnValue)> {
        EquipmentColumn::ALL
            .iter()
            .filter_map(|&column| self.value_of(column).map(|value| (column, value)))
            .collect()
    }

    /// Chave natural do merge: serial sem espaços nas pontas, se não vazio.
    pub fn serial_key(&self) -> Option<&str> {
        self.serial
            .as_deref()
            .map(str::trim)
            .filter(|serial| !serial.is_empty())
    }

    /// Grava o serial na forma da chave: aparado, e `None` se ficar vazio.
    pub fn normalize_serial(&mut self) {
        self.serial = self.serial_key().map(str::to_string);
    }

    // Regra de criação: o nome do equipamento é obrigatório (coluna NOT NULL).
    pub fn validate_for_create(&self) -> Result<(), ValidationErrors> {
        self.validate()?;

        let has_name = self
            .equipamento
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty());
        if !has_name {
            let mut error = ValidationError::new("required");
            error.message = Some("O campo 'equipamento' é obrigatório.".into());
            let mut errors = ValidationErrors::new();
            errors.add("equipamento", error);
            return Err(errors);
        }
        Ok(())
    }
}

impl From<&Equipment> for EquipmentInput {
    fn from(row: &Equipment) -> Self {
        Self {
            equipamento: Some(row.equipamento.clone()),
            garantia: row.garantia.clone(),
            patrimonio: row.patrimonio.clone(),
            serial: row.serial.clone(),
            usuario_atual: row.usuario_atual.clone(),
            usuario_anterior: row.usuario_anterior.clone(),
            local: row.local.clone(),
            setor: row.setor.clone(),
            data_entrega_usuario: row.data_entrega_usuario.clone(),
            status: row.status,
            data_devolucao: row.data_devolucao.clone(),
            tipo: row.tipo.clone(),
            nota_compra: row.nota_compra.clone(),
            nota_pl_km: row.nota_pl_km.clone(),
            termo_responsabilidade: row.termo_responsabilidade.clone(),
            foto: row.foto.clone(),
            qr_code: row.qr_code.clone(),
            observacoes: row.observacoes.clone(),
            email_colaborador: row.email_colaborador.clone(),
            brand: row.brand.clone(),
            model: row.model.clone(),
            identificador: row.identificador.clone(),
            nome_so: row.nome_so.clone(),
            memoria_fisica_total: row.memoria_fisica_total.clone(),
            grupo_politicas: row.grupo_politicas.clone(),
            pais: row.pais.clone(),
            cidade: row.cidade.clone(),
            estado_provincia: row.estado_provincia.clone(),
            condicao_termo: row.condicao_termo,
        }
    }
}

// --- Envelopes de requisição (compatíveis com o front atual) ---

#[derive(Debug, Deserialize, ToSchema)]
pub struct EquipmentRequest {
    pub equipment: EquipmentInput,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentListRequest {
    pub equipment_list: Vec<EquipmentInput>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub received: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub success: bool,
    pub message: String,
    pub summary: ImportSummary,
}
