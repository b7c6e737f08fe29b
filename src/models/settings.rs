// src/models/settings.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// Chaves conhecidas da tabela app_config
pub mod keys {
    pub const COMPANY_NAME: &str = "companyName";
    pub const IS_SSO_ENABLED: &str = "isSsoEnabled";
    pub const IS_2FA_ENABLED: &str = "is2faEnabled";
    pub const LAST_ABSOLUTE_UPDATE: &str = "lastAbsoluteUpdateTimestamp";
    pub const INITIAL_CONSOLIDATION: &str = "hasInitialConsolidationRun";
    pub const TERMO_ENTREGA: &str = "termo_entrega_template";
    pub const TERMO_DEVOLUCAO: &str = "termo_devolucao_template";
    pub const LICENSE_TOTALS: &str = "license_totals";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ConfigEntry {
    pub config_key: String,
    pub config_value: Option<String>,
}

fn as_flag(value: Option<&str>) -> bool {
    value == Some("true")
}

/// Visão tipada das configurações do sistema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[schema(example = "MRR INFORMATICA")]
    pub company_name: Option<String>,
    pub is_sso_enabled: bool,
    #[serde(rename = "is2faEnabled")]
    pub is_2fa_enabled: bool,
    pub last_absolute_update_timestamp: Option<String>,
    pub has_initial_consolidation_run: bool,
}

impl AppSettings {
    pub fn from_entries(entries: &[ConfigEntry]) -> Self {
        let value = |key: &str| {
            entries
                .iter()
                .find(|e| e.config_key == key)
                .and_then(|e| e.config_value.as_deref())
        };

        Self {
            company_name: value(keys::COMPANY_NAME).map(str::to_string),
            is_sso_enabled: as_flag(value(keys::IS_SSO_ENABLED)),
            is_2fa_enabled: as_flag(value(keys::IS_2FA_ENABLED)),
            last_absolute_update_timestamp: value(keys::LAST_ABSOLUTE_UPDATE).map(str::to_string),
            has_initial_consolidation_run: as_flag(value(keys::INITIAL_CONSOLIDATION)),
        }
    }
}

// Atualização parcial: só os campos enviados são gravados.
// Chaves fora desta lista são recusadas.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SettingsUpdate {
    pub company_name: Option<String>,
    pub is_sso_enabled: Option<bool>,
    #[serde(rename = "is2faEnabled")]
    pub is_2fa_enabled: Option<bool>,
    #[serde(rename = "termo_entrega_template")]
    pub termo_entrega_template: Option<String>,
    #[serde(rename = "termo_devolucao_template")]
    pub termo_devolucao_template: Option<String>,
}

impl SettingsUpdate {
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = Vec::new();
        if let Some(name) = &self.company_name {
            entries.push((keys::COMPANY_NAME, name.clone()));
        }
        if let Some(flag) = self.is_sso_enabled {
            entries.push((keys::IS_SSO_ENABLED, flag.to_string()));
        }
        if let Some(flag) = self.is_2fa_enabled {
            entries.push((keys::IS_2FA_ENABLED, flag.to_string()));
        }
        if let Some(template) = &self.termo_entrega_template {
            entries.push((keys::TERMO_ENTREGA, template.clone()));
        }
        if let Some(template) = &self.termo_devolucao_template {
            entries.push((keys::TERMO_DEVOLUCAO, template.clone()));
        }
        entries
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSettingsRequest {
    pub settings: SettingsUpdate,
}

#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TermoTemplates {
    pub entrega_template: String,
    pub devolucao_template: String,
}

impl TermoTemplates {
    pub fn from_entries(entries: &[ConfigEntry]) -> Self {
        let mut templates = Self::default();
        for entry in entries {
            let value = entry.config_value.clone().unwrap_or_default();
            match entry.config_key.as_str() {
                keys::TERMO_ENTREGA => templates.entrega_template = value,
                keys::TERMO_DEVOLUCAO => templates.devolucao_template = value,
                _ => {}
            }
        }
        templates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn entry(key: &str, value: Option<&str>) -> ConfigEntry {
        ConfigEntry {
            config_key: key.to_string(),
            config_value: value.map(str::to_string),
        }
    }

    #[test]
    fn decodes_flags_and_text_values() {
        let settings = AppSettings::from_entries(&[
            entry(keys::COMPANY_NAME, Some("MRR INFORMATICA")),
            entry(keys::IS_SSO_ENABLED, Some("false")),
            entry(keys::IS_2FA_ENABLED, Some("true")),
            entry(keys::INITIAL_CONSOLIDATION, Some("true")),
            entry(keys::TERMO_ENTREGA, None),
        ]);

        assert_eq!(
            settings,
            AppSettings {
                company_name: Some("MRR INFORMATICA".into()),
                is_sso_enabled: false,
                is_2fa_enabled: true,
                last_absolute_update_timestamp: None,
                has_initial_consolidation_run: true,
            }
        );
    }

    #[test]
    fn update_rejects_unknown_keys() {
        let err = serde_json::from_value::<SettingsUpdate>(json!({ "license_totals": "{}" }))
            .unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn update_emits_only_provided_fields() {
        let update: SettingsUpdate = serde_json::from_value(json!({
            "companyName": "ACME",
            "is2faEnabled": true
        }))
        .unwrap();

        assert_eq!(
            update.entries(),
            vec![(keys::COMPANY_NAME, "ACME".to_string()), (keys::IS_2FA_ENABLED, "true".to_string())]
        );
    }

    #[test]
    fn missing_templates_are_empty_strings() {
        let templates = TermoTemplates::from_entries(&[
            entry(keys::TERMO_ENTREGA, Some("<p>Entrega</p>")),
            entry(keys::TERMO_DEVOLUCAO, None),
        ]);
        assert_eq!(templates.entrega_template, "<p>Entrega</p>");
        assert_eq!(templates.devolucao_template, "");
    }
}
