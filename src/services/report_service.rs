// src/services/report_service.rs

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use thiserror::Error;

use crate::{common::error::AppError, db::EquipmentRepository};

const INVALID_FORMAT: &str = "IA não retornou um formato de dados válido.";

// Campos pesados (imagens em base64) que não vão para o modelo
const STRIPPED_FIELDS: [&str; 3] = ["foto", "qrCode", "avatarUrl"];

// Do primeiro '[' ao último ']'
const ARRAY_SPAN: &str = r"(?s)\[.*\]";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Falha ao gerar relatório com IA: {0}")]
    Service(String),
    #[error("{0}")]
    Parse(String),
}

/// Filtro em linguagem natural sobre um snapshot do inventário.
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate_structured_filter(
        &self,
        query: &str,
        snapshot: &[Value],
    ) -> Result<Vec<Value>, ReportError>;
}

// ---
// Ollama
// ---

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    format: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

pub struct OllamaReportGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    parser: ReportOutputParser,
}

impl OllamaReportGenerator {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            parser: ReportOutputParser::new()?,
        })
    }
}

fn build_prompt(query: &str, snapshot: &[Value]) -> Result<String, ReportError> {
    let data = serde_json::to_string(snapshot).map_err(|e| ReportError::Service(e.to_string()))?;
    Ok(format!(
        "You are an inventory assistant API. You will receive inventory data in JSON format and a user query.\n\n\
         INVENTORY DATA:\n{data}\n\n\
         USER QUERY: \"{query}\"\n\n\
         INSTRUCTIONS:\n\
         1. Analyze the user query to understand what equipment they are looking for (e.g., specific brand, status, department).\n\
         2. Filter the INVENTORY DATA based on the query.\n\
         3. Return ONLY a valid JSON array containing the matching objects.\n\
         4. Do NOT include any explanation, markdown, or text outside the JSON array.\n\
         5. If no items match, return an empty JSON array []."
    ))
}

#[async_trait]
impl ReportGenerator for OllamaReportGenerator {
    async fn generate_structured_filter(
        &self,
        query: &str,
        snapshot: &[Value],
    ) -> Result<Vec<Value>, ReportError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt: build_prompt(query, snapshot)?,
            stream: false,
            format: "json",
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ReportError::Service(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::Service(format!("Ollama API error: {}", status)));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ReportError::Service(e.to_string()))?;

        self.parser.extract_json_array(&generated.response)
    }
}

/// Interpreta a saída do modelo como uma lista de registros.
pub struct ReportOutputParser {
    array_span: Regex,
}

impl ReportOutputParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            array_span: Regex::new(ARRAY_SPAN)?,
        })
    }

    /// Aceita um array puro, um objeto com um único campo array
    /// (`{"items": [...]}`) ou texto com um array no meio.
    pub fn extract_json_array(&self, text: &str) -> Result<Vec<Value>, ReportError> {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => return Ok(items),
            Ok(Value::Object(map)) => {
                let mut arrays = map.into_iter().filter_map(|(_, v)| match v {
                    Value::Array(items) => Some(items),
                    _ => None,
                });
                if let (Some(items), None) = (arrays.next(), arrays.next()) {
                    return Ok(items);
                }
            }
            _ => {}
        }

        tracing::warn!("Resposta da IA não é um array JSON, tentando extrair: {}", text);
        self.array_span
            .find(text)
            .and_then(|span| serde_json::from_str::<Vec<Value>>(span.as_str()).ok())
            .ok_or_else(|| ReportError::Parse(INVALID_FORMAT.into()))
    }
}

/// Remove os campos binários de cada registro do snapshot.
pub fn strip_binary_fields(records: Vec<Value>) -> Vec<Value> {
    records
        .into_iter()
        .map(|mut record| {
            if let Value::Object(map) = &mut record {
                for field in STRIPPED_FIELDS {
                    map.remove(field);
                }
            }
            record
        })
        .collect()
}

#[derive(Clone)]
pub struct ReportService {
    generator: Arc<dyn ReportGenerator>,
    equipment_repo: EquipmentRepository,
}

impl ReportService {
    pub fn new(generator: Arc<dyn ReportGenerator>, equipment_repo: EquipmentRepository) -> Self {
        Self {
            generator,
            equipment_repo,
        }
    }

    pub async fn generate(&self, query: &str, data: Option<Vec<Value>>) -> Result<Vec<Value>, AppError> {
        let records = match data {
            Some(records) => records,
            None => self
                .equipment_repo
                .list_approved()
                .await?
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<Vec<_>, _>>()?,
        };
        let snapshot = strip_binary_fields(records);

        tracing::info!("Relatório IA: '{}' sobre {} registros", query, snapshot.len());
        Ok(self.generator.generate_structured_filter(query, &snapshot).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;

    fn extract_json_array(text: &str) -> Result<Vec<Value>, ReportError> {
        ReportOutputParser::new().unwrap().extract_json_array(text)
    }

    #[test]
    fn generator_builds_with_the_span_pattern() {
        let generator =
            OllamaReportGenerator::new("http://127.0.0.1:11434/", "llama3.2", Duration::from_secs(5)).unwrap();
        assert_eq!(generator.base_url, "http://127.0.0.1:11434");
        assert!(generator.parser.array_span.is_match("texto [1] texto"));
    }

    #[test]
    fn plain_array_is_returned_as_is() {
        let items = extract_json_array(r#"[{"serial": "S1"}, {"serial": "S2"}]"#).unwrap();
        assert_eq!(items, vec![json!({"serial": "S1"}), json!({"serial": "S2"})]);
    }

    #[test]
    fn single_array_field_is_unwrapped() {
        let items = extract_json_array(r#"{"results": [{"serial": "S1"}], "count": 1}"#).unwrap();
        assert_eq!(items, vec![json!({"serial": "S1"})]);
    }

    #[test]
    fn array_is_extracted_from_surrounding_text() {
        let text = "Aqui está o resultado:\n[{\"serial\": \"S1\"}]\nEspero ter ajudado.";
        assert_eq!(extract_json_array(text).unwrap(), vec![json!({"serial": "S1"})]);
    }

    #[test]
    fn object_with_two_arrays_falls_back_to_the_span() {
        // O trecho entre o primeiro '[' e o último ']' não é JSON válido
        let err = extract_json_array(r#"{"a": [1], "b": [2]}"#).unwrap_err();
        assert!(matches!(err, ReportError::Parse(_)));
    }

    #[test]
    fn text_without_array_is_a_parse_error() {
        let err = extract_json_array("Nenhum item encontrado.").unwrap_err();
        assert_eq!(err.to_string(), INVALID_FORMAT);
    }

    #[test]
    fn strips_heavy_fields_only() {
        let stripped = strip_binary_fields(vec![json!({
            "serial": "S1",
            "foto": "data:image/png;base64,AAAA",
            "qrCode": "data:image/png;base64,BBBB",
            "avatarUrl": "x"
        })]);
        assert_eq!(stripped, vec![json!({"serial": "S1"})]);
    }

    #[test]
    fn prompt_carries_query_and_data() {
        let prompt = build_prompt("notebooks em uso", &[json!({"serial": "S1"})]).unwrap();
        assert!(prompt.contains("USER QUERY: \"notebooks em uso\""));
        assert!(prompt.contains(r#"[{"serial":"S1"}]"#));
        assert!(prompt.contains("Return ONLY a valid JSON array"));
    }

    struct RecordingGenerator {
        seen: Mutex<Vec<Value>>,
    }

    #[async_trait]
    impl ReportGenerator for RecordingGenerator {
        async fn generate_structured_filter(
            &self,
            _query: &str,
            snapshot: &[Value],
        ) -> Result<Vec<Value>, ReportError> {
            *self.seen.lock().unwrap() = snapshot.to_vec();
            Ok(snapshot.iter().take(1).cloned().collect())
        }
    }

    #[tokio::test]
    async fn service_strips_client_data_before_generating() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/inventario_test")
            .unwrap();
        let generator = Arc::new(RecordingGenerator {
            seen: Mutex::new(Vec::new()),
        });
        let service = ReportService::new(generator.clone(), EquipmentRepository::new(pool));

        let result = service
            .generate(
                "tudo",
                Some(vec![json!({"serial": "S1", "foto": "x"}), json!({"serial": "S2"})]),
            )
            .await
            .unwrap();

        assert_eq!(result, vec![json!({"serial": "S1"})]);
        assert_eq!(
            *generator.seen.lock().unwrap(),
            vec![json!({"serial": "S1"}), json!({"serial": "S2"})]
        );
    }
}
