// src/importer/csv.rs

use thiserror::Error;

use crate::{
    importer::mapping::{column_for, normalize_header},
    models::equipment::{EquipmentColumn, EquipmentInput},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CsvError {
    #[error("O arquivo CSV deve conter um cabeçalho e dados.")]
    MissingData,

    #[error("Nenhum dado válido encontrado. Verifique se as colunas obrigatórias (ex: Número de série) existem.")]
    NoValidRows,
}

/// `;` quando o cabeçalho tem mais `;` do que `,`; senão `,`.
pub fn detect_separator(header_line: &str) -> char {
    let semicolons = header_line.matches(';').count();
    let commas = header_line.matches(',').count();
    if semicolons > commas { ';' } else { ',' }
}

fn clean_field(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('"').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('"').unwrap_or(trimmed);
    trimmed.to_string()
}

/// Divide uma linha respeitando aspas: o separador dentro de aspas não
/// separa campos. As aspas alternam o estado e não entram no valor.
pub fn split_line(line: &str, separator: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == separator && !in_quotes {
            fields.push(clean_field(&current));
            current.clear();
        } else {
            current.push(c);
        }
    }
    fields.push(clean_field(&current));
    fields
}

/// Lê o CSV e devolve uma entrada por linha com serial preenchido.
pub fn parse_equipment_csv(text: &str) -> Result<Vec<EquipmentInput>, CsvError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text).trim();
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < 2 {
        return Err(CsvError::MissingData);
    }

    let separator = detect_separator(lines[0]);
    let columns: Vec<Option<EquipmentColumn>> = split_line(lines[0], separator)
        .iter()
        .map(|header| column_for(&normalize_header(header)))
        .collect();

    let rows = lines[1..]
        .iter()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let values = split_line(line, separator);
            let mut entry = EquipmentInput::default();

            for (column, value) in columns.iter().zip(values) {
                let Some(column) = column else { continue };
                let value = value.trim();
                if !value.is_empty() {
                    entry.set_text(*column, value.to_string());
                }
            }

            entry.serial_key().is_some().then_some(entry)
        })
        .collect();

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn detects_separator_from_header() {
        assert_eq!(detect_separator("Serial;Usuario;Setor"), ';');
        assert_eq!(detect_separator("Serial,Usuario;Setor"), ',');
        assert_eq!(detect_separator("Serial"), ',');
        assert_eq!(detect_separator("a;b,c,d;e;f"), ';');
    }

    #[test]
    fn quoted_separator_is_not_a_boundary() {
        assert_eq!(
            split_line(r#"S1,"Silva, João", TI "#, ','),
            vec!["S1".to_string(), "Silva, João".to_string(), "TI".to_string()]
        );
        assert_eq!(split_line("a;;b", ';'), vec!["a", "", "b"]);
    }

    #[test]
    fn parses_semicolon_export_with_bom_and_accents() {
        let text = "\u{feff}Nome do dispositivo;Número de série;Nome do usuário atual;Marca\r\n\
                    NB-001;S1;Alice;Dell\r\n\
                    NB-002;S2;\"Souza; Bob\";Lenovo\r\n";

        let rows = parse_equipment_csv(text).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].equipamento.as_deref(), Some("NB-001"));
        assert_eq!(rows[0].serial.as_deref(), Some("S1"));
        assert_eq!(rows[0].usuario_atual.as_deref(), Some("Alice"));
        assert_eq!(rows[0].brand.as_deref(), Some("Dell"));
        assert_eq!(rows[1].usuario_atual.as_deref(), Some("Souza; Bob"));
    }

    #[test]
    fn drops_rows_without_serial_and_unmapped_columns() {
        let text = "Serial,Usuario,Patrimonio\nS1,Alice,PAT-1\n,Bob,PAT-2\n\n  ,Carol,PAT-3\nS4,,\n";

        let rows = parse_equipment_csv(text).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].serial.as_deref(), Some("S1"));
        assert_eq!(rows[0].patrimonio, None);
        assert_eq!(rows[1].serial.as_deref(), Some("S4"));
        assert_eq!(rows[1].usuario_atual, None);
    }

    #[test]
    fn short_rows_only_fill_present_columns() {
        let rows = parse_equipment_csv("Serial,Usuario,Setor\nS1\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].setor, None);
    }

    #[test]
    fn header_only_file_is_rejected() {
        assert_eq!(parse_equipment_csv("Serial;Usuario\n"), Err(CsvError::MissingData));
        assert_eq!(parse_equipment_csv("\u{feff}"), Err(CsvError::MissingData));
    }
}
