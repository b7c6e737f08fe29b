// src/importer/mapping.rs

use unicode_normalization::UnicodeNormalization;

use crate::models::equipment::EquipmentColumn;

/// Normaliza um cabeçalho: maiúsculas, sem acentos e só `A-Z0-9`.
/// "Número de Série" -> "NUMERODESERIE"
pub fn normalize_header(header: &str) -> String {
    header
        .to_uppercase()
        .nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect()
}

/// Apelidos (já normalizados) aceitos para cada coluna.
const ALIASES: &[(&str, EquipmentColumn)] = &[
    ("NOMEDODISPOSITIVO", EquipmentColumn::Equipamento),
    ("DISPOSITIVO", EquipmentColumn::Equipamento),
    ("EQUIPAMENTO", EquipmentColumn::Equipamento),
    ("NUMERODESERIE", EquipmentColumn::Serial),
    ("SERIAL", EquipmentColumn::Serial),
    ("NOMEDOUSUARIOATUAL", EquipmentColumn::UsuarioAtual),
    ("USUARIOATUAL", EquipmentColumn::UsuarioAtual),
    ("USUARIO", EquipmentColumn::UsuarioAtual),
    ("MARCA", EquipmentColumn::Brand),
    ("MODELO", EquipmentColumn::Model),
    ("EMAILDOCOLABORADOR", EquipmentColumn::EmailColaborador),
    ("EMAIL", EquipmentColumn::EmailColaborador),
    ("IDENTIFICADOR", EquipmentColumn::Identificador),
    ("NOMEDOSO", EquipmentColumn::NomeSo),
    ("SO", EquipmentColumn::NomeSo),
    ("MEMORIAFISICATOTAL", EquipmentColumn::MemoriaFisicaTotal),
    ("MEMORIA", EquipmentColumn::MemoriaFisicaTotal),
    ("GRUPODEPOLITICAS", EquipmentColumn::GrupoPoliticas),
    ("POLITICAS", EquipmentColumn::GrupoPoliticas),
    ("PAIS", EquipmentColumn::Pais),
    ("CIDADE", EquipmentColumn::Cidade),
    ("ESTADOPROVINCIA", EquipmentColumn::EstadoProvincia),
    ("ESTADO", EquipmentColumn::EstadoProvincia),
    ("LOCAL", EquipmentColumn::Local),
    ("SETOR", EquipmentColumn::Setor),
];

pub fn column_for(normalized_header: &str) -> Option<EquipmentColumn> {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized_header)
        .map(|(_, column)| *column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn serial_header_variants_normalize_identically() {
        for header in ["Número de Série", "NUMERO DE SERIE", "numero_de_serie", "NumeroDeSerie"] {
            assert_eq!(normalize_header(header), "NUMERODESERIE", "cabeçalho: {header}");
            assert_eq!(column_for(&normalize_header(header)), Some(EquipmentColumn::Serial));
        }
    }

    #[test]
    fn strips_cedilla_and_punctuation() {
        assert_eq!(normalize_header("Memória física total"), "MEMORIAFISICATOTAL");
        assert_eq!(normalize_header("País"), "PAIS");
        assert_eq!(normalize_header("Estado/Província"), "ESTADOPROVINCIA");
        assert_eq!(normalize_header("Ação (nº 2)"), "ACAON2");
    }

    #[test]
    fn known_aliases_map_to_columns() {
        assert_eq!(column_for("DISPOSITIVO"), Some(EquipmentColumn::Equipamento));
        assert_eq!(column_for("SO"), Some(EquipmentColumn::NomeSo));
        assert_eq!(column_for("EMAIL"), Some(EquipmentColumn::EmailColaborador));
        assert_eq!(column_for("SETOR"), Some(EquipmentColumn::Setor));
        assert_eq!(column_for("PATRIMONIO"), None);
    }
}
