// Importação de inventário: leitura do CSV exportado pelo agente de
// inventário e reconciliação com os equipamentos já cadastrados.
pub mod csv;
pub mod mapping;
pub mod merge;
