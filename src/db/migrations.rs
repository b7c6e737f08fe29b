// src/db/migrations.rs

/// Passo do ledger: aplicado uma única vez, em ordem crescente de id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub id: i32,
    pub description: &'static str,
    pub sql: String,
}

impl Migration {
    fn new(id: i32, description: &'static str, sql: impl Into<String>) -> Self {
        Self {
            id,
            description,
            sql: sql.into(),
        }
    }
}

/// Coluna verificada a cada boot pelo auto-reparo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRepair {
    pub table: &'static str,
    pub column: &'static str,
    pub definition: &'static str,
}

const fn repair(table: &'static str, column: &'static str, definition: &'static str) -> ColumnRepair {
    ColumnRepair {
        table,
        column,
        definition,
    }
}

pub const COLUMN_REPAIRS: &[ColumnRepair] = &[
    // licenses
    repair("licenses", "empresa", "VARCHAR(255)"),
    repair("licenses", "observacoes", "TEXT"),
    repair("licenses", "approval_status", "approval_status NOT NULL DEFAULT 'approved'"),
    repair("licenses", "rejection_reason", "TEXT"),
    repair("licenses", "created_by_id", "INT"),
    // equipment
    repair("equipment", "observacoes", "TEXT"),
    repair("equipment", "approval_status", "approval_status NOT NULL DEFAULT 'approved'"),
    repair("equipment", "rejection_reason", "TEXT"),
    repair("equipment", "created_by_id", "INT"),
    repair("equipment", "email_colaborador", "VARCHAR(255)"),
    repair("equipment", "brand", "VARCHAR(255)"),
    repair("equipment", "model", "VARCHAR(255)"),
    repair("equipment", "identificador", "VARCHAR(255)"),
    repair("equipment", "nome_so", "VARCHAR(255)"),
    repair("equipment", "memoria_fisica_total", "VARCHAR(255)"),
    repair("equipment", "grupo_politicas", "VARCHAR(255)"),
    repair("equipment", "pais", "VARCHAR(255)"),
    repair("equipment", "cidade", "VARCHAR(255)"),
    repair("equipment", "estado_provincia", "VARCHAR(255)"),
    repair("equipment", "condicao_termo", "term_condition DEFAULT 'N/A'"),
    // users
    repair("users", "two_fa_secret", "VARCHAR(255)"),
    repair("users", "is_2fa_enabled", "BOOLEAN NOT NULL DEFAULT FALSE"),
    repair("users", "avatar_url", "TEXT"),
    // equipment_history
    repair("equipment_history", "equipment_id", "INT REFERENCES equipment(id) ON DELETE CASCADE"),
];

const CREATE_USERS: &str = r#"
DO $$ BEGIN
    CREATE TYPE user_role AS ENUM ('Admin', 'User Manager', 'User');
EXCEPTION WHEN duplicate_object THEN NULL;
END $$;

CREATE TABLE IF NOT EXISTS users (
    id INT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
    username VARCHAR(255) NOT NULL UNIQUE,
    real_name VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL UNIQUE,
    password_hash VARCHAR(255) NOT NULL,
    role user_role NOT NULL,
    last_login TIMESTAMPTZ,
    is_2fa_enabled BOOLEAN NOT NULL DEFAULT FALSE,
    two_fa_secret VARCHAR(255),
    sso_provider VARCHAR(50),
    avatar_url TEXT
);
"#;

const CREATE_EQUIPMENT: &str = r#"
DO $$ BEGIN
    CREATE TYPE approval_status AS ENUM ('approved', 'pending_approval', 'rejected');
EXCEPTION WHEN duplicate_object THEN NULL;
END $$;

DO $$ BEGIN
    CREATE TYPE equipment_status AS ENUM ('Estoque', 'Em Uso', 'Manutenção', 'Descartado');
EXCEPTION WHEN duplicate_object THEN NULL;
END $$;

DO $$ BEGIN
    CREATE TYPE term_condition AS ENUM ('N/A', 'Pendente', 'Assinado - Entrega', 'Assinado - Devolução');
EXCEPTION WHEN duplicate_object THEN NULL;
END $$;

CREATE TABLE IF NOT EXISTS equipment (
    id INT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
    equipamento VARCHAR(255) NOT NULL,
    garantia VARCHAR(255),
    patrimonio VARCHAR(255) UNIQUE,
    serial VARCHAR(255) UNIQUE,
    usuario_atual VARCHAR(255),
    usuario_anterior VARCHAR(255),
    local VARCHAR(255),
    setor VARCHAR(255),
    data_entrega_usuario VARCHAR(255),
    status equipment_status,
    data_devolucao VARCHAR(255),
    tipo VARCHAR(255),
    nota_compra VARCHAR(255),
    nota_pl_km VARCHAR(255),
    termo_responsabilidade VARCHAR(255),
    foto TEXT,
    qr_code TEXT,
    observacoes TEXT,
    brand VARCHAR(255),
    model VARCHAR(255),
    identificador VARCHAR(255),
    nome_so VARCHAR(255),
    memoria_fisica_total VARCHAR(255),
    grupo_politicas VARCHAR(255),
    pais VARCHAR(255),
    cidade VARCHAR(255),
    estado_provincia VARCHAR(255),
    condicao_termo term_condition DEFAULT 'N/A',
    approval_status approval_status NOT NULL DEFAULT 'approved',
    rejection_reason TEXT
);
"#;

const CREATE_LICENSES: &str = r#"
CREATE TABLE IF NOT EXISTS licenses (
    id INT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
    produto VARCHAR(255) NOT NULL,
    tipo_licenca VARCHAR(255),
    chave_serial VARCHAR(255) NOT NULL,
    data_expiracao VARCHAR(255),
    usuario VARCHAR(255) NOT NULL,
    cargo VARCHAR(255),
    setor VARCHAR(255),
    gestor VARCHAR(255),
    centro_custo VARCHAR(255),
    conta_razao VARCHAR(255),
    nome_computador VARCHAR(255),
    numero_chamado VARCHAR(255),
    observacoes TEXT,
    empresa VARCHAR(255),
    approval_status approval_status NOT NULL DEFAULT 'approved',
    rejection_reason TEXT
);
CREATE INDEX IF NOT EXISTS idx_licenses_produto ON licenses (produto);
"#;

const CREATE_HISTORY: &str = r#"
CREATE TABLE IF NOT EXISTS equipment_history (
    id INT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
    equipment_id INT REFERENCES equipment(id) ON DELETE CASCADE,
    changed_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    changed_by VARCHAR(255),
    change_type VARCHAR(255) NOT NULL,
    from_value TEXT,
    to_value TEXT
);
CREATE INDEX IF NOT EXISTS idx_equipment_history_equipment ON equipment_history (equipment_id, changed_at DESC);
"#;

const CREATE_AUDIT_LOG: &str = r#"
CREATE TABLE IF NOT EXISTS audit_log (
    id INT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    username VARCHAR(255),
    action_type VARCHAR(255) NOT NULL,
    target_type VARCHAR(255) NOT NULL,
    target_id VARCHAR(255),
    details TEXT
);
"#;

const CREATE_APP_CONFIG: &str = r#"
CREATE TABLE IF NOT EXISTS app_config (
    id INT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
    config_key VARCHAR(255) NOT NULL UNIQUE,
    config_value TEXT
);
"#;

fn seed_config(pairs: &[(&str, Option<&str>)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| {
            let value = value.map_or("NULL".to_string(), |v| format!("'{v}'"));
            format!(
                "INSERT INTO app_config (config_key, config_value) VALUES ('{key}', {value}) \
                 ON CONFLICT (config_key) DO NOTHING;\n"
            )
        })
        .collect()
}

/// Id da migração que cria o usuário `admin`.
pub const ADMIN_SEED_ID: i32 = 7;

/// Lista ordenada do ledger. O hash do admin é calculado pelo chamador
/// (bcrypt) e só é gravado se o usuário `admin` ainda não existir.
pub fn all(admin_password_hash: &str) -> Vec<Migration> {
    vec![
        Migration::new(1, "tabela users", CREATE_USERS),
        Migration::new(2, "tabela equipment", CREATE_EQUIPMENT),
        Migration::new(3, "tabela licenses", CREATE_LICENSES),
        Migration::new(4, "tabela equipment_history", CREATE_HISTORY),
        Migration::new(5, "tabela audit_log", CREATE_AUDIT_LOG),
        Migration::new(6, "tabela app_config", CREATE_APP_CONFIG),
        Migration::new(
            ADMIN_SEED_ID,
            "usuário admin inicial",
            format!(
                "INSERT INTO users (username, real_name, email, password_hash, role) \
                 VALUES ('admin', 'Admin', 'admin@example.com', '{admin_password_hash}', 'Admin') \
                 ON CONFLICT (username) DO NOTHING;"
            ),
        ),
        Migration::new(
            8,
            "configurações iniciais",
            seed_config(&[("companyName", Some("MRR INFORMATICA")), ("isSsoEnabled", Some("false"))]),
        ),
        Migration::new(
            9,
            "equipment.email_colaborador",
            "ALTER TABLE equipment ADD COLUMN IF NOT EXISTS email_colaborador VARCHAR(255);",
        ),
        Migration::new(
            10,
            "modelos de termo",
            seed_config(&[("termo_entrega_template", None), ("termo_devolucao_template", None)]),
        ),
        Migration::new(
            11,
            "users.avatar_url",
            "ALTER TABLE users ADD COLUMN IF NOT EXISTS avatar_url TEXT;",
        ),
        Migration::new(
            12,
            "users.avatar_url como TEXT",
            "ALTER TABLE users ALTER COLUMN avatar_url TYPE TEXT;",
        ),
        Migration::new(
            13,
            "licenses.created_by_id",
            "ALTER TABLE licenses ADD COLUMN IF NOT EXISTS created_by_id INT;",
        ),
        Migration::new(
            14,
            "equipment.created_by_id",
            "ALTER TABLE equipment ADD COLUMN IF NOT EXISTS created_by_id INT;",
        ),
        Migration::new(15, "flag global de 2FA", seed_config(&[("is2faEnabled", Some("false"))])),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_ascending() {
        let migrations = all("$2b$10$hash");
        let ids: Vec<i32> = migrations.iter().map(|m| m.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(ids, sorted);
        assert_eq!(ids.first(), Some(&1));
    }

    #[test]
    fn admin_seed_embeds_hash_and_is_idempotent() {
        let migrations = all("$2b$10$abc");
        let seed = migrations.iter().find(|m| m.id == ADMIN_SEED_ID).unwrap();
        assert!(seed.sql.contains("'$2b$10$abc'"));
        assert!(seed.sql.contains("ON CONFLICT (username) DO NOTHING"));
    }

    // Colapsa espaços para comparar trechos de DDL
    fn squash(sql: &str) -> String {
        sql.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn history_rows_follow_their_equipment_on_delete() {
        assert!(squash(CREATE_HISTORY)
            .contains("equipment_id INT REFERENCES equipment(id) ON DELETE CASCADE"));
    }

    #[test]
    fn serial_and_asset_tag_are_unique() {
        let ddl = squash(CREATE_EQUIPMENT);
        assert!(ddl.contains("patrimonio VARCHAR(255) UNIQUE,"));
        assert!(ddl.contains("serial VARCHAR(255) UNIQUE,"));
        // Único mas anulável: vários itens sem serial convivem
        assert!(!ddl.contains("serial VARCHAR(255) NOT NULL"));
    }

    #[test]
    fn config_seed_writes_null_for_missing_values() {
        let sql = seed_config(&[("termo_entrega_template", None), ("companyName", Some("ACME"))]);
        assert!(sql.contains("VALUES ('termo_entrega_template', NULL)"));
        assert!(sql.contains("VALUES ('companyName', 'ACME')"));
    }

    #[test]
    fn repairs_cover_every_table_at_most_once_per_column() {
        let mut seen = std::collections::HashSet::new();
        for repair in COLUMN_REPAIRS {
            assert!(seen.insert((repair.table, repair.column)), "duplicado: {repair:?}");
        }
        for table in ["licenses", "equipment", "users", "equipment_history"] {
            assert!(COLUMN_REPAIRS.iter().any(|r| r.table == table));
        }
    }
}
