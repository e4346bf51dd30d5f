//! Field roles and per-cycle key resolution
//!
//! The upstream API does not fix its field names: the vendor column has shipped
//! as `vendedor_nome`, `vendedor`, `nome_vendedor` and others. Each semantic
//! role carries an ordered candidate list, and resolution happens once per
//! payload over the full record set so every row is read through the same
//! schema interpretation.

use serde_json::Value;

/// Semantic purpose a field serves in a record, independent of its literal
/// name in any given payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    VendorIdentity,
    TeamIdentity,
    FranchiseIdentity,
    MonetaryValue,
    ProductCategory,
    ImageReference,
    CompanyLabel,
    ProposalCount,
}

/// Ordered candidate field names per role, most-preferred first. The defaults
/// mirror every name the upstream API has been observed to use; deployments
/// with a different backend can swap the table without touching the engine.
#[derive(Debug, Clone)]
pub struct RoleTable {
    pub vendor: Vec<&'static str>,
    pub team: Vec<&'static str>,
    pub franchise: Vec<&'static str>,
    pub value: Vec<&'static str>,
    pub product: Vec<&'static str>,
    pub image: Vec<&'static str>,
    pub company: Vec<&'static str>,
    pub count: Vec<&'static str>,
}

impl Default for RoleTable {
    fn default() -> Self {
        RoleTable {
            vendor: vec!["vendedor_nome", "vendedor", "nome_vendedor", "vendedorName", "nome"],
            team: vec!["equipe_nome", "equipe", "nome_equipe"],
            franchise: vec!["franquia_nome", "franquia", "nome_franquia"],
            value: vec!["valor_referencia", "soma_valor_referencia", "valor", "total", "valor_total"],
            product: vec!["produto_nome", "produto", "nome_produto", "produtoName"],
            image: vec!["imagem_perfil", "imagemPerfil", "imagem", "foto", "avatar", "profile_image"],
            company: vec!["empresa"],
            count: vec![
                "qtde_vendedor_nome",
                "qtde_vendedor",
                "qtde_propostas",
                "qtde_proposta",
                "quantidade_propostas",
                "propostas",
            ],
        }
    }
}

impl RoleTable {
    pub fn candidates(&self, role: FieldRole) -> &[&'static str] {
        match role {
            FieldRole::VendorIdentity => &self.vendor,
            FieldRole::TeamIdentity => &self.team,
            FieldRole::FranchiseIdentity => &self.franchise,
            FieldRole::MonetaryValue => &self.value,
            FieldRole::ProductCategory => &self.product,
            FieldRole::ImageReference => &self.image,
            FieldRole::CompanyLabel => &self.company,
            FieldRole::ProposalCount => &self.count,
        }
    }
}

/// Whether a value counts as present: finite numbers and non-blank strings.
pub fn has_row_value(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_f64().map(f64::is_finite).unwrap_or(false),
        Value::String(s) => !s.trim().is_empty(),
        Value::Bool(_) => true,
        _ => false,
    }
}

/// Row is an object carrying `key` with a usable value.
pub fn row_has_key(row: &Value, key: &str) -> bool {
    row.as_object()
        .and_then(|obj| obj.get(key))
        .map(has_row_value)
        .unwrap_or(false)
}

/// First candidate that at least one row carries with a non-empty value.
/// Logs when the payload satisfies more than one candidate, since that means
/// the priority order is deciding the schema interpretation.
pub fn resolve_row_key<'a>(rows: &[Value], candidates: &[&'a str]) -> Option<&'a str> {
    let matched: Vec<&str> = candidates
        .iter()
        .copied()
        .filter(|key| rows.iter().any(|row| row_has_key(row, key)))
        .collect();
    if matched.len() > 1 {
        eprintln!(
            "[SCHEMA] payload matches several candidate fields {:?}; using '{}'",
            matched, matched[0]
        );
    }
    matched.first().copied()
}

/// Field names resolved for one ingest cycle. Falls back to each role's first
/// candidate so downstream reads always have a key, even if it yields nothing.
#[derive(Debug)]
pub struct ResolvedKeys {
    pub vendor: &'static str,
    pub team: &'static str,
    pub franchise: &'static str,
    pub value: &'static str,
    pub product: &'static str,
    pub image: &'static str,
}

impl ResolvedKeys {
    pub fn resolve(rows: &[Value], table: &RoleTable) -> Self {
        let pick = |role: FieldRole| {
            let candidates = table.candidates(role);
            resolve_row_key(rows, candidates).unwrap_or(candidates[0])
        };
        ResolvedKeys {
            vendor: pick(FieldRole::VendorIdentity),
            team: pick(FieldRole::TeamIdentity),
            franchise: pick(FieldRole::FranchiseIdentity),
            value: pick(FieldRole::MonetaryValue),
            product: pick(FieldRole::ProductCategory),
            image: pick(FieldRole::ImageReference),
        }
    }
}

/// Read a string field, whitespace-normalized; absent fields read as empty.
pub fn row_str(row: &Value, key: &str) -> String {
    match row.get(key) {
        Some(Value::String(s)) => crate::text::normalize_whitespace(s),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}
