//! Leaderboard definitions, product filtering and ranking assembly
//!
//! This module handles:
//! - The five static board definitions and their result-size limits
//! - Restricting rows to a product allow-set (accent/case-insensitive)
//! - Building the boards from flat rows or from pre-aggregated lists

use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;

use crate::groups::{build_groups, GroupOptions, GroupedEntry};
use crate::payload::{detect, RankingLists, Shape};
use crate::rows::{has_row_value, resolve_row_key, FieldRole, ResolvedKeys, RoleTable};
use crate::text::{
    format_after_colon, format_count_label, format_name, format_vendor_name_only,
    format_vendor_name_with_company, normalize_key, normalize_whitespace, parse_numeric,
};

const PORTABILIDADE_PRODUCTS: [&str; 4] = [
    "Portabilidade",
    "Refinanciamento",
    "Port com Refin",
    "Refin da Port",
];
const NOVO_PRODUCTS: [&str; 3] = ["Cartão com Saque", "Margem Livre", "Cartão sem Saque"];

static PORTABILIDADE_SET: Lazy<HashSet<String>> =
    Lazy::new(|| PORTABILIDADE_PRODUCTS.iter().map(|p| normalize_key(p)).collect());
static NOVO_SET: Lazy<HashSet<String>> =
    Lazy::new(|| NOVO_PRODUCTS.iter().map(|p| normalize_key(p)).collect());

/// Static display configuration for one board.
#[derive(Debug, Serialize)]
pub struct BoardDef {
    pub id: &'static str,
    pub kicker: &'static str,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub description: &'static str,
    pub limit: usize,
}

pub static BOARD_DEFS: [BoardDef; 5] = [
    BoardDef {
        id: "vendedores",
        kicker: "VENDAS",
        title: "Ranking TOP 10 Vendedor",
        subtitle: "Hoje",
        description: "Resultado do dia atual.",
        limit: 10,
    },
    BoardDef {
        id: "supervisores",
        kicker: "OPERACAO",
        title: "Ranking TOP 5 Supervisor",
        subtitle: "Hoje",
        description: "Resultado do dia atual.",
        limit: 5,
    },
    BoardDef {
        id: "gerentes",
        kicker: "GESTAO",
        title: "Ranking Grupo",
        subtitle: "Hoje",
        description: "Resultado do dia atual.",
        limit: 5,
    },
    BoardDef {
        id: "portabilidade",
        kicker: "VENDAS",
        title: "Ranking TOP 10 Portabilidade",
        subtitle: "Hoje",
        description: "Resultado do dia atual.",
        limit: 10,
    },
    BoardDef {
        id: "novo",
        kicker: "VENDAS",
        title: "Ranking TOP 10 Novo",
        subtitle: "Hoje",
        description: "Resultado do dia atual.",
        limit: 10,
    },
];

/// A board definition paired with its ranked rows, truncated to the limit.
#[derive(Debug, Serialize)]
pub struct Leaderboard {
    pub def: &'static BoardDef,
    pub rows: Vec<GroupedEntry>,
}

impl Leaderboard {
    pub fn id(&self) -> &'static str {
        self.def.id
    }
}

/// Keep only rows whose product field normalizes into the allow-set. Rows
/// with no product are excluded.
pub fn filter_rows_by_product(
    rows: &[Value],
    product_key: &str,
    allowed: &HashSet<String>,
) -> Vec<Value> {
    rows.iter()
        .filter(|row| match row.get(product_key) {
            Some(Value::String(s)) if !s.trim().is_empty() => allowed.contains(&normalize_key(s)),
            _ => false,
        })
        .cloned()
        .collect()
}

fn rows_for(id: &str, built: &mut Vec<(&'static str, Vec<GroupedEntry>)>) -> Vec<GroupedEntry> {
    built
        .iter_mut()
        .find(|(board, _)| *board == id)
        .map(|(_, rows)| std::mem::take(rows))
        .unwrap_or_default()
}

fn assemble(mut rows_by_id: Vec<(&'static str, Vec<GroupedEntry>)>) -> Vec<Leaderboard> {
    BOARD_DEFS
        .iter()
        .map(|def| {
            let mut rows = rows_for(def.id, &mut rows_by_id);
            rows.truncate(def.limit);
            Leaderboard { def, rows }
        })
        .collect()
}

/// The empty result set: every configured board with zero rows.
pub fn empty_boards() -> Vec<Leaderboard> {
    assemble(Vec::new())
}

/// Build all five boards from flat transaction rows. Field names are resolved
/// once for the whole payload.
pub fn build_from_rows(rows: &[Value], table: &RoleTable) -> Vec<Leaderboard> {
    let keys = ResolvedKeys::resolve(rows, table);

    let vendedores = build_groups(
        rows,
        keys.vendor,
        keys.team,
        &GroupOptions {
            multi_label: "VARIAS EQUIPES",
            name_formatter: Some(format_vendor_name_with_company),
            meta_formatter: Some(format_name),
            value_key: keys.value,
            image_key: Some(keys.image),
        },
    );
    let supervisores = build_groups(
        rows,
        keys.team,
        keys.franchise,
        &GroupOptions {
            multi_label: "VARIAS FRANQUIAS",
            name_formatter: Some(format_after_colon),
            meta_formatter: Some(format_name),
            value_key: keys.value,
            image_key: None,
        },
    );
    let company_key = table.candidates(FieldRole::CompanyLabel)[0];
    let gerentes: Vec<GroupedEntry> = build_groups(
        rows,
        keys.franchise,
        company_key,
        &GroupOptions {
            multi_label: "VARIAS EMPRESAS",
            name_formatter: None,
            meta_formatter: Some(format_name),
            value_key: keys.value,
            image_key: None,
        },
    )
    .into_iter()
    .map(|mut entry| {
        // Manager rows show how many proposals the franchise closed, not the
        // company label used for conflict tracking.
        entry.meta = format_count_label(entry.count);
        entry
    })
    .collect();

    let vendor_only_options = || GroupOptions {
        multi_label: "VARIAS EQUIPES",
        name_formatter: Some(format_vendor_name_only),
        meta_formatter: Some(format_name),
        value_key: keys.value,
        image_key: Some(keys.image),
    };
    let port_rows = filter_rows_by_product(rows, keys.product, &PORTABILIDADE_SET);
    let portabilidade = build_groups(&port_rows, keys.vendor, keys.team, &vendor_only_options());
    let novo_rows = filter_rows_by_product(rows, keys.product, &NOVO_SET);
    let novo = build_groups(&novo_rows, keys.vendor, keys.team, &vendor_only_options());

    assemble(vec![
        ("vendedores", vendedores),
        ("supervisores", supervisores),
        ("gerentes", gerentes),
        ("portabilidade", portabilidade),
        ("novo", novo),
    ])
}

struct ListConfig {
    name_key: &'static str,
    meta_key: Option<&'static str>,
    value_key: &'static str,
    image_key: Option<&'static str>,
    name_formatter: Option<fn(&str) -> String>,
    counted: bool,
}

/// Read the monetary value for one pre-aggregated item: the configured key
/// first, then the usual monetary candidates.
fn list_value(item: &Value, value_key: &str, table: &RoleTable) -> f64 {
    if let Some(v) = item.get(value_key) {
        if has_row_value(v) {
            return parse_numeric(v);
        }
    }
    for key in table.candidates(FieldRole::MonetaryValue) {
        if let Some(v) = item.get(*key) {
            if has_row_value(v) {
                return parse_numeric(v);
            }
        }
    }
    0.0
}

fn make_list_rows(list: &[Value], config: &ListConfig, table: &RoleTable) -> Vec<GroupedEntry> {
    let count_key = resolve_row_key(list, table.candidates(FieldRole::ProposalCount));
    let mut rows: Vec<GroupedEntry> = list
        .iter()
        .filter_map(|item| {
            let raw_name = crate::rows::row_str(item, config.name_key);
            let name = match config.name_formatter {
                Some(f) => f(&raw_name),
                None => format_name(&raw_name),
            };
            if name.is_empty() {
                return None;
            }
            let value = list_value(item, config.value_key, table);
            let image = config
                .image_key
                .and_then(|key| item.get(key))
                .and_then(Value::as_str)
                .map(normalize_whitespace)
                .unwrap_or_default();
            let (meta, count) = if config.counted {
                let count = count_key
                    .and_then(|key| item.get(key))
                    .map(parse_numeric)
                    .unwrap_or(0.0)
                    .round()
                    .max(0.0) as u64;
                (format_count_label(count), count.max(1))
            } else {
                let meta = config
                    .meta_key
                    .map(|key| format_name(&crate::rows::row_str(item, key)))
                    .unwrap_or_default();
                (meta, 1)
            };
            Some(GroupedEntry {
                name,
                meta,
                value,
                count,
                image,
            })
        })
        .collect();
    rows.sort_by(|a, b| b.value.total_cmp(&a.value));
    rows
}

/// Build the boards from pre-aggregated lists. The product boards have no
/// transaction-level rows to filter on this path and stay empty.
pub fn build_from_lists(lists: &RankingLists, table: &RoleTable) -> Vec<Leaderboard> {
    let vendedores = make_list_rows(
        &lists.vendors,
        &ListConfig {
            name_key: "vendedor_nome",
            meta_key: Some("equipe_nome"),
            value_key: "valor_referencia",
            image_key: Some("imagem_perfil"),
            name_formatter: Some(format_vendor_name_with_company),
            counted: false,
        },
        table,
    );
    let supervisores = make_list_rows(
        &lists.teams,
        &ListConfig {
            name_key: "equipe_nome",
            meta_key: Some("franquia_nome"),
            value_key: "valor_referencia",
            image_key: None,
            name_formatter: Some(format_after_colon),
            counted: false,
        },
        table,
    );
    let gerentes = make_list_rows(
        &lists.franchises,
        &ListConfig {
            name_key: "franquia_nome",
            meta_key: None,
            value_key: "valor_referencia",
            image_key: None,
            name_formatter: None,
            counted: true,
        },
        table,
    );

    assemble(vec![
        ("vendedores", vendedores),
        ("supervisores", supervisores),
        ("gerentes", gerentes),
    ])
}

/// One ingest cycle: classify the payload and produce the full ordered board
/// set. Never fails; unrecognized payloads give empty boards.
pub fn build_leaderboards(payload: &Value, table: &RoleTable) -> Vec<Leaderboard> {
    match detect(payload, table) {
        Shape::FlatRows(rows) => build_from_rows(&rows, table),
        Shape::Lists(lists) => build_from_lists(&lists, table),
        Shape::Unrecognized => empty_boards(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> RoleTable {
        RoleTable::default()
    }

    fn board<'a>(boards: &'a [Leaderboard], id: &str) -> &'a Leaderboard {
        boards.iter().find(|b| b.id() == id).unwrap()
    }

    fn flat_row(vendor: &str, team: &str, franchise: &str, product: &str, value: &str) -> Value {
        json!({
            "vendedor_nome": vendor,
            "equipe_nome": team,
            "franquia_nome": franchise,
            "produto_nome": product,
            "valor_referencia": value,
        })
    }

    #[test]
    fn product_filter_is_accent_insensitive() {
        let rows = vec![
            json!({"produto_nome": "CARTAO COM SAQUE"}),
            json!({"produto_nome": "cartão com saque"}),
            json!({"produto_nome": "Margem Livre"}),
            json!({"produto_nome": "Consignado"}),
            json!({"produto_nome": ""}),
            json!({"valor": 1}),
        ];
        let kept = filter_rows_by_product(&rows, "produto_nome", &NOVO_SET);
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn flat_rows_produce_all_five_boards() {
        let rows = json!({"rows": [
            flat_row("joão da silva", "SUP: Carla", "Franquia Sul", "Portabilidade", "1.000,00"),
            flat_row("joão da silva", "SUP: Carla", "Franquia Sul", "Margem Livre", "500,00"),
            flat_row("ana pereira", "SUP: Bruno", "Franquia Norte", "Portabilidade", "2.000,00"),
        ]});
        let boards = build_leaderboards(&rows, &table());
        assert_eq!(boards.len(), 5);

        let vendedores = board(&boards, "vendedores");
        assert_eq!(vendedores.rows[0].name, "ANA PEREIRA");
        assert!((vendedores.rows[0].value - 2000.0).abs() < 1e-9);
        assert_eq!(vendedores.rows[1].name, "JOÃO SILVA");
        assert!((vendedores.rows[1].value - 1500.0).abs() < 1e-9);
        assert_eq!(vendedores.rows[1].count, 2);

        let supervisores = board(&boards, "supervisores");
        assert_eq!(supervisores.rows[0].name, "BRUNO");
        assert_eq!(supervisores.rows[0].meta, "FRANQUIA NORTE");

        let gerentes = board(&boards, "gerentes");
        assert_eq!(gerentes.rows[0].meta, "1 proposta");
        assert_eq!(gerentes.rows[1].meta, "2 propostas");

        let portabilidade = board(&boards, "portabilidade");
        assert_eq!(portabilidade.rows.len(), 2);
        assert_eq!(portabilidade.rows[0].name, "ANA PEREIRA");

        let novo = board(&boards, "novo");
        assert_eq!(novo.rows.len(), 1);
        assert_eq!(novo.rows[0].name, "JOÃO SILVA");
        assert!((novo.rows[0].value - 500.0).abs() < 1e-9);
    }

    #[test]
    fn boards_are_truncated_to_their_limits() {
        let rows: Vec<Value> = (0..20)
            .map(|i| {
                flat_row(
                    &format!("vendedor {i}"),
                    &format!("equipe {i}"),
                    &format!("franquia {i}"),
                    "Portabilidade",
                    &format!("{}", 100 + i),
                )
            })
            .collect();
        let boards = build_leaderboards(&json!(rows), &table());
        assert_eq!(board(&boards, "vendedores").rows.len(), 10);
        assert_eq!(board(&boards, "supervisores").rows.len(), 5);
        assert_eq!(board(&boards, "gerentes").rows.len(), 5);
        assert_eq!(board(&boards, "portabilidade").rows.len(), 10);
    }

    #[test]
    fn aggregated_lists_fill_entity_boards_and_leave_product_boards_empty() {
        let payload = json!({
            "vendedores": [
                {"vendedor_nome": "maria souza/Filial X", "equipe_nome": "SUP: Davi",
                 "valor_referencia": "300,00", "imagem_perfil": "maria.jpg"},
                {"vendedor_nome": "pedro lima", "valor": 700}
            ],
            "equipes": [
                {"equipe_nome": "SUP: Davi", "franquia_nome": "Franquia Leste", "valor_referencia": 900}
            ],
            "franquias": [
                {"franquia_nome": "Franquia Leste", "valor_referencia": 900, "qtde_propostas": 4}
            ]
        });
        let boards = build_leaderboards(&payload, &table());

        let vendedores = board(&boards, "vendedores");
        assert_eq!(vendedores.rows[0].name, "PEDRO LIMA");
        assert_eq!(vendedores.rows[1].name, "MARIA SOUZA / FILIAL X");
        assert_eq!(vendedores.rows[1].image, "maria.jpg");

        let supervisores = board(&boards, "supervisores");
        assert_eq!(supervisores.rows[0].name, "DAVI");
        assert_eq!(supervisores.rows[0].meta, "FRANQUIA LESTE");

        let gerentes = board(&boards, "gerentes");
        assert_eq!(gerentes.rows[0].meta, "4 propostas");
        assert_eq!(gerentes.rows[0].count, 4);

        assert!(board(&boards, "portabilidade").rows.is_empty());
        assert!(board(&boards, "novo").rows.is_empty());
    }

    #[test]
    fn unrecognized_payload_yields_empty_boards() {
        let boards = build_leaderboards(&json!({"status": "ok", "mensagem": "sem dados"}), &table());
        assert_eq!(boards.len(), 5);
        assert!(boards.iter().all(|b| b.rows.is_empty()));
    }

    #[test]
    fn identical_payloads_build_identical_boards() {
        let payload = json!({"rows": [
            flat_row("b b", "t", "f", "Portabilidade", "50"),
            flat_row("a a", "t", "f", "Portabilidade", "50"),
        ]});
        let first = build_leaderboards(&payload, &table());
        let second = build_leaderboards(&payload, &table());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.rows, b.rows);
        }
        // exact tie keeps first-seen order
        let vendedores = board(&first, "vendedores");
        assert_eq!(vendedores.rows[0].name, "B B");
    }

    #[test]
    fn values_are_finite_and_counts_match_contributions() {
        let payload = json!([
            flat_row("v", "t", "f", "Portabilidade", "not-a-number"),
            flat_row("v", "t", "f", "Portabilidade", "10,50"),
        ]);
        let boards = build_leaderboards(&payload, &table());
        let entry = &board(&boards, "vendedores").rows[0];
        assert!(entry.value.is_finite());
        assert!((entry.value - 10.5).abs() < 1e-9);
        assert_eq!(entry.count, 2);
    }
}
