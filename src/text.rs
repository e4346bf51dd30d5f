//! Text and numeric normalization plus display-name formatting
//!
//! This module handles:
//! - Whitespace/case canonicalization and accent-insensitive comparison keys
//! - Parsing locale-ambiguous monetary strings ("1.234,56", "R$ 900")
//! - Compacting person/vendor/team names for fixed-width display

use serde_json::Value;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Collapse whitespace runs to single spaces and trim. Empty input stays empty.
pub fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-normalize and uppercase, for display labels.
pub fn format_name(value: &str) -> String {
    normalize_whitespace(value).to_uppercase()
}

/// Comparison key: NFD-decompose, drop combining marks, uppercase.
/// "Cartão com Saque" and "CARTAO COM SAQUE" map to the same key.
pub fn normalize_key(value: &str) -> String {
    let normalized = normalize_whitespace(value);
    normalized
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_uppercase()
}

/// Parse a monetary value that may be a JSON number or a string in either
/// decimal-comma or decimal-point convention, possibly carrying a currency
/// marker. Anything unparseable contributes 0 instead of failing the cycle.
pub fn parse_numeric(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        Value::String(s) => parse_numeric_str(s),
        _ => 0.0,
    }
}

fn parse_numeric_str(raw: &str) -> f64 {
    let sanitized: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{00A0}' && *c != 'R' && *c != '$')
        .collect();
    if sanitized.is_empty() {
        return 0.0;
    }
    let normalized = if sanitized.contains(',') && sanitized.contains('.') {
        // "1.234,56": dot is a thousands separator, comma the decimal point
        sanitized.replace('.', "").replace(',', ".")
    } else if sanitized.contains(',') {
        sanitized.replace(',', ".")
    } else {
        sanitized
    };
    match normalized.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// First + last token, uppercased; middle names are dropped so long names
/// fit the board. A single token is uppercased as-is.
pub fn format_person_name(value: &str) -> String {
    let cleaned = normalize_whitespace(value);
    if cleaned.is_empty() {
        return String::new();
    }
    let parts: Vec<&str> = cleaned.split(' ').collect();
    if parts.len() == 1 {
        return parts[0].to_uppercase();
    }
    let first = parts[0].to_uppercase();
    let last = parts[parts.len() - 1].to_uppercase();
    format!("{first} {last}")
}

/// Vendor fields sometimes arrive as "name/company". Compact the person name
/// and keep the company verbatim (uppercased) as a suffix.
pub fn format_vendor_name_with_company(value: &str) -> String {
    let mut halves = value.splitn(2, '/');
    let name = format_person_name(halves.next().unwrap_or(""));
    let company = halves.next().map(format_name).unwrap_or_default();
    match (name.is_empty(), company.is_empty()) {
        (false, false) => format!("{name} / {company}"),
        (true, false) => company,
        _ => name,
    }
}

/// Person name only, discarding any "/company" suffix.
pub fn format_vendor_name_only(value: &str) -> String {
    format_person_name(value.splitn(2, '/').next().unwrap_or(""))
}

/// Team labels arrive as "SUP: Fulano"; keep the text after the first colon
/// (rejoining any later colons), or the whole string when there is none.
pub fn format_after_colon(value: &str) -> String {
    match value.split_once(':') {
        Some((_, tail)) => format_name(tail),
        None => format_name(value),
    }
}

/// Proposal-count label for franchise rows.
pub fn format_count_label(count: u64) -> String {
    match count {
        0 => "0 propostas".to_string(),
        1 => "1 proposta".to_string(),
        n => format!("{n} propostas"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn whitespace_collapses_and_trims() {
        assert_eq!(normalize_whitespace("  a \t b\n c "), "a b c");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn key_is_accent_and_case_insensitive() {
        assert_eq!(normalize_key("Cartão com Saque"), "CARTAO COM SAQUE");
        assert_eq!(normalize_key("cartao  com saque"), "CARTAO COM SAQUE");
        assert_eq!(normalize_key("São João"), "SAO JOAO");
    }

    #[test]
    fn numeric_handles_both_decimal_conventions() {
        assert_eq!(parse_numeric(&json!("1.234,56")), 1234.56);
        assert_eq!(parse_numeric(&json!("1234,56")), 1234.56);
        assert_eq!(parse_numeric(&json!("1234.56")), 1234.56);
        assert_eq!(parse_numeric(&json!("R$ 900")), 900.0);
        assert_eq!(parse_numeric(&json!("R$\u{00A0}1.500,00")), 1500.0);
    }

    #[test]
    fn numeric_degrades_to_zero() {
        assert_eq!(parse_numeric(&json!("")), 0.0);
        assert_eq!(parse_numeric(&json!("n/a")), 0.0);
        assert_eq!(parse_numeric(&Value::Null), 0.0);
        assert_eq!(parse_numeric(&json!({"x": 1})), 0.0);
    }

    #[test]
    fn numeric_passes_numbers_through() {
        assert_eq!(parse_numeric(&json!(900)), 900.0);
        assert_eq!(parse_numeric(&json!(12.5)), 12.5);
    }

    #[test]
    fn person_name_keeps_first_and_last() {
        assert_eq!(format_person_name("joão da silva"), "JOÃO SILVA");
        assert_eq!(format_person_name("ana"), "ANA");
        assert_eq!(format_person_name("  maria  clara  souza "), "MARIA SOUZA");
        assert_eq!(format_person_name(""), "");
    }

    #[test]
    fn vendor_name_splits_company_suffix() {
        assert_eq!(
            format_vendor_name_with_company("joão da silva/Corretora X"),
            "JOÃO SILVA / CORRETORA X"
        );
        assert_eq!(format_vendor_name_with_company("joão da silva"), "JOÃO SILVA");
        assert_eq!(format_vendor_name_with_company("/Corretora X"), "CORRETORA X");
        assert_eq!(format_vendor_name_only("joão da silva/Corretora X"), "JOÃO SILVA");
    }

    #[test]
    fn after_colon_keeps_tail_and_rejoins() {
        assert_eq!(format_after_colon("SUP: Fulano de Tal"), "FULANO DE TAL");
        assert_eq!(format_after_colon("a:b:c"), "B:C");
        assert_eq!(format_after_colon("Equipe Centro"), "EQUIPE CENTRO");
    }

    #[test]
    fn count_label_pluralizes() {
        assert_eq!(format_count_label(0), "0 propostas");
        assert_eq!(format_count_label(1), "1 proposta");
        assert_eq!(format_count_label(7), "7 propostas");
    }
}
