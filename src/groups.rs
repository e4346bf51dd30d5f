//! Grouping and aggregation
//!
//! Folds flat transaction rows into one entry per group key: values sum,
//! contributors are counted, the first non-empty image wins, and a secondary
//! "meta" label collapses to a sticky multi-source sentinel as soon as two
//! contributors disagree.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::text::{normalize_whitespace, parse_numeric};

/// One leaderboard row before truncation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupedEntry {
    pub name: String,
    pub meta: String,
    pub value: f64,
    pub count: u64,
    pub image: String,
}

/// Per-board grouping knobs. Formatters are optional; a missing name
/// formatter keeps the raw group value, a missing meta formatter keeps the
/// whitespace-normalized raw value.
pub struct GroupOptions {
    pub multi_label: &'static str,
    pub name_formatter: Option<fn(&str) -> String>,
    pub meta_formatter: Option<fn(&str) -> String>,
    pub value_key: &'static str,
    pub image_key: Option<&'static str>,
}

fn read_str(row: &Value, key: &str) -> String {
    match row.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Fold one additional contributor into an existing group entry. The meta
/// conflict rule is sticky: once two contributors disagree the label stays
/// the multi-source sentinel no matter what arrives later.
fn merge(entry: &mut GroupedEntry, value: f64, meta: &str, image: &str, multi_label: &str) {
    entry.value += value;
    entry.count += 1;
    if entry.image.is_empty() && !image.is_empty() {
        entry.image = image.to_string();
    }
    if !meta.is_empty() {
        if entry.meta.is_empty() {
            entry.meta = meta.to_string();
        } else if entry.meta != meta {
            entry.meta = multi_label.to_string();
        }
    }
}

/// Group `rows` by `group_key`, summing the monetary field and merging meta
/// attributes. Output is sorted descending by value; the sort is stable, so
/// exact ties keep first-seen order.
pub fn build_groups(
    rows: &[Value],
    group_key: &str,
    meta_key: &str,
    options: &GroupOptions,
) -> Vec<GroupedEntry> {
    let mut map: IndexMap<String, GroupedEntry> = IndexMap::new();

    for row in rows {
        let raw_name = read_str(row, group_key);
        if raw_name.trim().is_empty() {
            continue;
        }
        let raw_meta = read_str(row, meta_key);
        let meta = match options.meta_formatter {
            Some(f) => f(&raw_meta),
            None => normalize_whitespace(&raw_meta),
        };
        let value = parse_numeric(row.get(options.value_key).unwrap_or(&Value::Null));
        let image = options
            .image_key
            .map(|key| normalize_whitespace(&read_str(row, key)))
            .unwrap_or_default();

        match map.get_mut(&raw_name) {
            Some(entry) => merge(entry, value, &meta, &image, options.multi_label),
            None => {
                let name = match options.name_formatter {
                    Some(f) => f(&raw_name),
                    None => raw_name.clone(),
                };
                map.insert(
                    raw_name,
                    GroupedEntry {
                        name,
                        meta,
                        value,
                        count: 1,
                        image,
                    },
                );
            }
        }
    }

    let mut entries: Vec<GroupedEntry> = map.into_values().collect();
    entries.sort_by(|a, b| b.value.total_cmp(&a.value));
    entries
}
