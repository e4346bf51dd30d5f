//! Payload shape detection
//!
//! The upstream API has shipped two shapes over time with no type tag: flat
//! transaction rows (one record per proposal, carrying vendor, team and
//! franchise identity at once) and pre-aggregated per-entity lists. This
//! module sniffs the structure of an arbitrary JSON value and classifies it,
//! degrading to `Unrecognized` instead of failing.

use serde_json::Value;

use crate::rows::{row_has_key, FieldRole, RoleTable};

/// Depth guard for the recursive array scan, so a pathological payload cannot
/// recurse unboundedly.
const MAX_SCAN_DEPTH: usize = 16;

/// Container field names probed, in priority order, when the payload is an
/// object that is not itself a record collection.
const CONTAINER_KEYS: [&str; 5] = ["rows", "data", "result", "items", "payload"];

/// Pre-aggregated per-entity lists pulled out of the payload. Any of the
/// three may be missing.
#[derive(Debug, Default)]
pub struct RankingLists {
    pub vendors: Vec<Value>,
    pub teams: Vec<Value>,
    pub franchises: Vec<Value>,
}

/// Classification of one payload.
#[derive(Debug)]
pub enum Shape {
    FlatRows(Vec<Value>),
    Lists(RankingLists),
    Unrecognized,
}

/// Depth-first collection of every array in the structure.
fn collect_arrays<'a>(value: &'a Value, depth: usize, bucket: &mut Vec<&'a Vec<Value>>) {
    if depth > MAX_SCAN_DEPTH {
        return;
    }
    match value {
        Value::Array(arr) => bucket.push(arr),
        Value::Object(obj) => {
            for nested in obj.values() {
                collect_arrays(nested, depth + 1, bucket);
            }
        }
        _ => {}
    }
}

fn is_record_collection(obj: &serde_json::Map<String, Value>) -> bool {
    !obj.is_empty() && obj.values().all(Value::is_object)
}

/// Pull the flat record candidate out of an arbitrary payload: arrays pass
/// through, JSON-in-a-string is reparsed, objects-of-records yield their
/// values, then the container candidates are probed, then the first non-empty
/// array found anywhere wins. Nothing usable yields an empty collection.
pub fn extract_rows_payload(payload: &Value) -> Vec<Value> {
    match payload {
        Value::Array(arr) => return arr.clone(),
        Value::String(raw) => {
            return match serde_json::from_str::<Value>(raw) {
                Ok(parsed) => extract_rows_payload(&parsed),
                Err(_) => Vec::new(),
            };
        }
        Value::Object(obj) => {
            if is_record_collection(obj) {
                return obj.values().cloned().collect();
            }
            for key in CONTAINER_KEYS {
                match obj.get(key) {
                    Some(Value::Array(arr)) => return arr.clone(),
                    Some(Value::Object(nested)) if is_record_collection(nested) => {
                        return nested.values().cloned().collect();
                    }
                    _ => {}
                }
            }
        }
        _ => return Vec::new(),
    }
    let mut arrays = Vec::new();
    collect_arrays(payload, 0, &mut arrays);
    arrays
        .into_iter()
        .find(|arr| !arr.is_empty())
        .cloned()
        .unwrap_or_default()
}

/// Transaction-level rows carry all three identities on a single record.
pub fn looks_like_raw_rows(rows: &[Value], table: &RoleTable) -> bool {
    rows.iter().any(|row| {
        has_any_key(row, table.candidates(FieldRole::VendorIdentity))
            && has_any_key(row, table.candidates(FieldRole::TeamIdentity))
            && has_any_key(row, table.candidates(FieldRole::FranchiseIdentity))
    })
}

fn has_any_key(row: &Value, candidates: &[&str]) -> bool {
    candidates.iter().any(|key| row_has_key(row, key))
}

fn array_has_row(arr: &[Value], pred: impl Fn(&Value) -> bool) -> bool {
    arr.iter().any(pred)
}

/// Locate the pre-aggregated lists by structural fingerprint. Returns `None`
/// when any array looks like raw transaction rows (the flat path wins) or
/// when no list matches at all.
pub fn extract_ranking_lists(payload: &Value, table: &RoleTable) -> Option<RankingLists> {
    if !payload.is_object() && !payload.is_array() {
        return None;
    }
    let mut arrays = Vec::new();
    collect_arrays(payload, 0, &mut arrays);
    if arrays.is_empty() {
        return None;
    }
    if arrays.iter().any(|arr| looks_like_raw_rows(arr, table)) {
        return None;
    }

    let vendor_keys = table.candidates(FieldRole::VendorIdentity);
    let team_keys = table.candidates(FieldRole::TeamIdentity);
    let franchise_keys = table.candidates(FieldRole::FranchiseIdentity);
    let count_keys = table.candidates(FieldRole::ProposalCount);

    let vendors = arrays
        .iter()
        .find(|arr| array_has_row(arr, |row| has_any_key(row, vendor_keys)));
    let teams = arrays.iter().find(|arr| {
        array_has_row(arr, |row| {
            has_any_key(row, team_keys)
                && has_any_key(row, franchise_keys)
                && !has_any_key(row, vendor_keys)
        })
    });
    // A franchise list with an explicit proposal count is preferred over a
    // bare one; when both exist and differ, the priority order is deciding.
    let franchises_counted = arrays.iter().find(|arr| {
        array_has_row(arr, |row| {
            has_any_key(row, franchise_keys) && has_any_key(row, count_keys)
        })
    });
    let franchises_bare = arrays.iter().find(|arr| {
        array_has_row(arr, |row| {
            has_any_key(row, franchise_keys)
                && !has_any_key(row, team_keys)
                && !has_any_key(row, vendor_keys)
        })
    });
    if let (Some(counted), Some(bare)) = (franchises_counted, franchises_bare) {
        if !std::ptr::eq(*counted, *bare) {
            eprintln!("[SHAPE] two franchise list candidates found; using the counted one");
        }
    }
    let franchises = franchises_counted.or(franchises_bare);

    if vendors.is_none() && teams.is_none() && franchises.is_none() {
        return None;
    }
    Some(RankingLists {
        vendors: vendors.map(|arr| (*arr).clone()).unwrap_or_default(),
        teams: teams.map(|arr| (*arr).clone()).unwrap_or_default(),
        franchises: franchises.map(|arr| (*arr).clone()).unwrap_or_default(),
    })
}

/// Classify one payload. Flat transaction rows win; otherwise the aggregated
/// lists are tried; otherwise the payload is unrecognized and the caller
/// renders empty boards.
pub fn detect(payload: &Value, table: &RoleTable) -> Shape {
    let rows = extract_rows_payload(payload);
    if looks_like_raw_rows(&rows, table) {
        return Shape::FlatRows(rows);
    }
    match extract_ranking_lists(payload, table) {
        Some(lists) => Shape::Lists(lists),
        None => Shape::Unrecognized,
    }
}
