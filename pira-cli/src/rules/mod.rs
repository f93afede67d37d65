//! Rule-document model.
//!
//! A rule document is JSON of the shape
//! `{"rules": [{"sheet": ..., "operations": [{"type": ..., "params": {...}}]}]}`.
//! Operations form a closed set. Unrecognized or malformed entries are
//! dropped with a warning while the document loads, so one bad operation
//! never takes down the rest of the document.

use serde::Deserialize;
use serde::de::Deserializer;

/// One declarative mutation applied to a sheet.
///
/// The JSON wire shape `{"type": ..., "params": {...}}` maps onto the serde
/// adjacently-tagged representation.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
pub enum Operation {
    /// Clear cell contents over an address range.
    ClearRange { range: Option<String> },
    /// Copy values and number formats from one range to another, optionally
    /// clearing the source afterward.
    CopyRange {
        source: Option<String>,
        destination: Option<String>,
        #[serde(default)]
        clear_source: bool,
    },
    /// Clear a range but keep the named cells' values (save/clear/restore).
    ClearRangeExcept {
        range: Option<String>,
        #[serde(default)]
        exceptions: Vec<String>,
    },
    /// Find the date label on an information sheet and stamp month/year next
    /// to it. Defaults to the current calendar month and year.
    UpdateInfGerais {
        month: Option<u32>,
        year: Option<i32>,
    },
    /// Anchor-search column insertion on the accumulated-results sheet.
    ProcessR2Analise {},
}

impl Operation {
    /// The wire name of the operation, as it appears in rule documents.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::ClearRange { .. } => "clear_range",
            Operation::CopyRange { .. } => "copy_range",
            Operation::ClearRangeExcept { .. } => "clear_range_except",
            Operation::UpdateInfGerais { .. } => "update_inf_gerais",
            Operation::ProcessR2Analise {} => "process_r2_analise",
        }
    }
}

/// Ordered operations for one target sheet.
#[derive(Debug, Clone, Deserialize)]
pub struct Rule {
    pub sheet: String,
    #[serde(default, deserialize_with = "deserialize_operations")]
    pub operations: Vec<Operation>,
}

/// An immutable, ordered rule document for one client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleDocument {
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl RuleDocument {
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Deserialize an operation list, dropping entries that do not parse.
fn deserialize_operations<'de, D>(deserializer: D) -> Result<Vec<Operation>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<serde_json::Value> = Vec::deserialize(deserializer)?;
    Ok(raw.into_iter().filter_map(parse_operation).collect())
}

fn parse_operation(mut entry: serde_json::Value) -> Option<Operation> {
    if !entry.is_object() {
        log::warn!("Skipping non-object operation entry: {entry}");
        return None;
    }
    let kind = entry
        .get("type")
        .and_then(|t| t.as_str())
        .unwrap_or("<missing type>")
        .to_string();

    // A missing params object is treated as empty, so parameterless
    // operations may omit it.
    if let Some(object) = entry.as_object_mut() {
        object
            .entry("params")
            .or_insert_with(|| serde_json::json!({}));
    }

    match serde_json::from_value::<Operation>(entry) {
        Ok(operation) => Some(operation),
        Err(e) => {
            log::warn!("Skipping unrecognized operation '{kind}': {e}");
            None
        }
    }
}
