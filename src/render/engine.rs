//! Template filling and value-mapping loader.

use super::parser::{Field, Issue, extract_fields, field_pattern, lint};
use anyhow::{Context, Result, bail, ensure};
use log::{debug, warn};
use regex::{NoExpand, Regex};
use std::{collections::HashMap, fs, path::Path};

// Value mappings
pub fn load_values(values_file: &Path) -> Result<HashMap<String, String>> {
    let src = fs::read_to_string(values_file)
        .with_context(|| format!("read {}", values_file.display()))?;

    let table: toml::Table = toml::from_str(&src)
        .with_context(|| format!("parse {}", values_file.display()))?;

    let mut values = HashMap::new();
    for (key, value) in &table {
        let text = match value {
            toml::Value::String(s) => s.clone(),
            toml::Value::Integer(i) => i.to_string(),
            toml::Value::Float(f) => f.to_string(),
            toml::Value::Boolean(b) => b.to_string(),
            _ => {
                warn!("ignoring non-scalar value for '{key}' in {}", values_file.display());
                continue;
            }
        };
        values.insert(key.clone(), text);
    }

    Ok(values)
}

/// Parse a `field-N=VALUE` command-line assignment.
///
/// Only the first `=` splits; the value is kept verbatim.
pub fn parse_assignment(raw: &str) -> Result<(String, String)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("expected FIELD=VALUE, got '{raw}'");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("empty field id in '{raw}'");
    }
    Ok((key.to_owned(), value.to_owned()))
}

/// Values from an optional TOML file, overridden by `FIELD=VALUE` assignments.
pub fn merge_values(
    values_file: Option<&Path>,
    assignments: Vec<(String, String)>,
) -> Result<HashMap<String, String>> {
    let mut values = match values_file {
        Some(path) => load_values(path)?,
        None => HashMap::new(),
    };
    values.extend(assignments);
    Ok(values)
}

/// Checks run before a template is filled.
#[derive(Debug, Clone, Copy, Default)]
pub struct FillPolicy {
    /// Refuse templates whose blocks repeat title and description.
    pub strict: bool,
    /// Refuse to fill while any field lacks a value.
    pub require_all: bool,
}

/// Apply `policy` to `src`, then fill it.
///
/// With the default policy this never fails and behaves like
/// [`fill_template`], logging a warning per missing value.
pub fn fill_checked(
    src: &str,
    values: &HashMap<String, String>,
    policy: FillPolicy,
) -> Result<String> {
    if policy.strict {
        let dups: Vec<Issue> = lint(src).into_iter().filter(Issue::is_duplicate).collect();
        if let Some(first) = dups.first() {
            bail!("{} duplicate block(s): {first}", dups.len());
        }
    }

    let fields = extract_fields(src);
    let missing = missing_values(&fields, values);
    if policy.require_all {
        ensure!(
            missing.is_empty(),
            "no value for: {}",
            missing.iter().map(|f| f.id.as_str()).collect::<Vec<_>>().join(", ")
        );
    }
    for f in &missing {
        warn!("no value for {} ({}); filling with empty text", f.id, f.title);
    }
    for key in values.keys() {
        if !fields.iter().any(|f| &f.id == key) {
            warn!("no field '{key}' in template");
        }
    }

    Ok(fill_template(src, values))
}

/// Fields that have no entry in `values`.
pub fn missing_values<'a>(fields: &'a [Field], values: &HashMap<String, String>) -> Vec<&'a Field> {
    fields
        .iter()
        .filter(|f| !values.contains_key(&f.id))
        .collect()
}

/// Replace every block in `src` with its value from `values`.
///
/// Fields without a value become empty text. Each block is located by a
/// pattern rebuilt from its title and description and only the first match
/// in the partially filled text is replaced, so blocks with identical text
/// are filled in document order. Values are inserted literally.
pub fn fill_template(src: &str, values: &HashMap<String, String>) -> String {
    let mut out = src.to_owned();

    for field in extract_fields(src) {
        let value = match values.get(&field.id) {
            Some(v) => v.as_str(),
            None => {
                debug!("no value for {} ({}), substituting empty text", field.id, field.title);
                ""
            }
        };

        let pattern = match Regex::new(&field_pattern(&field)) {
            Ok(re) => re,
            Err(e) => {
                warn!("leaving {} unfilled: {e}", field.id);
                continue;
            }
        };

        out = pattern.replacen(&out, 1, NoExpand(value)).into_owned();
    }

    out
}
