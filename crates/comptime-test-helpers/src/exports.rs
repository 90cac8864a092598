//! Reading synthesized modules back
//!
//! Synthesized modules consist of `export const <id> = <json>;` lines. These
//! helpers parse them back into values the way a consumer's compiler would
//! see them, so tests can compare by name instead of by text.

use indexmap::IndexMap;
use serde_json::Value;

/// Exported bindings in emission order
pub type ParsedExports = IndexMap<String, Value>;

/// Parse every export of a synthesized module
///
/// # Returns
/// The bindings, or a message naming the first malformed line
pub fn parse_exports(source: &str) -> Result<ParsedExports, String> {
    let mut exports = ParsedExports::new();

    for (index, line) in source.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let declaration = line
            .strip_prefix("export const ")
            .and_then(|rest| rest.strip_suffix(';'))
            .ok_or_else(|| format!("line {}: not an export declaration: {}", index + 1, line))?;

        let (name, literal) = declaration
            .split_once(" = ")
            .ok_or_else(|| format!("line {}: missing initializer: {}", index + 1, line))?;

        let value: Value = serde_json::from_str(literal)
            .map_err(|e| format!("line {}: bad literal for {}: {}", index + 1, name, e))?;

        if exports.insert(name.to_string(), value).is_some() {
            return Err(format!("line {}: duplicate export {}", index + 1, name));
        }
    }

    Ok(exports)
}
