//! Rendering a registry snapshot as module source
//!
//! Every entry becomes one line, `export const <id> = <json>;`, in snapshot
//! order. JSON literals are valid TypeScript/JavaScript expressions, so the
//! host compiles them back into the same values.

use crate::errors::SynthesisError;
use crate::identifier::is_valid_identifier;
use crate::registry::Snapshot;
use crate::value::ComptimeValue;

/// Render a single export declaration, including the trailing newline
pub fn export_line(id: &str, value: &ComptimeValue) -> Result<String, SynthesisError> {
    if !is_valid_identifier(id) {
        return Err(SynthesisError::InvalidIdentifier { id: id.to_string() });
    }
    if value.has_prototype_key() {
        return Err(SynthesisError::PrototypeKey { id: id.to_string() });
    }

    let literal = serde_json::to_string(value).map_err(|source| SynthesisError::Serialize {
        id: id.to_string(),
        source,
    })?;

    Ok(format!("export const {} = {};\n", id, literal))
}

/// Render the whole module. An empty snapshot gives an empty module.
///
/// The first entry that cannot be rendered fails the whole module; no
/// partial output is returned.
pub fn synthesize_module(snapshot: &Snapshot) -> Result<String, SynthesisError> {
    let mut output = String::new();
    for (id, value) in snapshot.iter() {
        output.push_str(&export_line(id, value)?);
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(entries: Vec<(&str, ComptimeValue)>) -> Snapshot {
        entries.into_iter().collect()
    }

    #[test]
    fn test_empty_snapshot() {
        assert_eq!(synthesize_module(&Snapshot::default()).unwrap(), "");
    }

    #[test]
    fn test_export_line_format() {
        let value: ComptimeValue = vec![("bar", "baz")].into_iter().collect();
        assert_eq!(
            export_line("foo", &value).unwrap(),
            "export const foo = {\"bar\":\"baz\"};\n"
        );
    }

    #[test]
    fn test_strings_are_escaped() {
        let line = export_line("quote", &ComptimeValue::from("say \"hi\"\n")).unwrap();
        assert_eq!(line, "export const quote = \"say \\\"hi\\\"\\n\";\n");
    }

    #[test]
    fn test_module_follows_snapshot_order() {
        let module = synthesize_module(&snapshot(vec![
            ("second", ComptimeValue::from(2)),
            ("first", ComptimeValue::from(1)),
        ]))
        .unwrap();

        insta::assert_snapshot!(module, @r"
        export const second = 2;
        export const first = 1;
        ");
    }

    #[test]
    fn test_invalid_identifier_fails_whole_module() {
        let result = synthesize_module(&snapshot(vec![
            ("ok", ComptimeValue::from(true)),
            ("not ok", ComptimeValue::from(false)),
        ]));

        match result {
            Err(SynthesisError::InvalidIdentifier { id }) => assert_eq!(id, "not ok"),
            other => panic!("Expected identifier error, got {:?}", other),
        }
    }

    #[test]
    fn test_prototype_key_is_not_emitted() {
        let nested: ComptimeValue = vec![("__proto__", 5)].into_iter().collect();
        let value: ComptimeValue = vec![("inner", ComptimeValue::List(vec![nested]))]
            .into_iter()
            .collect();

        match export_line("cfg", &value) {
            Err(SynthesisError::PrototypeKey { id }) => assert_eq!(id, "cfg"),
            other => panic!("Expected prototype key error, got {:?}", other),
        }
    }

    #[test]
    fn test_proto_as_string_value_is_fine() {
        let value: ComptimeValue = vec![("name", "__proto__")].into_iter().collect();
        assert_eq!(
            export_line("cfg", &value).unwrap(),
            "export const cfg = {\"name\":\"__proto__\"};\n"
        );
    }
}
