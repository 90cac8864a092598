//! Export identifier rules
//!
//! Registry ids become binding names in `export const <id> = ...;`, so they
//! must be valid identifiers in the module's language and must not collide
//! with a reserved word. Characters follow the Unicode `ID_Start` /
//! `ID_Continue` classes that the ECMAScript grammar uses.

use unicode_ident::{is_xid_continue, is_xid_start};

/// Words that cannot be used as a binding name in a TypeScript/JavaScript
/// module (modules are always strict mode)
const RESERVED_WORDS: &[&str] = &[
    "arguments",
    "await",
    "break",
    "case",
    "catch",
    "class",
    "const",
    "continue",
    "debugger",
    "default",
    "delete",
    "do",
    "else",
    "enum",
    "eval",
    "export",
    "extends",
    "false",
    "finally",
    "for",
    "function",
    "if",
    "implements",
    "import",
    "in",
    "instanceof",
    "interface",
    "let",
    "new",
    "null",
    "package",
    "private",
    "protected",
    "public",
    "return",
    "static",
    "super",
    "switch",
    "this",
    "throw",
    "true",
    "try",
    "typeof",
    "var",
    "void",
    "while",
    "with",
    "yield",
];

pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

const ZWNJ: char = '\u{200C}';
const ZWJ: char = '\u{200D}';

fn is_identifier_start(c: char) -> bool {
    c == '_' || c == '$' || is_xid_start(c)
}

fn is_identifier_part(c: char) -> bool {
    c == '$' || c == ZWNJ || c == ZWJ || is_xid_continue(c)
}

/// Check whether `name` can be emitted as an exported binding
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_identifier_start(first) => {}
        _ => return false,
    }
    chars.all(is_identifier_part) && !is_reserved_word(name)
}
