//! Identifier rules for platform object names.
//!
//! Unquoted identifiers are case-insensitive and resolve to upper case;
//! double-quoted identifiers are case-sensitive with `""` as an escaped quote.

/// Maximum length of an unquoted identifier (first char plus 254 more)
const MAX_IDENTIFIER_LEN: usize = 255;

/// Check whether `s` is a valid unquoted identifier (`[A-Za-z_][A-Za-z0-9_$]*`).
pub fn is_valid_unquoted_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    s.len() <= MAX_IDENTIFIER_LEN && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Check whether `s` is a valid double-quoted identifier.
///
/// Embedded double quotes must be escaped by doubling them.
pub fn is_valid_quoted_identifier(s: &str) -> bool {
    if s.len() < 2 || !s.starts_with('"') || !s.ends_with('"') {
        return false;
    }
    let inner = &s[1..s.len() - 1];
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '"' {
            if chars.peek() == Some(&'"') {
                chars.next();
            } else {
                return false;
            }
        }
    }
    true
}

/// Check whether `s` is a valid identifier, quoted or not.
pub fn is_valid_identifier(s: &str) -> bool {
    is_valid_unquoted_identifier(s) || is_valid_quoted_identifier(s)
}

/// Turn an arbitrary name into a valid identifier.
///
/// Valid identifiers are returned unchanged; anything else is wrapped in
/// double quotes with embedded quotes escaped.
pub fn to_identifier(name: &str) -> String {
    if is_valid_identifier(name) {
        return name.to_string();
    }
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Resolve an identifier to the name the platform stores.
///
/// Unquoted identifiers resolve to upper case; quoted identifiers lose their
/// quotes and have escaped quotes collapsed.
pub fn unquote_identifier(identifier: &str) -> String {
    if is_valid_unquoted_identifier(identifier) {
        return identifier.to_uppercase();
    }
    if is_valid_quoted_identifier(identifier) {
        return identifier[1..identifier.len() - 1].replace("\"\"", "\"");
    }
    identifier.to_string()
}

/// Compare two identifiers by their resolved names.
pub fn identifiers_match(a: &str, b: &str) -> bool {
    unquote_identifier(a) == unquote_identifier(b)
}

/// Split a qualified name on dots that are not inside double quotes.
pub fn split_qualified(name: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in name.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '.' if !in_quotes => {
                parts.push(&name[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&name[start..]);
    parts
}

/// Extract the schema component of a `schema.object` or `db.schema.object` name.
pub fn extract_schema(qualified_name: &str) -> Option<String> {
    let parts = split_qualified(qualified_name);
    match parts.len() {
        2 => Some(parts[0].to_string()),
        3 => Some(parts[1].to_string()),
        _ => None,
    }
}

/// Build the quoted `LIKE` pattern that matches exactly one identifier.
///
/// The identifier is resolved first, then backslash, `_` and `%` are escaped
/// so they match literally.
pub fn identifier_to_show_like_pattern(identifier: &str) -> String {
    let name = unquote_identifier(identifier)
        .replace('\\', "\\\\")
        .replace('_', "\\\\_")
        .replace('%', "\\\\%")
        .replace('\'', "\\'");
    format!("'{}'", name)
}

/// Strip every character that cannot appear in an unquoted identifier.
pub fn clean_identifier(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
        .collect()
}

/// Append a suffix to an identifier, keeping it inside the quotes if quoted.
pub fn append_to_identifier(identifier: &str, suffix: &str) -> String {
    if is_valid_quoted_identifier(identifier) {
        let inner = &identifier[1..identifier.len() - 1];
        return format!("\"{}{}\"", inner, suffix.replace('"', "\"\""));
    }
    format!("{}{}", identifier, suffix)
}

#[cfg(test)]
#[path = "identifier_test.rs"]
mod tests;
