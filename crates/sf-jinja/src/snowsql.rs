//! SnowSQL variable syntax
//!
//! SnowSQL scripts reference variables as `&name` or `&{name}` and escape a
//! literal ampersand as `&&`. Before rendering, these references are rewritten
//! into the CLI template syntax `&{ name }`; anything else is left untouched.

use regex::{Captures, Regex};
use std::sync::OnceLock;

fn snowsql_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"&(?:(?P<escaped>&)|(?P<named>[_A-Za-z][_A-Za-z0-9]*)|\{(?P<braced>[_A-Za-z][_A-Za-z0-9]*)\})")
            .expect("valid regex")
    })
}

/// Rewrite SnowSQL `&var` and `&{var}` references into `&{ var }`
pub fn transpile_snowsql_templates(text: &str) -> String {
    snowsql_pattern()
        .replace_all(text, |caps: &Captures| {
            if caps.name("escaped").is_some() {
                return "&".to_string();
            }
            let name = caps
                .name("named")
                .or_else(|| caps.name("braced"))
                .map_or("", |m| m.as_str());
            format!("&{{ {} }}", name)
        })
        .into_owned()
}
