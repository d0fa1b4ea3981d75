//! SQL text utilities
//!
//! Literal escaping and statement splitting. Splitting uses the sqlparser
//! tokenizer so that semicolons inside string literals, quoted identifiers
//! and comments never terminate a statement.

use crate::error::{CoreError, CoreResult};
use sqlparser::dialect::SnowflakeDialect;
use sqlparser::tokenizer::{Location, Token, Tokenizer, Whitespace};

/// Escape a SQL string literal value by doubling single quotes.
///
/// This is for use inside single-quoted SQL string literals, not identifiers.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Split a SQL script into individual statements.
///
/// Statements are returned trimmed and without their terminating semicolon;
/// empty statements are dropped. When `remove_comments` is set, line and
/// block comments are removed from the returned text.
pub fn split_statements(sql: &str, remove_comments: bool) -> CoreResult<Vec<String>> {
    let dialect = SnowflakeDialect {};
    let tokens = Tokenizer::new(&dialect, sql)
        .tokenize_with_location()
        .map_err(|e| CoreError::SqlTokenize {
            message: e.to_string(),
        })?;

    let offsets = LineOffsets::new(sql);
    let mut statements = Vec::new();
    let mut current = String::new();

    for tok in &tokens {
        match &tok.token {
            Token::SemiColon => {
                push_statement(&mut statements, &current);
                current.clear();
            }
            Token::EOF => {}
            Token::Whitespace(Whitespace::SingleLineComment { .. })
            | Token::Whitespace(Whitespace::MultiLineComment(_))
                if remove_comments =>
            {
                // Keep the line break a single-line comment swallowed
                if matches!(
                    tok.token,
                    Token::Whitespace(Whitespace::SingleLineComment { .. })
                ) {
                    current.push('\n');
                }
            }
            _ => {
                let start = offsets.byte_offset(tok.span.start);
                let end = offsets.byte_offset(tok.span.end);
                current.push_str(&sql[start..end]);
            }
        }
    }
    push_statement(&mut statements, &current);
    Ok(statements)
}

fn push_statement(statements: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
}

/// Maps tokenizer locations (1-based line and character column) to byte offsets.
struct LineOffsets<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineOffsets<'a> {
    fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { text, line_starts }
    }

    fn byte_offset(&self, loc: Location) -> usize {
        let line_idx = (loc.line as usize).saturating_sub(1);
        let Some(&line_start) = self.line_starts.get(line_idx) else {
            return self.text.len();
        };
        let col = (loc.column as usize).saturating_sub(1);
        self.text[line_start..]
            .char_indices()
            .nth(col)
            .map(|(i, _)| line_start + i)
            .unwrap_or(self.text.len())
    }
}

#[cfg(test)]
#[path = "sql_utils_test.rs"]
mod tests;
