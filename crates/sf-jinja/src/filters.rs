//! Custom filters available in every template environment

use minijinja::{Environment, Error, ErrorKind};
use std::fs;

/// Register `read_file_content` and `procedure_from_js_file`
pub fn register(env: &mut Environment<'_>) {
    env.add_filter("read_file_content", read_file_content);
    env.add_filter("procedure_from_js_file", procedure_from_js_file);
}

/// Contents of a file, resolved against the working directory
pub fn read_file_content(file_name: String) -> Result<String, Error> {
    fs::read_to_string(&file_name).map_err(|e| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("cannot read file '{}': {}", file_name, e),
        )
    })
}

/// Wrap a CommonJS-style JavaScript file as a stored procedure body
pub fn procedure_from_js_file(file_name: String) -> Result<String, Error> {
    let code = read_file_content(file_name)?;
    Ok(format!(
        "var module = {{}};\n\
         var exports = {{}};\n\
         module.exports = exports;\n\
         (function() {{\n\
         {}\n\
         }})()\n\
         return module.exports.apply(this, arguments);",
        code
    ))
}
