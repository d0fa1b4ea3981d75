//! Error types for sf-jinja

use thiserror::Error;

/// Templating errors
#[derive(Error, Debug)]
pub enum JinjaError {
    /// Template render error (J001)
    #[error("[J001] Jinja render error: {0}")]
    RenderError(String),

    /// Undefined variable under strict rendering (J002)
    #[error("[J002] Undefined variable in template '{template}': {message}")]
    UndefinedVariable { template: String, message: String },

    /// Template file could not be found (J003)
    #[error("[J003] Template '{name}' does not exist")]
    TemplateNotFound { name: String },

    /// Template failed to parse (J004)
    #[error("[J004] Template '{template}' is not a valid jinja template: {message}")]
    SyntaxError { template: String, message: String },
}

/// Result type alias for JinjaError
pub type JinjaResult<T> = Result<T, JinjaError>;

impl JinjaError {
    /// Classify a minijinja error raised while loading or rendering `template`
    pub fn from_template(template: &str, err: minijinja::Error) -> Self {
        use minijinja::ErrorKind;

        match err.kind() {
            ErrorKind::TemplateNotFound => JinjaError::TemplateNotFound {
                name: template.to_string(),
            },
            ErrorKind::SyntaxError => JinjaError::SyntaxError {
                template: template.to_string(),
                message: err.to_string(),
            },
            ErrorKind::UndefinedError => JinjaError::UndefinedVariable {
                template: template.to_string(),
                message: err.to_string(),
            },
            _ => JinjaError::RenderError(err.to_string()),
        }
    }
}

impl From<minijinja::Error> for JinjaError {
    fn from(err: minijinja::Error) -> Self {
        let name = err.name().unwrap_or("<string>").to_string();
        JinjaError::from_template(&name, err)
    }
}
