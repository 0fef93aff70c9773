//! TOML parser with helpful error messages

use std::path::Path;

use super::{ConfigError, schema::RegistryDocument};

/// Parse config.toml, failing with `NotFound` if the file does not exist
pub fn parse_document(path: &Path) -> Result<RegistryDocument, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    parse_document_str(&content).map_err(|e| match e {
        ConfigError::Parse { message } => ConfigError::Parse {
            message: format!("{} ({})", message, path.display()),
        },
        other => other,
    })
}

/// Parse config.toml content from string
pub fn parse_document_str(content: &str) -> Result<RegistryDocument, ConfigError> {
    let mut document: RegistryDocument =
        toml::from_str(content).map_err(|e| enhance_toml_error(&e, content))?;

    document.validate()?;

    Ok(document)
}

/// Serialize a document to a TOML string
pub fn to_toml(document: &RegistryDocument) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(document)?)
}

/// Attach the offending line and its neighbours to a TOML error
fn enhance_toml_error(error: &toml::de::Error, content: &str) -> ConfigError {
    let line_num = error
        .span()
        .map(|span| content[..span.start.min(content.len())].matches('\n').count() + 1);

    let message = match line_num {
        Some(line_num) => format!(
            "TOML parsing error at line {}:\n{}\n\nError: {}",
            line_num,
            get_line_context(content, line_num),
            error.message()
        ),
        None => format!("TOML parsing error: {}", error.message()),
    };

    ConfigError::Parse { message }
}

/// Get context lines around an error
fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 1).min(lines.len());

    lines[start.min(end)..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
