//! `.bunfig.toml` reader/writer.

use anyhow::{Context, Result};
use toml_edit::{DocumentMut, Item, Table, Value, value};

pub(super) fn parse(content: &str) -> Result<Option<String>> {
    let table = load_table(content)?;

    let registry = table
        .get("install")
        .and_then(|install| install.get("registry"));

    // bun accepts either a plain URL or `{ url = "..." }`
    let url = match registry {
        Some(toml::Value::String(url)) => Some(url.clone()),
        Some(toml::Value::Table(t)) => t
            .get("url")
            .and_then(|v| v.as_str())
            .map(String::from),
        _ => None,
    };

    Ok(url.filter(|u| !u.is_empty()))
}

/// Point `[install] registry` at `url`, editing the document in place.
///
/// Comments, ordering and unrelated keys survive. A table-form registry
/// keeps its other keys (such as `token`) and only has `url` replaced.
pub(super) fn write(existing: &str, url: &str) -> Result<String> {
    let mut doc = if existing.trim().is_empty() {
        DocumentMut::new()
    } else {
        existing
            .parse::<DocumentMut>()
            .context("Failed to parse bunfig TOML")?
    };

    let install = doc
        .entry("install")
        .or_insert(Item::Table(Table::new()))
        .as_table_like_mut()
        .ok_or_else(|| anyhow::anyhow!("Expected [install] to be a table in bunfig"))?;

    match install.get_mut("registry") {
        Some(registry) if registry.is_table_like() => {
            let registry = registry
                .as_table_like_mut()
                .ok_or_else(|| anyhow::anyhow!("Expected install.registry to be a table"))?;
            match registry.get_mut("url") {
                Some(current) => replace_string(current, url),
                None => {
                    registry.insert("url", value(url));
                }
            }
        }
        Some(registry) => replace_string(registry, url),
        None => {
            install.insert("registry", value(url));
        }
    }

    Ok(doc.to_string())
}

/// Swap a value for `url`, keeping its surrounding whitespace and comments.
fn replace_string(item: &mut Item, url: &str) {
    match item.as_value_mut() {
        Some(current) => {
            let decor = current.decor().clone();
            *current = Value::from(url);
            *current.decor_mut() = decor;
        }
        None => *item = value(url),
    }
}

fn load_table(content: &str) -> Result<toml::Table> {
    if content.trim().is_empty() {
        return Ok(toml::Table::new());
    }
    content
        .parse::<toml::Table>()
        .context("Failed to parse bunfig TOML")
}
