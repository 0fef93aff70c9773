//! Registry settings in package-manager rc files.
//!
//! Each supported file syntax is one variant of [`RcFormat`]; all of them
//! expose the same read/rewrite pair and leave unrelated settings intact.

mod bunfig;
mod npmrc;
mod yarnrc;

use anyhow::Result;

/// Syntax of a package manager's user config file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RcFormat {
    /// `key=value` lines (`~/.npmrc`, shared by npm and pnpm)
    Npmrc,
    /// `key "value"` lines (`~/.yarnrc`)
    Yarnrc,
    /// TOML with an `[install]` table (`~/.bunfig.toml`)
    Bunfig,
}

impl RcFormat {
    /// Extract the configured registry URL, if any.
    pub fn parse(self, content: &str) -> Result<Option<String>> {
        match self {
            RcFormat::Npmrc => Ok(npmrc::parse(content)),
            RcFormat::Yarnrc => Ok(yarnrc::parse(content)),
            RcFormat::Bunfig => bunfig::parse(content),
        }
    }

    /// Rewrite `existing` so that it points at `url`.
    pub fn write(self, existing: &str, url: &str) -> Result<String> {
        match self {
            RcFormat::Npmrc => Ok(npmrc::write(existing, url)),
            RcFormat::Yarnrc => Ok(yarnrc::write(existing, url)),
            RcFormat::Bunfig => bunfig::write(existing, url),
        }
    }
}

/// Replace the first line accepted by `is_registry_line` or append `new_line`.
///
/// Later duplicates of the registry line are dropped.
fn replace_or_append(
    existing: &str,
    new_line: &str,
    is_registry_line: impl Fn(&str) -> bool,
) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut replaced = false;

    for line in existing.lines() {
        if is_registry_line(line.trim()) {
            if !replaced {
                lines.push(new_line.to_string());
                replaced = true;
            }
            continue;
        }
        lines.push(line.to_string());
    }

    if !replaced {
        while lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(new_line.to_string());
    }

    let mut content = lines.join("\n");
    content.push('\n');
    content
}

fn is_comment(line: &str) -> bool {
    line.starts_with('#') || line.starts_with(';')
}

fn unquote(value: &str) -> &str {
    value.trim().trim_matches(|c| c == '"' || c == '\'')
}
