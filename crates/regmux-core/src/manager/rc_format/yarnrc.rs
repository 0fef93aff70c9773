//! `.yarnrc` (yarn v1) reader/writer.

use super::{is_comment, replace_or_append, unquote};

pub(super) fn parse(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_comment(line))
        .find_map(registry_value)
        .map(|value| unquote(value).to_string())
        .filter(|value| !value.is_empty())
}

pub(super) fn write(existing: &str, url: &str) -> String {
    replace_or_append(existing, &format!("registry \"{}\"", url), |line| {
        !is_comment(line) && registry_value(line).is_some()
    })
}

fn registry_value(line: &str) -> Option<&str> {
    let mut parts = line.splitn(2, char::is_whitespace);
    match (parts.next(), parts.next()) {
        (Some("registry"), Some(value)) => Some(value),
        _ => None,
    }
}
