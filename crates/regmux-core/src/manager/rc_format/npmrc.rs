//! `.npmrc` reader/writer.

use super::{is_comment, replace_or_append, unquote};

pub(super) fn parse(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_comment(line))
        .filter_map(|line| line.split_once('='))
        .filter(|(key, _)| key.trim() == "registry")
        .map(|(_, value)| unquote(value).to_string())
        .filter(|value| !value.is_empty())
        .last()
}

pub(super) fn write(existing: &str, url: &str) -> String {
    replace_or_append(existing, &format!("registry={}", url), is_registry_line)
}

fn is_registry_line(line: &str) -> bool {
    !is_comment(line)
        && line
            .split_once('=')
            .is_some_and(|(key, _)| key.trim() == "registry")
}
