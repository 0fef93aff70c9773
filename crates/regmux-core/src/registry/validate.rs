//! Name and URL rules for registry entries.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use super::RegistryError;

/// Pattern every registry name must match.
pub const NAME_PATTERN: &str = r"^[A-Za-z0-9_]+$";

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(NAME_PATTERN).expect("unable to compile registry name regex"));

pub fn validate_name(name: &str) -> Result<(), RegistryError> {
    if NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(RegistryError::InvalidName {
            name: name.to_string(),
        })
    }
}

/// Registry URLs must be absolute `http`/`https` URLs with a host.
pub fn validate_url(raw: &str) -> Result<(), RegistryError> {
    let invalid = |reason: String| RegistryError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(invalid(format!(
                "scheme must be http or https, got '{}'",
                other
            )));
        }
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }

    Ok(())
}
