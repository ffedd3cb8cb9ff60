// nugs-net/src/validation.rs
use nugs_common::error::{NugsError, Result};
use url::Url;

/// Parses `url_str` and checks its scheme: `https` always, `http` only when
/// `allow_insecure` is set. Unparseable input is `NugsError::Url`.
pub fn validate_url(url_str: &str, allow_insecure: bool) -> Result<Url> {
    let url = Url::parse(url_str)?;
    match url.scheme() {
        "https" => Ok(url),
        "http" if allow_insecure => Ok(url),
        scheme => Err(NugsError::ValidationError(format!(
            "Invalid URL scheme for '{url_str}': Must be https, but got '{scheme}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn https_only_by_default() {
        assert!(validate_url("https://api.nuget.org/v3/index.json", false).is_ok());
        assert!(matches!(
            validate_url("http://localhost:8080/x", false),
            Err(NugsError::ValidationError(_))
        ));
        assert!(validate_url("http://localhost:8080/x", true).is_ok());
        assert!(validate_url("ftp://example.test/x", true).is_err());
        assert!(matches!(
            validate_url("not a url", true),
            Err(NugsError::Url(url::ParseError::RelativeUrlWithoutBase))
        ));
    }
}
