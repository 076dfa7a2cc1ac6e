use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors that can occur during URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// Plain http to a host that is not the local machine.
    #[error("Insecure API base URL: HTTPS required (except localhost)")]
    Insecure,
    /// The URL has no hierarchical path to append endpoints to.
    #[error("URL cannot be used as a base")]
    NotABase,
}

/// Validates the API base URL.
///
/// The bearer token travels with every request, so plain `http://` is only
/// accepted for loopback hosts (local servers and test doubles).
///
/// ```
/// use pressdesk::util::validate_api_base;
///
/// assert!(validate_api_base("https://geek.itheima.net/v1_0").is_ok());
/// assert!(validate_api_base("http://127.0.0.1:8080").is_ok());
/// assert!(validate_api_base("http://example.com/api").is_err());
/// ```
pub fn validate_api_base(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;

    match url.scheme() {
        "https" => Ok(url),
        "http" if is_loopback_host(&url) => {
            tracing::warn!(base_url = %url, "Using non-HTTPS API base URL (localhost only)");
            Ok(url)
        }
        "http" => Err(UrlValidationError::Insecure),
        scheme => Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
}

/// Validates a URL before handing it to the system opener.
///
/// Cover image URLs come from the server; anything other than http(s)
/// (`file:`, `javascript:`, custom handlers) is refused.
pub fn validate_url_for_open(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
}

fn is_loopback_host(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    if host == "localhost" {
        return true;
    }
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    host.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_https_base_accepted() {
        let url = validate_api_base("https://geek.itheima.net/v1_0").unwrap();
        assert_eq!(url.host_str(), Some("geek.itheima.net"));
    }

    #[test]
    fn test_http_loopback_accepted() {
        assert!(validate_api_base("http://localhost:3000").is_ok());
        assert!(validate_api_base("http://127.0.0.1:8080/api").is_ok());
        assert!(validate_api_base("http://[::1]:8080").is_ok());
    }

    #[test]
    fn test_http_remote_rejected() {
        assert!(matches!(
            validate_api_base("http://evil.example.com"),
            Err(UrlValidationError::Insecure)
        ));
        assert!(matches!(
            validate_api_base("http://192.168.1.10"),
            Err(UrlValidationError::Insecure)
        ));
    }

    #[test]
    fn test_other_schemes_rejected() {
        assert!(matches!(
            validate_api_base("ftp://example.com"),
            Err(UrlValidationError::UnsupportedScheme(_))
        ));
        assert!(validate_api_base("not a url").is_err());
    }

    #[test]
    fn test_open_accepts_web_urls_only() {
        assert!(validate_url_for_open("https://img.example.com/a.png").is_ok());
        assert!(validate_url_for_open("http://img.example.com/a.png").is_ok());
        assert!(validate_url_for_open("file:///etc/passwd").is_err());
        assert!(validate_url_for_open("javascript:alert(1)").is_err());
    }
}
