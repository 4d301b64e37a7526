/// Domain key extraction for grouping tabs
use url::Url;

/// Key used for tabs whose URL cannot be parsed
pub const UNKNOWN_DOMAIN: &str = "unknown";

/// Map a URL to the key its tab is grouped under
///
/// The key is the parsed hostname with a single leading "www." removed.
/// Parsing failures (relative, empty, garbage) map to [`UNKNOWN_DOMAIN`],
/// so this never fails. URLs that parse but carry no host (`about:blank`,
/// `file:///...`) map to the empty key.
///
/// Examples:
/// - https://www.google.com/search → google.com
/// - https://www.www.example.org → www.example.org
/// - https://mail.google.com → mail.google.com
/// - not a url → unknown
pub fn extract_key(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or_default();
            host.strip_prefix("www.").unwrap_or(host).to_string()
        }
        Err(err) => {
            log::debug!("Invalid URL {:?}: {}", url, err);
            UNKNOWN_DOMAIN.to_string()
        }
    }
}
