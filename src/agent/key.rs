//! Origin handling and logical key derivation
//!
//! Cache regions are keyed by absolute request URL; the manifest is keyed
//! by origin-relative path. These helpers map between the two.

use crate::error::{ShellcacheError, ShellcacheResult};
use std::fmt;

/// Key of the root document
pub const ROOT_KEY: &str = "/";

/// Version query marker appended by the app shell for cache busting
const VERSION_MARKER: &str = "?v=";

/// Scheme + host (+ port) of the application, without trailing slash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin(String);

impl Origin {
    /// Parse an origin such as `https://app.example.com`
    pub fn parse(origin: &str) -> ShellcacheResult<Self> {
        let trimmed = origin.trim().trim_end_matches('/');
        let invalid = |reason: &str| ShellcacheError::InvalidOrigin {
            origin: origin.to_string(),
            reason: reason.to_string(),
        };

        let (scheme, authority) = trimmed
            .split_once("://")
            .ok_or_else(|| invalid("expected scheme://host"))?;
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c)) {
            return Err(invalid("invalid scheme"));
        }
        if authority.is_empty() {
            return Err(invalid("missing host"));
        }
        if authority.contains(['/', '?', '#']) {
            return Err(invalid("origin must not contain a path, query or fragment"));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Absolute URL for a manifest key
    pub fn resolve(&self, key: &str) -> String {
        if key == ROOT_KEY {
            format!("{}/", self.0)
        } else {
            format!("{}/{}", self.0, key.trim_start_matches('/'))
        }
    }

    /// The part of `url` after the origin, or `None` for other origins
    fn remainder<'a>(&self, url: &'a str) -> Option<&'a str> {
        let rest = url.strip_prefix(self.0.as_str())?;
        match rest.chars().next() {
            None | Some('/') | Some('?') | Some('#') => Some(rest),
            // e.g. https://app.test.evil.com shares the prefix
            Some(_) => None,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Manifest key of a stored entry, as used when reconciling regions.
///
/// The URL is taken literally (no version stripping), so
/// `main.dart.js?v=1` does not match `main.dart.js`.
pub fn resource_key(url: &str, origin: &Origin) -> Option<String> {
    let rest = origin.remainder(url)?;
    let key = rest.strip_prefix('/').unwrap_or(rest);
    if key.is_empty() {
        Some(ROOT_KEY.to_string())
    } else {
        Some(key.to_string())
    }
}

/// Manifest key of an incoming request, as used by the router.
///
/// Strips the `?v=` version marker; the bare origin, the root path and
/// in-page navigations (`origin/#...`) all map to the root document.
pub fn request_key(url: &str, origin: &Origin) -> Option<String> {
    let rest = origin.remainder(url)?;
    let mut key = rest.strip_prefix('/').unwrap_or(rest);
    if let Some(idx) = key.find(VERSION_MARKER) {
        key = &key[..idx];
    }

    let in_page_navigation = rest.starts_with("/#");
    if key.is_empty() || in_page_navigation {
        Some(ROOT_KEY.to_string())
    } else {
        Some(key.to_string())
    }
}

/// Region key for a request URL.
///
/// Fragments never reach the server, so `origin/#/route` and `origin/`
/// share one entry; the bare origin is keyed with its trailing slash.
pub fn cache_url(url: &str, origin: &Origin) -> String {
    let without_fragment = url.split_once('#').map_or(url, |(before, _)| before);
    if without_fragment == origin.as_str() {
        origin.resolve(ROOT_KEY)
    } else {
        without_fragment.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Origin {
        Origin::parse("https://app.test").unwrap()
    }

    #[test]
    fn parse_trims_trailing_slash() {
        assert_eq!(Origin::parse("https://app.test/").unwrap().as_str(), "https://app.test");
        assert_eq!(
            Origin::parse("http://localhost:8080").unwrap().as_str(),
            "http://localhost:8080"
        );
    }

    #[test]
    fn parse_rejects_bad_origins() {
        assert!(Origin::parse("app.test").is_err());
        assert!(Origin::parse("https://").is_err());
        assert!(Origin::parse("https://app.test/sub/path").is_err());
        assert!(Origin::parse("://app.test").is_err());
    }

    #[test]
    fn resolve_keys() {
        let origin = origin();
        assert_eq!(origin.resolve("/"), "https://app.test/");
        assert_eq!(origin.resolve("main.dart.js"), "https://app.test/main.dart.js");
        assert_eq!(origin.resolve("assets/a.png"), "https://app.test/assets/a.png");
    }

    #[test]
    fn resource_key_strips_origin() {
        let origin = origin();
        assert_eq!(resource_key("https://app.test/", &origin).unwrap(), "/");
        assert_eq!(resource_key("https://app.test", &origin).unwrap(), "/");
        assert_eq!(
            resource_key("https://app.test/assets/FontManifest.json", &origin).unwrap(),
            "assets/FontManifest.json"
        );
        assert_eq!(
            resource_key("https://app.test/main.dart.js?v=42", &origin).unwrap(),
            "main.dart.js?v=42"
        );
    }

    #[test]
    fn resolve_and_resource_key_agree() {
        let origin = origin();
        for key in ["/", "index.html", "assets/fonts/MaterialIcons-Regular.otf"] {
            assert_eq!(resource_key(&origin.resolve(key), &origin).unwrap(), key);
        }
    }

    #[test]
    fn request_key_strips_version_marker() {
        let origin = origin();
        assert_eq!(
            request_key("https://app.test/main.dart.js?v=123456", &origin).unwrap(),
            "main.dart.js"
        );
        assert_eq!(
            request_key("https://app.test/main.dart.js?x=1", &origin).unwrap(),
            "main.dart.js?x=1"
        );
    }

    #[test]
    fn request_key_normalizes_root() {
        let origin = origin();
        assert_eq!(request_key("https://app.test", &origin).unwrap(), "/");
        assert_eq!(request_key("https://app.test/", &origin).unwrap(), "/");
        assert_eq!(request_key("https://app.test/#/settings", &origin).unwrap(), "/");
        assert_eq!(request_key("https://app.test/?v=7", &origin).unwrap(), "/");
    }

    #[test]
    fn other_origins_have_no_key() {
        let origin = origin();
        assert!(request_key("https://cdn.test/main.dart.js", &origin).is_none());
        assert!(request_key("https://app.test.evil.com/main.dart.js", &origin).is_none());
        assert!(resource_key("http://app.test/main.dart.js", &origin).is_none());
    }

    #[test]
    fn cache_url_drops_fragment_and_adds_root_slash() {
        let origin = origin();
        assert_eq!(cache_url("https://app.test/#/settings", &origin), "https://app.test/");
        assert_eq!(cache_url("https://app.test#top", &origin), "https://app.test/");
        assert_eq!(cache_url("https://app.test", &origin), "https://app.test/");
        assert_eq!(cache_url("https://app.test/", &origin), "https://app.test/");
        assert_eq!(
            cache_url("https://app.test/main.dart.js?v=1#x", &origin),
            "https://app.test/main.dart.js?v=1"
        );
    }
}
