//! Address composition.
//!
//! The scheduler never builds final addresses itself. It hands the module id,
//! its raw address and its version to an [`AddressComposer`] once per emitted
//! entry.

use crate::domain::Version;

/// Turns a module's raw address into the final resolvable address.
pub trait AddressComposer {
    fn compose(&self, id: &str, address: &str, version: &Version) -> String;
}

impl<F> AddressComposer for F
where
    F: Fn(&str, &str, &Version) -> String,
{
    fn compose(&self, id: &str, address: &str, version: &Version) -> String {
        self(id, address, version)
    }
}

/// Default query parameter carrying the version.
pub const DEFAULT_VERSION_PARAM: &str = "ver";

/// Appends the version as a query parameter (`?ver=1.0`, or `&ver=1.0` when
/// the address already has a query string).
#[derive(Debug, Clone)]
pub struct VersionQueryComposer {
    /// Version used for modules registered with [`Version::Ambient`]
    ambient_version: Option<String>,
    /// Query parameter name
    param: String,
}

impl VersionQueryComposer {
    pub fn new(ambient_version: Option<String>) -> Self {
        Self {
            ambient_version: ambient_version.filter(|v| !v.is_empty()),
            param: DEFAULT_VERSION_PARAM.to_string(),
        }
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = param.into();
        self
    }

    fn version_for<'a>(&'a self, version: &'a Version) -> Option<&'a str> {
        match version {
            Version::Ambient => self.ambient_version.as_deref(),
            Version::Unversioned => None,
            Version::Tag(tag) if tag.is_empty() => None,
            Version::Tag(tag) => Some(tag.as_str()),
        }
    }
}

impl Default for VersionQueryComposer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl AddressComposer for VersionQueryComposer {
    fn compose(&self, _id: &str, address: &str, version: &Version) -> String {
        let Some(version) = self.version_for(version) else {
            return address.to_string();
        };

        let (base, fragment) = match address.split_once('#') {
            Some((base, fragment)) => (base, Some(fragment)),
            None => (address, None),
        };
        let separator = if base.contains('?') { '&' } else { '?' };
        let mut composed = format!("{}{}{}={}", base, separator, self.param, encode_query_value(version));
        if let Some(fragment) = fragment {
            composed.push('#');
            composed.push_str(fragment);
        }
        composed
    }
}

/// Form-encode a version value for use in a query string.
fn encode_query_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambient_version() {
        let composer = VersionQueryComposer::new(Some("6.9".to_string()));
        assert_eq!(composer.compose("m", "/m.js", &Version::Ambient), "/m.js?ver=6.9");
    }

    #[test]
    fn test_ambient_without_configured_version() {
        let composer = VersionQueryComposer::default();
        assert_eq!(composer.compose("m", "/m.js", &Version::Ambient), "/m.js");
    }

    #[test]
    fn test_unversioned() {
        let composer = VersionQueryComposer::new(Some("6.9".to_string()));
        assert_eq!(composer.compose("m", "/m.js", &Version::Unversioned), "/m.js");
    }

    #[test]
    fn test_existing_query_and_fragment() {
        let composer = VersionQueryComposer::default();
        assert_eq!(
            composer.compose("m", "/m.js?a=1#top", &Version::tag("2.0")),
            "/m.js?a=1&ver=2.0#top"
        );
    }

    #[test]
    fn test_version_is_encoded() {
        let composer = VersionQueryComposer::default().with_param("v");
        assert_eq!(composer.compose("m", "/m.js", &Version::tag("1.0 beta")), "/m.js?v=1.0+beta");
        assert_eq!(composer.compose("m", "/m.js", &Version::tag("a&b=c#d")), "/m.js?v=a%26b%3Dc%23d");
    }

    #[test]
    fn test_closure_composer() {
        let composer = |id: &str, address: &str, _v: &Version| format!("https://cdn.test{}#{}", address, id);
        assert_eq!(composer.compose("m", "/m.js", &Version::Ambient), "https://cdn.test/m.js#m");
    }
}
