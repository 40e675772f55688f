//! Turn a `git describe` descriptor into a PEP 440–style version.
//!
//! Two shapes are recognized:
//!
//! - `1.2.3`: a bare dotted-numeric release, returned unchanged.
//! - `v1.2.3-5-gabc1234`: a tag plus commit distance plus abbreviated hash,
//!   rewritten to `1.2.3.post5+gabc1234`.
//!
//! Anything else passes through untouched. The pass-through is not
//! validated, so a descriptor such as `release-candidate` comes back as is
//! even though it is not PEP 440 compliant.

use regex::Regex;
use std::sync::LazyLock;

static RELEASE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d[\d.]*$").unwrap());

static DESCRIBE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v(?P<version>\d[\d.]*)-(?P<count>\d+)-(?P<sha>.*)$").unwrap()
});

/// Normalize an optional raw descriptor.
///
/// - `None` → `None`
/// - `Some("1.2.3")` → `Some("1.2.3")`
/// - `Some("v1.2.3-5-gabc1234")` → `Some("1.2.3.post5+gabc1234")`
/// - `Some("not-a-version-string")` → `Some("not-a-version-string")`
pub fn normalize(raw: Option<&str>) -> Option<String> {
    raw.map(pep440_compliant)
}

/// Normalize a descriptor that is known to be present.
pub fn pep440_compliant(raw: &str) -> String {
    if RELEASE_REGEX.is_match(raw) {
        return raw.to_string();
    }
    if let Some(caps) = DESCRIBE_REGEX.captures(raw) {
        return format!("{}.post{}+{}", &caps["version"], &caps["count"], &caps["sha"]);
    }
    raw.to_string()
}

/// Whether `version` is a bare dotted-numeric release (no post or local part).
pub fn is_release(version: &str) -> bool {
    RELEASE_REGEX.is_match(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_release_unchanged() {
        assert_eq!(pep440_compliant("1.2.3"), "1.2.3");
    }

    #[test]
    fn single_component_release_unchanged() {
        assert_eq!(pep440_compliant("4"), "4");
    }

    #[test]
    fn trailing_dot_still_counts_as_release() {
        // `[\d.]*` allows it; left as is.
        assert_eq!(pep440_compliant("1.2."), "1.2.");
    }

    #[test]
    fn describe_with_distance_becomes_post_release() {
        assert_eq!(
            pep440_compliant("v1.2.3-5-gabc1234"),
            "1.2.3.post5+gabc1234"
        );
    }

    #[test]
    fn describe_with_large_distance() {
        assert_eq!(
            pep440_compliant("v4.0.1-120-g0f3e9d2"),
            "4.0.1.post120+g0f3e9d2"
        );
    }

    #[test]
    fn trailing_token_keeps_extra_hyphens() {
        assert_eq!(
            pep440_compliant("v2.0.0-3-gdeadbee-dirty"),
            "2.0.0.post3+gdeadbee-dirty"
        );
    }

    #[test]
    fn tag_with_v_prefix_but_no_distance_passes_through() {
        assert_eq!(pep440_compliant("v1.2.3"), "v1.2.3");
    }

    #[test]
    fn unrecognized_descriptor_passes_through() {
        assert_eq!(
            pep440_compliant("not-a-version-string"),
            "not-a-version-string"
        );
    }

    #[test]
    fn non_numeric_count_passes_through() {
        assert_eq!(pep440_compliant("v1.2-x-gabc"), "v1.2-x-gabc");
    }

    #[test]
    fn empty_string_passes_through() {
        assert_eq!(pep440_compliant(""), "");
    }

    #[test]
    fn absent_stays_absent() {
        assert_eq!(normalize(None), None);
    }

    #[test]
    fn present_is_normalized() {
        assert_eq!(
            normalize(Some("v2.0.0-3-gdeadbee")),
            Some("2.0.0.post3+gdeadbee".to_string())
        );
    }

    #[test]
    fn is_release_detects_bare_versions() {
        assert!(is_release("2.0.0"));
        assert!(!is_release("2.0.0.post3+gdeadbee"));
        assert!(!is_release("v2.0.0"));
    }
}
