//! External documentation links, including the well-known defaults.

use crate::manifest::ExternalLink;
use folio_config::{ExternalLinkConfig, Platform, ResolvedSourceSet};

/// Kotlin standard library documentation root.
pub const KOTLIN_STDLIB_URL: &str = "https://kotlinlang.org/api/core/";

/// Android reference documentation root.
pub const ANDROID_URL: &str = "https://developer.android.com/reference/kotlin/";

/// Documentation root of a JDK release.
///
/// Releases before 11 publish a `package-list`; later ones an `element-list`.
pub fn jdk_link(version: u32) -> ExternalLink {
    if version < 11 {
        let url = format!("https://docs.oracle.com/javase/{version}/docs/api/");
        ExternalLink {
            package_list_url: format!("{url}package-list"),
            url,
        }
    } else {
        let url = format!("https://docs.oracle.com/en/java/javase/{version}/docs/api/");
        ExternalLink {
            package_list_url: format!("{url}element-list"),
            url,
        }
    }
}

/// Normalizes a configured link: the URL ends in `/` and the package list
/// defaults to `<url>package-list`. Disabled links yield `None`.
pub fn normalize_link(config: &ExternalLinkConfig) -> Option<ExternalLink> {
    if !config.enabled {
        return None;
    }
    let url = with_trailing_slash(&config.url);
    let package_list_url = config
        .package_list_url
        .clone()
        .unwrap_or_else(|| format!("{url}package-list"));
    Some(ExternalLink {
        url,
        package_list_url,
    })
}

/// Configured links followed by the enabled defaults, without duplicate URLs.
///
/// The JDK link only applies to JVM source sets.
pub fn external_links(source_set: &ResolvedSourceSet) -> Vec<ExternalLink> {
    let mut links: Vec<ExternalLink> = Vec::new();
    let mut push = |link: ExternalLink| {
        if !links.iter().any(|l| l.url == link.url) {
            links.push(link);
        }
    };

    for configured in &source_set.external_links {
        if let Some(link) = normalize_link(configured) {
            push(link);
        }
    }
    if source_set.enable_kotlin_stdlib_link {
        push(ExternalLink {
            url: KOTLIN_STDLIB_URL.to_string(),
            package_list_url: format!("{KOTLIN_STDLIB_URL}package-list"),
        });
    }
    if source_set.enable_jdk_link && source_set.platform == Platform::Jvm {
        push(jdk_link(source_set.jdk_version));
    }
    if source_set.enable_android_link {
        push(ExternalLink {
            url: ANDROID_URL.to_string(),
            package_list_url: format!("{ANDROID_URL}package-list"),
        });
    }
    links
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jdk_link_switches_at_eleven() {
        let old = jdk_link(8);
        assert_eq!(old.url, "https://docs.oracle.com/javase/8/docs/api/");
        assert!(old.package_list_url.ends_with("/package-list"));

        let new = jdk_link(17);
        assert_eq!(new.url, "https://docs.oracle.com/en/java/javase/17/docs/api/");
        assert!(new.package_list_url.ends_with("/element-list"));
    }

    #[test]
    fn normalize_adds_slash_and_default_package_list() {
        let link = normalize_link(&ExternalLinkConfig {
            url: "https://kotlinlang.org/api/kotlinx.coroutines".to_string(),
            package_list_url: None,
            enabled: true,
        })
        .unwrap();
        assert_eq!(link.url, "https://kotlinlang.org/api/kotlinx.coroutines/");
        assert_eq!(
            link.package_list_url,
            "https://kotlinlang.org/api/kotlinx.coroutines/package-list"
        );
    }

    #[test]
    fn disabled_link_is_dropped() {
        assert!(normalize_link(&ExternalLinkConfig {
            url: "https://example.com/".to_string(),
            package_list_url: None,
            enabled: false,
        })
        .is_none());
    }
}
