//! URL helper functions

use crate::config::SiteConfig;

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/post/hello/") // -> "/blog/post/hello/"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Generate a full URL including the domain
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.url.trim_end_matches('/');
    format!("{}{}", base, url_for(config, path))
}

/// Path of a post detail page
pub fn post_path(slug: &str) -> String {
    format!("/post/{}/", slug)
}

/// Path of the list view after `page - 1` load-more steps
pub fn list_path(page: usize) -> String {
    if page <= 1 {
        "/".to_string()
    } else {
        format!("/page/{}/", page)
    }
}

/// Whether a uid can be used as a single path segment
pub fn is_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SiteConfig {
        SiteConfig {
            url: "https://example.com/".to_string(),
            root: "/blog/".to_string(),
            ..SiteConfig::default()
        }
    }

    #[test]
    fn test_url_for() {
        let config = test_config();
        assert_eq!(url_for(&config, "/imgs/logo.svg"), "/blog/imgs/logo.svg");
        assert_eq!(url_for(&config, ""), "/blog/");
    }

    #[test]
    fn test_full_url_for() {
        let config = test_config();
        assert_eq!(
            full_url_for(&config, "/post/hello/"),
            "https://example.com/blog/post/hello/"
        );
    }

    #[test]
    fn test_list_path() {
        assert_eq!(list_path(1), "/");
        assert_eq!(list_path(3), "/page/3/");
        assert_eq!(post_path("a-b"), "/post/a-b/");
    }

    #[test]
    fn test_is_safe_slug() {
        assert!(is_safe_slug("como-utilizar-hooks"));
        assert!(is_safe_slug("criando-um-app-cra-do-zero_2"));
        assert!(!is_safe_slug(""));
        assert!(!is_safe_slug("../etc"));
        assert!(!is_safe_slug("a/b"));
    }
}
