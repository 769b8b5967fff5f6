// src/utils/url.rs

//! Link normalization utilities.

use url::Url;

/// Canonical hosts keyed by the host suffix they replace.
const CANONICAL_HOSTS: [(&str, &str); 6] = [
    ("vk.com", "vk.com"),
    ("instagram.com", "instagram.com"),
    ("rutube.ru", "rutube.ru"),
    ("tiktok.com", "www.tiktok.com"),
    ("telegram.me", "t.me"),
    ("t.me", "t.me"),
];

/// Prefix `https://` when the link carries no scheme.
///
/// # Examples
/// ```
/// use chanstat::utils::url::ensure_scheme;
///
/// assert_eq!(ensure_scheme("t.me/durov"), "https://t.me/durov");
/// assert_eq!(ensure_scheme("http://t.me/durov"), "http://t.me/durov");
/// ```
pub fn ensure_scheme(link: &str) -> String {
    let link = link.trim();
    if link.starts_with("http://") || link.starts_with("https://") {
        link.to_string()
    } else {
        format!("https://{link}")
    }
}

/// Standardize a link to `https` and the platform's canonical host.
///
/// Unparseable links are returned with only the scheme fixed.
///
/// # Examples
/// ```
/// use chanstat::utils::url::normalize_link;
///
/// assert_eq!(normalize_link("m.vk.com/club1"), "https://vk.com/club1");
/// assert_eq!(normalize_link("http://telegram.me/durov"), "https://t.me/durov");
/// ```
pub fn normalize_link(link: &str) -> String {
    let with_scheme = ensure_scheme(link);
    let mut url = match Url::parse(&with_scheme) {
        Ok(url) => url,
        Err(e) => {
            log::warn!("Could not parse link '{}', using it as is: {}", with_scheme, e);
            return with_scheme;
        }
    };

    // Only fails for cannot-be-a-base URLs, which `https://` never is.
    let _ = url.set_scheme("https");

    if let Some(host) = url.host_str().map(str::to_lowercase) {
        if let Some((_, canonical)) = CANONICAL_HOSTS
            .iter()
            .find(|(suffix, _)| host == *suffix || host.ends_with(&format!(".{suffix}")))
        {
            let _ = url.set_host(Some(*canonical));
        }
    }

    url.to_string()
}

/// Extract the channel handle (first path segment) from a link.
///
/// # Examples
/// ```
/// use chanstat::utils::url::channel_handle;
///
/// assert_eq!(channel_handle("https://t.me/durov"), Some("durov".to_string()));
/// assert_eq!(channel_handle("t.me/s/durov/"), Some("durov".to_string()));
/// assert_eq!(channel_handle("https://t.me/"), None);
/// ```
pub fn channel_handle(link: &str) -> Option<String> {
    let url = Url::parse(&ensure_scheme(link)).ok()?;
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let first = segments.next()?;
    // t.me/s/<handle> is the web preview of <handle>
    let handle = if first == "s" { segments.next()? } else { first };
    Some(handle.trim_start_matches('@').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_link_hosts() {
        assert_eq!(
            normalize_link("https://www.instagram.com/someone"),
            "https://instagram.com/someone"
        );
        assert_eq!(
            normalize_link("rutube.ru/channel/1/"),
            "https://rutube.ru/channel/1/"
        );
        assert_eq!(
            normalize_link("vm.tiktok.com/@user"),
            "https://www.tiktok.com/@user"
        );
        assert_eq!(normalize_link("  t.me/abc  "), "https://t.me/abc");
    }

    #[test]
    fn test_normalize_link_leaves_other_hosts() {
        assert_eq!(
            normalize_link("https://example.com/x"),
            "https://example.com/x"
        );
        // suffix match must be on a label boundary
        assert_eq!(normalize_link("https://notvk.com/x"), "https://notvk.com/x");
    }

    #[test]
    fn test_channel_handle_strips_at() {
        assert_eq!(
            channel_handle("https://t.me/@durov"),
            Some("durov".to_string())
        );
    }
}
