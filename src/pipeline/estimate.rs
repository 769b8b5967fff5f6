//! Rough processing time estimate for a batch of links.

use std::time::Duration;

use crate::models::Platform;

/// Expected seconds spent on one link of the given platform.
pub fn seconds_per_link(platform: Platform) -> u64 {
    match platform {
        Platform::Vk => 26,
        _ => 1,
    }
}

/// Sum of per-link estimates, detecting each link's platform from its text.
pub fn estimate_processing_time<S: AsRef<str>>(links: &[S]) -> Duration {
    let secs = links
        .iter()
        .map(|link| seconds_per_link(Platform::detect(link.as_ref())))
        .sum();
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate() {
        let links = ["https://vk.com/a", "https://t.me/b", "https://instagram.com/c", "x"];
        assert_eq!(estimate_processing_time(&links), Duration::from_secs(29));
    }

    #[test]
    fn test_estimate_empty() {
        let links: Vec<String> = Vec::new();
        assert_eq!(estimate_processing_time(&links), Duration::ZERO);
    }
}
