//! Followers text normalization.

use std::sync::LazyLock;

use regex::Regex;

static NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\d.KM]").expect("static regex is valid"));

/// Turn followers text such as `"20K"`, `"1.5M"`, `"3,700"` or `"12 345"`
/// into a plain integer string.
///
/// Text that cannot be interpreted is returned trimmed but otherwise as is,
/// so the skip rule can see it is not a number.
pub fn normalize_followers(text: &str) -> String {
    let trimmed = text.trim();
    let upper = trimmed.to_uppercase().replace(',', "");
    let cleaned = NOISE.replace_all(&upper, "");

    let (number, multiplier) = if let Some(n) = cleaned.strip_suffix('K') {
        (n, 1_000.0)
    } else if let Some(n) = cleaned.strip_suffix('M') {
        (n, 1_000_000.0)
    } else {
        (cleaned.as_ref(), 1.0)
    };

    if number.is_empty() {
        return trimmed.to_string();
    }

    if multiplier == 1.0 {
        return match number.parse::<u64>() {
            Ok(n) => n.to_string(),
            Err(_) => trimmed.to_string(),
        };
    }

    match number.parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 => ((n * multiplier).round() as u64).to_string(),
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_numbers() {
        assert_eq!(normalize_followers("5000"), "5000");
        assert_eq!(normalize_followers("3,700"), "3700");
        assert_eq!(normalize_followers("12 345"), "12345");
        assert_eq!(normalize_followers(" 42 subscribers"), "42");
    }

    #[test]
    fn test_suffixes() {
        assert_eq!(normalize_followers("20K"), "20000");
        assert_eq!(normalize_followers("20k"), "20000");
        assert_eq!(normalize_followers("20.5K"), "20500");
        assert_eq!(normalize_followers("1.5M"), "1500000");
        assert_eq!(normalize_followers("1M"), "1000000");
    }

    #[test]
    fn test_unparseable_passes_through() {
        assert_eq!(normalize_followers("N/A"), "N/A");
        assert_eq!(normalize_followers(""), "");
        assert_eq!(normalize_followers("1.2.3"), "1.2.3");
    }
}
