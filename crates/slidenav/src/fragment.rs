use regex::Regex;
use std::sync::LazyLock;

static INDEX_FRAGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\d+)").expect("valid fragment regex"));

/// Slide index named by a URL fragment, clamped to the deck.
///
/// The first `#<digits>` run wins. Values too large to represent clamp to the
/// last slide like any other out-of-range index.
pub fn parse_index(fragment: &str, slide_count: usize) -> Option<usize> {
    if slide_count == 0 {
        return None;
    }
    let digits = INDEX_FRAGMENT.captures(fragment)?.get(1)?.as_str();
    let n = digits.parse::<usize>().unwrap_or(usize::MAX);
    Some(n.min(slide_count - 1))
}

pub fn format_index(index: usize) -> String {
    format!("#{index}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        assert_eq!(parse_index("#0", 5), Some(0));
        assert_eq!(parse_index("#4", 5), Some(4));
    }

    #[test]
    fn test_parse_clamps() {
        assert_eq!(parse_index("#9", 5), Some(4));
        assert_eq!(parse_index("#123456789012345678901234567890", 5), Some(4));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert_eq!(parse_index("", 5), None);
        assert_eq!(parse_index("#", 5), None);
        assert_eq!(parse_index("#intro", 5), None);
        assert_eq!(parse_index("#-2", 5), None);
        assert_eq!(parse_index("#3", 0), None);
    }

    #[test]
    fn test_parse_takes_first_digit_run() {
        assert_eq!(parse_index("#2abc", 5), Some(2));
        assert_eq!(parse_index("#intro#3", 5), Some(3));
    }

    #[test]
    fn test_format() {
        assert_eq!(format_index(7), "#7");
        assert_eq!(parse_index(&format_index(3), 5), Some(3));
    }
}
