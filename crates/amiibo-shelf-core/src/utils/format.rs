use chrono::NaiveDate;

/// Case-insensitive substring match
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format a release date for display.
/// Absent or empty dates read "Not released"; unparseable dates are shown as-is.
pub fn format_release_date(date: Option<&str>) -> String {
    match date {
        None => "Not released".to_string(),
        Some(d) if d.trim().is_empty() => "Not released".to_string(),
        Some(d) => match NaiveDate::parse_from_str(d.get(..10).unwrap_or(d), "%Y-%m-%d") {
            Ok(parsed) => parsed.format("%B %-d, %Y").to_string(),
            Err(_) => d.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("Princess Peach", "peach"));
        assert!(contains_ignore_case("Mario", ""));
        assert!(!contains_ignore_case("Mario", "luigi"));
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("Pokémon Trainer", 8), "Pokém...");
    }

    #[test]
    fn test_format_release_date() {
        assert_eq!(format_release_date(Some("2014-11-21")), "November 21, 2014");
        assert_eq!(format_release_date(Some("2016-03-05T00:00:00")), "March 5, 2016");
        assert_eq!(format_release_date(None), "Not released");
        assert_eq!(format_release_date(Some("")), "Not released");
        assert_eq!(format_release_date(Some("soon")), "soon");
    }
}
