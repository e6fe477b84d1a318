//! Conversions between spreadsheet cells and typed field values.
//!
//! Spreadsheet cells are free-form text, so parsing is lenient where the
//! stored data is user-edited (flags, year) and strict only where the value
//! is machine-written (timestamps).

/// Parses a flag cell.
///
/// A cell is `false` only when it is empty, equals `"false"` ignoring case
/// and surrounding whitespace, or is exactly `"0"`. Anything else is `true`.
///
/// # Examples
///
/// ```
/// use bookshelf_core::parse_boolean;
///
/// assert!(!parse_boolean(""));
/// assert!(!parse_boolean("  False  "));
/// assert!(!parse_boolean("0"));
/// assert!(parse_boolean("yes"));
/// assert!(parse_boolean("1"));
/// ```
pub fn parse_boolean(value: &str) -> bool {
    !(value.is_empty() || value.trim().eq_ignore_ascii_case("false") || value == "0")
}

/// Formats a flag the way the spreadsheet stores booleans.
pub fn format_boolean(value: bool) -> &'static str {
    if value { "TRUE" } else { "FALSE" }
}

/// Parses a year cell; empty or non-numeric input is absent.
pub fn parse_year(value: &str) -> Option<i32> {
    value.trim().parse().ok()
}

/// Parses a timestamp cell (Unix seconds).
///
/// Returns `None` when the cell is not an integer; the caller turns that into
/// a malformed-row error.
pub fn parse_timestamp(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}

/// Formats an optional number, rendering absence as the empty string.
pub fn format_optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_boolean_table() {
        let cases = [
            ("", false),
            ("0", false),
            ("false", false),
            ("FALSE", false),
            ("  False  ", false),
            ("1", true),
            ("true", true),
            ("TRUE", true),
            ("yes", true),
            ("x", true),
            // only the bare literal zero is false
            (" 0", true),
            ("00", true),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_boolean(input), expected, "input {input:?}");
        }
    }

    #[test]
    fn test_format_boolean_is_uppercase() {
        assert_eq!(format_boolean(true), "TRUE");
        assert_eq!(format_boolean(false), "FALSE");
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("1965"), Some(1965));
        assert_eq!(parse_year(" 2001 "), Some(2001));
        assert_eq!(parse_year(""), None);
        assert_eq!(parse_year("circa 1900"), None);
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("1700000000"), Some(1_700_000_000));
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_format_optional() {
        assert_eq!(format_optional(Some(2020)), "2020");
        assert_eq!(format_optional::<i32>(None), "");
    }
}
