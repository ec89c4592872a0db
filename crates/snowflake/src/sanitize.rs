//! Identifier sanitization
//!
//! Bare-bones stripping of SQL meta sequences from table and column names
//! before they are spliced into statement text. This is not a substitute
//! for quoting; it only removes statement terminators, quote characters and
//! line comments.

/// Strip `;`, `'` and `--` from a name.
///
/// Single characters are removed first so that sequences such as `-'-`
/// cannot collapse into a comment marker afterwards.
pub fn sanitize(name: &str) -> String {
    let stripped: String = name.chars().filter(|c| !matches!(c, ';' | '\'')).collect();
    // Non-overlapping replacement leaves at most one dash per run
    stripped.replace("--", "")
}

/// Produce a container name the warehouse will accept for a new table.
///
/// Sanitizes the name, replaces whitespace and other punctuation with `_`,
/// and prefixes names that would start with a digit.
pub fn valid_container_name(name: &str) -> String {
    let mut result: String = sanitize(name)
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if result.is_empty() {
        return "_".to_string();
    }

    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, '_');
    }

    result
}

/// Produce a column name the warehouse will accept.
///
/// Column names follow the same rules as container names.
pub fn valid_data_type_name(name: &str) -> String {
    valid_container_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_injection_attempt() {
        let result = sanitize("Robert'); DROP TABLE X;--");
        assert!(!result.contains('\''));
        assert!(!result.contains(';'));
        assert!(!result.contains("--"));
        assert_eq!(result, "Robert) DROP TABLE X");
    }

    #[test]
    fn test_sanitize_plain_name_unchanged() {
        assert_eq!(sanitize("Orders"), "Orders");
        assert_eq!(sanitize("order_lines_2024"), "order_lines_2024");
    }

    #[test]
    fn test_sanitize_keeps_single_dash() {
        assert_eq!(sanitize("a-b"), "a-b");
        assert_eq!(sanitize("a---b"), "a-b");
        assert_eq!(sanitize("a----b"), "ab");
    }

    #[test]
    fn test_sanitize_dash_quote_dash_does_not_form_comment() {
        let result = sanitize("x-'-y");
        assert!(!result.contains("--"));
        assert_eq!(result, "xy");
    }

    #[test]
    fn test_valid_container_name() {
        assert_eq!(valid_container_name("Orders"), "Orders");
        assert_eq!(valid_container_name("my orders"), "my_orders");
        assert_eq!(valid_container_name("2024 sales"), "_2024_sales");
        assert_eq!(valid_container_name("a.b-c"), "a_b_c");
        assert_eq!(valid_container_name("';"), "_");
    }

    #[test]
    fn test_valid_data_type_name() {
        assert_eq!(valid_data_type_name("organization.name"), "organization_name");
    }
}
