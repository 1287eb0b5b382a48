//! Lenient string parsing.
//!
//! All functions accept surrounding whitespace and trailing garbage,
//! and return zero when nothing can be parsed.

/// Parses the longest `[+-]?[0-9]+` prefix.
///
/// Returns `0` if there is no digit or the number does not fit into `i128`.
pub fn parse_int(s: &str) -> i128 {
    let s = s.trim_start();
    let bytes = s.as_bytes();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return 0;
    }

    s[..end].parse::<i128>().unwrap_or(0)
}

/// Parses a float, or the longest float-looking prefix.
///
/// `inf`, `-inf` and `NaN` are accepted as written by `Display`.
pub fn parse_float(s: &str) -> f64 {
    let s = s.trim();
    if let Ok(value) = s.parse::<f64>() {
        return value;
    }

    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let mantissa_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end == mantissa_start || &s[mantissa_start..end] == "." {
        return 0.0;
    }

    // Exponent only counts if at least one digit follows.
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().unwrap_or(0.0)
}

/// Parses a boolean: `true` in any case, or a non-zero integer.
pub fn parse_bool(s: &str) -> bool {
    let s = s.trim();
    s.eq_ignore_ascii_case("true") || parse_int(s) != 0
}

#[cfg(test)]
mod tests {
    use super::{parse_bool, parse_float, parse_int};

    #[test]
    fn int_prefix() {
        assert_eq!(parse_int("42"), 42);
        assert_eq!(parse_int("  -17abc"), -17);
        assert_eq!(parse_int("+8"), 8);
        assert_eq!(parse_int("abc"), 0);
        assert_eq!(parse_int("-"), 0);
        assert_eq!(parse_int(""), 0);
    }

    #[test]
    fn float_prefix() {
        assert_eq!(parse_float("1.5"), 1.5);
        assert_eq!(parse_float(" 2.25xyz"), 2.25);
        assert_eq!(parse_float("3e2"), 300.0);
        assert_eq!(parse_float("4e"), 4.0);
        assert_eq!(parse_float(".5"), 0.5);
        assert_eq!(parse_float("."), 0.0);
        assert_eq!(parse_float("hello"), 0.0);
        assert!(parse_float("inf").is_infinite());
        assert!(parse_float("NaN").is_nan());
    }

    #[test]
    fn bool_forms() {
        assert!(parse_bool("true"));
        assert!(parse_bool("TRUE"));
        assert!(parse_bool("1"));
        assert!(parse_bool("-3"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool("yes"));
    }
}
