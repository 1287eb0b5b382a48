//! The `Name='Value' Name2='Value2'` attribute string.

use alloc::string::String;
use alloc::vec::Vec;

/// Appends `value` with `'` and `\` escaped by a backslash.
fn push_escaped(out: &mut String, value: &str) {
    for ch in value.chars() {
        if ch == '\'' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
}

/// Formats pairs as `Name='Value'`, separated by single spaces.
///
/// # Examples
///
/// ```
/// use pl_rtti::serialize::format_values;
///
/// let s = format_values([("Name", "it's"), ("Count", "3")]);
/// assert_eq!(s, r"Name='it\'s' Count='3'");
/// ```
pub fn format_values<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut out = String::new();
    for (name, value) in pairs {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(name);
        out.push_str("='");
        push_escaped(&mut out, value);
        out.push('\'');
    }
    out
}

/// Parses an attribute string into `(name, value)` pairs in order.
///
/// The parser is lenient:
/// - Values may be quoted with `'` or `"`, or unquoted up to the next whitespace.
/// - A backslash escapes the next character inside a quoted value.
/// - An unterminated quote takes the rest of the input.
/// - A name without `=` is skipped.
///
/// # Examples
///
/// ```
/// use pl_rtti::serialize::parse_values;
///
/// let pairs = parse_values(r"A='1'  B='x \'y\'' C=3 D");
/// assert_eq!(pairs, [
///     ("A".to_string(), "1".to_string()),
///     ("B".to_string(), "x 'y'".to_string()),
///     ("C".to_string(), "3".to_string()),
/// ]);
/// ```
pub fn parse_values(input: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut name = String::new();
        while let Some(c) = chars.next_if(|c| *c != '=' && !c.is_whitespace()) {
            name.push(c);
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.next_if_eq(&'=').is_none() {
            // Stray token.
            continue;
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let mut value = String::new();
        match chars.next_if(|c| *c == '\'' || *c == '"') {
            Some(quote) => {
                while let Some(c) = chars.next() {
                    if c == quote {
                        break;
                    }
                    if c == '\\' {
                        match chars.next() {
                            Some(escaped) => value.push(escaped),
                            None => value.push('\\'),
                        }
                    } else {
                        value.push(c);
                    }
                }
            }
            None => {
                while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                    value.push(c);
                }
            }
        }

        if !name.is_empty() {
            pairs.push((name, value));
        }
    }

    pairs
}

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};
    use alloc::vec::Vec;

    use super::{format_values, parse_values};

    fn owned(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn escapes_round_trip() {
        let text = format_values([("Path", r"C:\dir"), ("Quote", "'")]);
        assert_eq!(text, r"Path='C:\\dir' Quote='\''");
        assert_eq!(parse_values(&text), owned(&[("Path", r"C:\dir"), ("Quote", "'")]));
    }

    #[test]
    fn lenient_input() {
        assert_eq!(parse_values(""), owned(&[]));
        assert_eq!(parse_values("  A = '1'  "), owned(&[("A", "1")]));
        assert_eq!(parse_values("A=\"x y\""), owned(&[("A", "x y")]));
        assert_eq!(parse_values("A='open"), owned(&[("A", "open")]));
        assert_eq!(parse_values("junk A='1'"), owned(&[("A", "1")]));
        assert_eq!(parse_values("='1' B='2'"), owned(&[("B", "2")]));
        assert_eq!(parse_values("Empty=''"), owned(&[("Empty", "")]));
    }
}
