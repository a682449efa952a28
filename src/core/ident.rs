//! Identifier helpers for generated names.
//!
//! Logical names land in a C header, so everything funnels through the
//! C identifier rules here.

use regex::Regex;
use std::sync::OnceLock;

/// True if `s` is a valid C identifier.
pub fn is_c_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Replace every character that cannot appear in a C identifier with `_`,
/// prefixing an extra `_` when the result would start with a digit.
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

static NUMBER_RE: OnceLock<Regex> = OnceLock::new();

/// Sort key that orders `Pin_2` before `Pin_10`: the last embedded integer,
/// then the full name.
pub fn numeric_sort_key(name: &str) -> (u64, String) {
    let re = NUMBER_RE.get_or_init(|| Regex::new(r"\d+").expect("static regex"));
    let num = re
        .find_iter(name)
        .last()
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .unwrap_or(0);
    (num, name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c_identifier_rules() {
        assert!(is_c_identifier("Timer_WAKE"));
        assert!(is_c_identifier("_pd4"));
        assert!(!is_c_identifier("3V3"));
        assert!(!is_c_identifier("Pin-3"));
        assert!(!is_c_identifier(""));
    }

    #[test]
    fn sanitize_replaces_and_prefixes() {
        assert_eq!(sanitize("Pin 3"), "Pin_3");
        assert_eq!(sanitize("DI/ON"), "DI_ON");
        assert_eq!(sanitize("3V3"), "_3V3");
        assert_eq!(sanitize(""), "_");
        assert_eq!(sanitize("Timer_WAKE"), "Timer_WAKE");
    }

    #[test]
    fn numeric_keys_order_pins_naturally() {
        let mut pins = vec!["Pin_10", "Pin_2", "Pin_1"];
        pins.sort_by_key(|p| numeric_sort_key(p));
        assert_eq!(pins, vec!["Pin_1", "Pin_2", "Pin_10"]);
        assert_eq!(numeric_sort_key("WAKE").0, 0);
    }
}
