use std::borrow::Cow;

use percent_encoding::percent_decode_str;

use super::criteria::CriteriaValue;

/// Largest integer a double represents exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Converts a raw query token into a typed criteria value.
///
/// The token is percent-decoded (falling back to the raw text if the result
/// is not valid UTF-8) and trimmed. Then, in order:
///
/// - `null`, `undefined`, `true` and `false` (any case) map to their keyword
/// - `"0"` maps to the integer zero
/// - any other finite, non-zero number maps to that number
/// - everything else becomes a case-insensitive [`CriteriaValue::Pattern`]
///
/// Zero spelled any other way (`"0.0"`, `"-0"`) is not a number here and falls
/// through to the pattern case.
pub fn coerce(token: &str) -> CriteriaValue {
    let decoded = percent_decode_str(token)
        .decode_utf8()
        .unwrap_or(Cow::Borrowed(token));
    let value = decoded.trim();

    match value.to_lowercase().as_str() {
        "null" => return CriteriaValue::Null,
        "undefined" => return CriteriaValue::Undefined,
        "true" => return CriteriaValue::Bool(true),
        "false" => return CriteriaValue::Bool(false),
        _ => {}
    }

    if value == "0" {
        return CriteriaValue::Int(0);
    }

    match parse_number(value) {
        Some(number) => number,
        None => CriteriaValue::Pattern(value.to_string()),
    }
}

fn parse_number(value: &str) -> Option<CriteriaValue> {
    let number = value.parse::<f64>().ok().filter(|n| n.is_finite() && *n != 0.0)?;
    if number.fract() == 0.0 && number.abs() <= MAX_EXACT_INTEGER {
        Some(CriteriaValue::Int(number as i64))
    } else {
        Some(CriteriaValue::Double(number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_ignore_case() {
        assert_eq!(coerce("NULL"), CriteriaValue::Null);
        assert_eq!(coerce("Undefined"), CriteriaValue::Undefined);
        assert_eq!(coerce("True"), CriteriaValue::Bool(true));
        assert_eq!(coerce("fALSE"), CriteriaValue::Bool(false));
    }

    #[test]
    fn numbers() {
        assert_eq!(coerce("0"), CriteriaValue::Int(0));
        assert_eq!(coerce("42"), CriteriaValue::Int(42));
        assert_eq!(coerce("-7"), CriteriaValue::Int(-7));
        assert_eq!(coerce("1e3"), CriteriaValue::Int(1000));
        assert_eq!(coerce("2.5"), CriteriaValue::Double(2.5));
    }

    #[test]
    fn other_zero_spellings_are_patterns() {
        assert_eq!(coerce("0.0"), CriteriaValue::Pattern("0.0".into()));
        assert_eq!(coerce("-0"), CriteriaValue::Pattern("-0".into()));
    }

    #[test]
    fn non_finite_numbers_are_patterns() {
        assert_eq!(coerce("NaN"), CriteriaValue::Pattern("NaN".into()));
        assert_eq!(coerce("Infinity"), CriteriaValue::Pattern("Infinity".into()));
    }

    #[test]
    fn decodes_and_trims() {
        assert_eq!(coerce("%20hello%20world%20"), CriteriaValue::Pattern("hello world".into()));
        assert_eq!(coerce("%20true"), CriteriaValue::Bool(true));
        assert_eq!(coerce(" 12 "), CriteriaValue::Int(12));
    }

    #[test]
    fn undecodable_input_is_kept_raw() {
        assert_eq!(coerce("%FFabc"), CriteriaValue::Pattern("%FFabc".into()));
    }

    #[test]
    fn whitespace_only_becomes_empty_pattern() {
        assert_eq!(coerce("   "), CriteriaValue::Pattern(String::new()));
    }
}
