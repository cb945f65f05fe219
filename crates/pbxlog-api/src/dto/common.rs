//! Common DTOs used across the API

/// Deserialize an optional number from either a string or a number.
///
/// Anything that is not an integer becomes `None` instead of rejecting the
/// request, so a malformed query parameter falls back to its default.
pub fn deserialize_lenient_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct LenientI64Visitor;

    impl<'de> Visitor<'de> for LenientI64Visitor {
        type Value = Option<i64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an integer or a string containing an integer")
        }

        fn visit_i64<E>(self, value: i64) -> Result<Option<i64>, E>
        where
            E: de::Error,
        {
            Ok(Some(value))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Option<i64>, E>
        where
            E: de::Error,
        {
            Ok(i64::try_from(value).ok())
        }

        fn visit_f64<E>(self, _value: f64) -> Result<Option<i64>, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_bool<E>(self, _value: bool) -> Result<Option<i64>, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_str<E>(self, value: &str) -> Result<Option<i64>, E>
        where
            E: de::Error,
        {
            Ok(value.trim().parse::<i64>().ok())
        }

        fn visit_none<E>(self) -> Result<Option<i64>, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Option<i64>, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(LenientI64Visitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "deserialize_lenient_number")]
        value: Option<i64>,
    }

    fn parse_value(json: &str) -> Option<i64> {
        serde_json::from_str::<Probe>(json).unwrap().value
    }

    #[test]
    fn test_numbers_and_strings() {
        assert_eq!(parse_value(r#"{"value": 42}"#), Some(42));
        assert_eq!(parse_value(r#"{"value": -3}"#), Some(-3));
        assert_eq!(parse_value(r#"{"value": "17"}"#), Some(17));
        assert_eq!(parse_value(r#"{"value": " 8 "}"#), Some(8));
    }

    #[test]
    fn test_garbage_becomes_none() {
        assert_eq!(parse_value(r#"{"value": "abc"}"#), None);
        assert_eq!(parse_value(r#"{"value": ""}"#), None);
        assert_eq!(parse_value(r#"{"value": 1.5}"#), None);
        assert_eq!(parse_value(r#"{"value": null}"#), None);
        assert_eq!(parse_value(r#"{"value": 18446744073709551615}"#), None);
        assert_eq!(parse_value("{}"), None);
    }
}
