//! Timestamp serde helpers.
//!
//! The chat server emits naive ISO-8601 timestamps (`2024-05-01T12:30:00.123456`)
//! that carry no offset; they are UTC.  Timestamps with an offset are accepted
//! too.  Serialization always writes RFC 3339.

use serde::{Deserialize, Deserializer, Serializer};
use time::format_description::FormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

const NAIVE_ISO_8601: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
);

/// Parse a timestamp in either RFC 3339 or naive ISO-8601 (assumed UTC) form.
pub fn parse(s: &str) -> Result<OffsetDateTime, time::error::Parse> {
    match OffsetDateTime::parse(s, &Rfc3339) {
        Ok(datetime) => Ok(datetime),
        Err(rfc_err) => PrimitiveDateTime::parse(s, NAIVE_ISO_8601)
            .map(PrimitiveDateTime::assume_utc)
            .map_err(|_| rfc_err),
    }
}

/// Deserialize an RFC 3339 or naive ISO-8601 string into an OffsetDateTime
pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse(&s).map_err(serde::de::Error::custom)
}

/// Serialize an OffsetDateTime into an RFC 3339 formatted string
pub fn serialize<S>(datetime: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let s = datetime
        .format(&Rfc3339)
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&s)
}

/// The same conversions for optional fields.
pub mod option {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) => super::parse(&s)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }

    pub fn serialize<S>(datetime: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match datetime {
            Some(datetime) => super::serialize(datetime, serializer),
            None => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn parses_naive_server_timestamps_as_utc() {
        assert_eq!(
            parse("2024-05-01T12:30:00.123456").unwrap(),
            datetime!(2024-05-01 12:30:00.123456 UTC)
        );
        assert_eq!(
            parse("2024-05-01T12:30:00").unwrap(),
            datetime!(2024-05-01 12:30:00 UTC)
        );
    }

    #[test]
    fn parses_rfc3339() {
        assert_eq!(
            parse("2024-05-01T12:30:00Z").unwrap(),
            datetime!(2024-05-01 12:30:00 UTC)
        );
        assert_eq!(
            parse("2024-05-01T14:30:00+02:00").unwrap(),
            datetime!(2024-05-01 12:30:00 UTC)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("yesterday").is_err());
    }
}
