use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use serde::de::{self, IgnoredAny, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, thiserror::Error)]
pub enum OdptParseError {
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// An ISO-8601 / RFC 3339 instant as published by ODPT (`dc:date`,
/// `odpt:fromBusstopPoleTime`). The default value is the zero timestamp
/// `0001-01-01T00:00:00Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OdptTimestamp(DateTime<FixedOffset>);

impl OdptTimestamp {
    pub fn parse(value: &str) -> Result<Self, OdptParseError> {
        DateTime::parse_from_rfc3339(value.trim())
            .map(Self)
            .map_err(|_| OdptParseError::InvalidTimestamp(value.to_string()))
    }

    pub fn zero() -> Self {
        let instant = NaiveDate::from_ymd_opt(1, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc().fixed_offset())
            .unwrap_or_default();
        Self(instant)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }
}

impl Default for OdptTimestamp {
    fn default() -> Self {
        Self::zero()
    }
}

/// RFC 3339 with the fractional seconds trimmed of trailing zeros and
/// dropped entirely when they are all zero.
impl fmt::Display for OdptTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.0.to_rfc3339_opts(SecondsFormat::Nanos, true);
        let Some((seconds, rest)) = rendered.split_once('.') else {
            return f.write_str(&rendered);
        };
        let digits = rest
            .find(|ch: char| !ch.is_ascii_digit())
            .unwrap_or(rest.len());
        let (fraction, offset) = rest.split_at(digits);
        let fraction = fraction.trim_end_matches('0');
        if fraction.is_empty() {
            write!(f, "{}{}", seconds, offset)
        } else {
            write!(f, "{}.{}{}", seconds, fraction, offset)
        }
    }
}

impl Serialize for OdptTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for OdptTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OdptTimestampVisitor;

        impl<'de> Visitor<'de> for OdptTimestampVisitor {
            type Value = OdptTimestamp;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("an RFC 3339 timestamp")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<OdptTimestamp, E> {
                OdptTimestamp::parse(value).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(OdptTimestampVisitor)
    }
}

/// The `title` key of a bus-stop pole. Older datasets publish a bare
/// string, newer ones a map keyed by language code.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OdptTitle {
    Text(String),
    Localized(BTreeMap<String, TitleEntry>),
    Other(IgnoredAny),
}

/// One language entry of a localized title. Entries that are not strings
/// (`null`, reading arrays) are kept as placeholders so the rest of the map
/// still resolves.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TitleEntry {
    Text(String),
    Other(IgnoredAny),
}

impl TitleEntry {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TitleEntry::Text(value) => Some(value.as_str()),
            TitleEntry::Other(_) => None,
        }
    }
}

impl OdptTitle {
    pub const JAPANESE: &'static str = "ja";

    /// The display text: the Japanese entry of a localized title or the
    /// bare string itself.
    pub fn text(&self) -> Option<&str> {
        match self {
            OdptTitle::Text(value) => Some(value.as_str()),
            OdptTitle::Localized(values) => {
                values.get(Self::JAPANESE).and_then(TitleEntry::as_str)
            }
            OdptTitle::Other(_) => None,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `odpt:Bus` record as returned by the ODPT API.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OdptBus {
    #[serde(rename = "@id", default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(rename = "@type", default, deserialize_with = "null_as_default")]
    pub record_type: String,
    #[serde(rename = "dc:date", default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(rename = "odpt:note", default, deserialize_with = "null_as_default")]
    pub note: String,
    #[serde(rename = "odpt:operator", default, deserialize_with = "null_as_default")]
    pub operator: String,
    #[serde(rename = "odpt:busNumber", default, deserialize_with = "null_as_default")]
    pub bus_number: String,
    #[serde(
        rename = "odpt:busTimetable",
        default,
        deserialize_with = "null_as_default"
    )]
    pub bus_timetable: String,
    #[serde(
        rename = "odpt:toBusstopPole",
        default,
        deserialize_with = "null_as_default"
    )]
    pub to_busstop_pole: String,
    #[serde(
        rename = "odpt:busroutePattern",
        default,
        deserialize_with = "null_as_default"
    )]
    pub busroute_pattern: String,
    #[serde(
        rename = "odpt:fromBusstopPole",
        default,
        deserialize_with = "null_as_default"
    )]
    pub from_busstop_pole: String,
    #[serde(
        rename = "odpt:fromBusstopPoleTime",
        default,
        deserialize_with = "null_as_default"
    )]
    pub from_busstop_pole_time: String,
    #[serde(
        rename = "odpt:startingBusstopPole",
        default,
        deserialize_with = "null_as_default"
    )]
    pub starting_busstop_pole: String,
    #[serde(
        rename = "odpt:terminalBusstopPole",
        default,
        deserialize_with = "null_as_default"
    )]
    pub terminal_busstop_pole: String,
}

/// `odpt:BusstopPole` record as stored in the bundled datasets.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OdptBusstopPole {
    #[serde(rename = "@id", default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(rename = "@type", default, deserialize_with = "null_as_default")]
    pub record_type: String,
    #[serde(default)]
    pub title: Option<OdptTitle>,
    #[serde(rename = "dc:date", default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(rename = "dc:title", default, deserialize_with = "null_as_default")]
    pub dc_title: String,
    #[serde(rename = "geo:long", default, deserialize_with = "null_as_default")]
    pub long: f64,
    #[serde(rename = "geo:lat", default, deserialize_with = "null_as_default")]
    pub lat: f64,
    #[serde(rename = "owl:sameAs", default, deserialize_with = "null_as_default")]
    pub same_as: String,
    #[serde(rename = "odpt:operator", default, deserialize_with = "null_as_default")]
    pub operator: Vec<String>,
}

/// Flattened vehicle location returned by `/location/busvehicle`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusVehicle {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub date: OdptTimestamp,
    pub note: String,
    pub operator: String,
    pub bus_number: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bus_timetable: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub to_busstop_pole: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub busroute_pattern: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub from_busstop_pole: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_busstop_pole_time: Option<OdptTimestamp>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub starting_busstop_pole: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub terminal_busstop_pole: String,
}

/// Flattened bus-stop pole returned by `/busstoppole`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusstopPole {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub same_as: String,
    pub date: String,
    pub title: String,
    pub long: f64,
    pub lat: f64,
    pub operator: Vec<String>,
}
