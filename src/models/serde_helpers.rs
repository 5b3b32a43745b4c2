//! Serde helpers for rational durations
//!
//! Durations are written as `"3/2"` strings so JSON stays readable; on input
//! both strings and plain numbers (`1.5`) are accepted.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};

use super::duration::{format_duration, from_f64, parse_duration, Duration};

struct DurationVisitor;

impl<'de> Visitor<'de> for DurationVisitor {
    type Value = Duration;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a duration such as \"3/2\", \"1\" or 0.75")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Duration, E> {
        parse_duration(v).ok_or_else(|| E::custom(format!("invalid duration '{}'", v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Duration, E> {
        u32::try_from(v)
            .map(Duration::from_integer)
            .map_err(|_| E::custom(format!("duration {} out of range", v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Duration, E> {
        u32::try_from(v)
            .map(Duration::from_integer)
            .map_err(|_| E::custom(format!("duration {} out of range", v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Duration, E> {
        from_f64(v).ok_or_else(|| E::custom(format!("invalid duration {}", v)))
    }
}

/// `#[serde(with = "duration_str")]` for a single `Duration`
pub mod duration_str {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        deserializer.deserialize_any(DurationVisitor)
    }
}

/// `#[serde(with = "duration_vec_str")]` for `Vec<Duration>`
pub mod duration_vec_str {
    use super::*;
    use serde::de::SeqAccess;
    use serde::ser::SerializeSeq;

    pub fn serialize<S: Serializer>(values: &[Duration], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            seq.serialize_element(&format_duration(*value))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Duration>, D::Error> {
        struct Elem(Duration);

        impl<'de> serde::Deserialize<'de> for Elem {
            fn deserialize<D2: Deserializer<'de>>(d: D2) -> Result<Self, D2::Error> {
                d.deserialize_any(DurationVisitor).map(Elem)
            }
        }

        struct SeqVisitor;

        impl<'de> Visitor<'de> for SeqVisitor {
            type Value = Vec<Duration>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a list of durations")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Vec<Duration>, A::Error> {
                let mut out = Vec::new();
                while let Some(Elem(value)) = seq.next_element()? {
                    out.push(value);
                }
                Ok(out)
            }
        }

        deserializer.deserialize_seq(SeqVisitor)
    }
}
