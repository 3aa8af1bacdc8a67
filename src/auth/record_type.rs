use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A DNS record kind as modelled by the upstream provider.
///
/// Record bodies sent to the provider identify the kind by numeric code (`"Type": 3`) while
/// permission grants use the symbolic name (`"TXT"`). Both forms parse onto this one enum.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum RecordType {
    A,
    AAAA,
    CNAME,
    TXT,
    MX,
    Redirect,
    Flatten,
    PullZone,
    SRV,
    CAA,
    PTR,
    Script,
    NS,
}

#[derive(thiserror::Error, Debug)]
#[error("unknown record type \"{0}\"")]
pub struct UnknownRecordType(String);

impl RecordType {
    pub const ALL: [RecordType; 13] = [
        RecordType::A,
        RecordType::AAAA,
        RecordType::CNAME,
        RecordType::TXT,
        RecordType::MX,
        RecordType::Redirect,
        RecordType::Flatten,
        RecordType::PullZone,
        RecordType::SRV,
        RecordType::CAA,
        RecordType::PTR,
        RecordType::Script,
        RecordType::NS,
    ];

    /// The provider's numeric code for this kind.
    pub fn code(self) -> u64 {
        match self {
            RecordType::A => 0,
            RecordType::AAAA => 1,
            RecordType::CNAME => 2,
            RecordType::TXT => 3,
            RecordType::MX => 4,
            RecordType::Redirect => 5,
            RecordType::Flatten => 6,
            RecordType::PullZone => 7,
            RecordType::SRV => 8,
            RecordType::CAA => 9,
            RecordType::PTR => 10,
            RecordType::Script => 11,
            RecordType::NS => 12,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::AAAA => "AAAA",
            RecordType::CNAME => "CNAME",
            RecordType::TXT => "TXT",
            RecordType::MX => "MX",
            RecordType::Redirect => "REDIRECT",
            RecordType::Flatten => "FLATTEN",
            RecordType::PullZone => "PULLZONE",
            RecordType::SRV => "SRV",
            RecordType::CAA => "CAA",
            RecordType::PTR => "PTR",
            RecordType::Script => "SCRIPT",
            RecordType::NS => "NS",
        }
    }

    pub fn from_code(code: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }
}

impl FromStr for RecordType {
    type Err = UnknownRecordType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownRecordType(s.to_string()))
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for RecordType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

struct RecordTypeVisitor;

impl<'de> Visitor<'de> for RecordTypeVisitor {
    type Value = RecordType;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a record type name or numeric code")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<RecordType, E> {
        RecordType::from_code(v).ok_or_else(|| E::invalid_value(Unexpected::Unsigned(v), &self))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<RecordType, E> {
        match u64::try_from(v) {
            Ok(code) => self.visit_u64(code),
            Err(_) => Err(E::invalid_value(Unexpected::Signed(v), &self)),
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<RecordType, E> {
        v.parse()
            .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
    }
}

impl<'de> Deserialize<'de> for RecordType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RecordTypeVisitor)
    }
}
