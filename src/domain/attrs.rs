//! Loading hints attached to a module: fetch priority, document placement and
//! version.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::str::FromStr;
use thiserror::Error;

/// A declared attribute value that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {attribute} value '{value}'")]
pub struct InvalidAttribute {
    pub attribute: &'static str,
    pub value: String,
}

/// Relative fetch priority hint.
///
/// Variants are declared lowest first so `Ord` and `max` follow precedence:
/// `high` > `auto` > `low`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Auto,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Auto => "auto",
            Priority::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = InvalidAttribute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "auto" => Ok(Priority::Auto),
            "high" => Ok(Priority::High),
            other => Err(InvalidAttribute {
                attribute: "priority",
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Where in the document a load tag is emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// Head of the document
    #[default]
    Early,
    /// Footer of the document
    Late,
}

impl Placement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Placement::Early => "early",
            Placement::Late => "late",
        }
    }

    pub fn is_late(&self) -> bool {
        matches!(self, Placement::Late)
    }
}

impl FromStr for Placement {
    type Err = InvalidAttribute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "early" => Ok(Placement::Early),
            "late" => Ok(Placement::Late),
            other => Err(InvalidAttribute {
                attribute: "placement",
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Placement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Version suffix policy for a module's address.
///
/// In manifests `false` (or an absent key) selects the ambient version,
/// `null` disables the suffix and a string is used verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Version {
    /// Use the environment's ambient version
    #[default]
    Ambient,
    /// No version suffix
    Unversioned,
    /// Explicit version string
    Tag(String),
}

impl Version {
    pub fn tag(v: impl Into<String>) -> Self {
        Version::Tag(v.into())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawVersion {
    Flag(bool),
    Tag(String),
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<RawVersion>::deserialize(deserializer)? {
            None => Ok(Version::Unversioned),
            Some(RawVersion::Flag(false)) => Ok(Version::Ambient),
            Some(RawVersion::Flag(true)) => Err(de::Error::invalid_value(
                de::Unexpected::Bool(true),
                &"false, null or a version string",
            )),
            Some(RawVersion::Tag(tag)) => Ok(Version::Tag(tag)),
        }
    }
}

impl Serialize for Version {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Version::Ambient => serializer.serialize_bool(false),
            Version::Unversioned => serializer.serialize_none(),
            Version::Tag(tag) => serializer.serialize_str(tag),
        }
    }
}
