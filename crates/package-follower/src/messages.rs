//! Inbound queue messages
//!
//! One [`WorkMessage`] arrives per delivery on the follower queue. The
//! producer is not under our control, so field names are accepted in both
//! camelCase and the legacy spellings it has used (`language`,
//! `packagesNames`, `analysis_id`). Missing fields take their zero value,
//! and so do a `null` ecosystem or package list. The body must be a JSON
//! object; arrays and scalars are malformed.

use serde::de::{value::MapAccessDeserializer, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// Request to import metadata for a list of packages on behalf of an analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkMessage {
    /// Analysis run whose status is tracked
    pub analysis_id: Uuid,
    /// Ecosystem tag; empty means the default ecosystem
    pub ecosystem: String,
    /// Packages to import, in order
    pub package_names: Vec<String>,
}

/// Field layout as the producer sends it
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireMessage {
    #[serde(alias = "analysis_id")]
    analysis_id: Uuid,
    #[serde(alias = "language", deserialize_with = "null_as_default")]
    ecosystem: String,
    #[serde(
        alias = "packagesNames",
        alias = "packages_names",
        deserialize_with = "null_as_default"
    )]
    package_names: Vec<String>,
}

impl From<WireMessage> for WorkMessage {
    fn from(wire: WireMessage) -> Self {
        Self {
            analysis_id: wire.analysis_id,
            ecosystem: wire.ecosystem,
            package_names: wire.package_names,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

struct WorkMessageVisitor;

impl<'de> Visitor<'de> for WorkMessageVisitor {
    type Value = WorkMessage;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a work message object")
    }

    fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        WireMessage::deserialize(MapAccessDeserializer::new(map)).map(WorkMessage::from)
    }
}

// Object bodies only; positional arrays are malformed
impl<'de> Deserialize<'de> for WorkMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(WorkMessageVisitor)
    }
}

impl WorkMessage {
    pub fn new(
        analysis_id: Uuid,
        ecosystem: impl Into<String>,
        package_names: Vec<String>,
    ) -> Self {
        Self {
            analysis_id,
            ecosystem: ecosystem.into(),
            package_names,
        }
    }

    /// Decode a raw delivery body
    pub fn from_payload(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// First eight characters of the analysis id, as used in log lines
    pub fn short_id(&self) -> String {
        self.analysis_id.simple().to_string()[..8].to_string()
    }
}

/// What to do with a delivery whose body cannot be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MalformedMessagePolicy {
    /// Dispatch a zero-valued message: status transitions are still attempted
    /// against the nil analysis id and the default ecosystem receives an
    /// empty package list.
    #[default]
    Tolerate,
    /// Drop the delivery without dispatching.
    Skip,
    /// Drop the delivery and ask the broker to dead-letter it (manual ack only).
    Reject,
}

impl std::str::FromStr for MalformedMessagePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tolerate" => Ok(Self::Tolerate),
            "skip" => Ok(Self::Skip),
            "reject" | "dead_letter" | "deadletter" => Ok(Self::Reject),
            other => Err(format!("Invalid malformed message policy: {other}")),
        }
    }
}

impl std::fmt::Display for MalformedMessagePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tolerate => write!(f, "tolerate"),
            Self::Skip => write!(f, "skip"),
            Self::Reject => write!(f, "reject"),
        }
    }
}
