//! Channel record — one configured upstream provider connection.
//!
//! A channel holds a credential key for a downstream AI-completion provider
//! along with the metadata the routing gateway uses to select it (weight,
//! priority, group, supported models, model remapping).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Status of a channel, stored and transferred as its integer code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum ChannelStatus {
    /// Unset (code 0).
    #[default]
    Unknown,
    Enabled,
    ManuallyDisabled,
    AutoDisabled,
}

impl ChannelStatus {
    pub const fn code(self) -> i32 {
        match self {
            ChannelStatus::Unknown => 0,
            ChannelStatus::Enabled => 1,
            ChannelStatus::ManuallyDisabled => 2,
            ChannelStatus::AutoDisabled => 3,
        }
    }

    /// Both manual and automatic disablement count as disabled.
    pub fn is_disabled(self) -> bool {
        matches!(
            self,
            ChannelStatus::ManuallyDisabled | ChannelStatus::AutoDisabled
        )
    }
}

impl TryFrom<i32> for ChannelStatus {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ChannelStatus::Unknown),
            1 => Ok(ChannelStatus::Enabled),
            2 => Ok(ChannelStatus::ManuallyDisabled),
            3 => Ok(ChannelStatus::AutoDisabled),
            other => Err(format!("unknown channel status code {other}")),
        }
    }
}

impl From<ChannelStatus> for i32 {
    fn from(status: ChannelStatus) -> Self {
        status.code()
    }
}

/// A persisted channel.
///
/// `id == 0` means the record has not been inserted yet; the store assigns
/// the identifier. In redacted projections `key` is empty.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelRecord {
    pub id: i64,

    /// Provider type code
    #[serde(rename = "type")]
    pub channel_type: i32,

    /// Credential key (secret)
    pub key: String,

    pub name: String,

    pub status: ChannelStatus,

    /// Selection weight
    pub weight: Option<u32>,

    /// Base URL override
    pub base_url: Option<String>,

    /// Supported models, comma separated
    pub models: String,

    pub group: String,

    /// Model name remapping, serialized JSON object
    pub model_mapping: Option<String>,

    /// Selection priority
    pub priority: Option<i64>,

    /// Free-form provider configuration, serialized
    pub config: String,

    /// System prompt override
    pub system_prompt: Option<String>,

    /// Unix seconds, stamped once at insertion
    pub created_time: i64,
}

impl ChannelRecord {
    pub fn is_disabled(&self) -> bool {
        self.status.is_disabled()
    }

    /// Drop the credential key, as the limited projection does.
    pub fn redacted(mut self) -> Self {
        self.key.clear();
        self
    }
}

impl std::fmt::Debug for ChannelRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelRecord")
            .field("id", &self.id)
            .field("channel_type", &self.channel_type)
            .field("key", &key_fingerprint(&self.key))
            .field("name", &self.name)
            .field("status", &self.status)
            .field("weight", &self.weight)
            .field("base_url", &self.base_url)
            .field("models", &self.models)
            .field("group", &self.group)
            .field("model_mapping", &self.model_mapping)
            .field("priority", &self.priority)
            .field("config", &self.config)
            .field("system_prompt", &self.system_prompt)
            .field("created_time", &self.created_time)
            .finish()
    }
}

/// Short, non-reversible identifier for a credential key, safe to log.
pub fn key_fingerprint(key: &str) -> String {
    if key.is_empty() {
        return "<empty>".into();
    }
    let digest = Sha256::digest(key.as_bytes());
    format!("sha256:{}", &hex::encode(digest)[..12])
}

/// Which subset and projection of channels a bulk read returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scope {
    /// Every channel, key included, pagination ignored.
    All,
    /// Every disabled channel, key included, pagination ignored.
    Disabled,
    /// One page of channels with keys redacted.
    #[default]
    Limited,
}

impl Scope {
    /// Parse a scope selector. Anything unrecognized is `Limited`.
    pub fn parse(s: &str) -> Self {
        match s {
            "all" => Scope::All,
            "disabled" => Scope::Disabled,
            _ => Scope::Limited,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scope::All => "all",
            Scope::Disabled => "disabled",
            Scope::Limited => "limited",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
