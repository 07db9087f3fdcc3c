//! Configuration for the OSS file-output sink
//!
//! The config is loaded once by the host, validated before any task
//! starts, and shared read-only by every session. All validation failures
//! surface as [`SinkError::Config`] with a message naming the offending
//! field.

use crate::error::{Result, SinkError};
use crate::naming::SequenceFormat;
use crate::types::SensitiveString;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

/// Canned access-control policy applied to each uploaded object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum CannedAcl {
    /// Inherit the bucket's access policy
    #[default]
    Default,
    /// Owner-only access
    Private,
    /// Anonymous read access
    PublicRead,
    /// Anonymous read and write access
    PublicReadWrite,
}

impl CannedAcl {
    /// The wire name of this policy
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Private => "private",
            Self::PublicRead => "public-read",
            Self::PublicReadWrite => "public-read-write",
        }
    }

    /// Whether this is the bucket-inherited policy
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }
}

/// Configuration for the OSS file-output sink.
///
/// # Example
///
/// ```yaml
/// endpoint: http://oss-ap-northeast-1.aliyuncs.com
/// access_key_id: AKID...
/// access_key_secret: SECRET...
/// bucket: my-exports
/// path_prefix: "data/"
/// file_ext: ".csv"
/// sequence_format: ".%03d.%02d"
/// canned_acl: private
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, Validate, JsonSchema)]
pub struct OssSinkConfig {
    /// OSS endpoint URL. The region is embedded in the host name.
    #[serde(default = "default_endpoint")]
    #[validate(length(min = 1))]
    pub endpoint: String,

    /// Access key id
    pub access_key_id: SensitiveString,

    /// Access key secret
    pub access_key_secret: SensitiveString,

    /// Bucket receiving the uploaded objects
    #[validate(length(min = 1, max = 255))]
    pub bucket: String,

    /// Object-key prefix. Concatenated verbatim, so a directory-style
    /// prefix needs its own trailing slash.
    #[serde(default = "default_path_prefix")]
    pub path_prefix: String,

    /// File extension appended to every key (e.g. ".csv")
    #[validate(length(min = 1))]
    pub file_ext: String,

    /// Printf-style template rendered with (task index, partition index)
    #[serde(default = "default_sequence_format")]
    pub sequence_format: String,

    /// Directory for staging files. Platform temp dir when unset.
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,

    /// Name prefix for staging files
    #[serde(default = "default_staging_prefix")]
    pub staging_prefix: String,

    /// Access-control policy applied to each uploaded object
    #[serde(default)]
    pub canned_acl: CannedAcl,
}

fn default_endpoint() -> String {
    "http://oss-ap-northeast-1.aliyuncs.com".to_string()
}

fn default_path_prefix() -> String {
    "tmp".to_string()
}

fn default_sequence_format() -> String {
    ".%03d.%02d".to_string()
}

fn default_staging_prefix() -> String {
    "skiff-oss-".to_string()
}

impl OssSinkConfig {
    /// Validate the whole configuration.
    ///
    /// Runs the field-level rules, checks the credential pair is present,
    /// and parses the sequence format with a sentinel `(0, 0)` probe. Any
    /// failure here means the job must not start.
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(|e| SinkError::Config(e.to_string()))?;
        if self.access_key_id.expose_secret().is_empty()
            || self.access_key_secret.expose_secret().is_empty()
        {
            return Err(SinkError::config(
                "access_key_id and access_key_secret must be set",
            ));
        }
        let format = SequenceFormat::parse(&self.sequence_format)?;
        let _probe = format.render(0, 0);
        Ok(())
    }

    /// JSON Schema describing this configuration, for host-side
    /// introspection and documentation generation.
    pub fn config_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(OssSinkConfig)).unwrap_or_default()
    }
}
