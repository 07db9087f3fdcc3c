//! Common types shared across the sink
//!
//! Currently this is just the credential wrapper. Access keys travel
//! through config files, log statements and error messages, and every one
//! of those paths must see a redacted value.

use schemars::JsonSchema;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

const REDACTED: &str = "[REDACTED]";

/// A string that refuses to leak.
///
/// `Debug`, `Display` and `Serialize` all emit a redaction marker instead
/// of the wrapped value; the real value is only reachable through
/// [`expose_secret`](Self::expose_secret), which call sites use at the
/// moment the credential is actually handed to the transport.
#[derive(Clone, Deserialize)]
#[serde(from = "String")]
pub struct SensitiveString(SecretString);

impl SensitiveString {
    /// Wrap a credential value
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::new(value.into().into_boxed_str()))
    }

    /// Access the wrapped value
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Display for SensitiveString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(REDACTED)
    }
}

impl std::fmt::Debug for SensitiveString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

impl From<String> for SensitiveString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SensitiveString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Serialize for SensitiveString {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("***REDACTED***")
    }
}

impl JsonSchema for SensitiveString {
    fn schema_name() -> String {
        "SensitiveString".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        let mut schema = gen.subschema_for::<String>();
        if let schemars::schema::Schema::Object(obj) = &mut schema {
            obj.format = Some("password".to_string());
            obj.metadata().description =
                Some("Sensitive value (access keys). Redacted in logs and dumps.".to_string());
        }
        schema
    }
}
