use serde::Deserialize;

use m2rs_core::error::{M2Error, Result};
use m2rs_core::protocol::envelope::{HeaderFormat, ParseOptions};
use m2rs_core::protocol::json::JSON_MAX_DEPTH;
use m2rs_core::protocol::DEFAULT_MAX_DEPTH;

use crate::connection::DEFAULT_MAX_MESSAGE_BYTES;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandlerConfig {
    pub version: u32,

    pub handler: HandlerSection,

    #[serde(default)]
    pub log: LogSection,
}

impl HandlerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(M2Error::BadConfig(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        self.handler.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandlerSection {
    /// Identity set on the inbound endpoint.
    #[serde(default)]
    pub sender_id: Option<String>,

    /// Server PUSH address that requests come from.
    pub recv_addr: String,

    /// Server SUB address that replies go to.
    pub send_addr: String,

    #[serde(default)]
    pub header_format: HeaderFormatConfig,

    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl HandlerSection {
    pub fn validate(&self) -> Result<()> {
        if self.recv_addr.is_empty() || self.send_addr.is_empty() {
            return Err(M2Error::BadConfig(
                "handler.recv_addr and handler.send_addr must not be empty".into(),
            ));
        }
        if self.recv_addr == self.send_addr {
            return Err(M2Error::BadConfig(
                "handler.recv_addr and handler.send_addr must differ".into(),
            ));
        }
        if let Some(id) = &self.sender_id {
            if id.is_empty() || id.contains(' ') {
                return Err(M2Error::BadConfig(
                    "handler.sender_id must be non-empty and contain no spaces".into(),
                ));
            }
        }
        if !(1024..=64 * 1024 * 1024).contains(&self.max_message_bytes) {
            return Err(M2Error::BadConfig(
                "handler.max_message_bytes must be between 1024 and 67108864".into(),
            ));
        }
        // JSON headers cannot nest deeper than serde_json allows
        if !(1..=JSON_MAX_DEPTH).contains(&self.max_depth) {
            return Err(M2Error::BadConfig(format!(
                "handler.max_depth must be between 1 and {JSON_MAX_DEPTH}"
            )));
        }
        Ok(())
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            header_format: self.header_format.into(),
            max_depth: self.max_depth,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderFormatConfig {
    #[default]
    Tnetstring,
    Auto,
}

impl From<HeaderFormatConfig> for HeaderFormat {
    fn from(c: HeaderFormatConfig) -> Self {
        match c {
            HeaderFormatConfig::Tnetstring => HeaderFormat::TNetstring,
            HeaderFormatConfig::Auto => HeaderFormat::Auto,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_max_message_bytes() -> usize {
    DEFAULT_MAX_MESSAGE_BYTES
}
fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}
fn default_log_filter() -> String {
    "info".into()
}
