//! Handler config loader (strict parsing).

pub mod schema;

use std::fs;

use m2rs_core::error::{M2Error, Result};

pub use schema::{HandlerConfig, HandlerSection, HeaderFormatConfig, LogSection};

pub fn load_from_file(path: &str) -> Result<HandlerConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| M2Error::BadConfig(format!("read {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<HandlerConfig> {
    let cfg: HandlerConfig = serde_yaml::from_str(s)
        .map_err(|e| M2Error::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
