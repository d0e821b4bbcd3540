//! Purpose: Decode the optional `tx_options` object of a transaction submission.
//! Exports: `TxOptions`.
//! Role: Structural validation only; the engine interprets the values.
//! Invariants: Unknown keys are rejected, never ignored.
//! Invariants: Foreign decode errors are wrapped once as `tx/malformed-tx-options` with the cause kept.
use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxOptions {
    pub system_time: Option<OffsetDateTime>,
    pub default_tz: Option<String>,
    pub default_all_valid_time: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTxOptions {
    #[serde(default)]
    system_time: Option<String>,
    #[serde(default)]
    default_tz: Option<String>,
    #[serde(default)]
    default_all_valid_time: bool,
}

impl TxOptions {
    pub fn from_json(node: &Value) -> Result<Self, Error> {
        if !node.is_object() {
            return Err(malformed(node).with_message("tx_options must be a JSON object"));
        }
        let raw = RawTxOptions::deserialize(node).map_err(|err| {
            malformed(node)
                .with_message("tx_options has unknown or ill-typed keys")
                .with_hint("Recognized keys: system_time, default_tz, default_all_valid_time.")
                .with_source(err)
        })?;

        let system_time = match raw.system_time {
            None => None,
            Some(text) => Some(OffsetDateTime::parse(&text, &Rfc3339).map_err(|err| {
                malformed(node)
                    .with_message("system_time must be an RFC 3339 timestamp")
                    .with_source(err)
            })?),
        };

        if let Some(tz) = &raw.default_tz
            && tz.trim().is_empty()
        {
            return Err(malformed(node).with_message("default_tz must not be blank"));
        }

        Ok(Self {
            system_time,
            default_tz: raw.default_tz,
            default_all_valid_time: raw.default_all_valid_time,
        })
    }
}

fn malformed(node: &Value) -> Error {
    Error::new(ErrorKind::MalformedTxOptions).with_json(node)
}
