use serde::{Deserialize, Serialize};

use crate::error::{CubismError, CubismResult};

use super::ContextConfig;

pub const CONTEXT_CONFIG_JSON_SCHEMA_V1: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfigJsonContractV1 {
    pub schema_version: u32,
    pub config: ContextConfig,
}

impl ContextConfig {
    pub fn to_json_pretty(self) -> CubismResult<String> {
        serde_json::to_string_pretty(&self).map_err(|e| {
            CubismError::InvalidConfig(format!("failed to serialize context config: {e}"))
        })
    }

    pub fn to_json_contract_v1_pretty(self) -> CubismResult<String> {
        let payload = ContextConfigJsonContractV1 {
            schema_version: CONTEXT_CONFIG_JSON_SCHEMA_V1,
            config: self,
        };
        serde_json::to_string_pretty(&payload).map_err(|e| {
            CubismError::InvalidConfig(format!(
                "failed to serialize context config contract v1: {e}"
            ))
        })
    }

    /// Parses either the bare config or the versioned contract, then validates it.
    ///
    /// A top-level `schema_version` key selects the contract form. Unknown keys
    /// are rejected in both forms.
    pub fn from_json_str(input: &str) -> CubismResult<Self> {
        let value: serde_json::Value = serde_json::from_str(input).map_err(|e| {
            CubismError::InvalidConfig(format!("failed to parse context config json: {e}"))
        })?;
        let config = if value.get("schema_version").is_some() {
            let payload: ContextConfigJsonContractV1 =
                serde_json::from_value(value).map_err(|e| {
                    CubismError::InvalidConfig(format!(
                        "failed to parse context config contract: {e}"
                    ))
                })?;
            if payload.schema_version != CONTEXT_CONFIG_JSON_SCHEMA_V1 {
                return Err(CubismError::InvalidConfig(format!(
                    "unsupported context config schema version: {}",
                    payload.schema_version
                )));
            }
            payload.config
        } else {
            serde_json::from_value::<ContextConfig>(value).map_err(|e| {
                CubismError::InvalidConfig(format!("failed to parse context config json: {e}"))
            })?
        };
        config.validate()?;
        Ok(config)
    }
}
