//! Odos Assemble Types
//!
//! Request and response structures for `/sor/assemble`, which turns a
//! quoted path id into a signable transaction.

use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::ports::aggregator::{AggregatorError, AssembledSwap};

/// Request body for transaction assembly
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembleRequest {
    pub user_addr: String,
    pub path_id: String,
    pub simulate: bool,
}

/// Response from the assemble endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembleResponse {
    pub transaction: TransactionBlob,
    #[serde(flatten)]
    pub extra: std::collections::HashMap<String, serde_json::Value>,
}

/// The raw transaction fields returned by the API.
///
/// `value` arrives in whatever shape the API feels like that day: a hex
/// string, a decimal string, or a JSON number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBlob {
    pub to: String,
    pub data: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: std::collections::HashMap<String, serde_json::Value>,
}

impl AssembleResponse {
    /// Convert the raw blob into typed transaction fields.
    pub fn into_swap(self) -> Result<AssembledSwap, AggregatorError> {
        let to: Address = self.transaction.to.parse().map_err(|e| {
            AggregatorError::InvalidResponse(format!(
                "bad 'to' address '{}': {e}",
                self.transaction.to
            ))
        })?;

        let data: Bytes = self.transaction.data.parse().map_err(|e| {
            AggregatorError::InvalidResponse(format!("bad calldata: {e}"))
        })?;

        let value = match self.transaction.value {
            Some(raw) => parse_value(&raw)?,
            None => U256::ZERO,
        };

        Ok(AssembledSwap { to, data, value })
    }
}

/// Parse the transaction `value` field from any of its observed encodings.
fn parse_value(raw: &serde_json::Value) -> Result<U256, AggregatorError> {
    match raw {
        serde_json::Value::Null => Ok(U256::ZERO),
        serde_json::Value::Number(n) => {
            let v = n.as_u64().ok_or_else(|| {
                AggregatorError::InvalidResponse(format!("bad numeric value: {n}"))
            })?;
            Ok(U256::from(v))
        }
        // U256::from_str handles both "0x..." hex and plain decimal strings
        serde_json::Value::String(s) => s.parse().map_err(|e| {
            AggregatorError::InvalidResponse(format!("bad value string '{s}': {e}"))
        }),
        other => Err(AggregatorError::InvalidResponse(format!(
            "unexpected value field: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(value: serde_json::Value) -> AssembleResponse {
        serde_json::from_value(serde_json::json!({
            "transaction": {
                "to": "0xCa423977156BB05b13A2BA3b76Bc5419E2fE9680",
                "data": "0xdeadbeef",
                "value": value,
                "gas": 500000
            },
            "simulation": null
        }))
        .unwrap()
    }

    #[test]
    fn test_into_swap_hex_value() {
        let swap = response(serde_json::json!("0x10")).into_swap().unwrap();
        assert_eq!(swap.value, U256::from(16u64));
        assert_eq!(swap.data, Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]));
    }

    #[test]
    fn test_into_swap_decimal_string_value() {
        let swap = response(serde_json::json!("1000")).into_swap().unwrap();
        assert_eq!(swap.value, U256::from(1000u64));
    }

    #[test]
    fn test_into_swap_numeric_value() {
        let swap = response(serde_json::json!(7)).into_swap().unwrap();
        assert_eq!(swap.value, U256::from(7u64));
    }

    #[test]
    fn test_into_swap_missing_value_defaults_zero() {
        let resp: AssembleResponse = serde_json::from_value(serde_json::json!({
            "transaction": {
                "to": "0xCa423977156BB05b13A2BA3b76Bc5419E2fE9680",
                "data": "0x"
            }
        }))
        .unwrap();

        assert_eq!(resp.into_swap().unwrap().value, U256::ZERO);
    }

    #[test]
    fn test_into_swap_bad_address() {
        let resp: AssembleResponse = serde_json::from_value(serde_json::json!({
            "transaction": { "to": "router", "data": "0x" }
        }))
        .unwrap();

        assert!(matches!(
            resp.into_swap(),
            Err(AggregatorError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_assemble_request_serializes_camel_case() {
        let req = AssembleRequest {
            user_addr: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
            path_id: "abc".to_string(),
            simulate: true,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("userAddr").is_some());
        assert!(json.get("pathId").is_some());
        assert_eq!(json["simulate"], true);
    }
}
