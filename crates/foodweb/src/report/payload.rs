//! Rich error payloads multiplexed through plain string codes.
//!
//! A failure leaf holds a single string slot. Rich payloads ride in that
//! slot behind a sentinel prefix; anything unprefixed is a plain code. The
//! decoding side is built from this crate's own combinators, so payload
//! validation reports shape problems the same way any other decode does.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::decode::{boolean, object, record, string, union, unknown, Decoder, ErrorTree};
use crate::limits::MAX_PAYLOAD_BYTES;

/// Sentinel marking an encoded rich payload.
pub const RICH_PREFIX: &str = "rich:";

/// An error code with structured metadata.
///
/// `client` gates transit: only client-visible payloads cross the
/// server-to-client boundary. A plain code decodes as the degenerate
/// payload with empty params/debug and `client` unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub client: bool,
    pub params: BTreeMap<String, String>,
    pub debug: Map<String, Value>,
}

impl ErrorPayload {
    /// A server-only payload.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            client: false,
            params: BTreeMap::new(),
            debug: Map::new(),
        }
    }

    /// A client-visible payload.
    pub fn client(code: impl Into<String>) -> Self {
        Self {
            client: true,
            ..Self::new(code)
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_debug(mut self, key: impl Into<String>, value: Value) -> Self {
        self.debug.insert(key.into(), value);
        self
    }

    /// Encodes into the single string slot a failure leaf occupies.
    pub fn encode(&self) -> String {
        let json = serde_json::to_string(self)
            .expect("string-keyed payload serialization cannot fail");
        format!("{RICH_PREFIX}{json}")
    }
}

/// Shape validator for a parsed rich payload.
fn shape_decoder() -> Decoder<ErrorPayload> {
    let code = string();
    let client = boolean();
    let params = record(&string());
    let debug = record(&unknown());
    object(move |f| {
        let code = f.required("code", &code);
        let client = f.required("client", &client);
        let params = f.required("params", &params);
        let debug = f.required("debug", &debug);
        Some(ErrorPayload {
            code: code?,
            client: client?,
            params: params?,
            debug: debug?.into_iter().collect(),
        })
    })
}

/// Decodes either an encoded rich payload or a plain code.
///
/// A sentinel-prefixed string must parse and validate as a payload; an
/// unprefixed string is a plain code. Prefixed garbage fails both
/// alternatives.
pub fn payload_decoder() -> Decoder<ErrorPayload> {
    let rich = string().parse(|s, raw| {
        let Some(body) = s.strip_prefix(RICH_PREFIX) else {
            return Err(ErrorTree::leaf(raw.clone(), "invalid_rich_message"));
        };
        if body.len() > MAX_PAYLOAD_BYTES {
            return Err(ErrorTree::leaf(raw.clone(), "invalid_rich_message"));
        }
        let json: Value = serde_json::from_str(body)
            .map_err(|_| ErrorTree::leaf(raw.clone(), "json"))?;
        shape_decoder().decode(&json)
    });
    let plain = string().parse(|s, raw| {
        if s.starts_with(RICH_PREFIX) {
            return Err(ErrorTree::leaf(raw.clone(), "not_error_code"));
        }
        Ok(ErrorPayload::new(s))
    });
    union(vec![rich, plain])
}

/// Decodes one code string into its payload.
pub fn decode_code(code: &str) -> Result<ErrorPayload, ErrorTree> {
    payload_decoder().decode(&Value::String(code.to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_roundtrip_rich_payload() {
        let payload = ErrorPayload::client("too_small")
            .with_param("minimum", "0")
            .with_param("inclusive", "true")
            .with_debug("observed", json!(-3));
        let decoded = decode_code(&payload.encode()).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_plain_code_is_degenerate_payload() {
        let decoded = decode_code("not_found").unwrap();
        assert_eq!(decoded.code, "not_found");
        assert!(!decoded.client);
        assert!(decoded.params.is_empty());
        assert!(decoded.debug.is_empty());
    }

    #[test]
    fn test_prefixed_garbage_fails_both_alternatives() {
        let err = decode_code("rich:{not json").unwrap_err();
        assert_eq!(
            err,
            ErrorTree::both(
                ErrorTree::member(0, ErrorTree::leaf(json!("rich:{not json"), "json")),
                ErrorTree::member(
                    1,
                    ErrorTree::leaf(json!("rich:{not json"), "not_error_code")
                ),
            )
        );
    }

    #[test]
    fn test_prefixed_wrong_shape_rejected() {
        // Valid JSON, but missing the client flag.
        let code = format!("{RICH_PREFIX}{}", json!({ "code": "x", "params": {}, "debug": {} }));
        assert!(decode_code(&code).is_err());
    }

    #[test]
    fn test_encode_is_prefixed_json() {
        let encoded = ErrorPayload::new("oops").encode();
        assert!(encoded.starts_with(RICH_PREFIX));
        let body: Value = serde_json::from_str(&encoded[RICH_PREFIX.len()..]).unwrap();
        assert_eq!(body["code"], json!("oops"));
        assert_eq!(body["client"], json!(false));
    }
}
