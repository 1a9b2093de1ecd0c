//! Wire shapes at the server-to-client trust boundary.
//!
//! Server-only diagnostics must never cross this boundary: only
//! client-visible rich codes survive [`prepare_for_transit`], and params
//! travel as an ordered pair sequence because the boundary cannot assume
//! ordered-map support.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::decode::{array, object, string, Decoder};
use crate::report::payload::decode_code;
use crate::report::ReportedError;

/// One key/value pair of a transit-encoded param map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitParam {
    pub key: String,
    pub value: String,
}

/// One client-visible code with its params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitCode {
    pub code: String,
    pub params: Vec<TransitParam>,
}

/// All client-visible codes reported at one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitError {
    pub path: Vec<String>,
    pub errors: Vec<TransitCode>,
}

/// Filters reports down to what may cross to the client.
///
/// Plain codes, payloads without the client flag, and codes that fail
/// payload decoding are all dropped; reports left without codes are removed
/// entirely.
pub fn prepare_for_transit(reported: &[ReportedError]) -> Vec<TransitError> {
    reported
        .iter()
        .filter_map(|report| {
            let errors: Vec<TransitCode> = report
                .errors
                .iter()
                .filter_map(|code| {
                    let payload = match decode_code(code) {
                        Ok(payload) => payload,
                        Err(_) => {
                            tracing::debug!(
                                code = %code,
                                "undecodable error code dropped at transit boundary"
                            );
                            return None;
                        }
                    };
                    payload.client.then(|| TransitCode {
                        code: payload.code,
                        params: encode_params(&payload.params),
                    })
                })
                .collect();
            if errors.is_empty() {
                None
            } else {
                Some(TransitError {
                    path: report.path.clone(),
                    errors,
                })
            }
        })
        .collect()
}

/// Encodes a param map as its ordered transit form.
pub fn encode_params(params: &BTreeMap<String, String>) -> Vec<TransitParam> {
    params
        .iter()
        .map(|(key, value)| TransitParam {
            key: key.clone(),
            value: value.clone(),
        })
        .collect()
}

/// Decodes the transit form of a param map back into a map.
pub fn params_decoder() -> Decoder<BTreeMap<String, String>> {
    array(&transit_param_decoder()).map(|pairs| {
        pairs
            .into_iter()
            .map(|pair| (pair.key, pair.value))
            .collect()
    })
}

fn transit_param_decoder() -> Decoder<TransitParam> {
    let key = string();
    let value = string();
    object(move |f| {
        let key = f.required("key", &key);
        let value = f.required("value", &value);
        Some(TransitParam {
            key: key?,
            value: value?,
        })
    })
}

fn transit_code_decoder() -> Decoder<TransitCode> {
    let code = string();
    let params = array(&transit_param_decoder());
    object(move |f| {
        let code = f.required("code", &code);
        let params = f.required("params", &params);
        Some(TransitCode {
            code: code?,
            params: params?,
        })
    })
}

/// Decodes a full transit error payload, for the receiving side of the
/// boundary.
pub fn transit_decoder() -> Decoder<Vec<TransitError>> {
    let path = array(&string());
    let errors = array(&transit_code_decoder());
    let element = object(move |f| {
        let path = f.required("path", &path);
        let errors = f.required("errors", &errors);
        Some(TransitError {
            path: path?,
            errors: errors?,
        })
    });
    array(&element)
}
