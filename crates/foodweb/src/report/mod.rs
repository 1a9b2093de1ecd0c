//! Flattening decode failure trees into path-addressed reports.
//!
//! The reporter folds an arbitrary [`ErrorTree`] into a flat list with at
//! most one entry per distinct path; codes discovered at the same path are
//! concatenated in encounter order.

use std::collections::hash_map::Entry;

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::decode::{ErrorTree, NULL_CODE};

pub mod payload;
pub mod transit;

/// One flattened failure: the offending input, where it sits, and every
/// code recorded at that path.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportedError {
    pub input: Value,
    pub path: Vec<String>,
    pub errors: Vec<String>,
}

/// Folds a decode result into transit-ready reports. Success is the empty
/// list.
pub fn report<T>(result: &Result<T, ErrorTree>) -> Vec<ReportedError> {
    match result {
        Ok(_) => Vec::new(),
        Err(tree) => report_tree(tree),
    }
}

/// Folds a failure tree into reports with unique paths.
pub fn report_tree(tree: &ErrorTree) -> Vec<ReportedError> {
    combine_paths(flatten(tree))
}

/// Recursively folds a failure tree into per-leaf reports, without path
/// deduplication.
pub fn flatten(tree: &ErrorTree) -> Vec<ReportedError> {
    match tree {
        ErrorTree::Leaf { input, code } => vec![ReportedError {
            input: input.clone(),
            path: Vec::new(),
            errors: vec![code.clone()],
        }],
        ErrorTree::Key { key, tree } => prepend(key.clone(), flatten(tree)),
        ErrorTree::Index { index, tree } => prepend(index.to_string(), flatten(tree)),
        // Alternation adds no path segment: every branch's failure surfaces
        // at the same position.
        ErrorTree::Member { tree, .. } => flatten(tree),
        ErrorTree::Lazy { tree, .. } => flatten(tree)
            .into_iter()
            .filter_map(strip_null_placeholder)
            .collect(),
        ErrorTree::Both { left, right } => {
            let mut out = flatten(left);
            out.extend(flatten(right));
            out
        }
    }
}

fn prepend(segment: String, errors: Vec<ReportedError>) -> Vec<ReportedError> {
    errors
        .into_iter()
        .map(|mut e| {
            e.path.insert(0, segment.clone());
            e
        })
        .collect()
}

/// Drops the null placeholders that recursive unwinding introduces, along
/// with any entry left without codes.
fn strip_null_placeholder(mut error: ReportedError) -> Option<ReportedError> {
    error.errors.retain(|code| code != NULL_CODE);
    if error.errors.is_empty() {
        None
    } else {
        Some(error)
    }
}

/// Dedup key: path length first, then segments, so a path and a longer
/// path sharing its prefix cannot collide.
fn path_key(path: &[String]) -> String {
    let mut key = path.len().to_string();
    for segment in path {
        key.push('.');
        key.push_str(segment);
    }
    key
}

/// Merges reports sharing a path, concatenating codes in discovery order.
fn combine_paths(errors: Vec<ReportedError>) -> Vec<ReportedError> {
    let mut slots: FxHashMap<String, usize> = FxHashMap::default();
    let mut out: Vec<ReportedError> = Vec::new();
    for error in errors {
        match slots.entry(path_key(&error.path)) {
            Entry::Occupied(slot) => out[*slot.get()].errors.extend(error.errors),
            Entry::Vacant(slot) => {
                slot.insert(out.len());
                out.push(error);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::decode::{
        array, lazy, nullable, number, object, record, string, union, Decoder,
    };

    fn entry(input: Value, path: &[&str], errors: &[&str]) -> ReportedError {
        ReportedError {
            input,
            path: path.iter().map(|s| s.to_string()).collect(),
            errors: errors.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_success_reports_nothing() {
        assert_eq!(report(&string().decode(&json!("hello"))), Vec::new());
    }

    #[test]
    fn test_primitive_mismatch() {
        assert_eq!(
            report(&string().decode(&json!(null))),
            vec![entry(Value::Null, &[], &["string"])]
        );
    }

    #[test]
    fn test_refined_primitive() {
        let decoder = string().refine(|s| !s.is_empty(), "required");
        assert_eq!(
            report(&decoder.decode(&json!(""))),
            vec![entry(json!(""), &[], &["required"])]
        );
    }

    #[test]
    fn test_object_missing_key() {
        let decoder = {
            let num = number();
            object(move |f| {
                let num = f.required("num", &num);
                Some(num?)
            })
        };
        assert_eq!(
            report(&decoder.decode(&json!({}))),
            vec![entry(Value::Null, &["num"], &["number"])]
        );
    }

    #[test]
    fn test_whole_object_refinement() {
        let decoder = {
            let num = number();
            let text = string();
            object(move |f| {
                let num = f.optional("num", &num);
                let text = f.optional("str", &text);
                match (num?, text?) {
                    (None, None) => {
                        f.reject("need_value");
                        None
                    }
                    (num, text) => Some((num, text)),
                }
            })
        };
        assert_eq!(
            report(&decoder.decode(&json!({}))),
            vec![entry(json!({}), &[], &["need_value"])]
        );
    }

    #[test]
    fn test_deep_path() {
        let decoder = {
            let inner = {
                let num = number();
                object(move |f| {
                    let num = f.required("num", &num);
                    Some(num?)
                })
            };
            object(move |f| {
                let obj = f.required("obj", &inner);
                Some(obj?)
            })
        };
        assert_eq!(
            report(&decoder.decode(&json!({ "obj": {} }))),
            vec![entry(Value::Null, &["obj", "num"], &["number"])]
        );
    }

    #[test]
    fn test_record_key_path() {
        let decoder = record(&number());
        assert_eq!(
            report(&decoder.decode(&json!({ "key": "hello" }))),
            vec![entry(json!("hello"), &["key"], &["number"])]
        );
    }

    #[test]
    fn test_array_index_path() {
        let decoder = array(&number());
        assert_eq!(
            report(&decoder.decode(&json!(["hello"]))),
            vec![entry(json!("hello"), &["0"], &["number"])]
        );
    }

    #[test]
    fn test_union_surfaces_every_branch_at_one_path() {
        let decoder = union(vec![number().map(|n| n.to_string()), string()]);
        assert_eq!(
            report(&decoder.decode(&json!(null))),
            vec![entry(Value::Null, &[], &["number", "string"])]
        );
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Category {
        title: String,
        subcategory: Option<Box<Category>>,
    }

    fn category() -> Decoder<Category> {
        lazy("Category", || {
            let title = string();
            let subcategory = nullable(&category());
            object(move |f| {
                let title = f.required("title", &title);
                let subcategory = f.required("subcategory", &subcategory);
                Some(Category {
                    title: title?,
                    subcategory: subcategory?.map(Box::new),
                })
            })
        })
    }

    #[test]
    fn test_recursive_decode_strips_null_placeholder() {
        let input = json!({
            "title": "mystery",
            "subcategory": { "title": 5, "subcategory": null },
        });
        assert_eq!(
            report(&category().decode(&input)),
            vec![entry(json!(5), &["subcategory", "title"], &["string"])]
        );
    }

    #[test]
    fn test_recursive_decode_succeeds() {
        let input = json!({
            "title": "outer",
            "subcategory": { "title": "inner", "subcategory": null },
        });
        let decoded = category().decode(&input).unwrap();
        assert_eq!(decoded.title, "outer");
        assert_eq!(decoded.subcategory.unwrap().title, "inner");
    }

    #[test]
    fn test_no_duplicate_paths_after_merge() {
        let decoder = union(vec![
            array(&number()).map(|_| ()),
            array(&number()).map(|_| ()),
        ]);
        let reports = report(&decoder.decode(&json!(["x"])));
        assert_eq!(
            reports,
            vec![entry(json!("x"), &["0"], &["number", "number"])]
        );
        let mut paths: Vec<_> = reports.iter().map(|r| r.path.clone()).collect();
        paths.dedup();
        assert_eq!(paths.len(), reports.len());
    }

    #[test]
    fn test_prefix_paths_stay_distinct() {
        // A failure at ["a"] and one at ["a", "b"] must not merge.
        let tree = crate::decode::ErrorTree::both(
            crate::decode::ErrorTree::key(
                "a",
                crate::decode::ErrorTree::leaf(Value::Null, "number"),
            ),
            crate::decode::ErrorTree::key(
                "a",
                crate::decode::ErrorTree::key(
                    "b",
                    crate::decode::ErrorTree::leaf(Value::Null, "string"),
                ),
            ),
        );
        let reports = report_tree(&tree);
        assert_eq!(
            reports,
            vec![
                entry(Value::Null, &["a"], &["number"]),
                entry(Value::Null, &["a", "b"], &["string"]),
            ]
        );
    }
}
