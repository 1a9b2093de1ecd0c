//! Composable validators over untrusted JSON input.
//!
//! A [`Decoder`] turns a `serde_json::Value` into a typed success value or
//! an [`ErrorTree`] describing every failed check. Decoders are pure and
//! stateless: composition allocates a new decoder and never mutates the
//! input. Validation failures are always returned as data — the only
//! panics in this module guard programmer errors in combinator wiring.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::report::payload::ErrorPayload;

pub mod refinements;
pub mod tree;

pub use tree::{combine_all, ErrorTree, NULL_CODE};

/// A composable validator: a pure function from untrusted JSON to either a
/// typed value or a failure tree.
///
/// Cloning is cheap (shared function handle).
pub struct Decoder<T> {
    run: Arc<dyn Fn(&Value) -> Result<T, ErrorTree> + Send + Sync>,
}

impl<T> Clone for Decoder<T> {
    fn clone(&self) -> Self {
        Self {
            run: Arc::clone(&self.run),
        }
    }
}

impl<T: 'static> Decoder<T> {
    /// Wraps a raw decode function.
    pub fn new(run: impl Fn(&Value) -> Result<T, ErrorTree> + Send + Sync + 'static) -> Self {
        Self { run: Arc::new(run) }
    }

    /// Runs the decoder against untrusted input.
    pub fn decode(&self, input: &Value) -> Result<T, ErrorTree> {
        (self.run)(input)
    }

    /// Transforms the success value.
    pub fn map<U: 'static>(&self, f: impl Fn(T) -> U + Send + Sync + 'static) -> Decoder<U> {
        let inner = self.clone();
        Decoder::new(move |input| inner.decode(input).map(&f))
    }

    /// Chains a fully custom decode step.
    ///
    /// The step receives the decoded value and the raw input; a failure
    /// must be returned as a tree, usually a single leaf with an explicit
    /// code.
    pub fn parse<U: 'static>(
        &self,
        f: impl Fn(T, &Value) -> Result<U, ErrorTree> + Send + Sync + 'static,
    ) -> Decoder<U> {
        let inner = self.clone();
        Decoder::new(move |input| {
            let value = inner.decode(input)?;
            f(value, input)
        })
    }
}

impl<T: Serialize + 'static> Decoder<T> {
    /// Re-checks an already-decoded value against a predicate.
    ///
    /// The failure leaf carries the decoded value, not the raw input, so a
    /// refinement layered over a transforming decoder reports what was
    /// actually checked.
    pub fn refine(
        &self,
        pred: impl Fn(&T) -> bool + Send + Sync + 'static,
        code: impl Into<String>,
    ) -> Decoder<T> {
        let code = code.into();
        self.parse(move |value, _| {
            if pred(&value) {
                Ok(value)
            } else {
                Err(ErrorTree::leaf(decoded_input(&value), code.clone()))
            }
        })
    }

    /// Like [`Decoder::refine`], but the failure carries an encoded rich
    /// payload instead of a plain code.
    pub fn refine_rich(
        &self,
        pred: impl Fn(&T) -> bool + Send + Sync + 'static,
        payload: impl Fn() -> ErrorPayload + Send + Sync + 'static,
    ) -> Decoder<T> {
        self.parse(move |value, _| {
            if pred(&value) {
                Ok(value)
            } else {
                Err(ErrorTree::leaf(decoded_input(&value), payload().encode()))
            }
        })
    }
}

/// Serializes an already-decoded value for use as a failure leaf input.
pub(crate) fn decoded_input<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

// =============================================================================
// PRIMITIVES
// =============================================================================

/// Decodes any JSON string.
pub fn string() -> Decoder<String> {
    Decoder::new(|input| match input {
        Value::String(s) => Ok(s.clone()),
        other => Err(ErrorTree::leaf(other.clone(), "string")),
    })
}

/// Decodes any JSON number.
pub fn number() -> Decoder<f64> {
    Decoder::new(|input| match input.as_f64() {
        Some(n) => Ok(n),
        None => Err(ErrorTree::leaf(input.clone(), "number")),
    })
}

/// Decodes a JSON boolean.
pub fn boolean() -> Decoder<bool> {
    Decoder::new(|input| match input {
        Value::Bool(b) => Ok(*b),
        other => Err(ErrorTree::leaf(other.clone(), "boolean")),
    })
}

/// Accepts exactly the given string; the failure code names the expected
/// literal.
pub fn literal(expected: &'static str) -> Decoder<String> {
    Decoder::new(move |input| match input {
        Value::String(s) if s == expected => Ok(s.clone()),
        other => Err(ErrorTree::leaf(other.clone(), expected)),
    })
}

/// Accepts any JSON value unchanged.
pub fn unknown() -> Decoder<Value> {
    Decoder::new(|input| Ok(input.clone()))
}

// =============================================================================
// COMBINATORS
// =============================================================================

/// Per-object decode accumulator.
///
/// Field reads record failures instead of aborting, so every failing field
/// of an object surfaces in one combined tree. Builders should run all
/// field reads before joining their results with `?`.
pub struct FieldSet<'a> {
    obj: &'a Map<String, Value>,
    failures: Vec<ErrorTree>,
}

impl FieldSet<'_> {
    /// Decodes a required field.
    ///
    /// A missing field is decoded as JSON null so the failure names the
    /// expected shape.
    pub fn required<T: 'static>(&mut self, key: &str, decoder: &Decoder<T>) -> Option<T> {
        let value = self.obj.get(key).unwrap_or(&Value::Null);
        match decoder.decode(value) {
            Ok(v) => Some(v),
            Err(tree) => {
                self.failures.push(ErrorTree::key(key, tree));
                None
            }
        }
    }

    /// Decodes an optional field.
    ///
    /// Absent and JSON-null fields are skipped without validation; a
    /// present non-null field must still decode.
    pub fn optional<T: 'static>(&mut self, key: &str, decoder: &Decoder<T>) -> Option<Option<T>> {
        match self.obj.get(key) {
            None | Some(Value::Null) => Some(None),
            Some(value) => match decoder.decode(value) {
                Ok(v) => Some(Some(v)),
                Err(tree) => {
                    self.failures.push(ErrorTree::key(key, tree));
                    None
                }
            },
        }
    }

    /// Records a whole-object failure with the object itself as the
    /// offending input.
    pub fn reject(&mut self, code: impl Into<String>) {
        self.failures
            .push(ErrorTree::leaf(Value::Object(self.obj.clone()), code));
    }
}

/// Decodes an object by running a builder against a [`FieldSet`].
///
/// Succeeds iff every field read succeeds; all field failures are combined
/// as siblings.
///
/// # Panics
///
/// A builder that returns `None` without recording any failure is a
/// programmer error.
pub fn object<T: 'static>(
    build: impl Fn(&mut FieldSet<'_>) -> Option<T> + Send + Sync + 'static,
) -> Decoder<T> {
    Decoder::new(move |input| {
        let Some(obj) = input.as_object() else {
            return Err(ErrorTree::leaf(input.clone(), "object"));
        };
        let mut fields = FieldSet {
            obj,
            failures: Vec::new(),
        };
        let built = build(&mut fields);
        match combine_all(fields.failures) {
            Some(tree) => Err(tree),
            None => Ok(built.expect("object builder returned no value and recorded no failure")),
        }
    })
}

/// Decodes a homogeneous string-keyed map.
pub fn record<T: 'static>(values: &Decoder<T>) -> Decoder<BTreeMap<String, T>> {
    let values = values.clone();
    Decoder::new(move |input| {
        let Some(obj) = input.as_object() else {
            return Err(ErrorTree::leaf(input.clone(), "object"));
        };
        let mut out = BTreeMap::new();
        let mut failures = Vec::new();
        for (key, value) in obj {
            match values.decode(value) {
                Ok(v) => {
                    out.insert(key.clone(), v);
                }
                Err(tree) => failures.push(ErrorTree::key(key.clone(), tree)),
            }
        }
        match combine_all(failures) {
            Some(tree) => Err(tree),
            None => Ok(out),
        }
    })
}

/// Decodes every element of a JSON array.
pub fn array<T: 'static>(element: &Decoder<T>) -> Decoder<Vec<T>> {
    let element = element.clone();
    Decoder::new(move |input| {
        let Some(items) = input.as_array() else {
            return Err(ErrorTree::leaf(input.clone(), "array"));
        };
        let mut out = Vec::with_capacity(items.len());
        let mut failures = Vec::new();
        for (i, item) in items.iter().enumerate() {
            match element.decode(item) {
                Ok(v) => out.push(v),
                Err(tree) => failures.push(ErrorTree::index(i, tree)),
            }
        }
        match combine_all(failures) {
            Some(tree) => Err(tree),
            None => Ok(out),
        }
    })
}

/// Tries each alternative left to right, succeeding on the first match.
///
/// When every alternative fails, the combined failure surfaces each
/// branch's tree so the caller learns that none of the shapes matched.
///
/// # Panics
///
/// An empty branch list is a programmer error.
pub fn union<T: 'static>(branches: Vec<Decoder<T>>) -> Decoder<T> {
    assert!(
        !branches.is_empty(),
        "union requires at least one alternative"
    );
    Decoder::new(move |input| {
        let mut failures = Vec::with_capacity(branches.len());
        for (i, branch) in branches.iter().enumerate() {
            match branch.decode(input) {
                Ok(v) => return Ok(v),
                Err(tree) => failures.push(ErrorTree::member(i, tree)),
            }
        }
        Err(combine_all(failures).expect("union has at least one alternative"))
    })
}

/// Runs both decoders against the same input and merges their outputs.
///
/// Failures on both sides are combined as siblings, so each side's tree is
/// reported.
pub fn intersect<A: 'static, B: 'static, T: 'static>(
    a: &Decoder<A>,
    b: &Decoder<B>,
    merge: impl Fn(A, B) -> T + Send + Sync + 'static,
) -> Decoder<T> {
    let a = a.clone();
    let b = b.clone();
    Decoder::new(move |input| match (a.decode(input), b.decode(input)) {
        (Ok(left), Ok(right)) => Ok(merge(left, right)),
        (Err(left), Err(right)) => Err(ErrorTree::both(left, right)),
        (Err(left), Ok(_)) => Err(left),
        (Ok(_), Err(right)) => Err(right),
    })
}

/// Accepts JSON null or the inner decoder's shape.
///
/// The failure keeps both alternatives, mirroring a two-branch union; the
/// null branch's placeholder code is stripped by the reporter when it is an
/// artifact of recursive unwinding.
pub fn nullable<T: 'static>(inner: &Decoder<T>) -> Decoder<Option<T>> {
    let inner = inner.clone();
    Decoder::new(move |input| {
        if input.is_null() {
            return Ok(None);
        }
        match inner.decode(input) {
            Ok(v) => Ok(Some(v)),
            Err(tree) => Err(ErrorTree::both(
                ErrorTree::member(0, ErrorTree::leaf(input.clone(), NULL_CODE)),
                ErrorTree::member(1, tree),
            )),
        }
    })
}

/// Defers construction of a decoder, allowing recursive shapes.
///
/// The inner decoder is built per call, so self-referential definitions
/// terminate. Failures are tagged with `id` for the reporter's
/// recursive-unwinding cleanup.
pub fn lazy<T: 'static>(
    id: &'static str,
    thunk: impl Fn() -> Decoder<T> + Send + Sync + 'static,
) -> Decoder<T> {
    Decoder::new(move |input| {
        thunk()
            .decode(input)
            .map_err(|tree| ErrorTree::lazy(id, tree))
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_string_accepts_string() {
        assert_eq!(string().decode(&json!("hello")), Ok("hello".to_string()));
    }

    #[test]
    fn test_string_rejects_number() {
        assert_eq!(
            string().decode(&json!(5)),
            Err(ErrorTree::leaf(json!(5), "string"))
        );
    }

    #[test]
    fn test_number_accepts_integer_and_float() {
        assert_eq!(number().decode(&json!(5)), Ok(5.0));
        assert_eq!(number().decode(&json!(2.5)), Ok(2.5));
    }

    #[test]
    fn test_literal_code_names_expected_value() {
        assert_eq!(
            literal("EVERGREEN").decode(&json!("DECIDUOUS")),
            Err(ErrorTree::leaf(json!("DECIDUOUS"), "EVERGREEN"))
        );
    }

    #[test]
    fn test_object_combines_every_field_failure() {
        let decoder = {
            let num = number();
            let text = string();
            object(move |f| {
                let a = f.required("a", &num);
                let b = f.required("b", &text);
                Some((a?, b?))
            })
        };
        let err = decoder.decode(&json!({ "a": "x", "b": 3 })).unwrap_err();
        assert_eq!(
            err,
            ErrorTree::both(
                ErrorTree::key("a", ErrorTree::leaf(json!("x"), "number")),
                ErrorTree::key("b", ErrorTree::leaf(json!(3), "string")),
            )
        );
    }

    #[test]
    fn test_object_missing_field_decoded_as_null() {
        let decoder = {
            let num = number();
            object(move |f| {
                let a = f.required("a", &num);
                Some(a?)
            })
        };
        assert_eq!(
            decoder.decode(&json!({})),
            Err(ErrorTree::key("a", ErrorTree::leaf(Value::Null, "number")))
        );
    }

    #[test]
    fn test_optional_field_skips_absent_and_null() {
        let decoder = {
            let num = number();
            object(move |f| {
                let a = f.optional("a", &num);
                Some(a?)
            })
        };
        assert_eq!(decoder.decode(&json!({})), Ok(None));
        assert_eq!(decoder.decode(&json!({ "a": null })), Ok(None));
        assert_eq!(decoder.decode(&json!({ "a": 4 })), Ok(Some(4.0)));
        assert!(decoder.decode(&json!({ "a": "x" })).is_err());
    }

    #[test]
    fn test_array_wraps_element_failures_with_index() {
        let decoder = array(&number());
        let err = decoder.decode(&json!([1, "x", 3, "y"])).unwrap_err();
        assert_eq!(
            err,
            ErrorTree::both(
                ErrorTree::index(1, ErrorTree::leaf(json!("x"), "number")),
                ErrorTree::index(3, ErrorTree::leaf(json!("y"), "number")),
            )
        );
    }

    #[test]
    fn test_union_short_circuits_on_first_success() {
        let decoder = union(vec![
            number().map(|n| n.to_string()),
            string(),
        ]);
        assert_eq!(decoder.decode(&json!(3)), Ok("3".to_string()));
        assert_eq!(decoder.decode(&json!("x")), Ok("x".to_string()));
    }

    #[test]
    fn test_union_failure_surfaces_every_branch() {
        let decoder = union(vec![
            number().map(|n| n.to_string()),
            string(),
        ]);
        let err = decoder.decode(&json!(null)).unwrap_err();
        assert_eq!(
            err,
            ErrorTree::both(
                ErrorTree::member(0, ErrorTree::leaf(Value::Null, "number")),
                ErrorTree::member(1, ErrorTree::leaf(Value::Null, "string")),
            )
        );
    }

    #[test]
    fn test_intersect_merges_outputs() {
        let a = {
            let num = number();
            object(move |f| {
                let n = f.required("n", &num);
                Some(n?)
            })
        };
        let b = {
            let text = string();
            object(move |f| {
                let s = f.required("s", &text);
                Some(s?)
            })
        };
        let decoder = intersect(&a, &b, |n, s| (n, s));
        assert_eq!(
            decoder.decode(&json!({ "n": 1, "s": "x" })),
            Ok((1.0, "x".to_string()))
        );
    }

    #[test]
    fn test_intersect_combines_sibling_failures() {
        let decoder = intersect(&number(), &boolean(), |n, b| (n, b));
        let err = decoder.decode(&json!("x")).unwrap_err();
        assert_eq!(
            err,
            ErrorTree::both(
                ErrorTree::leaf(json!("x"), "number"),
                ErrorTree::leaf(json!("x"), "boolean"),
            )
        );
    }

    #[test]
    fn test_refine_reports_the_decoded_value() {
        // The doubling map runs before the refinement, so the leaf carries
        // the doubled value.
        let decoder = number().map(|n| n * 2.0).refine(|n| *n < 10.0, "small");
        assert_eq!(
            decoder.decode(&json!(6)),
            Err(ErrorTree::leaf(json!(12.0), "small"))
        );
    }

    #[test]
    fn test_parse_receives_decoded_and_raw() {
        let decoder = string().parse(|s, raw| {
            s.parse::<i64>()
                .map_err(|_| ErrorTree::leaf(raw.clone(), "not_numeric"))
        });
        assert_eq!(decoder.decode(&json!("42")), Ok(42));
        assert_eq!(
            decoder.decode(&json!("x")),
            Err(ErrorTree::leaf(json!("x"), "not_numeric"))
        );
    }

    #[test]
    fn test_record_decodes_values_and_wraps_key_failures() {
        let decoder = record(&number());
        let ok = decoder.decode(&json!({ "a": 1, "b": 2 })).unwrap();
        assert_eq!(ok.get("a"), Some(&1.0));
        let err = decoder.decode(&json!({ "k": "hello" })).unwrap_err();
        assert_eq!(
            err,
            ErrorTree::key("k", ErrorTree::leaf(json!("hello"), "number"))
        );
    }

    #[test]
    fn test_nullable_accepts_null_and_inner() {
        let decoder = nullable(&number());
        assert_eq!(decoder.decode(&json!(null)), Ok(None));
        assert_eq!(decoder.decode(&json!(2)), Ok(Some(2.0)));
        let err = decoder.decode(&json!("x")).unwrap_err();
        assert_eq!(
            err,
            ErrorTree::both(
                ErrorTree::member(0, ErrorTree::leaf(json!("x"), NULL_CODE)),
                ErrorTree::member(1, ErrorTree::leaf(json!("x"), "number")),
            )
        );
    }

    #[test]
    fn test_reject_records_whole_object_failure() {
        let decoder = object(move |f| {
            f.reject("need_value");
            None::<()>
        });
        assert_eq!(
            decoder.decode(&json!({})),
            Err(ErrorTree::leaf(json!({}), "need_value"))
        );
    }
}
