//! Bound refinements carrying client-visible rich codes.
//!
//! Each refinement embeds the violated bound as a payload param so the
//! client can format its own message; this library never renders error
//! text.

use std::fmt::Display;

use serde::Serialize;

use crate::decode::{number, Decoder, ErrorTree};
use crate::report::payload::ErrorPayload;

/// Shapes measurable for length refinements: strings and arrays.
pub trait Len {
    fn len(&self) -> usize;
}

impl Len for String {
    fn len(&self) -> usize {
        self.chars().count()
    }
}

impl<T> Len for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }
}

/// Rejects values shorter than `min` with a `too_short` rich code.
pub fn min_length<T>(inner: &Decoder<T>, min: usize) -> Decoder<T>
where
    T: Len + Serialize + 'static,
{
    inner.refine_rich(
        move |v| v.len() >= min,
        move || ErrorPayload::client("too_short").with_param("minLength", min.to_string()),
    )
}

/// Rejects values longer than `max` with a `too_long` rich code.
pub fn max_length<T>(inner: &Decoder<T>, max: usize) -> Decoder<T>
where
    T: Len + Serialize + 'static,
{
    inner.refine_rich(
        move |v| v.len() <= max,
        move || ErrorPayload::client("too_long").with_param("maxLength", max.to_string()),
    )
}

/// Rejects values below the bound with a `too_small` rich code.
pub fn min<T>(inner: &Decoder<T>, minimum: T, inclusive: bool) -> Decoder<T>
where
    T: PartialOrd + Display + Serialize + Clone + Send + Sync + 'static,
{
    let shown = minimum.clone();
    inner.refine_rich(
        move |v| {
            if inclusive {
                *v >= minimum
            } else {
                *v > minimum
            }
        },
        move || {
            ErrorPayload::client("too_small")
                .with_param("minimum", shown.to_string())
                .with_param("inclusive", inclusive.to_string())
        },
    )
}

/// Rejects values above the bound with a `too_big` rich code.
pub fn max<T>(inner: &Decoder<T>, maximum: T, inclusive: bool) -> Decoder<T>
where
    T: PartialOrd + Display + Serialize + Clone + Send + Sync + 'static,
{
    let shown = maximum.clone();
    inner.refine_rich(
        move |v| {
            if inclusive {
                *v <= maximum
            } else {
                *v < maximum
            }
        },
        move || {
            ErrorPayload::client("too_big")
                .with_param("maximum", shown.to_string())
                .with_param("inclusive", inclusive.to_string())
        },
    )
}

/// Decodes a JSON number that is a whole value fitting `i64`, with a
/// `not_int` rich code otherwise.
pub fn integer() -> Decoder<i64> {
    number().parse(|n, _| {
        if n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
            Ok(n as i64)
        } else {
            Err(ErrorTree::leaf(
                crate::decode::decoded_input(&n),
                ErrorPayload::client("not_int").encode(),
            ))
        }
    })
}
