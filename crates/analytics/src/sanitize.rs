//! JSON-safety pass over report shapes.
//!
//! Every report record implements [`Sanitize`] by destructuring itself and
//! visiting each field, so adding a field without visiting it fails to compile.
//! Leaves are either floats (rewritten) or values that cannot be non-finite.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use cafestock_core::{ItemId, RecordId};

/// Finite stand-in for an unbounded positive result (e.g. stock life with no consumption).
pub const POSITIVE_SENTINEL: f64 = 999.0;

/// Finite stand-in for an unbounded negative result.
pub const NEGATIVE_SENTINEL: f64 = -999.0;

/// Rewrite non-finite floats in place: `+inf -> 999.0`, `-inf -> -999.0`, `NaN -> 0.0`.
pub trait Sanitize {
    fn sanitize(&mut self);
}

/// Owned convenience wrapper around [`Sanitize::sanitize`].
pub fn sanitized<T: Sanitize>(mut value: T) -> T {
    value.sanitize();
    value
}

pub fn sanitize_f64(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else if value == f64::INFINITY {
        POSITIVE_SENTINEL
    } else if value == f64::NEG_INFINITY {
        NEGATIVE_SENTINEL
    } else {
        value
    }
}

impl Sanitize for f64 {
    fn sanitize(&mut self) {
        *self = sanitize_f64(*self);
    }
}

impl<T: Sanitize> Sanitize for Option<T> {
    fn sanitize(&mut self) {
        if let Some(v) = self {
            v.sanitize();
        }
    }
}

impl<T: Sanitize> Sanitize for Vec<T> {
    fn sanitize(&mut self) {
        for v in self.iter_mut() {
            v.sanitize();
        }
    }
}

impl<K: Ord, T: Sanitize> Sanitize for BTreeMap<K, T> {
    fn sanitize(&mut self) {
        for v in self.values_mut() {
            v.sanitize();
        }
    }
}

macro_rules! impl_finite_leaf {
    ($($t:ty),* $(,)?) => {
        $(
            impl Sanitize for $t {
                #[inline]
                fn sanitize(&mut self) {}
            }
        )*
    };
}

impl_finite_leaf!(bool, u32, i64, usize, String, DateTime<Utc>, ItemId, RecordId);
