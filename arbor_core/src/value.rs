// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dynamic property values and the absorbing `Pending` sentinel.
//!
//! Every property holds a [`Value`]. [`Value::Pending`] stands for "no value
//! yet / evaluation failed" and is algebraically absorbing: any arithmetic,
//! bitwise, or unary operator with a `Pending` operand yields `Pending` again.
//! A derived expression that reads an unready upstream value therefore
//! produces `Pending` downstream instead of failing, and converges on a later
//! evaluation pass.
//!
//! Operators never panic. Type mismatches, integer division by zero, and
//! integer overflow also yield `Pending`; the engine treats them the same as
//! an expression that raised.
//!
//! # Comparison semantics
//!
//! - `Pending == Pending`, and `Pending` is unequal to every other value.
//! - `Pending` orders below every non-pending value.
//! - `Int` and `Float` compare numerically with each other.
//! - [`truthy`](Value::truthy) is `false` for `Pending`.

use alloc::string::String;
use core::cmp::Ordering;
use core::fmt;
use core::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Rem, Shl, Shr, Sub};

/// A dynamically typed property value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// No value yet, or the last evaluation failed.
    #[default]
    Pending,
    /// A boolean.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit float.
    Float(f64),
    /// A string.
    Str(String),
}

impl Value {
    /// Returns `true` if this is the `Pending` sentinel.
    #[inline]
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Boolean conversion: `false` for `Pending`, zero, the empty string, and
    /// `false` itself.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::Pending => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
        }
    }

    /// Returns the integer payload, if any.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a float, promoting integers.
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the boolean payload, if any.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the string payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Identity comparison used for change detection.
    ///
    /// Same as `==`, except that a NaN is the same as a NaN with the same
    /// bit pattern.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => a == b || a.to_bits() == b.to_bits(),
            _ => self == other,
        }
    }

    /// Name of the variant, for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("<pending>"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Pending, Self::Pending) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Float(_) | Self::Int(_), Self::Float(_) | Self::Int(_)) => {
                self.as_float() == other.as_float()
            }
            _ => false,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Pending, Self::Pending) => Some(Ordering::Equal),
            (Self::Pending, _) => Some(Ordering::Less),
            (_, Self::Pending) => Some(Ordering::Greater),
            (Self::Bool(a), Self::Bool(b)) => a.partial_cmp(b),
            (Self::Int(a), Self::Int(b)) => a.partial_cmp(b),
            (Self::Str(a), Self::Str(b)) => a.partial_cmp(b),
            (Self::Float(_) | Self::Int(_), Self::Float(_) | Self::Int(_)) => {
                self.as_float()?.partial_cmp(&other.as_float()?)
            }
            _ => None,
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(v: $ty) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    String => Str,
}

impl From<&str> for Value {
    #[inline]
    fn from(v: &str) -> Self {
        Self::Str(v.into())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Pending, Into::into)
    }
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

/// Applies a numeric binary operation with int/float promotion.
fn numeric(
    lhs: Value,
    rhs: Value,
    int: impl FnOnce(i64, i64) -> Option<i64>,
    float: impl FnOnce(f64, f64) -> Option<f64>,
) -> Value {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => int(a, b).map_or(Value::Pending, Value::Int),
        (a @ (Value::Int(_) | Value::Float(_)), b @ (Value::Int(_) | Value::Float(_))) => {
            match (a.as_float(), b.as_float()) {
                (Some(x), Some(y)) => float(x, y).map_or(Value::Pending, Value::Float),
                _ => Value::Pending,
            }
        }
        _ => Value::Pending,
    }
}

/// Applies an integer (or boolean) binary operation.
fn bitwise(
    lhs: Value,
    rhs: Value,
    int: impl FnOnce(i64, i64) -> Option<i64>,
    boolean: impl FnOnce(bool, bool) -> bool,
) -> Value {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => int(a, b).map_or(Value::Pending, Value::Int),
        (Value::Bool(a), Value::Bool(b)) => Value::Bool(boolean(a, b)),
        _ => Value::Pending,
    }
}

fn nonzero(y: f64) -> Option<f64> {
    (y != 0.0).then_some(y)
}

fn shift_amount(b: i64) -> Option<u32> {
    u32::try_from(b).ok()
}

impl<T: Into<Self>> Add<T> for Value {
    type Output = Self;

    fn add(self, rhs: T) -> Self {
        match (self, rhs.into()) {
            (Self::Str(mut a), Self::Str(b)) => {
                a.push_str(&b);
                Self::Str(a)
            }
            (a, b) => numeric(a, b, i64::checked_add, |x, y| Some(x + y)),
        }
    }
}

impl<T: Into<Self>> Sub<T> for Value {
    type Output = Self;

    fn sub(self, rhs: T) -> Self {
        numeric(self, rhs.into(), i64::checked_sub, |x, y| Some(x - y))
    }
}

impl<T: Into<Self>> Mul<T> for Value {
    type Output = Self;

    fn mul(self, rhs: T) -> Self {
        numeric(self, rhs.into(), i64::checked_mul, |x, y| Some(x * y))
    }
}

impl<T: Into<Self>> Div<T> for Value {
    type Output = Self;

    /// Integer operands use truncating division; any float operand promotes.
    fn div(self, rhs: T) -> Self {
        numeric(self, rhs.into(), i64::checked_div, |x, y| {
            nonzero(y).map(|y| x / y)
        })
    }
}

impl<T: Into<Self>> Rem<T> for Value {
    type Output = Self;

    fn rem(self, rhs: T) -> Self {
        numeric(self, rhs.into(), i64::checked_rem, |x, y| {
            nonzero(y).map(|y| x % y)
        })
    }
}

impl<T: Into<Self>> BitAnd<T> for Value {
    type Output = Self;

    fn bitand(self, rhs: T) -> Self {
        bitwise(self, rhs.into(), |a, b| Some(a & b), |a, b| a & b)
    }
}

impl<T: Into<Self>> BitOr<T> for Value {
    type Output = Self;

    fn bitor(self, rhs: T) -> Self {
        bitwise(self, rhs.into(), |a, b| Some(a | b), |a, b| a | b)
    }
}

impl<T: Into<Self>> BitXor<T> for Value {
    type Output = Self;

    fn bitxor(self, rhs: T) -> Self {
        bitwise(self, rhs.into(), |a, b| Some(a ^ b), |a, b| a ^ b)
    }
}

impl<T: Into<Self>> Shl<T> for Value {
    type Output = Self;

    fn shl(self, rhs: T) -> Self {
        match (self, rhs.into()) {
            (Self::Int(a), Self::Int(b)) => shift_amount(b)
                .and_then(|b| a.checked_shl(b))
                .map_or(Self::Pending, Self::Int),
            _ => Self::Pending,
        }
    }
}

impl<T: Into<Self>> Shr<T> for Value {
    type Output = Self;

    fn shr(self, rhs: T) -> Self {
        match (self, rhs.into()) {
            (Self::Int(a), Self::Int(b)) => shift_amount(b)
                .and_then(|b| a.checked_shr(b))
                .map_or(Self::Pending, Self::Int),
            _ => Self::Pending,
        }
    }
}

impl Neg for Value {
    type Output = Self;

    fn neg(self) -> Self {
        match self {
            Self::Int(i) => i.checked_neg().map_or(Self::Pending, Self::Int),
            Self::Float(f) => Self::Float(-f),
            _ => Self::Pending,
        }
    }
}

impl Not for Value {
    type Output = Self;

    /// Logical negation for booleans, bitwise inversion for integers.
    fn not(self) -> Self {
        match self {
            Self::Bool(b) => Self::Bool(!b),
            Self::Int(i) => Self::Int(!i),
            _ => Self::Pending,
        }
    }
}
