//! Values of the hot parameters.
//!
//! Arguments reach the engine as `ParamKey`s. Floats are normalized to a fixed
//! number of decimals, so `0.1 + 0.2` and `0.3` share the same statistic.

use super::FLOAT_KEY_PRECISION;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::TryFrom;
use std::fmt;

/// ParamKind is the primitive kind of a configured specific value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    Int,
    String,
    Bool,
    Float,
}

impl Default for ParamKind {
    fn default() -> Self {
        ParamKind::String
    }
}

/// ParamKey is a decoded argument value that can be used as a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamKey {
    Int(i64),
    Str(String),
    Bool(bool),
    /// the float scaled by 10^`FLOAT_KEY_PRECISION` and rounded
    Float(i64),
}

#[inline]
fn float_scale() -> f64 {
    10_f64.powi(FLOAT_KEY_PRECISION)
}

impl ParamKey {
    pub fn from_f64(value: f64) -> Self {
        ParamKey::Float((value * float_scale()).round() as i64)
    }

    /// `parse` decodes the string representation of a configured value.
    pub fn parse(kind: ParamKind, value: &str) -> Result<Self> {
        let trimmed = value.trim();
        match kind {
            ParamKind::Int => trimmed
                .parse::<i64>()
                .map(ParamKey::Int)
                .map_err(|err| Error::msg(format!("invalid int value {:?}: {}", value, err))),
            ParamKind::String => Ok(ParamKey::Str(value.into())),
            ParamKind::Bool => trimmed
                .parse::<bool>()
                .map(ParamKey::Bool)
                .map_err(|err| Error::msg(format!("invalid bool value {:?}: {}", value, err))),
            ParamKind::Float => {
                let f = trimmed.parse::<f64>().map_err(|err| {
                    Error::msg(format!("invalid float value {:?}: {}", value, err))
                })?;
                if !f.is_finite() {
                    return Err(Error::msg(format!("invalid float value {:?}", value)));
                }
                Ok(ParamKey::from_f64(f))
            }
        }
    }

    pub fn kind(&self) -> ParamKind {
        match self {
            ParamKey::Int(_) => ParamKind::Int,
            ParamKey::Str(_) => ParamKind::String,
            ParamKey::Bool(_) => ParamKind::Bool,
            ParamKey::Float(_) => ParamKind::Float,
        }
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKey::Int(v) => write!(f, "{}", v),
            ParamKey::Str(v) => write!(f, "{}", v),
            ParamKey::Bool(v) => write!(f, "{}", v),
            ParamKey::Float(v) => write!(
                f,
                "{:.*}",
                FLOAT_KEY_PRECISION as usize,
                *v as f64 / float_scale()
            ),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ParamKey {
                fn from(v: $t) -> Self {
                    ParamKey::Int(v as i64)
                }
            }
        )*
    }
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32, isize);

/// Values above `i64::MAX` saturate.
impl From<u64> for ParamKey {
    fn from(v: u64) -> Self {
        ParamKey::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<usize> for ParamKey {
    fn from(v: usize) -> Self {
        ParamKey::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for ParamKey {
    fn from(v: f64) -> Self {
        ParamKey::from_f64(v)
    }
}

impl From<f32> for ParamKey {
    fn from(v: f32) -> Self {
        ParamKey::from_f64(v as f64)
    }
}

impl From<bool> for ParamKey {
    fn from(v: bool) -> Self {
        ParamKey::Bool(v)
    }
}

impl From<&str> for ParamKey {
    fn from(v: &str) -> Self {
        ParamKey::Str(v.into())
    }
}

impl From<String> for ParamKey {
    fn from(v: String) -> Self {
        ParamKey::Str(v)
    }
}

pub type ParamsList = Vec<ParamKey>;
pub type ParamsMap = HashMap<String, ParamKey>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn float_normalized() {
        assert_eq!(ParamKey::from(0.1 + 0.2), ParamKey::from(0.3));
        assert_eq!(ParamKey::from(1.000_001), ParamKey::from(1.0));
        assert_ne!(ParamKey::from(1.000_01), ParamKey::from(1.0));
        assert_eq!(ParamKey::from(-0.0), ParamKey::from(0.0));
        assert_eq!("3.14159", ParamKey::from(std::f64::consts::PI).to_string());
    }

    #[test]
    fn parse_kinds() {
        assert_eq!(
            ParamKey::Int(-12),
            ParamKey::parse(ParamKind::Int, " -12").unwrap()
        );
        assert_eq!(
            ParamKey::Bool(true),
            ParamKey::parse(ParamKind::Bool, "true").unwrap()
        );
        assert_eq!(
            ParamKey::from(1.5),
            ParamKey::parse(ParamKind::Float, "1.500000001").unwrap()
        );
        assert_eq!(
            ParamKey::from("abc"),
            ParamKey::parse(ParamKind::String, "abc").unwrap()
        );
        assert!(ParamKey::parse(ParamKind::Int, "1.2").is_err());
        assert!(ParamKey::parse(ParamKind::Bool, "yes").is_err());
        assert!(ParamKey::parse(ParamKind::Float, "NaN").is_err());
    }

    #[test]
    fn wide_unsigned() {
        assert_eq!(ParamKey::from(7_i64), ParamKey::from(7_usize));
        assert_eq!(ParamKey::from(7_i64), ParamKey::from(7_u64));
        assert_eq!(ParamKey::Int(i64::MAX), ParamKey::from(u64::MAX));
        assert_eq!(ParamKey::Int(i64::MAX), ParamKey::from(usize::MAX));
    }

    #[test]
    fn kinds_are_distinct() {
        assert_ne!(ParamKey::from(1), ParamKey::from("1"));
        assert_ne!(ParamKey::from(1), ParamKey::from(1.0));
        assert_eq!(ParamKind::Float, ParamKey::from(2.5_f32).kind());
    }
}
