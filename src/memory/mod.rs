//! Watched memory
//!
//! - [`watch_list`] - the table of named, typed addresses loaded at startup
//! - [`sampler`] - all-or-nothing reads of every watched address

pub mod sampler;
pub mod watch_list;

pub use sampler::{MemorySample, MemorySampler, ReadFault, SampleError};
pub use watch_list::{parse_address, RowError, WatchList, WatchListEntry, WatchListError};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declared type of a watched value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    U8,
    U16,
    U32,
    F32,
}

impl ValueType {
    /// Number of bytes read from memory
    pub fn width(self) -> usize {
        match self {
            ValueType::U8 => 1,
            ValueType::U16 => 2,
            ValueType::U32 | ValueType::F32 => 4,
        }
    }
}

impl FromStr for ValueType {
    type Err = RowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "u8" => Ok(ValueType::U8),
            "u16" => Ok(ValueType::U16),
            "u32" => Ok(ValueType::U32),
            "f32" => Ok(ValueType::F32),
            other => Err(RowError::UnsupportedType(other.to_string())),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::U8 => "u8",
            ValueType::U16 => "u16",
            ValueType::U32 => "u32",
            ValueType::F32 => "f32",
        };
        f.write_str(name)
    }
}

/// One sampled value, serialized as a bare JSON number
///
/// The variant carries the width the server read with. A decoded value only
/// knows the number itself (the smallest unsigned variant that fits, or `F32`
/// for fractional values), so values compare by numeric value, not variant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WatchValue {
    U8(u8),
    U16(u16),
    U32(u32),
    F32(f32),
}

impl WatchValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            WatchValue::U8(v) => f64::from(v),
            WatchValue::U16(v) => f64::from(v),
            WatchValue::U32(v) => f64::from(v),
            WatchValue::F32(v) => f64::from(v),
        }
    }
}

impl PartialEq for WatchValue {
    fn eq(&self, other: &Self) -> bool {
        self.as_f64() == other.as_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoded_values_compare_by_number() {
        let decoded: WatchValue = serde_json::from_str("3").unwrap();
        assert!(matches!(decoded, WatchValue::U8(3)));
        assert_eq!(decoded, WatchValue::U32(3));
        assert_eq!(decoded.as_f64(), 3.0);

        let decoded: WatchValue = serde_json::from_str("70000").unwrap();
        assert_eq!(decoded, WatchValue::U32(70_000));
        assert_ne!(decoded, WatchValue::U16(7_000));

        let decoded: WatchValue = serde_json::from_str("-2.5").unwrap();
        assert_eq!(decoded, WatchValue::F32(-2.5));
    }

    #[test]
    fn parses_known_types_only() {
        assert_eq!("f32".parse::<ValueType>().unwrap(), ValueType::F32);
        assert_eq!(ValueType::U16.width(), 2);
        assert!(matches!(
            "i16".parse::<ValueType>(),
            Err(RowError::UnsupportedType(name)) if name == "i16"
        ));
    }
}
