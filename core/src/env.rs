// Hail
// Copyright 2025 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Utilities to deal with environment variables.

use std::env;
use std::time::Duration;

/// Result type for environment errors.
type Result<T> = std::result::Result<T, String>;

/// Wrapper around an environment variable's value to support conversions to other types.
pub struct Value(String);

impl TryFrom<Value> for String {
    type Error = String;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        Ok(value.0)
    }
}

impl TryFrom<Value> for Duration {
    type Error = String;

    /// Parses a duration expressed as an integer quantity followed by a unit suffix, one of
    /// `s`, `m`, `h` or `d`.
    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        let raw = value.0;
        let (quantity, multiplier) = match raw.chars().last() {
            Some('s') => (&raw[..raw.len() - 1], 1),
            Some('m') => (&raw[..raw.len() - 1], 60),
            Some('h') => (&raw[..raw.len() - 1], 60 * 60),
            Some('d') => (&raw[..raw.len() - 1], 24 * 60 * 60),
            _ => return Err(format!("Invalid Duration {}: missing unit suffix", raw)),
        };
        match quantity.parse::<u64>() {
            Ok(quantity) => Ok(Duration::from_secs(quantity * multiplier)),
            Err(e) => Err(format!("Invalid Duration {}: {}", raw, e)),
        }
    }
}

/// Generates a `TryFrom<Value>` for a type that can be parsed by `FromStr`.
macro_rules! tryfrom_value_for_fromstr [
    ( $t:ty ) => {
        impl TryFrom<Value> for $t {
            type Error = String;

            fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
                value.0.parse::<$t>().map_err(|e| format!("Invalid {}: {}", stringify!($t), e))
            }
        }
    }
];

tryfrom_value_for_fromstr!(i8);
tryfrom_value_for_fromstr!(i16);
tryfrom_value_for_fromstr!(i32);
tryfrom_value_for_fromstr!(i64);
tryfrom_value_for_fromstr!(i128);
tryfrom_value_for_fromstr!(u8);
tryfrom_value_for_fromstr!(u16);
tryfrom_value_for_fromstr!(u32);
tryfrom_value_for_fromstr!(u64);
tryfrom_value_for_fromstr!(u128);
tryfrom_value_for_fromstr!(usize);

/// Gets a required environment variable whose name is `<prefix>_<suffix>` with a conversion to
/// a target type `T`.
pub fn get_required_var<T: TryFrom<Value, Error = String>>(
    prefix: &str,
    suffix: &str,
) -> Result<T> {
    let name = format!("{}_{}", prefix, suffix);
    match env::var(&name) {
        Ok(value) => match Value(value).try_into() {
            Ok(value) => Ok(value),
            Err(e) => Err(format!("Invalid type in environment variable {}: {}", name, e)),
        },
        Err(env::VarError::NotPresent) => {
            Err(format!("Required environment variable {} not present", name))
        }
        Err(env::VarError::NotUnicode(_)) => {
            Err(format!("Invalid value in environment variable {}", name))
        }
    }
}

/// Gets an optional environment variable whose name is `<prefix>_<suffix>` with a conversion to
/// a target type `T`, returning `None` if the variable is not set.
pub fn get_optional_var<T: TryFrom<Value, Error = String>>(
    prefix: &str,
    suffix: &str,
) -> Result<Option<T>> {
    let name = format!("{}_{}", prefix, suffix);
    match env::var(&name) {
        Ok(value) => match Value(value).try_into() {
            Ok(value) => Ok(Some(value)),
            Err(e) => Err(format!("Invalid type in environment variable {}: {}", name, e)),
        },
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => {
            Err(format!("Invalid value in environment variable {}", name))
        }
    }
}
