// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Typed literals and their single-value binary serialization.

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use ordered_float::OrderedFloat;
use serde_bytes::ByteBuf;

use crate::error::Result;
use crate::spec::datatypes::{PrimitiveType, Type};
use crate::{Error, ErrorKind, ensure_data_valid};

/// Maximum value for [`PrimitiveType::Time`] type in microseconds.
pub(crate) const MAX_TIME_VALUE: i64 = 24 * 60 * 60 * 1_000_000i64 - 1;

const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Values present in iceberg type
#[derive(Clone, Debug, PartialOrd, PartialEq, Hash, Eq)]
pub enum PrimitiveLiteral {
    /// 0x00 for false, non-zero byte for true
    Boolean(bool),
    /// Stored as 4-byte little-endian
    Int(i32),
    /// Stored as 8-byte little-endian
    Long(i64),
    /// Stored as 4-byte little-endian
    Float(OrderedFloat<f32>),
    /// Stored as 8-byte little-endian
    Double(OrderedFloat<f64>),
    /// UTF-8 bytes (without length)
    String(String),
    /// Binary value (without length)
    Binary(Vec<u8>),
    /// Unscaled decimal value
    Int128(i128),
    /// Uuid value
    UInt128(u128),
}

/// Literal associated with its type.
///
/// The pair is checked on construction, so comparisons only ever happen between values of one
/// primitive type. Values of different types are unordered.
#[derive(Clone, Debug, PartialEq, Hash, Eq)]
pub struct Datum {
    r#type: PrimitiveType,
    literal: PrimitiveLiteral,
}

impl PartialOrd for Datum {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (&self.literal, &other.literal, &self.r#type, &other.r#type) {
            (PrimitiveLiteral::Boolean(v), PrimitiveLiteral::Boolean(o), _, _) => v.partial_cmp(o),
            (PrimitiveLiteral::Int(v), PrimitiveLiteral::Int(o), t, ot) if t == ot => {
                v.partial_cmp(o)
            }
            (PrimitiveLiteral::Long(v), PrimitiveLiteral::Long(o), t, ot) if t == ot => {
                v.partial_cmp(o)
            }
            (PrimitiveLiteral::Float(v), PrimitiveLiteral::Float(o), _, _) => Some(v.cmp(o)),
            (PrimitiveLiteral::Double(v), PrimitiveLiteral::Double(o), _, _) => Some(v.cmp(o)),
            (PrimitiveLiteral::String(v), PrimitiveLiteral::String(o), _, _) => v.partial_cmp(o),
            (PrimitiveLiteral::UInt128(v), PrimitiveLiteral::UInt128(o), _, _) => {
                v.partial_cmp(o)
            }
            (PrimitiveLiteral::Binary(v), PrimitiveLiteral::Binary(o), t, ot) if t == ot => {
                v.partial_cmp(o)
            }
            (
                PrimitiveLiteral::Int128(v),
                PrimitiveLiteral::Int128(o),
                PrimitiveType::Decimal { scale, .. },
                PrimitiveType::Decimal {
                    scale: other_scale,
                    ..
                },
            ) => compare_decimal(*v, *scale, *o, *other_scale),
            _ => None,
        }
    }
}

/// Compares two unscaled decimals by lifting the one with the smaller scale.
fn compare_decimal(val: i128, scale: u32, other: i128, other_scale: u32) -> Option<Ordering> {
    match scale.cmp(&other_scale) {
        Ordering::Equal => Some(val.cmp(&other)),
        Ordering::Less => {
            let lifted = 10i128
                .checked_pow(other_scale - scale)
                .and_then(|f| val.checked_mul(f))?;
            Some(lifted.cmp(&other))
        }
        Ordering::Greater => {
            let lifted = 10i128
                .checked_pow(scale - other_scale)
                .and_then(|f| other.checked_mul(f))?;
            Some(val.cmp(&lifted))
        }
    }
}

impl Display for Datum {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (&self.r#type, &self.literal) {
            (PrimitiveType::Date, PrimitiveLiteral::Int(val)) => match days_to_date(*val) {
                Some(date) => write!(f, "{date}"),
                None => write!(f, "{val}"),
            },
            (PrimitiveType::Time, PrimitiveLiteral::Long(val)) => {
                match micros_to_time(*val) {
                    Some(time) => write!(f, "{time}"),
                    None => write!(f, "{val}"),
                }
            }
            (PrimitiveType::Timestamp, PrimitiveLiteral::Long(val)) => {
                match DateTime::from_timestamp_micros(*val) {
                    Some(ts) => write!(f, "{}", ts.naive_utc()),
                    None => write!(f, "{val}"),
                }
            }
            (PrimitiveType::Timestamptz, PrimitiveLiteral::Long(val)) => {
                match DateTime::from_timestamp_micros(*val) {
                    Some(ts) => write!(f, "{ts}"),
                    None => write!(f, "{val}"),
                }
            }
            (_, PrimitiveLiteral::Boolean(val)) => write!(f, "{val}"),
            (_, PrimitiveLiteral::Int(val)) => write!(f, "{val}"),
            (_, PrimitiveLiteral::Long(val)) => write!(f, "{val}"),
            (_, PrimitiveLiteral::Float(val)) => write!(f, "{val}"),
            (_, PrimitiveLiteral::Double(val)) => write!(f, "{val}"),
            (_, PrimitiveLiteral::String(val)) => write!(f, r#""{val}""#),
            (_, PrimitiveLiteral::UInt128(val)) => write!(f, "{}", uuid::Uuid::from_u128(*val)),
            (_, PrimitiveLiteral::Binary(val)) => {
                for b in val {
                    write!(f, "{b:02X}")?;
                }
                Ok(())
            }
            (PrimitiveType::Decimal { scale, .. }, PrimitiveLiteral::Int128(val)) => {
                display_decimal(*val, *scale, f)
            }
            (_, PrimitiveLiteral::Int128(val)) => write!(f, "{val}"),
        }
    }
}

fn display_decimal(unscaled: i128, scale: u32, f: &mut Formatter<'_>) -> std::fmt::Result {
    if scale == 0 {
        return write!(f, "{unscaled}");
    }
    let digits = unscaled.unsigned_abs().to_string();
    let scale = scale as usize;
    let padded = if digits.len() <= scale {
        format!("{}{digits}", "0".repeat(scale - digits.len() + 1))
    } else {
        digits
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - scale);
    let sign = if unscaled < 0 { "-" } else { "" };
    write!(f, "{sign}{int_part}.{frac_part}")
}

fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

fn micros_to_time(micros: i64) -> Option<NaiveTime> {
    let secs = u32::try_from(micros.div_euclid(1_000_000)).ok()?;
    let nanos = u32::try_from(micros.rem_euclid(1_000_000) * 1_000).ok()?;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
}

impl From<Datum> for PrimitiveLiteral {
    fn from(value: Datum) -> Self {
        value.literal
    }
}

impl Datum {
    /// Creates a `Datum` from a `PrimitiveType` and a `PrimitiveLiteral`
    pub(crate) fn new(r#type: PrimitiveType, literal: PrimitiveLiteral) -> Self {
        Datum { r#type, literal }
    }

    /// Create iceberg value from bytes.
    ///
    /// See [this spec](https://iceberg.apache.org/spec/#binary-single-value-serialization) for reference.
    pub fn try_from_bytes(bytes: &[u8], data_type: PrimitiveType) -> Result<Self> {
        let literal = match data_type {
            PrimitiveType::Boolean => PrimitiveLiteral::Boolean(!(bytes.len() == 1 && bytes[0] == 0)),
            PrimitiveType::Int | PrimitiveType::Date => {
                PrimitiveLiteral::Int(i32::from_le_bytes(bytes.try_into()?))
            }
            PrimitiveType::Long => {
                if bytes.len() == 4 {
                    // Column promoted from int.
                    PrimitiveLiteral::Long(i32::from_le_bytes(bytes.try_into()?) as i64)
                } else {
                    PrimitiveLiteral::Long(i64::from_le_bytes(bytes.try_into()?))
                }
            }
            PrimitiveType::Float => {
                PrimitiveLiteral::Float(OrderedFloat(f32::from_le_bytes(bytes.try_into()?)))
            }
            PrimitiveType::Double => {
                if bytes.len() == 4 {
                    // Column promoted from float.
                    PrimitiveLiteral::Double(OrderedFloat(
                        f32::from_le_bytes(bytes.try_into()?) as f64
                    ))
                } else {
                    PrimitiveLiteral::Double(OrderedFloat(f64::from_le_bytes(bytes.try_into()?)))
                }
            }
            PrimitiveType::Time | PrimitiveType::Timestamp | PrimitiveType::Timestamptz => {
                PrimitiveLiteral::Long(i64::from_le_bytes(bytes.try_into()?))
            }
            PrimitiveType::String => {
                PrimitiveLiteral::String(std::str::from_utf8(bytes)?.to_string())
            }
            PrimitiveType::Uuid => {
                PrimitiveLiteral::UInt128(u128::from_be_bytes(bytes.try_into()?))
            }
            PrimitiveType::Fixed(_) | PrimitiveType::Binary => {
                PrimitiveLiteral::Binary(Vec::from(bytes))
            }
            PrimitiveType::Decimal { .. } => {
                let unscaled_value = BigInt::from_signed_bytes_be(bytes);
                PrimitiveLiteral::Int128(unscaled_value.to_i128().ok_or_else(|| {
                    Error::new(
                        ErrorKind::DataInvalid,
                        format!("Can't convert bytes to i128: {bytes:?}"),
                    )
                })?)
            }
        };
        Ok(Datum::new(data_type, literal))
    }

    /// Convert the value to bytes
    ///
    /// See [this spec](https://iceberg.apache.org/spec/#binary-single-value-serialization) for reference.
    pub fn to_bytes(&self) -> Result<ByteBuf> {
        let buf = match &self.literal {
            PrimitiveLiteral::Boolean(val) => ByteBuf::from([*val as u8]),
            PrimitiveLiteral::Int(val) => ByteBuf::from(val.to_le_bytes()),
            PrimitiveLiteral::Long(val) => ByteBuf::from(val.to_le_bytes()),
            PrimitiveLiteral::Float(val) => ByteBuf::from(val.to_le_bytes()),
            PrimitiveLiteral::Double(val) => ByteBuf::from(val.to_le_bytes()),
            PrimitiveLiteral::String(val) => ByteBuf::from(val.as_bytes()),
            PrimitiveLiteral::UInt128(val) => ByteBuf::from(val.to_be_bytes()),
            PrimitiveLiteral::Binary(val) => ByteBuf::from(val.as_slice()),
            PrimitiveLiteral::Int128(val) => {
                let PrimitiveType::Decimal { precision, .. } = self.r#type else {
                    return Err(Error::new(
                        ErrorKind::DataInvalid,
                        format!(
                            "PrimitiveLiteral Int128 must be PrimitiveType Decimal but got {}",
                            &self.r#type
                        ),
                    ));
                };
                let required_bytes = Type::decimal_required_bytes(precision)? as usize;
                let mut bytes = BigInt::from(*val).to_signed_bytes_be();
                // Sign-extend to the minimum width for the precision.
                if bytes.len() < required_bytes {
                    let pad = if *val < 0 { 0xFF } else { 0x00 };
                    let mut padded = vec![pad; required_bytes - bytes.len()];
                    padded.extend_from_slice(&bytes);
                    bytes = padded;
                }
                ByteBuf::from(bytes)
            }
        };

        Ok(buf)
    }

    /// Creates a boolean value.
    pub fn bool<T: Into<bool>>(t: T) -> Self {
        Self::new(PrimitiveType::Boolean, PrimitiveLiteral::Boolean(t.into()))
    }

    /// Creates an `int` value.
    pub fn int<T: Into<i32>>(t: T) -> Self {
        Self::new(PrimitiveType::Int, PrimitiveLiteral::Int(t.into()))
    }

    /// Creates a `long` value.
    pub fn long<T: Into<i64>>(t: T) -> Self {
        Self::new(PrimitiveType::Long, PrimitiveLiteral::Long(t.into()))
    }

    /// Creates a `float` value.
    pub fn float<T: Into<f32>>(t: T) -> Self {
        Self::new(
            PrimitiveType::Float,
            PrimitiveLiteral::Float(OrderedFloat(t.into())),
        )
    }

    /// Creates a `double` value.
    pub fn double<T: Into<f64>>(t: T) -> Self {
        Self::new(
            PrimitiveType::Double,
            PrimitiveLiteral::Double(OrderedFloat(t.into())),
        )
    }

    /// Creates date literal from number of days from unix epoch directly.
    pub fn date(days: i32) -> Self {
        Self::new(PrimitiveType::Date, PrimitiveLiteral::Int(days))
    }

    /// Creates date literal from `YYYY-MM-DD` string.
    pub fn date_from_str<S: AsRef<str>>(s: S) -> Result<Self> {
        let date = NaiveDate::parse_from_str(s.as_ref(), "%Y-%m-%d").map_err(|e| {
            Error::new(ErrorKind::DataInvalid, "Can't parse date from string")
                .with_context("value", s.as_ref())
                .with_source(e)
        })?;
        Ok(Self::date(date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE))
    }

    /// Creates time literal in microseconds since midnight.
    pub fn time_micros(value: i64) -> Result<Self> {
        ensure_data_valid!(
            (0..=MAX_TIME_VALUE).contains(&value),
            "Invalid value for Time type: {}",
            value
        );
        Ok(Self::new(PrimitiveType::Time, PrimitiveLiteral::Long(value)))
    }

    /// Creates a timestamp from unix epoch in microseconds.
    pub fn timestamp_micros(value: i64) -> Self {
        Self::new(PrimitiveType::Timestamp, PrimitiveLiteral::Long(value))
    }

    /// Creates a timestamp with timezone from unix epoch in microseconds.
    pub fn timestamptz_micros(value: i64) -> Self {
        Self::new(PrimitiveType::Timestamptz, PrimitiveLiteral::Long(value))
    }

    /// Creates a string literal.
    pub fn string<S: ToString>(s: S) -> Self {
        Self::new(PrimitiveType::String, PrimitiveLiteral::String(s.to_string()))
    }

    /// Creates uuid literal.
    pub fn uuid(uuid: uuid::Uuid) -> Self {
        Self::new(PrimitiveType::Uuid, PrimitiveLiteral::UInt128(uuid.as_u128()))
    }

    /// Creates uuid from str.
    pub fn uuid_from_str<S: AsRef<str>>(s: S) -> Result<Self> {
        let uuid = uuid::Uuid::parse_str(s.as_ref())?;
        Ok(Self::uuid(uuid))
    }

    /// Creates a fixed literal from bytes.
    pub fn fixed<I: IntoIterator<Item = u8>>(input: I) -> Self {
        let value: Vec<u8> = input.into_iter().collect();
        Self::new(
            PrimitiveType::Fixed(value.len() as u64),
            PrimitiveLiteral::Binary(value),
        )
    }

    /// Creates a binary literal from bytes.
    pub fn binary<I: IntoIterator<Item = u8>>(input: I) -> Self {
        Self::new(
            PrimitiveType::Binary,
            PrimitiveLiteral::Binary(input.into_iter().collect()),
        )
    }

    /// Creates a decimal literal from its unscaled value.
    pub fn decimal(unscaled: i128, precision: u32, scale: u32) -> Result<Self> {
        let Type::Primitive(data_type) = Type::decimal(precision, scale)? else {
            return Err(Error::new(ErrorKind::Unexpected, "decimal is always primitive"));
        };
        let limit = 10u128.pow(precision);
        ensure_data_valid!(
            unscaled.unsigned_abs() < limit,
            "Decimal value {} does not fit precision {}",
            unscaled,
            precision
        );
        Ok(Self::new(data_type, PrimitiveLiteral::Int128(unscaled)))
    }

    /// Convert the datum to `target_type`.
    pub fn to(self, target_type: &PrimitiveType) -> Result<Datum> {
        match (&self.literal, &self.r#type, target_type) {
            (_, self_type, target) if self_type == target => Ok(self),
            (PrimitiveLiteral::Int(val), PrimitiveType::Int, PrimitiveType::Long) => {
                Ok(Datum::long(*val))
            }
            (PrimitiveLiteral::Int(val), PrimitiveType::Int, PrimitiveType::Float) => {
                Ok(Datum::float(*val as f32))
            }
            (PrimitiveLiteral::Int(val), PrimitiveType::Int, PrimitiveType::Double) => {
                Ok(Datum::double(*val))
            }
            (PrimitiveLiteral::Long(val), PrimitiveType::Long, PrimitiveType::Int) => {
                Ok(Datum::int(i32::try_from(*val)?))
            }
            (PrimitiveLiteral::Long(val), PrimitiveType::Long, PrimitiveType::Timestamp) => {
                Ok(Datum::timestamp_micros(*val))
            }
            (PrimitiveLiteral::Long(val), PrimitiveType::Long, PrimitiveType::Timestamptz) => {
                Ok(Datum::timestamptz_micros(*val))
            }
            (PrimitiveLiteral::Float(val), PrimitiveType::Float, PrimitiveType::Double) => {
                Ok(Datum::double(val.0 as f64))
            }
            (PrimitiveLiteral::String(val), PrimitiveType::String, PrimitiveType::Date) => {
                Datum::date_from_str(val)
            }
            (PrimitiveLiteral::String(val), PrimitiveType::String, PrimitiveType::Uuid) => {
                Datum::uuid_from_str(val)
            }
            _ => Err(Error::new(
                ErrorKind::DataInvalid,
                format!(
                    "Can't convert datum from {} type to {} type.",
                    self.r#type, target_type
                ),
            )),
        }
    }

    /// Get the primitive literal from datum.
    pub fn literal(&self) -> &PrimitiveLiteral {
        &self.literal
    }

    /// Get the primitive type from datum.
    pub fn data_type(&self) -> &PrimitiveType {
        &self.r#type
    }
}
