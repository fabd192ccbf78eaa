//! Fixed-point price arithmetic
//!
//! Prices are quoted with two fractional digits, so the engine stores them
//! as integer cents and never touches floating point in the hot path.
//! `rust_decimal` is used only at the boundary: parsing incoming values,
//! validating scale, and rendering averages.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors produced when constructing a [`Price`] from external input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("price must be positive")]
    NotPositive,

    #[error("price must be a multiple of 0.01")]
    TooPrecise,

    #[error("price exceeds maximum of {}", Price::MAX)]
    OutOfRange,

    #[error("invalid price: {0}")]
    Unparseable(String),
}

/// Limit price held as integer cents of the quote currency.
///
/// Always strictly positive and at most [`Price::MAX`]. Ordering on the
/// wrapped cents matches ordering on the decimal value, so `Price` can key
/// the book's sorted level maps directly. Serialized as a decimal string
/// with two fractional digits to avoid JSON number precision loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(i64);

impl Price {
    /// Largest representable price: 999,999.99
    pub const MAX: Price = Price(99_999_999);

    /// Create a price from integer cents.
    ///
    /// # Panics
    /// Panics if `cents` is not positive or exceeds the maximum. Use
    /// [`Price::from_decimal`] for untrusted input.
    pub fn from_cents(cents: i64) -> Self {
        assert!(cents > 0, "price must be positive");
        assert!(cents <= Self::MAX.0, "price out of range");
        Self(cents)
    }

    /// Fallible variant of [`Price::from_cents`] for untrusted input such
    /// as storage rows.
    pub fn try_from_cents(cents: i64) -> Result<Self, PriceError> {
        if cents <= 0 {
            Err(PriceError::NotPositive)
        } else if cents > Self::MAX.0 {
            Err(PriceError::OutOfRange)
        } else {
            Ok(Self(cents))
        }
    }

    /// Validate and convert an external decimal value.
    pub fn from_decimal(value: Decimal) -> Result<Self, PriceError> {
        if value <= Decimal::ZERO {
            return Err(PriceError::NotPositive);
        }
        let normalized = value.normalize();
        if normalized.scale() > 2 {
            return Err(PriceError::TooPrecise);
        }
        let cents = (normalized * Decimal::new(100, 0))
            .to_i64()
            .ok_or(PriceError::OutOfRange)?;
        if cents > Self::MAX.0 {
            return Err(PriceError::OutOfRange);
        }
        Ok(Self(cents))
    }

    /// Parse from a decimal string such as `"101.50"`.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let decimal =
            Decimal::from_str(s).map_err(|_| PriceError::Unparseable(s.to_string()))?;
        Self::from_decimal(decimal)
    }

    /// The price in integer cents.
    pub fn as_cents(&self) -> i64 {
        self.0
    }

    /// The price as a two-decimal value.
    pub fn as_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_decimal())
    }
}

// Serialized as string; deserialization also accepts JSON numbers since
// clients send either form.
impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.as_decimal().to_string())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(PriceVisitor)
    }
}

struct PriceVisitor;

impl serde::de::Visitor<'_> for PriceVisitor {
    type Value = Price;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a positive decimal with at most two fractional digits")
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Price, E> {
        Price::parse(v).map_err(E::custom)
    }

    fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Price, E> {
        let decimal = Decimal::from_f64(v)
            .ok_or_else(|| E::custom(PriceError::Unparseable(v.to_string())))?;
        Price::from_decimal(decimal).map_err(E::custom)
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Price, E> {
        Price::from_decimal(Decimal::from(v)).map_err(E::custom)
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Price, E> {
        Price::from_decimal(Decimal::from(v)).map_err(E::custom)
    }
}
