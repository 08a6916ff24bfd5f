//! Monetary amounts with currency precision.
//!
//! Prices are stored as `NUMERIC(10,2)`: non-negative, two fractional digits,
//! at most eight integer digits. [`Price`] enforces the same rules in memory
//! so that sums of prices stay exact.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of fractional digits kept for every amount.
pub const CURRENCY_SCALE: u32 = 2;

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The amount has more fractional digits than the currency allows.
    #[error("price can have at most {CURRENCY_SCALE} decimal places")]
    TooPrecise,
    /// The amount does not fit in the storage column.
    #[error("price must be lower than {}", Price::MAX)]
    TooLarge,
}

/// A non-negative amount with two fractional digits.
///
/// # Examples
///
/// ```
/// use ecommerce_core::Price;
/// use rust_decimal::Decimal;
///
/// let a = Price::parse(Decimal::new(1000, 2)).unwrap();
/// let b = Price::parse(Decimal::new(15, 0)).unwrap();
/// assert_eq!(Price::sum([a, b]).unwrap().to_string(), "25.00");
///
/// assert!(Price::parse(Decimal::new(-1, 0)).is_err());
/// assert!(Price::parse(Decimal::new(1001, 3)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Largest amount a `NUMERIC(10,2)` column holds.
    pub const MAX: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

    /// The zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Validate and normalize an amount to currency precision.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError`] if the amount is negative, has more than two
    /// fractional digits, or exceeds [`Price::MAX`].
    pub fn parse(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount.normalize().scale() > CURRENCY_SCALE {
            return Err(PriceError::TooPrecise);
        }
        if amount > Self::MAX {
            return Err(PriceError::TooLarge);
        }

        let mut normalized = amount.round_dp(CURRENCY_SCALE);
        normalized.rescale(CURRENCY_SCALE);
        Ok(Self(normalized))
    }

    /// Wrap an amount read back from storage without re-validating it.
    #[must_use]
    pub fn from_stored(amount: Decimal) -> Self {
        let mut amount = amount;
        amount.rescale(CURRENCY_SCALE);
        Self(amount)
    }

    /// Exact sum of a set of prices, kept at currency precision.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::TooLarge`] if the total exceeds [`Price::MAX`].
    pub fn sum<I>(prices: I) -> Result<Self, PriceError>
    where
        I: IntoIterator<Item = Self>,
    {
        let mut total = prices.into_iter().try_fold(Decimal::ZERO, |acc, price| {
            acc.checked_add(price.0)
                .filter(|total| *total <= Self::MAX)
                .ok_or(PriceError::TooLarge)
        })?;
        total.rescale(CURRENCY_SCALE);
        Ok(Self(total))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl Default for Price {
    fn default() -> Self {
        Self::ZERO
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(feature = "postgres")]
impl ::sqlx::Type<::sqlx::Postgres> for Price {
    fn type_info() -> ::sqlx::postgres::PgTypeInfo {
        <Decimal as ::sqlx::Type<::sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for Price {
    fn decode(
        value: ::sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, ::sqlx::error::BoxDynError> {
        let amount = <Decimal as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
        Ok(Self::from_stored(amount))
    }
}

#[cfg(feature = "postgres")]
impl ::sqlx::Encode<'_, ::sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut ::sqlx::postgres::PgArgumentBuffer,
    ) -> Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
        <Decimal as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn price(text: &str) -> Price {
        Price::parse(text.parse().unwrap()).unwrap()
    }

    #[test]
    fn test_parse_normalizes_scale() {
        assert_eq!(price("10").to_string(), "10.00");
        assert_eq!(price("10.5").to_string(), "10.50");
        assert_eq!(price("0").to_string(), "0.00");
    }

    #[test]
    fn test_parse_accepts_trailing_zeros_beyond_scale() {
        assert_eq!(price("19.9900").to_string(), "19.99");
    }

    #[test]
    fn test_parse_rejects_negative() {
        let result = Price::parse("-0.01".parse().unwrap());
        assert_eq!(result, Err(PriceError::Negative));
    }

    #[test]
    fn test_parse_rejects_sub_cent_amounts() {
        let result = Price::parse("1.005".parse().unwrap());
        assert_eq!(result, Err(PriceError::TooPrecise));
    }

    #[test]
    fn test_parse_rejects_overflowing_column() {
        let result = Price::parse("100000000.00".parse().unwrap());
        assert_eq!(result, Err(PriceError::TooLarge));
        assert!(Price::parse(Price::MAX).is_ok());
        assert_eq!(Price::MAX.to_string(), "99999999.99");
    }

    #[test]
    fn test_sum_is_exact() {
        let total = Price::sum([price("0.10"), price("0.20"), price("0.30")]).unwrap();
        assert_eq!(total, price("0.60"));
    }

    #[test]
    fn test_sum_of_nothing_is_zero() {
        assert_eq!(Price::sum([]).unwrap(), Price::ZERO);
        assert_eq!(Price::sum([]).unwrap().to_string(), "0.00");
    }

    #[test]
    fn test_sum_rejects_totals_above_column_range() {
        let max = Price::parse(Price::MAX).unwrap();
        assert_eq!(Price::sum([max]).unwrap(), max);
        assert_eq!(Price::sum([max, price("0.01")]), Err(PriceError::TooLarge));
        assert_eq!(
            Price::sum([price("60000000.00"), price("60000000.00")]),
            Err(PriceError::TooLarge)
        );
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&price("25")).unwrap();
        assert_eq!(json, "\"25.00\"");
    }

    #[test]
    fn test_deserializes_numbers_and_strings() {
        let from_number: Price = serde_json::from_str("12.5").unwrap();
        let from_string: Price = serde_json::from_str("\"12.50\"").unwrap();
        assert_eq!(from_number, from_string);

        let negative: Result<Price, _> = serde_json::from_str("-3");
        assert!(negative.is_err());
    }
}
