//! Field validation shared by the account and catalog services.
//!
//! Each check returns the cleaned value or a [`Violation::InvalidField`]
//! naming the wire field.

use rust_decimal::Decimal;
use url::Url;

use ecommerce_core::{Email, Pagination, Price, validate_password};

use super::Violation;
use crate::models::PageQuery;

/// Largest phone number accepted (8 digits).
const MAX_PHONE: i64 = 99_999_999;

/// Trim `value` and check its length in characters.
pub fn text(field: &'static str, value: &str, min: usize, max: usize) -> Result<String, Violation> {
    let value = value.trim();
    let len = value.chars().count();
    if len < min || len > max {
        return Err(Violation::invalid(
            field,
            format_args!("must be between {min} and {max} characters"),
        ));
    }
    Ok(value.to_owned())
}

/// Trim `value` and require it to be non-empty.
pub fn required(field: &'static str, value: &str) -> Result<String, Violation> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Violation::invalid(field, "must not be empty"));
    }
    Ok(value.to_owned())
}

pub fn email(value: &str) -> Result<Email, Violation> {
    Email::parse(value).map_err(|e| Violation::invalid("email", e))
}

pub fn phone(value: i64) -> Result<i64, Violation> {
    if (1..=MAX_PHONE).contains(&value) {
        Ok(value)
    } else {
        Err(Violation::invalid(
            "phone",
            "must be a positive number of at most 8 digits",
        ))
    }
}

/// Check the password policy and that the confirmation matches.
pub fn password(password: &str, confirm: &str) -> Result<(), Violation> {
    validate_password(password).map_err(|e| Violation::invalid("password", e))?;
    if password != confirm {
        return Err(Violation::invalid("confirmPassword", "must match password"));
    }
    Ok(())
}

pub fn price(value: Decimal) -> Result<Price, Violation> {
    Price::parse(value).map_err(|e| Violation::invalid("price", e))
}

pub fn stock(value: i64) -> Result<i32, Violation> {
    if value < 0 {
        return Err(Violation::invalid("stock", "must not be negative"));
    }
    i32::try_from(value).map_err(|_| Violation::invalid("stock", "is too large"))
}

/// Require an absolute http(s) URL.
pub fn image_url(value: &str) -> Result<String, Violation> {
    let url = Url::parse(value.trim()).map_err(|e| Violation::invalid("imgUrl", e))?;
    match url.scheme() {
        "http" | "https" => Ok(url.into()),
        other => Err(Violation::invalid(
            "imgUrl",
            format_args!("unsupported scheme {other}"),
        )),
    }
}

/// Strict pagination: values below 1 are rejected.
pub fn page(query: PageQuery) -> Result<Pagination, Violation> {
    Pagination::new(query.page, query.limit).map_err(|e| {
        let field = match e {
            ecommerce_core::PaginationError::InvalidPage => "page",
            ecommerce_core::PaginationError::InvalidLimit => "limit",
        };
        Violation::invalid(field, e)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn field_of(v: &Violation) -> &'static str {
        match v {
            Violation::InvalidField { field, .. } => *field,
            other => panic!("unexpected violation {other:?}"),
        }
    }

    #[test]
    fn test_text_trims_and_counts_chars() {
        assert_eq!(text("name", "  Ana  ", 3, 80).unwrap(), "Ana");
        assert_eq!(field_of(&text("name", "ab", 3, 80).unwrap_err()), "name");
        // Multi-byte characters count once.
        assert!(text("city", "Göteb", 5, 20).is_ok());
        assert!(text("city", &"x".repeat(21), 5, 20).is_err());
    }

    #[test]
    fn test_required() {
        assert_eq!(required("description", " ok ").unwrap(), "ok");
        assert!(required("description", "   ").is_err());
    }

    #[test]
    fn test_phone_range() {
        assert_eq!(phone(12_345_678).unwrap(), 12_345_678);
        assert!(phone(0).is_err());
        assert!(phone(-5).is_err());
        assert!(phone(123_456_789).is_err());
    }

    #[test]
    fn test_password_and_confirmation() {
        assert!(password("Abcdef1!", "Abcdef1!").is_ok());
        assert_eq!(
            field_of(&password("Abcdef1!", "Abcdef1?").unwrap_err()),
            "confirmPassword"
        );
        assert_eq!(field_of(&password("abc", "abc").unwrap_err()), "password");
    }

    #[test]
    fn test_price_and_stock() {
        assert_eq!(
            price(Decimal::from_str("10.5").unwrap()).unwrap().to_string(),
            "10.50"
        );
        assert!(price(Decimal::from_str("-1").unwrap()).is_err());
        assert!(price(Decimal::from_str("1.005").unwrap()).is_err());
        assert_eq!(stock(0).unwrap(), 0);
        assert!(stock(-1).is_err());
        assert!(stock(i64::from(i32::MAX) + 1).is_err());
    }

    #[test]
    fn test_image_url() {
        assert_eq!(
            image_url("https://cdn.example.com/a.png").unwrap(),
            "https://cdn.example.com/a.png"
        );
        assert!(image_url("ftp://example.com/a.png").is_err());
        assert!(image_url("not a url").is_err());
    }

    #[test]
    fn test_page_rejects_values_below_one() {
        let p = page(PageQuery {
            page: Some(2),
            limit: Some(5),
        })
        .unwrap();
        assert_eq!(p.offset(), 5);
        let err = page(PageQuery {
            page: Some(0),
            limit: None,
        })
        .unwrap_err();
        assert_eq!(field_of(&err), "page");
        let err = page(PageQuery {
            page: None,
            limit: Some(-1),
        })
        .unwrap_err();
        assert_eq!(field_of(&err), "limit");
    }
}
