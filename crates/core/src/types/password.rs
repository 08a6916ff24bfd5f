//! Account password policy.
//!
//! A password is 8-15 characters drawn from ASCII letters, digits and the
//! symbols `!@#$%^&*`, with at least one of each class.

/// Symbols accepted in passwords.
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*";

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 15;

/// Reasons a password is rejected.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    TooShort,
    #[error("password must be at most {MAX_PASSWORD_LENGTH} characters")]
    TooLong,
    #[error("password must contain a lowercase letter")]
    MissingLowercase,
    #[error("password must contain an uppercase letter")]
    MissingUppercase,
    #[error("password must contain a digit")]
    MissingDigit,
    #[error("password must contain one of {PASSWORD_SYMBOLS}")]
    MissingSymbol,
    #[error("password contains an unsupported character {0:?}")]
    InvalidCharacter(char),
}

/// Check a candidate password against the account policy.
///
/// # Errors
///
/// Returns the first [`PasswordError`] the password triggers. Character
/// checks run before length checks so the message names the actual problem.
///
/// # Examples
///
/// ```
/// use ecommerce_core::{PasswordError, validate_password};
///
/// assert!(validate_password("StronG!Passw0rd").is_ok());
/// assert_eq!(validate_password("weak"), Err(PasswordError::MissingUppercase));
/// ```
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    if let Some(bad) = password
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !PASSWORD_SYMBOLS.contains(*c))
    {
        return Err(PasswordError::InvalidCharacter(bad));
    }

    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(PasswordError::MissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(PasswordError::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordError::MissingDigit);
    }
    if !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        return Err(PasswordError::MissingSymbol);
    }

    // Only ASCII remains at this point, so byte length equals char count.
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort);
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(PasswordError::TooLong);
    }

    Ok(())
}
