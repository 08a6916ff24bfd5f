//! Account management commands.

use ecommerce_api::db::users::UserRepository;
use ecommerce_core::Email;

use super::connect;

/// Grant admin rights to the account registered under `email`.
///
/// This is how the first administrator is created: sign up through the
/// API, then promote the account here.
///
/// # Errors
///
/// Returns an error if the email is invalid, no account uses it, or the
/// database is unreachable.
pub async fn promote(email: &str) -> Result<(), Box<dyn std::error::Error>> {
    let email = Email::parse(email)?;
    let pool = connect().await?;

    let user = UserRepository::new(&pool)
        .promote_by_email(&email)
        .await?
        .ok_or_else(|| format!("No account found for {email}"))?;

    tracing::info!(user_id = %user.id, email = %user.email, "User promoted to admin");
    Ok(())
}
