//! Company registration and login.
//!
//! Passwords are stored as salted Argon2id PHC strings. There is no lockout,
//! rate limiting or session expiry.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{Company, Session};
use crate::service::Service;

/// Symbols of which a password must contain at least one.
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*()-+=";

/// Check a password against the complexity policy: at least one letter, one
/// digit and one of [`PASSWORD_SYMBOLS`].
///
/// # Errors
///
/// Returns [`Error::WeakPassword`] naming the first missing class.
pub fn check_password_strength(password: &str) -> Result<()> {
    if !password.chars().any(char::is_alphabetic) {
        return Err(Error::weak_password("must contain a letter"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(Error::weak_password("must contain a digit"));
    }
    if !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        return Err(Error::weak_password(format!(
            "must contain one of {PASSWORD_SYMBOLS}"
        )));
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

impl Service {
    /// Register a company.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty name or password,
    /// [`Error::WeakPassword`] if the password fails the policy, and
    /// [`Error::DuplicateName`] if the name is taken.
    pub fn register(&self, name: &str, password: &str) -> Result<Company> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("company name is required"));
        }
        if password.is_empty() {
            return Err(Error::validation("password is required"));
        }
        check_password_strength(password)?;

        let hash = hash_password(password)?;
        let company = self.storage.insert_company(name, &hash)?;
        info!("Registered company {} (id {})", company.name, company.id);
        Ok(company)
    }

    /// Authenticate a company.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredentials`] for an unknown name or a wrong
    /// password.
    pub fn login(&self, name: &str, password: &str) -> Result<Session> {
        let name = name.trim();
        let Some((company, stored)) = self.storage.find_company_credentials(name)? else {
            debug!("Login for unknown company {}", name);
            return Err(Error::InvalidCredentials);
        };

        if !verify_password(password, &stored)? {
            debug!("Wrong password for company {}", name);
            return Err(Error::InvalidCredentials);
        }

        debug!("Company {} logged in", company.name);
        Ok(Session {
            company_id: company.id,
            company_name: company.name,
        })
    }
}
