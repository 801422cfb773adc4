use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

pub const USERNAME_MAX: usize = 50;
pub const FULL_NAME_MAX: usize = 100;
pub const EMAIL_MAX: usize = 255;
pub const PASSWORD_MIN: usize = 6;

const PASSWORD_SPECIALS: &str = r#"!@#$%^&*(),.?":{}|<>"#;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("username must be at most 50 characters")]
    UsernameTooLong,
    #[error("full_name must not be empty")]
    EmptyFullName,
    #[error("full_name must be at most 100 characters")]
    FullNameTooLong,
    #[error("email is not a valid address")]
    InvalidEmail,
    #[error("password must be at least 6 characters")]
    PasswordTooShort,
    #[error("password must contain at least one digit")]
    PasswordMissingDigit,
    #[error("password must contain at least one special character")]
    PasswordMissingSpecial,
    #[error("password must contain at least one letter")]
    PasswordMissingLetter,
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= EMAIL_MAX && EMAIL_RE.is_match(email)
}

/// Length >= 6 with a digit, a special character and an ASCII letter,
/// checked in that order.
pub fn check_password_policy(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(ValidationError::PasswordTooShort);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::PasswordMissingDigit);
    }
    if !password.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
        return Err(ValidationError::PasswordMissingSpecial);
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::PasswordMissingLetter);
    }
    Ok(())
}

pub fn check_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::EmptyUsername);
    }
    if username.chars().count() > USERNAME_MAX {
        return Err(ValidationError::UsernameTooLong);
    }
    Ok(())
}

pub fn check_full_name(full_name: &str) -> Result<(), ValidationError> {
    if full_name.is_empty() {
        return Err(ValidationError::EmptyFullName);
    }
    if full_name.chars().count() > FULL_NAME_MAX {
        return Err(ValidationError::FullNameTooLong);
    }
    Ok(())
}
