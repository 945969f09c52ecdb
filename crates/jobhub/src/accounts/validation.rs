/// Input problems detected before anything is stored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("email address is not valid")]
    InvalidEmail,
    #[error("phone number must contain 8 to 15 digits")]
    InvalidPhone,
    #[error("full name is required")]
    MissingName,
    #[error("password must be at least {min} characters and contain a letter and a digit")]
    WeakPassword { min: usize },
    #[error("administrator accounts cannot be self-registered")]
    RoleNotSelectable,
    #[error("account has no phone number on file")]
    MissingPhone,
}

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Lowercase and check the shape `local@domain.tld`.
pub fn normalize_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim().to_ascii_lowercase();
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ValidationError::InvalidEmail);
    };

    let domain_ok = domain
        .split('.')
        .all(|label| !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'))
        && domain.contains('.');

    if local.is_empty() || local.chars().any(char::is_whitespace) || !domain_ok {
        return Err(ValidationError::InvalidEmail);
    }

    Ok(email)
}

/// Strip separators, keep an optional leading `+`, require 8 to 15 digits.
pub fn normalize_phone(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    let (prefix, rest) = match trimmed.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", trimmed),
    };

    let mut digits = String::with_capacity(rest.len());
    for c in rest.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '(' | ')' | '.' => {}
            _ => return Err(ValidationError::InvalidPhone),
        }
    }

    if !(8..=15).contains(&digits.len()) {
        return Err(ValidationError::InvalidPhone);
    }

    Ok(format!("{prefix}{digits}"))
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let long_enough = password.chars().count() >= MIN_PASSWORD_LENGTH;
    let has_letter = password.chars().any(char::is_alphabetic);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if long_enough && has_letter && has_digit {
        Ok(())
    } else {
        Err(ValidationError::WeakPassword {
            min: MIN_PASSWORD_LENGTH,
        })
    }
}

pub fn normalize_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        Err(ValidationError::MissingName)
    } else {
        Ok(name)
    }
}
