use regex::Regex;
use std::sync::OnceLock;
use crate::error::{AppError, AppResult};

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
            .expect("static regex")
    })
}

/// Trims and lowercases, then checks the shape of the address.
pub fn canonical_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    if email.len() > 254 || !email_pattern().is_match(&email) {
        return Err(AppError::ValidationError("Invalid email address".to_string()));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_email() {
        assert_eq!(
            canonical_email("  Jane.Doe@Example.COM ").unwrap(),
            "jane.doe@example.com"
        );
        assert!(canonical_email("jane@localhost").is_err());
        assert!(canonical_email("not an email").is_err());
        assert!(canonical_email("@example.com").is_err());
    }
}
