use regex::Regex;
use std::sync::OnceLock;
use crate::error::{AppError, AppResult};

fn e164() -> &'static Regex {
    static E164: OnceLock<Regex> = OnceLock::new();
    E164.get_or_init(|| Regex::new(r"^\+[1-9]\d{7,14}$").expect("static regex"))
}

/// Validates an E.164 phone number (`+` followed by 8 to 15 digits).
pub fn validate_phone(phone: &str) -> AppResult<()> {
    if !e164().is_match(phone) {
        return Err(AppError::ValidationError(
            "Invalid phone number, expected international format (+<country><number>)".to_string()
        ));
    }

    Ok(())
}

/// Strips spaces, dashes and brackets and turns a leading `00` into `+`.
pub fn normalize_phone(phone: &str) -> String {
    let trimmed = phone.trim();
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

    if trimmed.starts_with('+') {
        format!("+{digits}")
    } else if let Some(rest) = digits.strip_prefix("00") {
        format!("+{rest}")
    } else {
        digits
    }
}

/// Normalizes then validates, returning the canonical form.
pub fn canonical_phone(phone: &str) -> AppResult<String> {
    let normalized = normalize_phone(phone);
    validate_phone(&normalized)?;
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+919876543210").is_ok());
        assert!(validate_phone("+12345678901").is_ok());
        assert!(validate_phone("9876543210").is_err());
        assert!(validate_phone("+0123456789").is_err());
        assert!(validate_phone("+1234").is_err());
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("+91 98765-43210"), "+919876543210");
        assert_eq!(normalize_phone("0091 (987) 654 3210"), "+919876543210");
        assert_eq!(normalize_phone("9876543210"), "9876543210");
    }

    #[test]
    fn test_canonical_phone() {
        assert_eq!(canonical_phone(" +1 (234) 567-8901 ").unwrap(), "+12345678901");
        assert!(canonical_phone("12345").is_err());
    }
}
