use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Generates a numeric one-time code with exactly `length` digits.
pub fn generate_otp(length: usize) -> String {
    let mut rng = rand::thread_rng();
    let mut code = String::with_capacity(length);
    // no leading zero so the code keeps its length when parsed as a number
    code.push(char::from(b'0' + rng.gen_range(1..=9u8)));
    for _ in 1..length {
        code.push(char::from(b'0' + rng.gen_range(0..=9u8)));
    }
    code
}

pub fn otp_expiry(now: DateTime<Utc>, validity_minutes: i64) -> DateTime<Utc> {
    now + Duration::minutes(validity_minutes)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpCheck {
    Valid,
    Missing,
    Expired,
    Mismatch,
}

/// Expiry is checked before the code so that a stale OTP is always reported
/// (and cleared) even when the caller typed it correctly.
pub fn check_otp(
    stored_code: Option<&str>,
    expires_at: Option<DateTime<Utc>>,
    supplied: &str,
    now: DateTime<Utc>,
) -> OtpCheck {
    let (Some(code), Some(expires_at)) = (stored_code, expires_at) else {
        return OtpCheck::Missing;
    };
    if now > expires_at {
        return OtpCheck::Expired;
    }
    if !codes_match(code, supplied.trim()) {
        return OtpCheck::Mismatch;
    }
    OtpCheck::Valid
}

/// Compares every byte regardless of where the first difference is.
fn codes_match(stored: &str, supplied: &str) -> bool {
    stored.len() == supplied.len()
        && stored
            .bytes()
            .zip(supplied.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_otp_has_requested_length() {
        for length in [4, 6, 8] {
            let code = generate_otp(length);
            assert_eq!(code.len(), length);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(code.chars().next(), Some('0'));
        }
    }

    #[test]
    fn test_otp_checked_eleven_minutes_after_issue_is_expired() {
        let issued = Utc::now() - Duration::minutes(11);
        let expires_at = otp_expiry(issued, 10);
        assert_eq!(
            check_otp(Some("123456"), Some(expires_at), "123456", Utc::now()),
            OtpCheck::Expired
        );
    }

    #[test]
    fn test_check_otp_outcomes() {
        let now = Utc::now();
        let expires_at = otp_expiry(now, 10);
        assert_eq!(
            check_otp(Some("123456"), Some(expires_at), " 123456 ", now),
            OtpCheck::Valid
        );
        assert_eq!(
            check_otp(Some("123456"), Some(expires_at), "654321", now),
            OtpCheck::Mismatch
        );
        assert_eq!(check_otp(None, None, "123456", now), OtpCheck::Missing);
        assert_eq!(
            check_otp(Some("123456"), None, "123456", now),
            OtpCheck::Missing
        );
        assert_eq!(
            check_otp(Some("123456"), Some(expires_at), "1234567", now),
            OtpCheck::Mismatch
        );
        assert_eq!(
            check_otp(Some("123456"), Some(expires_at), "", now),
            OtpCheck::Mismatch
        );
    }
}
