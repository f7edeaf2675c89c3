use chrono::{DateTime, Duration, Utc};
use rand::{thread_rng, Rng};

const CODE_TTL_HOURS: i64 = 1;

/// A one-time email verification code.
///
/// Six decimal digits, uniform over [100000, 999999], drawn from the
/// OS-seeded thread RNG. Expiry is fixed at one hour from issuance.
#[derive(Clone, Debug)]
pub struct VerificationCode {
    code: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl VerificationCode {
    pub fn generate() -> Self {
        let code = thread_rng().gen_range(100_000..=999_999).to_string();
        let issued_at = Utc::now();
        let expires_at = issued_at + Duration::hours(CODE_TTL_HOURS);

        Self {
            code,
            issued_at,
            expires_at,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_six_digits() {
        for _ in 0..100 {
            let code = VerificationCode::generate();
            assert_eq!(code.code().len(), 6);
            assert!(code.code().chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_code_stays_in_range() {
        for _ in 0..100 {
            let code = VerificationCode::generate();
            let value: u32 = code.code().parse().expect("code is numeric");
            assert!((100_000..=999_999).contains(&value));
        }
    }

    #[test]
    fn test_expiry_is_one_hour_after_issuance() {
        let code = VerificationCode::generate();
        assert_eq!(code.expires_at() - code.issued_at(), Duration::hours(1));
    }

    #[test]
    fn test_code_not_immediately_expired() {
        let code = VerificationCode::generate();
        assert!(!code.is_expired());
    }
}
