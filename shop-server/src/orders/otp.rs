//! Order confirmation codes
//!
//! Six-digit numeric codes, stored only as an argon2 hash next to the order
//! and checked lazily on verification.

use rand::Rng;

use super::{OrderError, OrderResult};
use crate::auth::{hash_password, verify_password};

/// Lifetime and attempt budget of issued codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpPolicy {
    pub ttl_secs: i64,
    /// Failed attempts allowed per issued code; 0 disables the limit
    pub max_attempts: u32,
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self {
            ttl_secs: 600,
            max_attempts: 5,
        }
    }
}

/// A freshly generated code; `code` is only ever sent to the customer
pub struct IssuedOtp {
    pub code: String,
    pub hash: String,
    pub expires_at: i64,
}

impl OtpPolicy {
    pub fn issue(&self, now: i64) -> OrderResult<IssuedOtp> {
        let code = generate_code();
        let hash = hash_password(&code)
            .map_err(|e| OrderError::Storage(format!("Failed to hash OTP: {e}")))?;
        Ok(IssuedOtp {
            code,
            hash,
            expires_at: now + self.ttl_secs * 1000,
        })
    }

    pub fn attempts_exhausted(&self, failed_attempts: i64) -> bool {
        self.max_attempts > 0 && failed_attempts >= i64::from(self.max_attempts)
    }

    pub fn ttl_minutes(&self) -> i64 {
        (self.ttl_secs + 59) / 60
    }
}

pub fn generate_code() -> String {
    let code: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
    code.to_string()
}

/// Compare a submitted code against the stored hash
pub fn matches(submitted: &str, hash: &str) -> bool {
    let submitted = submitted.trim();
    submitted.len() == 6 && submitted.bytes().all(|b| b.is_ascii_digit()) && verify_password(submitted, hash)
}
