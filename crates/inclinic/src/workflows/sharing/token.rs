use chrono::NaiveDate;
use rand::rngs::OsRng;
use rand::RngCore;

use super::domain::{Campaign, ShareToken};

/// Bytes of OS entropy behind every token (128 bits).
pub const TOKEN_ENTROPY_BYTES: usize = 16;

impl ShareToken {
    /// Draw a fresh token from the operating system CSPRNG, hex encoded.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_ENTROPY_BYTES];
        OsRng.fill_bytes(&mut bytes);
        ShareToken(hex::encode(bytes))
    }

    /// Cheap shape check used before hitting storage with an obviously bogus token.
    pub fn is_well_formed(raw: &str) -> bool {
        raw.len() == TOKEN_ENTROPY_BYTES * 2 && raw.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl Campaign {
    /// Public campaign code, `CAMP-YYYYMMDD-XXXXXX` with six uppercase hex characters.
    pub fn generate_code(today: NaiveDate) -> String {
        let mut suffix = [0u8; 3];
        OsRng.fill_bytes(&mut suffix);
        format!(
            "CAMP-{}-{}",
            today.format("%Y%m%d"),
            hex::encode_upper(suffix)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tokens_are_hex_encoded_128_bit_values() {
        let token = ShareToken::generate();
        assert_eq!(token.as_str().len(), 32);
        assert!(ShareToken::is_well_formed(token.as_str()));
    }

    #[test]
    fn tokens_do_not_repeat() {
        let tokens: HashSet<_> = (0..512).map(|_| ShareToken::generate()).collect();
        assert_eq!(tokens.len(), 512);
    }

    #[test]
    fn malformed_tokens_are_detected() {
        assert!(!ShareToken::is_well_formed("1"));
        assert!(!ShareToken::is_well_formed(&"z".repeat(32)));
    }

    #[test]
    fn campaign_codes_carry_date_and_suffix() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date");
        let code = Campaign::generate_code(today);
        assert!(code.starts_with("CAMP-20250314-"));
        let suffix = &code["CAMP-20250314-".len()..];
        assert_eq!(suffix.len(), 6);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }
}
