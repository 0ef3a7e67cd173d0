//! Badge code generation.
//!
//! A badge code looks like `TB-M2X4K9QZ-7F3KQA`: a fixed prefix, the issue time in milliseconds in base 36, and a
//! six-character random base-36 suffix, all upper case. Collisions are unlikely but possible; the database's unique
//! constraint on the code is the real guard.
use chrono::{DateTime, Utc};
use rand::Rng;

pub const BADGE_CODE_PREFIX: &str = "TB";
const SUFFIX_LEN: usize = 6;
const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".into();
    }
    let mut digits = Vec::with_capacity(13);
    while value > 0 {
        digits.push(ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

pub fn generate_badge_code(now: DateTime<Utc>) -> String {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
    let mut rng = rand::thread_rng();
    let suffix = (0..SUFFIX_LEN).map(|_| ALPHABET[rng.gen_range(0..36)] as char).collect::<String>();
    format!("{BADGE_CODE_PREFIX}-{}-{suffix}", to_base36(millis))
}

/// A cheap structural check, used to reject obvious garbage before touching the database.
pub fn is_valid_badge_code(code: &str) -> bool {
    let mut parts = code.split('-');
    let well_formed = |s: &str| !s.is_empty() && s.bytes().all(|b| ALPHABET.contains(&b));
    matches!(
        (parts.next(), parts.next(), parts.next(), parts.next()),
        (Some(BADGE_CODE_PREFIX), Some(ts), Some(suffix), None)
            if well_formed(ts) && well_formed(suffix) && suffix.len() == SUFFIX_LEN
    )
}
