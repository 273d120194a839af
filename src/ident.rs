//! Record identifier generation
//! ----------------------------
//! Single source of truth for minting record ids: a base36 rendering of the
//! current epoch milliseconds followed by a base36 random suffix from OS
//! randomness. Ids are lowercase alphanumeric and safe as URL or storage-key
//! material. The time component is forced monotonically non-decreasing
//! across the process even if the wall clock steps backwards.

use std::sync::atomic::{AtomicI64, Ordering};

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

static LAST_MILLIS: AtomicI64 = AtomicI64::new(0);

fn to_base36(mut n: u64) -> String {
    // 2^64 < 36^13, so 13 digits always suffice
    let mut buf = [0u8; 13];
    let mut i = buf.len();
    loop {
        i -= 1;
        buf[i] = ALPHABET[(n % 36) as usize];
        n /= 36;
        if n == 0 { break; }
    }
    String::from_utf8_lossy(&buf[i..]).into_owned()
}

/// Mint a fresh record id. Collision probability is negligible at the scale
/// of a single-tenant client store (the suffix carries 48 random bits).
pub fn generate_id() -> String {
    let now = chrono::Utc::now().timestamp_millis();
    let prev = LAST_MILLIS.fetch_max(now, Ordering::SeqCst);
    let millis = prev.max(now).max(0) as u64;

    let mut buf = [0u8; 8];
    let _ = getrandom::getrandom(&mut buf);
    let suffix = u64::from_le_bytes(buf) >> 16;

    format!("{}{}", to_base36(millis), to_base36(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn base36_digits() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(u64::MAX).len(), 13);
    }

    #[test]
    fn ids_are_charset_safe() {
        let id = generate_id();
        assert!(!id.is_empty());
        assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn sequential_ids_are_pairwise_distinct() {
        let mut seen = HashSet::new();
        for _ in 0..500 {
            assert!(seen.insert(generate_id()));
        }
    }
}
