use chrono::{DateTime, Utc};
use common::{ParseUserIdError, UserId};
use rand::Rng;

const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;

/// Mints a fresh opaque user id: `user_{unix millis}_{9 base36 chars}`.
///
/// Time and randomness are injected so callers (and tests) control both.
pub fn generate_user_id<R: Rng + ?Sized>(
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<UserId, ParseUserIdError> {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();

    // Millis may be negative for pre-1970 clocks; the sign is dropped to keep
    // the id within the allowed character set.
    let raw = format!("user_{}_{}", now.timestamp_millis().unsigned_abs(), suffix);
    UserId::try_from(raw)
}
