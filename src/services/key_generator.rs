//! License key generation.

/// Number of random bytes behind every key (128 bits).
pub const KEY_BYTES: usize = 16;

/// Produces new license keys.
///
/// Implementations do not check the store for collisions; the store's
/// unique-key constraint catches them and creation retries.
pub trait KeyGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Cryptographically secure random keys.
///
/// # Output
///
/// 32 uppercase hex characters (16 random bytes), e.g.
/// `9F1C03A7B2E44D0C8A61F5D2B7C9E013`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomKeyGenerator;

impl KeyGenerator for RandomKeyGenerator {
    fn generate(&self) -> String {
        // rand::random draws from the thread-local CSPRNG
        let bytes: [u8; KEY_BYTES] = rand::random();
        hex::encode_upper(bytes)
    }
}
