use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

pub const DEFAULT_TRANSACTION_PREFIX: &str = "Iz1HIHBjaA";
pub const TRANSACTION_SUFFIX_LEN: usize = 4;

const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Produces display identifiers for transfer attempts.
///
/// These are not ledger keys. Nothing checks for collisions and a retry simply
/// draws a new one.
pub struct IdGenerator {
    prefix: String,
    rng: StdRng,
}

impl IdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            rng: StdRng::from_entropy(),
        }
    }

    /// A generator with a fixed seed, for reproducible ids in tests.
    pub fn seeded(prefix: impl Into<String>, seed: u64) -> Self {
        Self {
            prefix: prefix.into(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// `<prefix>` followed by four characters from `[A-Z0-9]`.
    pub fn transaction_id(&mut self) -> String {
        let suffix: String = (0..TRANSACTION_SUFFIX_LEN)
            .map(|_| SUFFIX_CHARSET[self.rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
            .collect();
        format!("{}{}", self.prefix, suffix)
    }

    /// Receipt reference such as `#TRX-48213`.
    pub fn reference(&mut self) -> String {
        format!("#TRX-{}", self.rng.gen_range(0..100_000u32))
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSACTION_PREFIX)
    }
}

impl fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdGenerator")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}
