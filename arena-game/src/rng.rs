//! Seeded random streams for reproducible sessions.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use sha2::Sha256;

/// RNG wrapper that counts how many draws were taken from the stream.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<SmallRng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: rand::RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: rand::RngCore> rand::RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

/// Independent random streams, one per game system, derived from a single seed.
///
/// Keeping the streams apart means extra training draws never shift the
/// sequence of battle rolls for the same seed.
#[derive(Debug, Clone)]
pub struct RngBundle {
    seed: u64,
    training: CountingRng<SmallRng>,
    battle: CountingRng<SmallRng>,
    matchmaking: CountingRng<SmallRng>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            seed,
            training: CountingRng::new(derive_stream_seed(seed, b"training")),
            battle: CountingRng::new(derive_stream_seed(seed, b"battle")),
            matchmaking: CountingRng::new(derive_stream_seed(seed, b"matchmaking")),
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Access the training RNG stream.
    pub fn training(&mut self) -> &mut CountingRng<SmallRng> {
        &mut self.training
    }

    /// Access the battle RNG stream.
    pub fn battle(&mut self) -> &mut CountingRng<SmallRng> {
        &mut self.battle
    }

    /// Access the opponent selection RNG stream.
    pub fn matchmaking(&mut self) -> &mut CountingRng<SmallRng> {
        &mut self.matchmaking
    }

    /// Total draws across all streams.
    #[must_use]
    pub const fn total_draws(&self) -> u64 {
        self.training
            .draws()
            .saturating_add(self.battle.draws())
            .saturating_add(self.matchmaking.draws())
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
