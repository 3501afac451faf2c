//! Small-state pseudo-random number generators.
//!
//! Implements Bob Jenkins' small fast generator (JSF) in its 32-bit and
//! 64-bit variants. The generator has a tiny four-word state, no
//! multiplications, and passes PractRand; it is well suited to seeding one
//! independent stream per worker thread.
//!
//! Both variants implement [`rand::RngCore`] and [`rand::SeedableRng`], so
//! they can be used with every `R: Rng` algorithm in this crate.
//!
//! Instances are deliberately **not** `Clone`: a copied generator would
//! silently produce the same stream twice in parallel code. Move a generator
//! into the worker that owns it, or derive child seeds from a master stream.
//!
//! # References
//!
//! - Jenkins, "A small noncryptographic PRNG",
//!   <https://burtleburtle.net/bob/rand/smallprng.html>
//! - O'Neill, "Bob Jenkins's small PRNG passes PractRand",
//!   <https://www.pcg-random.org/posts/bob-jenkins-small-prng-passes-practrand.html>

use rand::{RngCore, SeedableRng};

/// Number of state advances discarded after seeding.
const WARMUP_ROUNDS: usize = 20;

/// Creates the crate's default generator from a 64-bit seed.
///
/// Convenience used throughout the tests and by callers that do not care
/// about the variant.
pub fn create_rng(seed: u64) -> Jsf64 {
    Jsf64::new(seed)
}

/// 64-bit Jenkins small fast generator.
///
/// Three-rotate variant with rotation amounts `(7, 13, 37)`.
#[derive(Debug)]
pub struct Jsf64 {
    a: u64,
    b: u64,
    c: u64,
    d: u64,
}

impl Jsf64 {
    /// Seeds the generator and discards the warm-up rounds.
    pub fn new(seed: u64) -> Self {
        let mut rng = Self {
            a: 0xf1ea_5eed,
            b: seed,
            c: seed,
            d: seed,
        };
        for _ in 0..WARMUP_ROUNDS {
            rng.advance();
        }
        rng
    }

    #[inline]
    fn advance(&mut self) -> u64 {
        let e = self.a.wrapping_sub(self.b.rotate_left(7));
        self.a = self.b ^ self.c.rotate_left(13);
        self.b = self.c.wrapping_add(self.d.rotate_left(37));
        self.c = self.d.wrapping_add(e);
        self.d = e.wrapping_add(self.a);
        self.d
    }
}

impl RngCore for Jsf64 {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        (self.advance() >> 32) as u32
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.advance()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.advance().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

impl SeedableRng for Jsf64 {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}

/// 32-bit Jenkins small fast generator.
///
/// Two-rotate variant with rotation amounts `(27, 17)`.
#[derive(Debug)]
pub struct Jsf32 {
    a: u32,
    b: u32,
    c: u32,
    d: u32,
}

impl Jsf32 {
    /// Seeds the generator and discards the warm-up rounds.
    pub fn new(seed: u32) -> Self {
        let mut rng = Self {
            a: 0xf1ea_5eed,
            b: seed,
            c: seed,
            d: seed,
        };
        for _ in 0..WARMUP_ROUNDS {
            rng.advance();
        }
        rng
    }

    #[inline]
    fn advance(&mut self) -> u32 {
        let e = self.a.wrapping_sub(self.b.rotate_left(27));
        self.a = self.b ^ self.c.rotate_left(17);
        self.b = self.c.wrapping_add(self.d);
        self.c = self.d.wrapping_add(e);
        self.d = e.wrapping_add(self.a);
        self.d
    }
}

impl RngCore for Jsf32 {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.advance()
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        let lo = self.advance() as u64;
        let hi = self.advance() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.advance().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

impl SeedableRng for Jsf32 {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state as u32)
    }
}
