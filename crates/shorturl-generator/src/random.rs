use crate::Generator;
use jiff::Timestamp;
use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use shorturl_core::{ShortCode, ALPHABET, RESERVED_PREFIX, SHORT_CODE_LENGTH};

/// Bits needed to index into [`ALPHABET`].
const INDEX_BITS: u32 = 6;
const INDEX_MASK: u64 = (1 << INDEX_BITS) - 1;
/// How many indices a single 64-bit draw yields.
const INDICES_PER_DRAW: u32 = u64::BITS / INDEX_BITS;

/// A random short code generator.
///
/// Each character is drawn uniformly and independently from [`ALPHABET`]
/// using a fast, non-cryptographic PRNG. Every 64-bit draw is sliced into
/// 6-bit indices; indices past the end of the alphabet are discarded, so no
/// symbol is favoured.
///
/// Two generators seeded identically produce identical sequences.
#[derive(Debug)]
pub struct RandomGenerator {
    rng: Mutex<SmallRng>,
    length: usize,
}

impl RandomGenerator {
    /// Creates a generator seeded from the current wall-clock time.
    pub fn new() -> Self {
        Self::with_seed(Timestamp::now().as_nanosecond() as u64)
    }

    /// Creates a generator with a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(SmallRng::seed_from_u64(seed)),
            length: SHORT_CODE_LENGTH,
        }
    }

    /// Produces a random string of `length` characters from [`ALPHABET`].
    pub fn generate_string(&self, length: usize) -> String {
        let mut out = vec![0u8; length];
        let mut rng = self.rng.lock();

        let mut cache = rng.next_u64();
        let mut remain = INDICES_PER_DRAW;
        let mut filled = 0;
        while filled < length {
            if remain == 0 {
                cache = rng.next_u64();
                remain = INDICES_PER_DRAW;
            }
            let idx = (cache & INDEX_MASK) as usize;
            if idx < ALPHABET.len() {
                out[length - 1 - filled] = ALPHABET[idx];
                filled += 1;
            }
            cache >>= INDEX_BITS;
            remain -= 1;
        }

        out.into_iter().map(char::from).collect()
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for RandomGenerator {
    type Output = ShortCode;

    fn generate(&self) -> ShortCode {
        ShortCode::new_unchecked(redraw_reserved(|| self.generate_string(self.length)))
    }
}

/// Draws until the result does not start with [`RESERVED_PREFIX`].
fn redraw_reserved(mut draw: impl FnMut() -> String) -> String {
    loop {
        let code = draw();
        if !code.starts_with(RESERVED_PREFIX) {
            return code;
        }
    }
}
