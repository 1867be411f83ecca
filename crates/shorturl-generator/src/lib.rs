pub mod random;

pub use random::RandomGenerator;

use shorturl_core::ShortCode;

/// Trait for generating short codes.
///
/// Implementations are pure generators that don't interact with storage,
/// so they give no uniqueness guarantee of their own.
pub trait Generator: Send + Sync + 'static {
    type Output: Into<ShortCode>;
    /// Generates a value that can be converted into a short code.
    fn generate(&self) -> Self::Output;
}
