//! Core types and traits for the shorturl service.
//!
//! This crate holds the domain vocabulary shared by every other crate:
//! short codes, the key-safe long URL encoding, the store key layout and
//! the key-value store contract the lease logic is written against.

pub mod encoding;
pub mod error;
pub mod keys;
pub mod shortcode;
pub mod shortener;
pub mod store;

pub use encoding::EncodedLongUrl;
pub use error::{ShortenerError, StorageError};
pub use shortcode::{ShortCode, ALPHABET, RESERVED_PREFIX, SHORT_CODE_LENGTH};
pub use shortener::{ShortenParams, Shortener};
pub use store::{KeyTtl, KeyValueStore};
