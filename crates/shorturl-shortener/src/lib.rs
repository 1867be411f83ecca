//! Short-link lifecycle management.
//!
//! [`LeaseStore`] gives the raw key-value store the vocabulary of the
//! mapping (forward/reverse entries, expiry, renewal locks) and
//! [`ShortenerService`] runs shorten, resolve and the renew-on-access
//! lease extension on top of it.

pub mod lease;
pub mod service;

pub use lease::{LeaseSettings, LeaseStore, DEFAULT_RENEWAL_PERIOD};
pub use service::{Renewal, ShortenerService};
pub use shorturl_core::{ShortCode, ShortenParams, Shortener, ShortenerError};
