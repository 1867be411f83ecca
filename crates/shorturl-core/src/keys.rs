//! Store key layout.
//!
//! Every key lives under the `shorturl:` prefix, split into three
//! namespaces: the long→short reverse index, the short→long forward index
//! and the renewal locks.

use crate::encoding::EncodedLongUrl;
use crate::shortcode::ShortCode;

const REVERSE_PREFIX: &str = "shorturl:long:";
const FORWARD_PREFIX: &str = "shorturl:short:";
const LOCK_PREFIX: &str = "shorturl:lock:";

/// Key of the reverse index entry holding the short code of a long URL.
pub fn reverse_key(encoded: &EncodedLongUrl) -> String {
    format!("{REVERSE_PREFIX}{encoded}")
}

/// Key of the forward index entry holding the long URL of a short code.
pub fn forward_key(code: &ShortCode) -> String {
    format!("{FORWARD_PREFIX}{code}")
}

/// Key of the renewal lock of a short code.
pub fn lock_key(code: &ShortCode) -> String {
    format!("{LOCK_PREFIX}{code}")
}
