use std::fmt::Display;

/// A long URL encoded as base58 so it can be embedded in a store key.
///
/// Raw URLs may contain characters that clash with key syntax, so the
/// reverse index never uses them directly. Base58 maps every byte string to
/// a distinct text (leading zero bytes become leading `1`s), which keeps the
/// reverse index collision-free.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EncodedLongUrl(String);

impl EncodedLongUrl {
    /// Encodes the bytes of `long_url`.
    ///
    /// # Type Parameters
    ///
    /// * `T` - Anything viewable as bytes, e.g. `&str`, `String` or `Vec<u8>`.
    ///   Arbitrary byte sequences are accepted; encoding never fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use shorturl_core::EncodedLongUrl;
    ///
    /// let encoded = EncodedLongUrl::new("https://example.com");
    /// assert_eq!(encoded.decode(), b"https://example.com");
    /// ```
    pub fn new<T: AsRef<[u8]>>(long_url: T) -> Self {
        Self(bs58::encode(long_url).into_string())
    }

    /// Returns the encoded form as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recovers the original bytes.
    pub fn decode(&self) -> Vec<u8> {
        // the inner string is only ever produced by `bs58::encode`
        bs58::decode(&self.0).into_vec().unwrap_or_default()
    }
}

impl std::fmt::Debug for EncodedLongUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EncodedLongUrl").field(&self.0).finish()
    }
}

impl Display for EncodedLongUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
