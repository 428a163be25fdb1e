//! String literal protection.
//!
//! A protected literal is replaced by a call to a generated zero-argument Go
//! function that rebuilds the value at runtime. Byte `i` of the stored array
//! is `original[i] + 5*i (mod 256)`; the generated function subtracts the same
//! amount again before converting back to a string.

use sha2::{Digest, Sha256};

pub const DEFAULT_SALT: &str = "lXz0r0oj";

/// Multiplier applied to the byte index when shifting.
const STEP: u8 = 5;

/// A generated decoder function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedString {
    pub name: String,
    pub body: String,
}

impl ProtectedString {
    /// Go expression that evaluates to the original literal.
    pub fn call(&self) -> String {
        format!("{}()", self.name)
    }
}

#[derive(Debug, Clone)]
pub struct StringProtector {
    salt: String,
    counter: usize,
}

impl Default for StringProtector {
    fn default() -> Self {
        Self::new(DEFAULT_SALT)
    }
}

impl StringProtector {
    pub fn new(salt: &str) -> Self {
        Self {
            salt: salt.to_string(),
            counter: 0,
        }
    }

    /// Build the decoder function for one literal value.
    ///
    /// Names are unique per protector even for identical values.
    pub fn protect(&mut self, value: &[u8]) -> ProtectedString {
        let name = format!("l{}{}", self.short_hash(value), self.counter);
        self.counter += 1;

        let encoded = encode(value)
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(",");

        let body = format!(
            "func {name}() string {{\n\
             \tb := []byte{{{encoded}}}\n\
             \tfor i := range b {{\n\
             \t\tb[i] -= byte(i * {STEP})\n\
             \t}}\n\
             \treturn string(b)\n\
             }}\n"
        );

        ProtectedString { name, body }
    }

    fn short_hash(&self, value: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(value);
        hasher.update(self.salt.as_bytes());
        let digest = hex::encode(hasher.finalize());
        digest[..8].to_string()
    }
}

pub fn encode(value: &[u8]) -> Vec<u8> {
    value
        .iter()
        .enumerate()
        .map(|(i, b)| b.wrapping_add(shift_for(i)))
        .collect()
}

pub fn decode(encoded: &[u8]) -> Vec<u8> {
    encoded
        .iter()
        .enumerate()
        .map(|(i, b)| b.wrapping_sub(shift_for(i)))
        .collect()
}

/// `5*i mod 256`, the same value Go's `byte(i * 5)` produces.
fn shift_for(index: usize) -> u8 {
    (index.wrapping_mul(STEP as usize) % 256) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_known_values() {
        assert_eq!(encode(b"aaa"), vec![97, 102, 107]);
        assert_eq!(encode(&[0xFF, 0xFF]), vec![0xFF, 0x04]);
        assert!(encode(b"").is_empty());
    }

    #[test]
    fn test_wraparound_past_index_51() {
        let zeros = vec![0u8; 60];
        let encoded = encode(&zeros);
        // 52 * 5 = 260, which wraps to 4
        assert_eq!(encoded[52], 4);
        assert_eq!(decode(&encoded), zeros);
    }

    #[test]
    fn test_edge_strings_round_trip() {
        for value in [vec![], vec![0u8; 300], vec![0xFFu8; 300]] {
            assert_eq!(decode(&encode(&value)), value);
        }
        let multibyte = "héllo wörld ✓".as_bytes();
        assert_eq!(decode(&encode(multibyte)), multibyte);
    }

    #[test]
    fn test_function_shape() {
        let mut protector = StringProtector::default();
        let protected = protector.protect(b"secret");
        assert!(protected.name.starts_with('l'));
        assert_eq!(protected.name.len(), 1 + 8 + 1);
        assert!(protected.name.ends_with('0'));
        assert!(protected
            .body
            .starts_with(&format!("func {}() string {{\n", protected.name)));
        assert!(protected.body.contains("b := []byte{115,106,109,129,121,141}"));
        assert!(protected.body.contains("b[i] -= byte(i * 5)"));
        assert!(!protected.body.contains("secret"));
        assert_eq!(protected.call(), format!("{}()", protected.name));
    }

    #[test]
    fn test_identical_values_get_distinct_names() {
        let mut protector = StringProtector::default();
        let first = protector.protect(b"token");
        let second = protector.protect(b"token");
        assert_ne!(first.name, second.name);
        assert_eq!(first.name[..9], second.name[..9]);
    }

    #[test]
    fn test_salt_changes_name() {
        let a = StringProtector::new("one").protect(b"value");
        let b = StringProtector::new("two").protect(b"value");
        assert_ne!(a.name, b.name);
    }

    #[test]
    fn test_empty_literal_still_valid_go() {
        let protected = StringProtector::default().protect(b"");
        assert!(protected.body.contains("b := []byte{}"));
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(value in proptest::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(decode(&encode(&value)), value);
        }
    }
}
