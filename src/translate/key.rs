//! Structured lookup keys and cache-key derivation.
//! Key: namespace prefix + hex blake3 of the length-prefixed (route, locale, attribute, value).
//! Values can be arbitrarily long, the derived key never is.

use serde::{Deserialize, Serialize};

/// Namespace for forward (localized -> original) buckets.
pub const FORWARD_NAMESPACE: &str = "i18n-route/fwd/";
/// Namespace for reverse (original -> localized) buckets.
pub const REVERSE_NAMESPACE: &str = "i18n-route/rev/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Localized value in, original value out.
    Forward,
    /// Original value in, localized value out.
    Reverse,
}

impl Direction {
    pub fn namespace(self) -> &'static str {
        match self {
            Direction::Forward => FORWARD_NAMESPACE,
            Direction::Reverse => REVERSE_NAMESPACE,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Reverse => write!(f, "reverse"),
        }
    }
}

/// The exact identity of one translation request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LookupKey {
    pub direction: Direction,
    pub route: String,
    pub locale: String,
    pub attribute: String,
    pub value: String,
}

impl LookupKey {
    pub fn new(
        direction: Direction,
        route: &str,
        locale: &str,
        attribute: &str,
        value: &str,
    ) -> Self {
        Self {
            direction,
            route: route.to_owned(),
            locale: locale.to_owned(),
            attribute: attribute.to_owned(),
            value: value.to_owned(),
        }
    }

    pub fn forward(route: &str, locale: &str, attribute: &str, value: &str) -> Self {
        Self::new(Direction::Forward, route, locale, attribute, value)
    }

    pub fn reverse(route: &str, locale: &str, attribute: &str, value: &str) -> Self {
        Self::new(Direction::Reverse, route, locale, attribute, value)
    }

    /// Compute the 32-byte digest of the four lookup fields.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        for field in [&self.route, &self.locale, &self.attribute, &self.value] {
            hasher.update(&(field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
        *hasher.finalize().as_bytes()
    }

    /// Backend key for the bucket holding this lookup.
    pub fn cache_key(&self) -> String {
        let digest = blake3::Hash::from(self.digest());
        let mut key = String::with_capacity(self.direction.namespace().len() + 64);
        key.push_str(self.direction.namespace());
        key.push_str(digest.to_hex().as_str());
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_deterministic() {
        let a = LookupKey::forward("product_show", "de", "slug", "mein-produkt");
        let b = LookupKey::forward("product_show", "de", "slug", "mein-produkt");
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_cache_key_namespaces() {
        let fwd = LookupKey::forward("r", "de", "slug", "x").cache_key();
        let rev = LookupKey::reverse("r", "de", "slug", "x").cache_key();

        assert!(fwd.starts_with("i18n-route/fwd/"));
        assert!(rev.starts_with("i18n-route/rev/"));
        assert_ne!(fwd, rev);
        // Same tuple hashes the same, only the namespace differs
        assert_eq!(fwd[FORWARD_NAMESPACE.len()..], rev[REVERSE_NAMESPACE.len()..]);
    }

    #[test]
    fn test_field_boundaries_do_not_collide() {
        let a = LookupKey::forward("a", "bc", "attr", "v");
        let b = LookupKey::forward("ab", "c", "attr", "v");
        assert_ne!(a.digest(), b.digest());

        // Delimiter-looking content must not shift fields either
        let c = LookupKey::forward("r__de", "", "slug", "v");
        let d = LookupKey::forward("r", "de", "slug", "v");
        assert_ne!(c.cache_key(), d.cache_key());
    }

    #[test]
    fn test_cache_key_length_is_fixed() {
        let short = LookupKey::forward("r", "de", "slug", "x").cache_key();
        let long_value = "x".repeat(10_000);
        let long = LookupKey::forward("r", "de", "slug", &long_value).cache_key();

        assert_eq!(short.len(), FORWARD_NAMESPACE.len() + 64);
        assert_eq!(short.len(), long.len());
    }
}
