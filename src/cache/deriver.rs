//! Key Derivation Module
//!
//! Strategy for computing the set of cache keys a value is registered under.

// == Key Deriver ==
/// Derives the cache keys for a value.
///
/// The calling layer implements this once per value type. A loaded content
/// record might be keyed by both its numeric id and its remote id, e.g.
/// `["contentinfo-123", "remoteid-abc"]`, making it retrievable through
/// either lookup path while being stored once.
pub trait KeyDeriver<V> {
    /// Returns every key the value should be retrievable under.
    fn derive_keys(&self, value: &V) -> Vec<String>;
}

/// Closures work directly as derivers.
impl<V, F> KeyDeriver<V> for F
where
    F: Fn(&V) -> Vec<String>,
{
    fn derive_keys(&self, value: &V) -> Vec<String> {
        self(value)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    struct ByIdAndName;

    impl KeyDeriver<(u32, String)> for ByIdAndName {
        fn derive_keys(&self, value: &(u32, String)) -> Vec<String> {
            vec![format!("id-{}", value.0), format!("name-{}", value.1)]
        }
    }

    #[test]
    fn test_struct_deriver() {
        let keys = ByIdAndName.derive_keys(&(42, "answer".to_string()));
        assert_eq!(keys, vec!["id-42".to_string(), "name-answer".to_string()]);
    }

    #[test]
    fn test_closure_deriver() {
        let deriver = |value: &u32| vec![format!("num-{}", value)];
        assert_eq!(deriver.derive_keys(&7), vec!["num-7".to_string()]);
    }
}
