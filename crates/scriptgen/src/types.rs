//! # Id and Collection Types
use core::{
    fmt::{Debug, Display},
    hash::Hash,
};

use num_traits::{FromPrimitive, PrimInt, ToPrimitive, Unsigned};

/// An unsigned integer used as a dense vocabulary id.
///
/// A vocabulary of `n` tokens needs ``n - 1`` to fit in `T`; see
/// [`crate::ScriptgenError::VocabSizeOverflow`].
pub trait TokenType:
    'static
    + PrimInt
    + FromPrimitive
    + ToPrimitive
    + Unsigned
    + Hash
    + Default
    + Debug
    + Display
    + Send
    + Sync
{
}

impl<T> TokenType for T where
    T: 'static
        + PrimInt
        + FromPrimitive
        + ToPrimitive
        + Unsigned
        + Hash
        + Default
        + Debug
        + Display
        + Send
        + Sync
{
}

cfg_if::cfg_if! {
    if #[cfg(feature = "ahash")] {
        /// Type Alias for hash maps in this crate.
        pub type SGHashMap<K, V> = ahash::AHashMap<K, V>;

        /// Type Alias for hash sets in this crate.
        pub type SGHashSet<V> = ahash::AHashSet<V>;
    } else {
        /// Type Alias for hash maps in this crate.
        pub type SGHashMap<K, V> = std::collections::HashMap<K, V>;

        /// Type Alias for hash sets in this crate.
        pub type SGHashSet<V> = std::collections::HashSet<V>;
    }
}

/// Static check that a type is `Send` and `Sync`.
pub fn static_is_send_sync_check<S: Send + Sync>(_: &S) {}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_token_type<T: TokenType>() {}

    #[test]
    fn test_common_token_types() {
        assert_token_type::<u8>();
        assert_token_type::<u16>();
        assert_token_type::<u32>();
        assert_token_type::<u64>();
        assert_token_type::<usize>();
    }

    #[test]
    fn test_hash_aliases() {
        let mut map: SGHashMap<String, u32> = SGHashMap::default();
        map.insert("moe".to_string(), 3);

        let set: SGHashSet<&str> = ["moe", "homer", "moe"].into_iter().collect();
        assert_eq!(map.get("moe"), Some(&3));
        assert_eq!(set.len(), 2);
    }
}
