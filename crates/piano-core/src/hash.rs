use core::hash::Hash;
use std::hash::Hasher;

use crate::Key;

#[cfg(feature = "std-hash")]
pub mod default {
    pub use std::collections::hash_map::DefaultHasher;

    #[inline]
    pub fn new() -> DefaultHasher {
        DefaultHasher::new()
    }
}

#[cfg(not(feature = "std-hash"))]
pub mod default {
    pub use ahash::AHasher as DefaultHasher;

    #[inline]
    pub fn new() -> DefaultHasher {
        DefaultHasher::default()
    }
}

/// convenience: hash a single value with whichever default is active
#[inline]
pub fn hash_one<T: Hash + ?Sized>(v: &T) -> Key {
    let mut h = default::new();
    v.hash(&mut h);
    h.finish()
}

/// Builds a hook key list by hashing every argument.
///
/// ```
/// use piano_core::hook_keys;
/// let count = 3;
/// let keys = hook_keys![count, "label"];
/// assert_eq!(keys.len(), 2);
/// ```
#[macro_export]
macro_rules! hook_keys {
    () => {
        ::std::vec::Vec::<$crate::Key>::new()
    };
    ($($key:expr),+ $(,)?) => {
        ::std::vec![$($crate::hash::hash_one(&$key)),+]
    };
}
