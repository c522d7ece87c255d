//! Cached Item Module
//!
//! The identity contract every cached value fulfils, and the lookup handle
//! used to address entries by either half of that identity.

use std::fmt;

/// Numeric identity of a cached value.
pub type ItemId = i64;

// == Cache Item ==
/// A value that can be stored in the cache.
///
/// Both the id and the key must stay stable while the value is cached.
pub trait CacheItem {
    /// Primary identity of the value
    fn id(&self) -> ItemId;
    /// Secondary identity of the value, unique across the cache
    fn key(&self) -> &str;
}

impl<T: CacheItem + ?Sized> CacheItem for std::sync::Arc<T> {
    fn id(&self) -> ItemId {
        (**self).id()
    }

    fn key(&self) -> &str {
        (**self).key()
    }
}

// == Lookup ==
/// Addresses an entry by id or by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookup<'a> {
    Id(ItemId),
    Key(&'a str),
}

impl From<ItemId> for Lookup<'_> {
    fn from(id: ItemId) -> Self {
        Lookup::Id(id)
    }
}

impl<'a> From<&'a str> for Lookup<'a> {
    fn from(key: &'a str) -> Self {
        Lookup::Key(key)
    }
}

impl<'a> From<&'a String> for Lookup<'a> {
    fn from(key: &'a String) -> Self {
        Lookup::Key(key.as_str())
    }
}

impl fmt::Display for Lookup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::Id(id) => write!(f, "id {}", id),
            Lookup::Key(key) => write!(f, "key '{}'", key),
        }
    }
}
