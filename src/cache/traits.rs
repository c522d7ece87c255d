//! Cache contract used by the read-through repository.

use std::future::Future;
use std::sync::Arc;

use crate::cache::{CacheItem, LimitedCache, Lookup, SizeLimitedCache};
use crate::error::Result;

/// The operations a cache exposes to its collaborators.
pub trait ObjectCache<V: Send + 'static>: Send + Sync {
    fn get<'a>(&'a self, lookup: Lookup<'a>) -> impl Future<Output = Option<V>> + Send + 'a;

    fn put(&self, value: V) -> impl Future<Output = Result<()>> + Send + '_;

    fn invalidate<'a>(&'a self, lookup: Lookup<'a>) -> impl Future<Output = ()> + Send + 'a;

    fn flush(&self) -> impl Future<Output = ()> + Send + '_;

    fn count(&self) -> impl Future<Output = usize> + Send + '_;
}

impl<V> ObjectCache<V> for LimitedCache<V>
where
    V: CacheItem + Clone + Send + 'static,
{
    fn get<'a>(&'a self, lookup: Lookup<'a>) -> impl Future<Output = Option<V>> + Send + 'a {
        LimitedCache::get(self, lookup)
    }

    fn put(&self, value: V) -> impl Future<Output = Result<()>> + Send + '_ {
        LimitedCache::put(self, value)
    }

    fn invalidate<'a>(&'a self, lookup: Lookup<'a>) -> impl Future<Output = ()> + Send + 'a {
        LimitedCache::invalidate(self, lookup)
    }

    fn flush(&self) -> impl Future<Output = ()> + Send + '_ {
        LimitedCache::flush(self)
    }

    fn count(&self) -> impl Future<Output = usize> + Send + '_ {
        LimitedCache::count(self)
    }
}

impl<V> ObjectCache<V> for SizeLimitedCache<V>
where
    V: CacheItem + Clone + Send + 'static,
{
    fn get<'a>(&'a self, lookup: Lookup<'a>) -> impl Future<Output = Option<V>> + Send + 'a {
        SizeLimitedCache::get(self, lookup)
    }

    fn put(&self, value: V) -> impl Future<Output = Result<()>> + Send + '_ {
        SizeLimitedCache::put(self, value)
    }

    fn invalidate<'a>(&'a self, lookup: Lookup<'a>) -> impl Future<Output = ()> + Send + 'a {
        SizeLimitedCache::invalidate(self, lookup)
    }

    fn flush(&self) -> impl Future<Output = ()> + Send + '_ {
        SizeLimitedCache::flush(self)
    }

    fn count(&self) -> impl Future<Output = usize> + Send + '_ {
        SizeLimitedCache::count(self)
    }
}

impl<V, C> ObjectCache<V> for Arc<C>
where
    V: Send + 'static,
    C: ObjectCache<V>,
{
    fn get<'a>(&'a self, lookup: Lookup<'a>) -> impl Future<Output = Option<V>> + Send + 'a {
        (**self).get(lookup)
    }

    fn put(&self, value: V) -> impl Future<Output = Result<()>> + Send + '_ {
        (**self).put(value)
    }

    fn invalidate<'a>(&'a self, lookup: Lookup<'a>) -> impl Future<Output = ()> + Send + 'a {
        (**self).invalidate(lookup)
    }

    fn flush(&self) -> impl Future<Output = ()> + Send + '_ {
        (**self).flush()
    }

    fn count(&self) -> impl Future<Output = usize> + Send + '_ {
        (**self).count()
    }
}
