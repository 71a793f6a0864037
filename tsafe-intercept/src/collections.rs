//! Ready-made guarded collections.
//!
//! [`SynchronizedMap`] is a `HashMap` whose every operation runs under one
//! shared synchronization state, so one map can be handed to any number of
//! threads behind an `Arc`.

use core::{borrow::Borrow, fmt, hash::Hash};
use std::{collections::HashMap, sync::Arc};

use tsafe_error::{Error, Result};

use crate::{
    guarded::{Guarded, GuardedType},
    registry::MemberSet,
    Interceptor,
};

impl<K, V> GuardedType for HashMap<K, V>
where
    K: Send + 'static,
    V: Send + 'static,
{
    fn enumerate_members(members: &mut MemberSet) -> Result<()> {
        members.add_all(&[
            "new",
            "default",
            "fmt",
            "insert",
            "update",
            "contains_key",
            "get",
            "get_or_fail",
            "pop",
            "remove",
            "pop_item",
            "len",
            "is_empty",
            "clear",
            "keys",
            "values",
            "snapshot",
        ])?;
        Ok(())
    }

    fn type_name() -> &'static str {
        "SynchronizedMap"
    }
}

/// A thread-safe hash map.
///
/// Each method is a guarded member call on the underlying map. Values are
/// returned by clone, never by reference, so nothing escapes the guarded
/// region.
pub struct SynchronizedMap<K, V>
where
    K: Send + 'static,
    V: Send + 'static,
{
    inner: Guarded<HashMap<K, V>>,
}

impl<K, V> SynchronizedMap<K, V>
where
    K: Eq + Hash + Send + 'static,
    V: Send + 'static,
{
    /// Creates an empty map using the global interceptor.
    ///
    /// # Errors
    ///
    /// Wrap-time errors from transforming the map type.
    pub fn new() -> Result<Self> {
        Ok(Self {
            inner: Guarded::new(HashMap::new())?,
        })
    }

    /// Creates an empty map using `interceptor`.
    ///
    /// # Errors
    ///
    /// Wrap-time errors from transforming the map type.
    pub fn with_interceptor(interceptor: Arc<Interceptor>) -> Result<Self> {
        Ok(Self {
            inner: Guarded::with_interceptor(HashMap::new(), interceptor)?,
        })
    }

    /// Inserts `value` under `key`, returning the previous value.
    #[track_caller]
    pub fn insert(&self, key: K, value: V) -> Result<Option<V>> {
        self.inner.call("insert", |map| map.insert(key, value))
    }

    /// Inserts every pair from `entries`, overwriting existing keys.
    #[track_caller]
    pub fn update(&self, entries: impl IntoIterator<Item = (K, V)>) -> Result<()> {
        self.inner.call("update", |map| map.extend(entries))
    }

    /// Whether `key` is present.
    #[track_caller]
    pub fn contains_key<Q>(&self, key: &Q) -> Result<bool>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.inner.call("contains_key", |map| map.contains_key(key))
    }

    /// A clone of the value under `key`, if any.
    #[track_caller]
    pub fn get<Q>(&self, key: &Q) -> Result<Option<V>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
        V: Clone,
    {
        self.inner.call("get", |map| map.get(key).cloned())
    }

    /// A clone of the value under `key`.
    ///
    /// # Errors
    ///
    /// `KEY_NOT_FOUND` if `key` is absent.
    #[track_caller]
    pub fn get_or_fail<Q>(&self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
        V: Clone,
    {
        self.inner
            .try_call("get_or_fail", |map| map.get(key).cloned().ok_or(Error::KEY_NOT_FOUND))
    }

    /// Removes `key` and returns its value.
    ///
    /// # Errors
    ///
    /// `KEY_NOT_FOUND` if `key` is absent.
    #[track_caller]
    pub fn pop<Q>(&self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.inner
            .try_call("pop", |map| map.remove(key).ok_or(Error::KEY_NOT_FOUND))
    }

    /// Removes `key`, returning its value if it was present.
    #[track_caller]
    pub fn remove<Q>(&self, key: &Q) -> Result<Option<V>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.inner.call("remove", |map| map.remove(key))
    }

    /// Removes and returns an arbitrary entry.
    #[track_caller]
    pub fn pop_item(&self) -> Result<Option<(K, V)>>
    where
        K: Clone,
    {
        self.inner.call("pop_item", |map| {
            let key = map.keys().next().cloned()?;
            map.remove_entry(&key)
        })
    }

    /// Number of entries.
    #[track_caller]
    pub fn len(&self) -> Result<usize> {
        self.inner.call("len", |map| map.len())
    }

    /// Whether the map has no entries.
    #[track_caller]
    pub fn is_empty(&self) -> Result<bool> {
        self.inner.call("is_empty", |map| map.is_empty())
    }

    /// Removes every entry.
    #[track_caller]
    pub fn clear(&self) -> Result<()> {
        self.inner.call("clear", HashMap::clear)
    }

    /// Clones of all keys, in arbitrary order.
    #[track_caller]
    pub fn keys(&self) -> Result<Vec<K>>
    where
        K: Clone,
    {
        self.inner.call("keys", |map| map.keys().cloned().collect())
    }

    /// Clones of all values, in arbitrary order.
    #[track_caller]
    pub fn values(&self) -> Result<Vec<V>>
    where
        V: Clone,
    {
        self.inner.call("values", |map| map.values().cloned().collect())
    }

    /// A copy of the whole map taken in one guarded call.
    #[track_caller]
    pub fn snapshot(&self) -> Result<HashMap<K, V>>
    where
        K: Clone,
        V: Clone,
    {
        self.inner.call("snapshot", |map| map.clone())
    }

    /// The underlying guarded map.
    pub fn as_guarded(&self) -> &Guarded<HashMap<K, V>> {
        &self.inner
    }

    /// Unwraps the map.
    pub fn into_inner(self) -> HashMap<K, V> {
        self.inner.into_inner()
    }
}

impl<K, V> fmt::Debug for SynchronizedMap<K, V>
where
    K: Send + 'static,
    V: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynchronizedMap")
            .field("inner", &self.inner)
            .finish()
    }
}
