// tsafe - tsafe-intercept
// Module: Type registry
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Process-wide record of which guarded types have been transformed.
//!
//! The first construction of a `Guarded<T>` enumerates `T`'s members,
//! classifies them through the member filter, and stores the result here.
//! Later constructions reuse the stored descriptor. Members are enumerated
//! without holding the registry lock; the final check and the insert happen
//! under one write lock, so concurrent first constructions still record a
//! type exactly once and exactly one of them reports the transformation.

use std::{
    any::TypeId,
    collections::{HashMap, HashSet},
    sync::Arc,
};

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tsafe_error::{Error, Result};

use crate::{filter::MemberFilter, guarded::GuardedType, site::OperationKind};

/// Collects the member names a guarded type reports.
#[derive(Debug, Default)]
pub struct MemberSet {
    names: Vec<&'static str>,
    seen:  HashSet<&'static str>,
}

impl MemberSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one member.
    ///
    /// # Errors
    ///
    /// `DUPLICATE_MEMBER` if `name` was already registered, or
    /// `MEMBER_ENUMERATION_FAILED` if it is empty.
    pub fn add(&mut self, name: &'static str) -> Result<&mut Self> {
        if name.is_empty() {
            return Err(Error::member_enumeration_failed("Empty member name"));
        }
        if !self.seen.insert(name) {
            return Err(Error::duplicate_member("Member enumerated more than once"));
        }
        self.names.push(name);
        Ok(self)
    }

    /// Registers several members in order.
    ///
    /// # Errors
    ///
    /// Same as [`add`](Self::add); members before the failing one stay
    /// registered.
    pub fn add_all(&mut self, names: &[&'static str]) -> Result<&mut Self> {
        for &name in names {
            self.add(name)?;
        }
        Ok(self)
    }

    /// Registered names, in registration order.
    #[must_use]
    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    /// Number of registered members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no member was registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One member of a transformed type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberEntry {
    /// Member name
    pub name:    &'static str,
    /// Whether calls to it go through the protocol
    pub guarded: bool,
}

impl MemberEntry {
    /// Wrapped members are always of kind `Member`; excluded ones have none.
    #[must_use]
    pub fn kind(&self) -> Option<OperationKind> {
        self.guarded.then_some(OperationKind::Member)
    }
}

/// The result of transforming one guarded type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    type_id:   TypeId,
    type_name: &'static str,
    members:   Vec<MemberEntry>,
    filter:    MemberFilter,
}

impl TypeDescriptor {
    fn build<T: GuardedType>(filter: &MemberFilter) -> Result<Self> {
        let mut set = MemberSet::new();
        T::enumerate_members(&mut set)?;
        let members = set
            .names()
            .iter()
            .map(|&name| MemberEntry {
                name,
                guarded: filter.is_guarded(name),
            })
            .collect();
        Ok(Self {
            type_id: TypeId::of::<T>(),
            type_name: T::type_name(),
            members,
            filter: filter.clone(),
        })
    }

    /// `TypeId` of the transformed type.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Display name of the transformed type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Every enumerated member, wrapped or not.
    #[must_use]
    pub fn members(&self) -> &[MemberEntry] {
        &self.members
    }

    /// Names of the wrapped members.
    pub fn guarded_members(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.members.iter().filter(|m| m.guarded).map(|m| m.name)
    }

    /// Names of the members the filter left unwrapped.
    pub fn excluded_members(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.members.iter().filter(|m| !m.guarded).map(|m| m.name)
    }

    /// The filter the type was transformed under.
    #[must_use]
    pub fn filter(&self) -> &MemberFilter {
        &self.filter
    }

    /// Looks up a wrapped member by name.
    ///
    /// # Errors
    ///
    /// `UNKNOWN_MEMBER` if the type never enumerated `name`,
    /// `EXCLUDED_MEMBER` if the filter left it unwrapped.
    pub fn resolve(&self, name: &str) -> Result<&'static str> {
        match self.members.iter().find(|m| m.name == name) {
            Some(entry) if entry.guarded => Ok(entry.name),
            Some(_) => Err(Error::excluded_member(
                "Member is excluded from guarding and has no guarded call path",
            )),
            None => Err(Error::unknown_member("Member was not enumerated by the type")),
        }
    }
}

/// Registry of transformed types, keyed by `TypeId`.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: RwLock<HashMap<TypeId, Arc<TypeDescriptor>>>,
}

static GLOBAL_REGISTRY: Lazy<TypeRegistry> = Lazy::new(TypeRegistry::new);

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by `Guarded`.
    pub fn global() -> &'static Self {
        &GLOBAL_REGISTRY
    }

    /// Returns `T`'s descriptor, transforming `T` first if needed.
    ///
    /// The boolean is `true` when this call performed the transformation.
    ///
    /// # Errors
    ///
    /// - Errors from `T::enumerate_members`.
    /// - `INCONSISTENT_TRANSFORM` if `T` was already transformed under a
    ///   different filter.
    pub fn transform<T: GuardedType>(
        &self,
        filter: &MemberFilter,
    ) -> Result<(Arc<TypeDescriptor>, bool)> {
        let type_id = TypeId::of::<T>();
        if let Some(existing) = self.types.read().get(&type_id) {
            return Self::reuse(existing, filter).map(|d| (d, false));
        }

        // `enumerate_members` is user code and may use the registry itself,
        // so the descriptor is built before the write lock is taken.
        let descriptor = Arc::new(TypeDescriptor::build::<T>(filter)?);

        let mut types = self.types.write();
        // Another thread may have transformed T in the meantime.
        if let Some(existing) = types.get(&type_id) {
            return Self::reuse(existing, filter).map(|d| (d, false));
        }
        types.insert(type_id, Arc::clone(&descriptor));
        Ok((descriptor, true))
    }

    fn reuse(existing: &Arc<TypeDescriptor>, filter: &MemberFilter) -> Result<Arc<TypeDescriptor>> {
        if existing.filter() == filter {
            Ok(Arc::clone(existing))
        } else {
            Err(Error::inconsistent_transform(
                "Type was already transformed under a different member filter",
            ))
        }
    }

    /// Whether `T` has been transformed.
    #[must_use]
    pub fn is_transformed<T: GuardedType>(&self) -> bool {
        self.types.read().contains_key(&TypeId::of::<T>())
    }

    /// `T`'s descriptor, if it has been transformed.
    #[must_use]
    pub fn descriptor<T: GuardedType>(&self) -> Option<Arc<TypeDescriptor>> {
        self.types.read().get(&TypeId::of::<T>()).cloned()
    }

    /// Number of transformed types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    /// Whether no type has been transformed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Barrier, thread};

    use tsafe_error::codes;

    use super::*;

    struct Ledger;

    impl GuardedType for Ledger {
        fn enumerate_members(members: &mut MemberSet) -> Result<()> {
            members.add_all(&["new", "deposit", "balance", "fmt"])?;
            Ok(())
        }
    }

    struct Broken;

    impl GuardedType for Broken {
        fn enumerate_members(members: &mut MemberSet) -> Result<()> {
            members.add("run")?.add("run")?;
            Ok(())
        }
    }

    #[test]
    fn transform_classifies_members() {
        let registry = TypeRegistry::new();
        let (descriptor, fresh) = registry.transform::<Ledger>(&MemberFilter::new()).unwrap();
        assert!(fresh);
        assert_eq!(
            descriptor.guarded_members().collect::<Vec<_>>(),
            vec!["deposit", "balance"]
        );
        assert_eq!(
            descriptor.excluded_members().collect::<Vec<_>>(),
            vec!["new", "fmt"]
        );
        assert_eq!(descriptor.resolve("deposit").unwrap(), "deposit");
        assert_eq!(descriptor.resolve("fmt").unwrap_err().code, codes::EXCLUDED_MEMBER);
        assert_eq!(descriptor.resolve("withdraw").unwrap_err().code, codes::UNKNOWN_MEMBER);
    }

    #[test]
    fn second_transform_reuses_descriptor() {
        let registry = TypeRegistry::new();
        let (first, fresh_first) = registry.transform::<Ledger>(&MemberFilter::new()).unwrap();
        let (second, fresh_second) = registry.transform::<Ledger>(&MemberFilter::new()).unwrap();
        assert!(fresh_first);
        assert!(!fresh_second);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn different_filter_is_inconsistent() {
        let registry = TypeRegistry::new();
        registry.transform::<Ledger>(&MemberFilter::new()).unwrap();
        let err = registry
            .transform::<Ledger>(&MemberFilter::new().exclude("balance"))
            .unwrap_err();
        assert_eq!(err.code, codes::INCONSISTENT_TRANSFORM);
    }

    #[test]
    fn duplicate_member_fails_and_leaves_type_untransformed() {
        let registry = TypeRegistry::new();
        let err = registry.transform::<Broken>(&MemberFilter::new()).unwrap_err();
        assert_eq!(err.code, codes::DUPLICATE_MEMBER);
        assert!(!registry.is_transformed::<Broken>());
    }

    struct Auditor;

    impl GuardedType for Auditor {
        fn enumerate_members(members: &mut MemberSet) -> Result<()> {
            members.add("audit")?;
            Ok(())
        }
    }

    struct Branch;

    impl GuardedType for Branch {
        fn enumerate_members(members: &mut MemberSet) -> Result<()> {
            let registry = TypeRegistry::global();
            assert!(!registry.is_transformed::<Self>());
            registry.transform::<Auditor>(&MemberFilter::new())?;
            members.add_all(&["open", "close"])?;
            Ok(())
        }
    }

    #[test]
    fn enumeration_may_use_the_registry() {
        let registry = TypeRegistry::global();
        let (descriptor, fresh) = registry.transform::<Branch>(&MemberFilter::new()).unwrap();
        assert!(fresh);
        assert_eq!(descriptor.guarded_members().count(), 2);
        assert!(registry.is_transformed::<Auditor>());
        assert!(registry.is_transformed::<Branch>());
    }

    #[test]
    fn concurrent_first_transforms_happen_once() {
        let registry = TypeRegistry::new();
        let barrier = Barrier::new(8);
        let fresh = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        registry.transform::<Ledger>(&MemberFilter::new()).unwrap().1
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|fresh| *fresh)
                .count()
        });
        assert_eq!(fresh, 1);
    }
}
