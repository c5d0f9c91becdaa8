use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Generic dense-integer identifier, compile-time tagged by the entity it
/// names (attribute type, object class, action, or object).
///
/// Every registry in this workspace assigns ids densely starting at zero
/// (spec.md §3: "Ids are dense and assigned by the registry"), so `Id<T>`
/// wraps a plain `u32` rather than the teacher's `uuid::Uuid`-backed
/// `ID<T>` (`rbp-core::ID`) — object ids in particular must support the
/// monotonically non-decreasing `next_object_id` counter on `State`, which
/// a random UUID cannot provide.
pub struct Id<T> {
    inner: u32,
    marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    pub const fn new(inner: u32) -> Self {
        Self {
            inner,
            marker: PhantomData,
        }
    }

    pub const fn index(&self) -> usize {
        self.inner as usize
    }

    pub const fn raw(&self) -> u32 {
        self.inner
    }

    /// Reinterpret this id as tagged by a different entity while keeping
    /// the same underlying integer. Used where the same dense counter
    /// backs two logically distinct id spaces.
    pub const fn cast<U>(self) -> Id<U> {
        Id {
            inner: self.inner,
            marker: PhantomData,
        }
    }
}

impl<T> From<u32> for Id<T> {
    fn from(inner: u32) -> Self {
        Self::new(inner)
    }
}
impl<T> From<Id<T>> for u32 {
    fn from(id: Id<T>) -> Self {
        id.inner
    }
}
impl<T> From<Id<T>> for usize {
    fn from(id: Id<T>) -> Self {
        id.inner as usize
    }
}

impl<T> Copy for Id<T> {}
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Eq for Id<T> {}
impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Id").field(&self.inner).finish()
    }
}
impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl<T> serde::Serialize for Id<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.inner)
    }
}
impl<'de, T> serde::Deserialize<'de> for Id<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::new(u32::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;

    #[test]
    fn orders_by_inner_value() {
        let a: Id<Marker> = Id::new(1);
        let b: Id<Marker> = Id::new(2);
        assert!(a < b);
        assert_eq!(a, Id::new(1));
    }
}
