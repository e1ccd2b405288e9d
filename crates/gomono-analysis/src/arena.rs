//! Append-only storage addressed by typed keys.
//!
//! Types and objects are never freed during a session, so a growing `Vec`
//! indexed by a `u32` newtype is all the checker needs. Keys of different
//! arenas cannot be mixed up at compile time.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

pub trait ArenaKey: Copy + Eq + Hash + fmt::Debug {
    fn from_usize(idx: usize) -> Self;
    fn as_usize(self) -> usize;
}

pub struct Arena<K: ArenaKey, V> {
    items: Vec<V>,
    _key: PhantomData<K>,
}

impl<K: ArenaKey, V> Default for Arena<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ArenaKey, V> Arena<K, V> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            _key: PhantomData,
        }
    }

    /// Stores `value` and returns the key it will live under forever.
    #[inline]
    pub fn insert(&mut self, value: V) -> K {
        let key = K::from_usize(self.items.len());
        self.items.push(value);
        key
    }

    #[inline]
    pub fn get(&self, key: K) -> Option<&V> {
        self.items.get(key.as_usize())
    }

    #[inline]
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.items.get_mut(key.as_usize())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, v)| (K::from_usize(i), v))
    }
}

impl<K: ArenaKey, V> Index<K> for Arena<K, V> {
    type Output = V;

    #[inline]
    fn index(&self, key: K) -> &V {
        &self.items[key.as_usize()]
    }
}

impl<K: ArenaKey, V> IndexMut<K> for Arena<K, V> {
    #[inline]
    fn index_mut(&mut self, key: K) -> &mut V {
        &mut self.items[key.as_usize()]
    }
}

impl<K: ArenaKey, V> fmt::Debug for Arena<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena").field("len", &self.items.len()).finish()
    }
}

/// Declares `u32` newtype keys usable with [`Arena`].
#[macro_export]
macro_rules! define_key {
    ($($(#[$attr:meta])* $vis:vis struct $name:ident;)*) => {
        $(
            $(#[$attr])*
            #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
            #[repr(transparent)]
            $vis struct $name(u32);

            impl $name {
                #[inline]
                pub fn raw(self) -> u32 {
                    self.0
                }
            }

            impl ::std::fmt::Debug for $name {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    write!(f, "{}({})", stringify!($name), self.0)
                }
            }

            impl $crate::arena::ArenaKey for $name {
                #[inline]
                fn from_usize(idx: usize) -> Self {
                    Self(idx as u32)
                }

                #[inline]
                fn as_usize(self) -> usize {
                    self.0 as usize
                }
            }
        )*
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    define_key! {
        struct SlotKey;
    }

    #[test]
    fn test_keys_are_sequential() {
        let mut arena: Arena<SlotKey, &str> = Arena::new();
        let a = arena.insert("List");
        let b = arena.insert("Pair");
        assert_eq!(a.raw(), 0);
        assert_eq!(b.raw(), 1);
        assert_eq!(arena[b], "Pair");
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_get_out_of_range() {
        let mut arena: Arena<SlotKey, u8> = Arena::new();
        arena.insert(7);
        assert_eq!(arena.get(SlotKey::from_usize(0)), Some(&7));
        assert!(arena.get(SlotKey::from_usize(3)).is_none());
    }

    #[test]
    fn test_iter_yields_keys_in_order() {
        let mut arena: Arena<SlotKey, i32> = Arena::new();
        for v in [3, 1, 2] {
            arena.insert(v);
        }
        let keys: Vec<u32> = arena.iter().map(|(k, _)| k.raw()).collect();
        assert_eq!(keys, vec![0, 1, 2]);
        arena[SlotKey::from_usize(1)] = 10;
        assert_eq!(arena.iter().map(|(_, v)| *v).sum::<i32>(), 15);
    }
}
