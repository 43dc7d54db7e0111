//! Bucket: head of one singly-linked chain of elements.
//!
//! A bucket does not know its own index and does not own storage; every
//! operation takes the node store holding its elements. New elements are
//! linked at the head.

use crate::alloc::{ElementAllocator, NodeStore};
use core::borrow::Borrow;

/// Outcome of [`Bucket::add_with`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Added<I> {
    /// The key was already present; nothing was constructed.
    Found(I),
    /// A new element was constructed and linked at the head.
    Created(I),
}

impl<I: Copy> Added<I> {
    #[inline]
    pub fn id(&self) -> I {
        match *self {
            Added::Found(id) | Added::Created(id) => id,
        }
    }

    #[inline]
    pub fn is_created(&self) -> bool {
        matches!(self, Added::Created(_))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Bucket<I> {
    first: Option<I>,
}

impl<I> Default for Bucket<I> {
    fn default() -> Self {
        Self { first: None }
    }
}

impl<I: Copy + Eq> Bucket<I> {
    pub const fn new() -> Self {
        Self { first: None }
    }

    #[inline]
    pub fn has_element(&self) -> bool {
        self.first.is_some()
    }

    #[inline]
    pub fn first(&self) -> Option<I> {
        self.first
    }

    /// Id of the element whose key equals `q`.
    pub fn find<S, Q>(&self, store: &S, q: &Q) -> Option<I>
    where
        S: NodeStore<Id = I> + ?Sized,
        S::Key: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.iter(store).find(|&id| store.node(id).key.borrow() == q)
    }

    /// Return the element for `key`, constructing it if absent.
    ///
    /// `make_value` runs exactly once when the key is absent and never when
    /// it is present.
    pub fn add_with<A, F>(&mut self, alloc: &mut A, key: A::Key, make_value: F) -> Added<I>
    where
        A: ElementAllocator<Id = I> + ?Sized,
        A::Key: Eq,
        F: FnOnce() -> A::Value,
    {
        if let Some(id) = self.find(&*alloc, &key) {
            return Added::Found(id);
        }
        let id = alloc.acquire(key, make_value());
        self.link(alloc, id);
        Added::Created(id)
    }

    /// Link an unlinked element at the head of the chain.
    #[inline]
    pub fn link<S>(&mut self, store: &mut S, id: I)
    where
        S: NodeStore<Id = I> + ?Sized,
    {
        let node = store.node_mut(id);
        debug_assert!(node.next.is_none(), "linking an element that is already chained");
        node.next = self.first;
        self.first = Some(id);
    }

    /// Unlink the element whose key equals `q` and return it with a cleared
    /// link. The caller decides whether to release it.
    pub fn remove<S, Q>(&mut self, store: &mut S, q: &Q) -> Option<I>
    where
        S: NodeStore<Id = I> + ?Sized,
        S::Key: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mut prev: Option<I> = None;
        let mut cur = self.first;
        while let Some(id) = cur {
            let node = store.node(id);
            let next = node.next;
            if node.key.borrow() == q {
                match prev {
                    None => self.first = next,
                    Some(p) => store.node_mut(p).next = next,
                }
                store.node_mut(id).next = None;
                return Some(id);
            }
            prev = cur;
            cur = next;
        }
        None
    }

    /// Unlink and return the head element.
    pub fn take_first<S>(&mut self, store: &mut S) -> Option<I>
    where
        S: NodeStore<Id = I> + ?Sized,
    {
        let id = self.first?;
        self.first = store.node_mut(id).next.take();
        Some(id)
    }

    /// Ids in chain order, head first.
    pub fn iter<'s, S>(&self, store: &'s S) -> ChainIter<'s, S>
    where
        S: NodeStore<Id = I> + ?Sized,
    {
        ChainIter {
            store,
            cur: self.first,
        }
    }

    /// Number of chain nodes. Walks the chain.
    pub fn len<S>(&self, store: &S) -> usize
    where
        S: NodeStore<Id = I> + ?Sized,
    {
        self.iter(store).count()
    }

    /// Tortoise/hare walk; false if the chain loops back on itself.
    pub fn is_acyclic<S>(&self, store: &S) -> bool
    where
        S: NodeStore<Id = I> + ?Sized,
    {
        let step = |id: I| store.node(id).next;
        let mut slow = self.first;
        let mut fast = self.first;
        loop {
            fast = match fast.and_then(step) {
                Some(f) => step(f),
                None => return true,
            };
            slow = slow.and_then(step);
            match fast {
                None => return true,
                Some(f) if Some(f) == slow => return false,
                Some(_) => {}
            }
        }
    }
}

/// Iterator over the ids of one chain.
pub struct ChainIter<'s, S: ?Sized + NodeStore> {
    store: &'s S,
    cur: Option<S::Id>,
}

impl<'s, S> Iterator for ChainIter<'s, S>
where
    S: ?Sized + NodeStore,
{
    type Item = S::Id;

    #[inline]
    fn next(&mut self) -> Option<S::Id> {
        let id = self.cur?;
        self.cur = self.store.node(id).next;
        Some(id)
    }
}
