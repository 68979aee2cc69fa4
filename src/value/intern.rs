//! The string interning pool: a process-wide weakly-held mapping from raw
//! string contents to the unique `Rc<str>` for them, so that two equal
//! strings are also the same allocation. `Null`/`Bool`/`Num` don't need a
//! pool of their own — they're small `Copy` payloads where reference
//! equality after interning falls out of ordinary value equality for free.
//!
//! Entries are held as `Weak<str>` and pruned opportunistically whenever
//! the pool is touched, so a long-running program doesn't accumulate dead
//! entries forever. The map key is a separate owned `Box<str>`, not a clone
//! of the interned `Rc<str>` itself — keying by the `Rc` would let the map's
//! own entry pin the value alive forever, which would make every `Weak`
//! upgrade succeed and `prune` a no-op.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// How many interns to allow between prune passes. Small enough that a
/// long-running program doesn't accumulate many dead entries, large enough
/// that pruning isn't a per-call cost.
const PRUNE_INTERVAL: usize = 256;

#[derive(Default)]
pub struct StrPool {
    entries: RefCell<HashMap<Box<str>, Weak<str>>>,
    inserts_since_prune: RefCell<usize>,
}

impl StrPool {
    pub fn new() -> Self {
        StrPool::default()
    }

    /// Returns the unique `Rc<str>` for `raw`, allocating one only if no
    /// live interned copy exists yet.
    pub fn intern(&self, raw: &str) -> Rc<str> {
        if let Some(weak) = self.entries.borrow().get(raw) {
            if let Some(strong) = weak.upgrade() {
                return strong;
            }
        }

        let fresh: Rc<str> = Rc::from(raw);
        self.entries
            .borrow_mut()
            .insert(raw.into(), Rc::downgrade(&fresh));

        let mut count = self.inserts_since_prune.borrow_mut();
        *count += 1;
        if *count >= PRUNE_INTERVAL {
            *count = 0;
            drop(count);
            self.prune();
        }

        fresh
    }

    /// Removes entries whose only reference was the pool's own `Weak`. Safe
    /// to call any time; a `Box<str>` key never keeps its `Weak`'s target
    /// alive, so this genuinely collects dead entries rather than being a
    /// no-op over a key that pins them.
    fn prune(&self) {
        self.entries
            .borrow_mut()
            .retain(|_, weak| weak.strong_count() > 0);
    }

    /// Number of live entries, exposed for tests.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

thread_local! {
    /// Thread-local rather than truly process-wide, which is harmless
    /// since the evaluator itself is single-threaded.
    static GLOBAL_POOL: StrPool = StrPool::new();
}

/// Interns `raw`, returning the unique live `Rc<str>` for its contents.
/// Every `Value::Str` in the system is constructed through this function —
/// constructing one directly would bypass the pool and break the
/// reference-equality guarantee.
pub fn intern_str(raw: &str) -> Rc<str> {
    GLOBAL_POOL.with(|pool| pool.intern(raw))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn interning_dedupes_equal_strings() {
        let pool = StrPool::new();
        let a = pool.intern("hello");
        let b = pool.intern("hello");
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn dropping_the_last_strong_ref_lets_prune_collect_the_entry() {
        let pool = StrPool::new();
        {
            let a = pool.intern("transient");
            assert_eq!(pool.len(), 1);
            drop(a);
        }
        // the map key must not itself be the thing keeping "transient"
        // alive - otherwise this would never shrink.
        pool.prune();
        assert_eq!(pool.len(), 0, "key must not pin the interned value alive");

        let b = pool.intern("transient");
        assert_eq!(&*b, "transient");
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn a_live_strong_ref_survives_prune() {
        let pool = StrPool::new();
        let a = pool.intern("kept");
        pool.prune();
        assert_eq!(pool.len(), 1);
        assert_eq!(&*a, "kept");
    }
}
