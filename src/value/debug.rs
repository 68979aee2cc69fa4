//! The "debug bag" every runtime datum carries: a small, diagnostics-only
//! bundle of `uid`/`name`/`sourceLoc`. Never consulted by evaluation
//! itself, only by error messages and (eventually) a pretty-printer.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_UID: AtomicU64 = AtomicU64::new(1);

/// A source location, carried by compiled expression nodes so runtime
/// errors can report where they happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugLoc {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for DebugLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Diagnostics-only bag attached to every value and every reference.
/// `name` is filled in by the compiler's symbol resolver (§4.2.2 step 6);
/// `source_loc` may be filled in by a future span-aware compiler front end.
#[derive(Debug, Default)]
pub struct DebugBag {
    pub uid: u64,
    name: RefCell<Option<Rc<str>>>,
    source_loc: RefCell<Option<DebugLoc>>,
}

impl DebugBag {
    pub fn new() -> Self {
        DebugBag {
            uid: NEXT_UID.fetch_add(1, Ordering::Relaxed),
            name: RefCell::new(None),
            source_loc: RefCell::new(None),
        }
    }

    pub fn with_name(name: Rc<str>) -> Self {
        let bag = Self::new();
        *bag.name.borrow_mut() = Some(name);
        bag
    }

    pub fn name(&self) -> Option<Rc<str>> {
        self.name.borrow().clone()
    }

    pub fn set_name(&self, name: Rc<str>) {
        *self.name.borrow_mut() = Some(name);
    }

    pub fn source_loc(&self) -> Option<DebugLoc> {
        *self.source_loc.borrow()
    }

    pub fn set_source_loc(&self, loc: DebugLoc) {
        *self.source_loc.borrow_mut() = Some(loc);
    }
}

impl Clone for DebugBag {
    /// Cloning a debug bag mints a fresh `uid` — it is never meant to alias
    /// the original's identity, only to carry forward its name/location.
    fn clone(&self) -> Self {
        DebugBag {
            uid: NEXT_UID.fetch_add(1, Ordering::Relaxed),
            name: RefCell::new(self.name.borrow().clone()),
            source_loc: RefCell::new(*self.source_loc.borrow()),
        }
    }
}
