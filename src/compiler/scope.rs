//! The compile-time lexical environment: an ordered sequence of frames
//! mirroring the runtime stack shape, used to resolve a name to a lexical
//! address before a single byte of the runtime ever exists.

use std::collections::HashMap;
use std::rc::Rc;

use crate::expr::CaptureAddr;

/// A lexical address produced by frame search, before any capture
/// rewrite: `level` frames up from the frame currently being compiled
/// (0 = current), `index` into that frame's locals. Used only for the
/// `free_vars` diagnostic map — the real resolution result is `Resolved`.
#[derive(Clone, Copy, Debug)]
pub struct StackAddr {
    pub level: usize,
    pub index: usize,
}

/// What a name resolves to.
pub enum Resolved {
    /// A genuine local of the current frame — used directly, no capture.
    Stack(StackAddr),
    /// A slot in the *current* frame's capture array, chained in from
    /// wherever the binding actually lives.
    Capture(usize),
}

struct CompileFrame {
    locals: Vec<Rc<str>>,
    /// Names captured into this frame, in order of first appearance —
    /// parallel to `capture_addrs`.
    captures: Vec<Rc<str>>,
    /// Each entry describes how to obtain `captures[i]` from the
    /// immediately enclosing frame (one hop) — either that frame's own
    /// local, or a slot already in that frame's own captures (itself
    /// chained in from further out).
    capture_addrs: Vec<CaptureAddr>,
}

impl CompileFrame {
    fn new() -> Self {
        CompileFrame {
            locals: Vec::new(),
            captures: Vec::new(),
            capture_addrs: Vec::new(),
        }
    }
}

/// The compile-time environment plus the free-variable map it accumulates
/// for diagnostics.
pub struct Scope {
    frames: Vec<CompileFrame>,
    pub free_vars: HashMap<Rc<str>, Vec<StackAddr>>,
}

impl Scope {
    /// A fresh scope always carries the implicit bottom frame, matching
    /// `eval::Stack`'s own implicit bottom frame for program-level `Let`
    /// bindings.
    pub fn new() -> Self {
        Scope {
            frames: vec![CompileFrame::new()],
            free_vars: HashMap::new(),
        }
    }

    /// Extends the current frame's locals. Used by `let`, which does not
    /// introduce a new runtime frame either.
    pub fn push_names(&mut self, names: &[Rc<str>]) {
        self.frames.last_mut().unwrap().locals.extend(names.iter().cloned());
    }

    /// Pops `let`-introduced locals and strips them from the free-variable
    /// map — once a `let` closes, its bound names are no longer free.
    pub fn pop_names(&mut self, names: &[Rc<str>]) {
        let frame = self.frames.last_mut().unwrap();
        let new_len = frame.locals.len() - names.len();
        frame.locals.truncate(new_len);
        self.strip_bound(names);
    }

    /// Pushes a new top frame, used by `fn`. Its locals start out as
    /// exactly its parameter list.
    pub fn push_frame(&mut self, params: &[Rc<str>]) {
        let mut frame = CompileFrame::new();
        frame.locals.extend(params.iter().cloned());
        self.frames.push(frame);
    }

    /// Pops a `fn` frame, returning the captured addresses it snapshotted
    /// for its surviving free variables, ordered by first appearance.
    pub fn pop_frame(&mut self, params: &[Rc<str>]) -> Vec<CaptureAddr> {
        let frame = self.frames.pop().expect("compile-frame underflow");
        self.strip_bound(params);
        frame.capture_addrs
    }

    fn strip_bound(&mut self, names: &[Rc<str>]) {
        for name in names {
            self.free_vars.remove(name.as_ref());
        }
    }

    /// Resolves a bound name to a lexical address or a capture slot.
    /// Returns `None` if `name` is not bound in any live frame — the
    /// caller falls through to the external (globals) namespace and
    /// finally to `CompilerError::UndefinedSymbol`.
    pub fn resolve(&mut self, name: &str) -> Option<Resolved> {
        let current_level = self.frames.len() - 1;
        let found = self.frames.iter().enumerate().rev().find_map(|(pos, frame)| {
            frame
                .locals
                .iter()
                .rposition(|n| n.as_ref() == name)
                .map(|index| (pos, current_level - pos, index))
        });

        let (owner_pos, level, index) = found?;
        // Free-variable bookkeeping records the raw lexical distance,
        // independent of how (or whether) it gets chained into captures.
        self.free_vars
            .entry(Rc::from(name))
            .or_default()
            .push(StackAddr { level, index });

        if level == 0 {
            return Some(Resolved::Stack(StackAddr { level: 0, index }));
        }

        Some(Resolved::Capture(self.chain_capture(owner_pos, index, name)))
    }

    /// Ensures every frame from `owner_pos + 1` up to the current
    /// (innermost) frame carries a one-hop capture entry chaining back to
    /// `owner_pos`'s local `index`, reusing any entry a frame already has
    /// for `name`. Returns the capture index in the *current* frame — the
    /// only one the caller needs, since every intermediate frame is now
    /// wired to forward it.
    fn chain_capture(&mut self, owner_pos: usize, index: usize, name: &str) -> usize {
        let mut addr = CaptureAddr::Local(index);
        for frame in &mut self.frames[owner_pos + 1..] {
            if let Some(pos) = frame.captures.iter().position(|n| n.as_ref() == name) {
                addr = CaptureAddr::Capture(pos);
                continue;
            }
            frame.captures.push(Rc::from(name));
            frame.capture_addrs.push(addr);
            addr = CaptureAddr::Capture(frame.captures.len() - 1);
        }
        match addr {
            CaptureAddr::Capture(index) => index,
            // `owner_pos < current frame`, so the loop above always runs at
            // least once and the final `addr` is always a `Capture` into
            // the current (innermost) frame.
            CaptureAddr::Local(_) => unreachable!("capture chain must end in the current frame"),
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn two_level_capture_chains_through_the_intermediate_frame() {
        let mut scope = Scope::new();
        let x: Rc<str> = Rc::from("x");
        scope.push_names(std::slice::from_ref(&x));

        // fn a() { fn b() { x } }
        scope.push_frame(&[]); // a
        scope.push_frame(&[]); // b
        let resolved = scope.resolve("x").expect("x must resolve");
        assert!(matches!(resolved, Resolved::Capture(_)));
        let b_captures = scope.pop_frame(&[]); // pop b
        // b's own enclosing frame is `a`, not the bottom frame holding x -
        // so b's capture entry must forward through a's *own* capture
        // slot, never reach past a to a frame that might already be gone
        // by the time b runs.
        assert!(matches!(b_captures[0], CaptureAddr::Capture(0)));

        let a_captures = scope.pop_frame(&[]); // pop a
        // a itself must now also carry a forwarding capture entry for x,
        // chained from the bottom frame's local - this is the fix: a
        // two-level-deep reference is threaded through every intermediate
        // frame instead of being resolved directly against a frame that
        // might already be gone by the time `b` runs.
        assert_eq!(a_captures.len(), 1);
        assert!(matches!(a_captures[0], CaptureAddr::Local(0)));
    }

    #[test]
    fn repeated_capture_of_the_same_name_reuses_the_slot() {
        let mut scope = Scope::new();
        let x: Rc<str> = Rc::from("x");
        scope.push_names(std::slice::from_ref(&x));
        scope.push_frame(&[]);

        let first = match scope.resolve("x").unwrap() {
            Resolved::Capture(i) => i,
            _ => panic!("expected a capture"),
        };
        let second = match scope.resolve("x").unwrap() {
            Resolved::Capture(i) => i,
            _ => panic!("expected a capture"),
        };
        assert_eq!(first, second);

        let captures = scope.pop_frame(&[]);
        assert_eq!(captures.len(), 1, "must not duplicate the capture slot");
    }
}
