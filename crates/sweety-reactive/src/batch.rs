#![forbid(unsafe_code)]

//! Deferred, deduplicated notification for multi-cell updates.
//!
//! # Design
//!
//! A thread-local [`BatchContext`] counts the open [`BatchScope`]s and holds
//! the jobs deferred while any scope is open. Each job carries a key (the
//! address of the cell or listener that scheduled it); a key already pending
//! is not queued twice. When the outermost scope drops, pending jobs are run
//! round by round until none remain. Jobs scheduled during a round land in
//! the next round, deduplicated the same way, so a listener fed by several
//! cells runs once per round rather than once per cell.
//!
//! # Invariants
//!
//! 1. Writes inside a scope are visible to reads immediately.
//! 2. A key is pending at most once per round.
//! 3. The flush runs only when the outermost scope exits.
//! 4. Outside any scope, [`schedule`] runs its job synchronously.

use std::cell::RefCell;
use std::collections::HashSet;
use std::marker::PhantomData;

type Job = Box<dyn FnOnce()>;

#[derive(Default)]
struct BatchContext {
    depth: u32,
    keys: HashSet<usize>,
    pending: Vec<Job>,
}

thread_local! {
    static CONTEXT: RefCell<BatchContext> = RefCell::new(BatchContext::default());
}

/// RAII guard deferring notifications until it (and every enclosing scope)
/// is dropped.
///
/// Scopes are per-thread and therefore `!Send`.
///
/// ```
/// use sweety_reactive::{BatchScope, Observable};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let cell = Observable::new(0);
/// let seen = Rc::new(Cell::new(0));
/// let seen_in_cb = Rc::clone(&seen);
/// let _sub = cell.subscribe(move |_| seen_in_cb.set(seen_in_cb.get() + 1));
///
/// {
///     let _scope = BatchScope::new();
///     cell.set(1);
///     cell.set(2);
///     assert_eq!(cell.get(), 2);
///     assert_eq!(seen.get(), 0);
/// }
/// assert_eq!(seen.get(), 1);
/// ```
pub struct BatchScope {
    _not_send: PhantomData<*const ()>,
}

impl BatchScope {
    /// Open a scope. Nested scopes only increase the depth.
    #[must_use]
    pub fn new() -> Self {
        CONTEXT.with(|ctx| ctx.borrow_mut().depth += 1);
        Self {
            _not_send: PhantomData,
        }
    }

    /// Whether any scope is open on this thread.
    #[must_use]
    pub fn is_active() -> bool {
        CONTEXT.with(|ctx| ctx.borrow().depth > 0)
    }

    /// Number of nested scopes currently open on this thread.
    #[must_use]
    pub fn depth() -> u32 {
        CONTEXT.with(|ctx| ctx.borrow().depth)
    }
}

impl Default for BatchScope {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BatchScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchScope")
            .field("depth", &Self::depth())
            .finish()
    }
}

impl Drop for BatchScope {
    fn drop(&mut self) {
        // Decrement even if a flushed job panics.
        let _exit = ScopeExit;
        if Self::depth() == 1 {
            flush();
        }
    }
}

struct ScopeExit;

impl Drop for ScopeExit {
    fn drop(&mut self) {
        CONTEXT.with(|ctx| {
            let mut ctx = ctx.borrow_mut();
            ctx.depth = ctx.depth.saturating_sub(1);
            if ctx.depth == 0 {
                ctx.keys.clear();
                ctx.pending.clear();
            }
        });
    }
}

fn flush() {
    loop {
        let round = CONTEXT.with(|ctx| {
            let mut ctx = ctx.borrow_mut();
            ctx.keys.clear();
            std::mem::take(&mut ctx.pending)
        });
        if round.is_empty() {
            break;
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(jobs = round.len(), "flushing batched notifications");
        for job in round {
            job();
        }
    }
}

/// Run `job` now, or defer it to the current batch under `key`.
///
/// While a batch is open, a job whose key is already pending is dropped.
pub fn schedule(key: usize, job: impl FnOnce() + 'static) {
    let immediate = CONTEXT.with(|ctx| {
        let mut ctx = ctx.borrow_mut();
        if ctx.depth == 0 {
            return Some(job);
        }
        if ctx.keys.insert(key) {
            ctx.pending.push(Box::new(job));
        }
        None
    });
    if let Some(job) = immediate {
        job();
    }
}

/// Run `f` inside a [`BatchScope`], flushing notifications when it returns.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    let _scope = BatchScope::new();
    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counter() -> (Rc<Cell<u32>>, impl Fn() -> u32) {
        let count = Rc::new(Cell::new(0));
        let read = Rc::clone(&count);
        (count, move || read.get())
    }

    #[test]
    fn schedule_outside_batch_runs_immediately() {
        let (count, read) = counter();
        schedule(1, move || count.set(count.get() + 1));
        assert_eq!(read(), 1);
    }

    #[test]
    fn schedule_inside_batch_defers() {
        let (count, read) = counter();
        {
            let _scope = BatchScope::new();
            schedule(1, move || count.set(count.get() + 1));
            assert_eq!(read(), 0);
        }
        assert_eq!(read(), 1);
    }

    #[test]
    fn duplicate_keys_run_once() {
        let (count, read) = counter();
        batch(|| {
            for _ in 0..5 {
                let count = Rc::clone(&count);
                schedule(7, move || count.set(count.get() + 1));
            }
        });
        assert_eq!(read(), 1);
    }

    #[test]
    fn distinct_keys_run_in_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        batch(|| {
            for key in [3usize, 1, 2] {
                let order = Rc::clone(&order);
                schedule(key, move || order.borrow_mut().push(key));
            }
        });
        assert_eq!(*order.borrow(), vec![3, 1, 2]);
    }

    #[test]
    fn nested_scopes_flush_at_outermost() {
        let (count, read) = counter();
        {
            let _outer = BatchScope::new();
            {
                let _inner = BatchScope::new();
                assert_eq!(BatchScope::depth(), 2);
                schedule(1, move || count.set(count.get() + 1));
            }
            assert_eq!(read(), 0);
            assert!(BatchScope::is_active());
        }
        assert_eq!(read(), 1);
        assert!(!BatchScope::is_active());
    }

    #[test]
    fn jobs_scheduled_while_flushing_join_the_flush() {
        let (count, read) = counter();
        batch(|| {
            let count = Rc::clone(&count);
            schedule(1, move || {
                for _ in 0..3 {
                    let count = Rc::clone(&count);
                    schedule(2, move || count.set(count.get() + 1));
                }
            });
        });
        assert_eq!(read(), 1);
    }

    #[test]
    fn batch_returns_closure_result() {
        assert_eq!(batch(|| 40 + 2), 42);
    }
}
