//! Named scopes for grouping cell and layer work.
//!
//! Scopes only affect diagnostics: the current path (`outer/inner`) is what
//! the crate logs when it instantiates cells or starts an unroll. Values never
//! depend on it.

use std::cell::RefCell;

thread_local! {
    static SCOPES: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

struct ScopeGuard;

impl ScopeGuard {
    fn enter(name: &str) -> Self {
        SCOPES.with(|scopes| scopes.borrow_mut().push(name.to_owned()));
        ScopeGuard
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        SCOPES.with(|scopes| {
            scopes.borrow_mut().pop();
        });
    }
}

/// Runs `f` with `name` pushed onto this thread's scope stack.
///
/// The scope is popped again when `f` returns or unwinds.
pub fn with_scope<R>(name: &str, f: impl FnOnce() -> R) -> R {
    let _guard = ScopeGuard::enter(name);
    f()
}

/// Slash-separated path of the scopes entered on this thread.
pub fn current_scope() -> String {
    SCOPES.with(|scopes| scopes.borrow().join("/"))
}
