//! Disposal tracking.
//!
//! A [`Disposable`] wraps a cleanup closure that runs exactly once, either
//! when `dispose` is called or when the guard is dropped. Consumers that
//! hand out registrations (event listeners, handler slots) return a
//! `Disposable` whose cleanup unregisters precisely that registration.

/// A cleanup guard. The wrapped closure runs at most once.
///
/// Dropping an undisposed guard runs the cleanup, so callers that want a
/// registration to outlive the guard must keep it alive (for example in a
/// [`DisposableCollection`]).
pub struct Disposable {
    cleanup: Option<Box<dyn FnOnce() + Send>>,
}

impl Disposable {
    /// Create a disposable that runs `cleanup` on disposal.
    pub fn new(cleanup: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cleanup: Some(Box::new(cleanup)),
        }
    }

    /// A disposable with no cleanup action.
    pub fn noop() -> Self {
        Self { cleanup: None }
    }

    /// Run the cleanup now. Idempotent.
    pub fn dispose(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }

    /// Whether the cleanup has already run (or never existed).
    pub fn is_disposed(&self) -> bool {
        self.cleanup.is_none()
    }
}

impl Drop for Disposable {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Disposable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disposable")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Owns a set of disposables and disposes them together.
///
/// Useful for tying several registrations to one lifetime, e.g. all
/// handlers a component registered on a client.
#[derive(Debug, Default)]
pub struct DisposableCollection {
    items: Vec<Disposable>,
}

impl DisposableCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Take ownership of a disposable.
    pub fn push(&mut self, disposable: Disposable) {
        self.items.push(disposable);
    }

    /// Number of held disposables (disposed or not).
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection holds no disposables.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Dispose everything, in insertion order, and clear the collection.
    pub fn dispose_all(&mut self) {
        for mut item in self.items.drain(..) {
            item.dispose();
        }
    }
}
