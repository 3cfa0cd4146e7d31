//! Listener contract for stream readers.

use super::error::ReaderError;

/// Observer of one read session.
///
/// Callbacks run on the reader's background task, never on the task that
/// started the reader. Nothing throttles or cancels the reader while a
/// callback runs, so long blocking work belongs elsewhere. Listeners that
/// share state with the caller bring their own synchronization.
///
/// Order per session: `on_start` once, `on_read` zero or more times in
/// byte order, `on_fault` at most once, then `on_finish` exactly once.
pub trait Listener: Send + 'static {
    /// Called once, before the first read.
    fn on_start(&mut self) {}

    /// Called once per completed chunk. The chunk is owned by the callee.
    fn on_read(&mut self, chunk: Vec<u8>);

    /// Called when a read fails, just before `on_finish`.
    fn on_fault(&mut self, _error: &ReaderError) {}

    /// Called once, last, however the session ended.
    fn on_finish(&mut self) {}
}

impl<L: Listener + ?Sized> Listener for Box<L> {
    fn on_start(&mut self) {
        (**self).on_start();
    }

    fn on_read(&mut self, chunk: Vec<u8>) {
        (**self).on_read(chunk);
    }

    fn on_fault(&mut self, error: &ReaderError) {
        (**self).on_fault(error);
    }

    fn on_finish(&mut self) {
        (**self).on_finish();
    }
}

/// Listener that ignores every callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl Listener for NoopListener {
    fn on_read(&mut self, _chunk: Vec<u8>) {}
}

/// Listener built from a chunk closure.
pub struct FnListener<F> {
    on_read: F,
}

impl<F> FnListener<F>
where
    F: FnMut(Vec<u8>) + Send + 'static,
{
    #[must_use]
    pub fn new(on_read: F) -> Self {
        Self { on_read }
    }
}

impl<F> Listener for FnListener<F>
where
    F: FnMut(Vec<u8>) + Send + 'static,
{
    fn on_read(&mut self, chunk: Vec<u8>) {
        (self.on_read)(chunk);
    }
}

impl<F> std::fmt::Debug for FnListener<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnListener").finish_non_exhaustive()
    }
}
