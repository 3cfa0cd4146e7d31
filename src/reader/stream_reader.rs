//! Background stream reader.
//!
//! A [`StreamReader`] drains an async byte source on its own tokio task,
//! cuts the bytes into chunks with a [`ChunkPolicy`], and hands each chunk
//! to a [`Listener`]. [`spawn_event_reader`] runs the same loop but
//! publishes [`ReaderEvent`]s on a bounded channel instead.

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use super::error::ReaderError;
use super::event::{ReadSummary, ReaderEvent, ReaderState, SharedState, Termination};
use super::listener::{Listener, NoopListener};
use super::policy::{ChunkPolicy, Chunker, ReadMode};

/// Default capacity of a reader event channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Destination of reader events.
#[async_trait]
trait EventSink: Send {
    /// Deliver one event. Returns `false` once nobody is listening.
    async fn deliver(&mut self, event: ReaderEvent) -> bool;
}

/// Dispatches events to listener callbacks.
///
/// `on_finish` runs exactly once: from the terminal event, or from `Drop`
/// when a callback panicked and the task unwound first.
struct ListenerSink<L: Listener> {
    listener: Option<L>,
    finished: bool,
}

impl<L: Listener> ListenerSink<L> {
    fn new(listener: Option<L>) -> Self {
        Self {
            listener,
            finished: false,
        }
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Some(listener) = self.listener.as_mut() {
            listener.on_finish();
        }
    }
}

#[async_trait]
impl<L: Listener> EventSink for ListenerSink<L> {
    async fn deliver(&mut self, event: ReaderEvent) -> bool {
        let Some(listener) = self.listener.as_mut() else {
            return true;
        };
        match event {
            ReaderEvent::Started => listener.on_start(),
            ReaderEvent::Chunk(chunk) => listener.on_read(chunk),
            ReaderEvent::EndOfStream => self.finish(),
            ReaderEvent::Fault(error) => {
                listener.on_fault(&error);
                self.finish();
            }
        }
        true
    }
}

impl<L: Listener> Drop for ListenerSink<L> {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Marks the session `Finished` however the read loop exits.
struct FinishGuard(SharedState);

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.0.set(ReaderState::Finished);
    }
}

/// Publishes events on a bounded channel, waiting for capacity.
struct ChannelSink {
    tx: mpsc::Sender<ReaderEvent>,
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn deliver(&mut self, event: ReaderEvent) -> bool {
        self.tx.send(event).await.is_ok()
    }
}

/// Reads a byte stream in the background and reports chunks to a listener.
///
/// The reader is configured completely at construction and consumed by
/// [`start`](Self::start), so each instance runs at most one session.
#[derive(Debug)]
pub struct StreamReader<R, L = NoopListener> {
    id: Uuid,
    source: R,
    policy: ChunkPolicy,
    listener: Option<L>,
}

impl<R, L> StreamReader<R, L>
where
    R: AsyncRead + Unpin + Send + 'static,
    L: Listener,
{
    /// Create a reader using the default block size in block mode.
    #[must_use]
    pub fn new(source: R, listener: Option<L>, mode: ReadMode) -> Self {
        let policy = match mode {
            ReadMode::Block => ChunkPolicy::default_block(),
            ReadMode::Line => ChunkPolicy::Line,
        };
        Self::with_policy(source, listener, policy)
    }

    /// Create a reader with an explicit block size.
    ///
    /// # Errors
    ///
    /// Returns `ReaderError::InvalidBlockSize` if `mode` is block and
    /// `block_size` is zero.
    pub fn with_block_size(
        source: R,
        listener: Option<L>,
        mode: ReadMode,
        block_size: usize,
    ) -> Result<Self, ReaderError> {
        let policy = ChunkPolicy::from_mode(mode, block_size)?;
        Ok(Self::with_policy(source, listener, policy))
    }

    #[must_use]
    pub fn with_policy(source: R, listener: Option<L>, policy: ChunkPolicy) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            policy,
            listener,
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn policy(&self) -> ChunkPolicy {
        self.policy
    }

    /// Spawn the background read loop and return immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> ReaderHandle {
        let sink = ListenerSink::new(self.listener);
        spawn_session(self.id, self.source, self.policy, sink)
    }
}

impl<R> StreamReader<R, NoopListener>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    /// Create a reader with no listener; chunks are read and dropped.
    #[must_use]
    pub fn without_listener(source: R, mode: ReadMode) -> Self {
        Self::new(source, None, mode)
    }
}

/// Handle to a running or finished read session.
#[derive(Debug)]
pub struct ReaderHandle {
    id: Uuid,
    state: SharedState,
    task: JoinHandle<ReadSummary>,
}

impl ReaderHandle {
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> ReaderState {
        self.state.get()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state() == ReaderState::Finished
    }

    /// Wait for the session to end.
    ///
    /// # Errors
    ///
    /// Returns `ReaderError::TaskFailed` if a listener callback panicked.
    pub async fn join(self) -> Result<ReadSummary, ReaderError> {
        Ok(self.task.await?)
    }
}

/// Start a reader that publishes events on a bounded channel.
///
/// Sends wait for channel capacity. Dropping the receiver stops the reader
/// at its next delivery.
pub fn spawn_event_reader<R>(
    source: R,
    policy: ChunkPolicy,
    capacity: usize,
) -> (ReaderHandle, mpsc::Receiver<ReaderEvent>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let handle = spawn_session(Uuid::new_v4(), source, policy, ChannelSink { tx });
    (handle, rx)
}

/// [`spawn_event_reader`] with the receiver wrapped as a `Stream`.
pub fn event_stream<R>(
    source: R,
    policy: ChunkPolicy,
    capacity: usize,
) -> (ReaderHandle, ReceiverStream<ReaderEvent>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (handle, rx) = spawn_event_reader(source, policy, capacity);
    (handle, ReceiverStream::new(rx))
}

fn spawn_session<R, S>(id: Uuid, source: R, policy: ChunkPolicy, sink: S) -> ReaderHandle
where
    R: AsyncRead + Unpin + Send + 'static,
    S: EventSink + 'static,
{
    let state = SharedState::default();
    state.set(ReaderState::Running);

    let task_state = state.clone();
    let task = match policy {
        // Single-byte reads go through a buffer so they don't each hit the OS.
        ChunkPolicy::Line => tokio::spawn(read_loop(
            id,
            BufReader::new(source),
            policy,
            sink,
            task_state,
        )),
        ChunkPolicy::Block { .. } => tokio::spawn(read_loop(id, source, policy, sink, task_state)),
    };

    ReaderHandle { id, state, task }
}

async fn read_loop<R, S>(
    id: Uuid,
    mut source: R,
    policy: ChunkPolicy,
    mut sink: S,
    state: SharedState,
) -> ReadSummary
where
    R: AsyncRead + Unpin + Send,
    S: EventSink,
{
    let _finish = FinishGuard(state);
    let mut summary = ReadSummary::default();
    let mut chunker = Chunker::new(policy);
    let mut buf = vec![0u8; policy.read_size()];

    tracing::debug!(reader_id = %id, mode = ?policy.mode(), "Reader started");

    let termination = if sink.deliver(ReaderEvent::Started).await {
        'read: loop {
            let n = match source.read(&mut buf).await {
                Ok(0) => break Termination::EndOfStream,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!(reader_id = %id, error = %e, "Read failed, ending session");
                    break Termination::Fault(e.into());
                }
            };
            summary.bytes_read += n as u64;

            for chunk in chunker.feed(&buf[..n]) {
                let len = chunk.len() as u64;
                if !sink.deliver(ReaderEvent::Chunk(chunk)).await {
                    break 'read Termination::Detached;
                }
                summary.chunks += 1;
                summary.bytes_delivered += len;
            }
        }
    } else {
        Termination::Detached
    };

    // Unterminated trailing data is dropped, never flushed.
    summary.bytes_discarded = chunker.pending().len();
    if summary.bytes_discarded > 0 {
        tracing::debug!(
            reader_id = %id,
            discarded = summary.bytes_discarded,
            "Dropping unflushed trailing bytes"
        );
    }

    let last = match &termination {
        Termination::EndOfStream => Some(ReaderEvent::EndOfStream),
        Termination::Fault(error) => Some(ReaderEvent::Fault(error.clone())),
        Termination::Detached => None,
    };
    if let Some(event) = last {
        sink.deliver(event).await;
    }

    tracing::debug!(
        reader_id = %id,
        chunks = summary.chunks,
        bytes_read = summary.bytes_read,
        termination = ?termination,
        "Reader finished"
    );
    summary.termination = termination;
    summary
}
