//! Background find/replace over many targets.
//!
//! Each target is loaded into a buffer owned by the worker thread. Results
//! cross back over an `mpsc` channel; replaced content is handed over through
//! [`ReplacedBuffers`], whose lock is held only for an insert or a take.

use std::collections::HashMap;
use std::fs;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crate::error::{Error, Result};
use crate::log::{LogLevel, emit_log};
use crate::options::TextOptions;
use crate::search::{FindFlags, Finder};
use crate::text::{BufferId, BufferSnapshot, TextBuffer, TextRange};

/// Something to search.
#[derive(Clone, Debug)]
pub enum SearchTarget {
    /// A file read from disk.
    Path(PathBuf),
    /// A copy of an open buffer.
    Snapshot(BufferSnapshot),
}

/// What to do with each match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchMode {
    Find,
    Replace(String),
}

/// A batch request.
#[derive(Clone, Debug)]
pub struct BatchJob {
    pub pattern: String,
    pub flags: FindFlags,
    pub mode: BatchMode,
    pub targets: Vec<SearchTarget>,
    /// Options for the worker-owned buffers.
    pub options: TextOptions,
}

impl BatchJob {
    #[must_use]
    pub fn find(pattern: &str, flags: FindFlags) -> Self {
        Self {
            pattern: pattern.to_string(),
            flags,
            mode: BatchMode::Find,
            targets: Vec::new(),
            options: TextOptions::default(),
        }
    }

    #[must_use]
    pub fn replace(pattern: &str, flags: FindFlags, replacement: &str) -> Self {
        Self {
            mode: BatchMode::Replace(replacement.to_string()),
            ..Self::find(pattern, flags)
        }
    }

    /// Add a target (builder pattern).
    #[must_use]
    pub fn with_target(mut self, target: SearchTarget) -> Self {
        self.targets.push(target);
        self
    }

    /// Set buffer options (builder pattern).
    #[must_use]
    pub fn with_options(mut self, options: TextOptions) -> Self {
        self.options = options;
        self
    }
}

/// Outcome for one target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileResult {
    /// Buffer the target was loaded into. Snapshot targets keep their id.
    pub id: BufferId,
    pub path: Option<PathBuf>,
    /// Matches before any replacement.
    pub matches: Vec<TextRange>,
    pub replaced: usize,
}

/// Progress reported by a [`BatchWorker`].
#[derive(Debug)]
pub enum BatchEvent {
    File(FileResult),
    /// A path target could not be read.
    Failed { path: PathBuf, error: Error },
    /// Always the last event.
    Finished { cancelled: bool },
}

/// Replaced buffer content waiting to be picked up, keyed by buffer id.
#[derive(Clone, Debug, Default)]
pub struct ReplacedBuffers {
    inner: Arc<Mutex<HashMap<BufferId, BufferSnapshot>>>,
}

impl ReplacedBuffers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<BufferId, BufferSnapshot>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(&self, snapshot: BufferSnapshot) {
        self.lock().insert(snapshot.id, snapshot);
    }

    /// Remove and return the pending content for `id`.
    #[must_use]
    pub fn take(&self, id: BufferId) -> Option<BufferSnapshot> {
        self.lock().remove(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Handle to a running batch.
///
/// Dropping the handle cancels the batch and waits for the thread.
pub struct BatchWorker {
    cancel: Arc<AtomicBool>,
    events: Receiver<BatchEvent>,
    handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for BatchWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchWorker")
            .field("cancelled", &self.cancel.load(Ordering::Relaxed))
            .field("running", &self.handle.is_some())
            .finish()
    }
}

impl BatchWorker {
    /// Validate the pattern and start the worker thread.
    pub fn spawn(job: BatchJob, replaced: ReplacedBuffers) -> Result<Self> {
        let finder = Finder::new(&job.pattern, job.flags)?;
        let (tx, rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);

        let handle = thread::Builder::new()
            .name("textcore-batch".to_string())
            .spawn(move || worker_main(job, &finder, &flag, &tx, &replaced))?;

        Ok(Self {
            cancel,
            events: rx,
            handle: Some(handle),
        })
    }

    /// Request cancellation. Takes effect before the next target.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn events(&self) -> &Receiver<BatchEvent> {
        &self.events
    }

    /// Next event if one is ready.
    #[must_use]
    pub fn try_recv(&self) -> Option<BatchEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Block for the next event. `None` once the worker is gone.
    #[must_use]
    pub fn recv(&self) -> Option<BatchEvent> {
        self.events.recv().ok()
    }

    /// Wait for the worker thread to exit.
    pub fn join(mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| Error::WorkerGone),
            None => Ok(()),
        }
    }
}

impl Drop for BatchWorker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.cancel();
            let _ = handle.join();
        }
    }
}

fn worker_main(
    job: BatchJob,
    finder: &Finder,
    cancel: &AtomicBool,
    tx: &Sender<BatchEvent>,
    replaced: &ReplacedBuffers,
) {
    let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
        worker_inner(job, finder, cancel, tx, replaced);
    }));

    if let Err(payload) = result {
        emit_log(
            LogLevel::Error,
            &format!("batch worker panicked: {}", panic_message(payload.as_ref())),
        );
        let _ = tx.send(BatchEvent::Finished { cancelled: true });
        std::panic::resume_unwind(payload);
    }
}

fn worker_inner(
    job: BatchJob,
    finder: &Finder,
    cancel: &AtomicBool,
    tx: &Sender<BatchEvent>,
    replaced: &ReplacedBuffers,
) {
    emit_log(
        LogLevel::Info,
        &format!(
            "batch worker started: {} targets, pattern {:?}",
            job.targets.len(),
            finder.pattern()
        ),
    );

    let mut cancelled = false;
    for target in job.targets {
        if cancel.load(Ordering::Relaxed) {
            cancelled = true;
            break;
        }

        let event = match load(target, &job.options) {
            Ok((path, mut buffer)) => {
                let result = process(finder, &job.mode, &mut buffer, path);
                if result.replaced > 0 {
                    replaced.insert(buffer.snapshot());
                }
                BatchEvent::File(result)
            }
            Err((path, error)) => {
                emit_log(
                    LogLevel::Warn,
                    &format!("batch worker: cannot read {}: {error}", path.display()),
                );
                BatchEvent::Failed { path, error }
            }
        };

        if tx.send(event).is_err() {
            emit_log(LogLevel::Debug, "batch worker: receiver dropped");
            return;
        }
    }

    if cancelled {
        emit_log(LogLevel::Info, "batch worker cancelled");
    } else {
        emit_log(LogLevel::Info, "batch worker finished");
    }
    let _ = tx.send(BatchEvent::Finished { cancelled });
}

type Loaded = (Option<PathBuf>, TextBuffer);

fn load(
    target: SearchTarget,
    options: &TextOptions,
) -> std::result::Result<Loaded, (PathBuf, Error)> {
    match target {
        SearchTarget::Path(path) => match fs::read_to_string(&path) {
            Ok(text) => {
                let buffer = TextBuffer::from_text(&text, options.clone());
                Ok((Some(path), buffer))
            }
            Err(e) => Err((path, e.into())),
        },
        SearchTarget::Snapshot(snapshot) => {
            Ok((None, TextBuffer::from_snapshot(snapshot, options.clone())))
        }
    }
}

fn process(
    finder: &Finder,
    mode: &BatchMode,
    buffer: &mut TextBuffer,
    path: Option<PathBuf>,
) -> FileResult {
    let matches = finder.find_all(buffer);
    let replaced = match mode {
        BatchMode::Find => 0,
        BatchMode::Replace(with) if !matches.is_empty() => finder.replace_all(buffer, with),
        BatchMode::Replace(_) => 0,
    };
    FileResult {
        id: buffer.id(),
        path,
        matches,
        replaced,
    }
}

/// Extract a message from a panic payload.
fn panic_message(payload: &dyn std::any::Any) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "batch worker panicked".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(text: &str) -> BufferSnapshot {
        TextBuffer::from_text(text, TextOptions::default()).snapshot()
    }

    fn drain(worker: &BatchWorker) -> Vec<BatchEvent> {
        let mut events = Vec::new();
        while let Some(event) = worker.recv() {
            let last = matches!(event, BatchEvent::Finished { .. });
            events.push(event);
            if last {
                break;
            }
        }
        events
    }

    #[test]
    fn test_find_over_snapshots() {
        let a = snapshot("one two\ntwo");
        let b = snapshot("three");
        let job = BatchJob::find("two", FindFlags::empty())
            .with_target(SearchTarget::Snapshot(a.clone()))
            .with_target(SearchTarget::Snapshot(b));
        let replaced = ReplacedBuffers::new();
        let worker = BatchWorker::spawn(job, replaced.clone()).unwrap();

        let events = drain(&worker);
        assert_eq!(events.len(), 3);
        let BatchEvent::File(first) = &events[0] else {
            panic!("expected a file event");
        };
        assert_eq!(first.id, a.id);
        assert_eq!(first.matches.len(), 2);
        assert_eq!(first.replaced, 0);
        assert!(matches!(events[2], BatchEvent::Finished { cancelled: false }));
        assert!(replaced.is_empty());
        worker.join().unwrap();
    }

    #[test]
    fn test_replace_hands_back_snapshot() {
        let a = snapshot("x = 1\ny = x");
        let id = a.id;
        let job = BatchJob::replace("x", FindFlags::WHOLE_WORD, "z")
            .with_target(SearchTarget::Snapshot(a));
        let replaced = ReplacedBuffers::new();
        let worker = BatchWorker::spawn(job, replaced.clone()).unwrap();
        let _ = drain(&worker);
        worker.join().unwrap();

        let out = replaced.take(id).unwrap();
        assert_eq!(out.lines, vec!["z = 1".to_string(), "y = z".to_string()]);
        assert!(replaced.take(id).is_none());
    }

    #[test]
    fn test_invalid_pattern_fails_spawn() {
        let job = BatchJob::find("(", FindFlags::USE_REGEX);
        assert!(matches!(
            BatchWorker::spawn(job, ReplacedBuffers::new()),
            Err(Error::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_missing_file_reports_failure() {
        let job = BatchJob::find("a", FindFlags::empty())
            .with_target(SearchTarget::Path(PathBuf::from("/nonexistent/textcore/file")));
        let worker = BatchWorker::spawn(job, ReplacedBuffers::new()).unwrap();
        let events = drain(&worker);
        assert!(matches!(
            &events[0],
            BatchEvent::Failed { error: Error::Io(_), .. }
        ));
        assert!(matches!(events[1], BatchEvent::Finished { cancelled: false }));
    }

    #[test]
    fn test_cancel_stops_between_targets() {
        let mut job = BatchJob::find("a", FindFlags::empty());
        for _ in 0..200 {
            job = job.with_target(SearchTarget::Snapshot(snapshot("a a a")));
        }
        let worker = BatchWorker::spawn(job, ReplacedBuffers::new()).unwrap();
        worker.cancel();
        assert!(worker.is_cancelled());

        let events = drain(&worker);
        let files = events.len() - 1;
        match events.last() {
            Some(BatchEvent::Finished { cancelled: true }) => assert!(files < 200),
            Some(BatchEvent::Finished { cancelled: false }) => assert_eq!(files, 200),
            other => panic!("unexpected last event: {other:?}"),
        }
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&String::from("bang")), "bang");
        assert_eq!(panic_message(&42_u8), "batch worker panicked");
    }
}
