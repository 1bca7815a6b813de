//! Interrupt registry.
//!
//! One entry per `(device, attribute path)` source, each owning exactly one
//! monitor thread. Entries move through
//! `Registering -> Active -> Deregistering` and are removed only after their
//! thread has been joined.
//!
//! All scan-then-mutate sequences run under the registry mutex. Joining
//! happens with the mutex released so a monitor thread that is busy
//! delivering a callback can finish.

mod lines;

pub use lines::{FileWatchLines, SimulatedLines, SysfsNotifyLines};

use crate::list::List;
use node_common::config::IrqBackend;
use node_common::consts::HAL_SERVICE_NAME;
use node_common::device::DeviceObject;
use node_common::error::LedgerError;
use parking_lot::Mutex;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// Callback run on the monitor thread when its source fires.
pub type IrqCallback = Arc<dyn Fn(&IrqSource) + Send + Sync>;

/// How the source signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqKind {
    /// Attribute file notification
    Sysfs,
    /// Numbered interrupt line (legacy GPIO)
    Line(u32),
}

/// Interrupt source: a device attribute that can fire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrqSource {
    /// Owning device
    pub obj: DeviceObject,
    /// Attribute path that fires
    pub path: PathBuf,
    /// Signal kind
    pub kind: IrqKind,
}

impl fmt::Display for IrqSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.obj, self.path.display())
    }
}

/// Blocking wait on one source's signal.
pub trait SignalLine: Send {
    /// Wait up to `timeout`. `Ok(true)` when the source fired.
    fn wait(&mut self, timeout: Duration) -> io::Result<bool>;
}

/// Factory of signal lines.
pub trait SignalLines: Send + Sync {
    /// Open the line for `source`.
    fn open(&self, source: &IrqSource) -> io::Result<Box<dyn SignalLine>>;
}

/// Signal-line factory for a configured backend.
pub fn lines_for(backend: IrqBackend) -> Arc<dyn SignalLines> {
    match backend {
        IrqBackend::SysfsNotify => Arc::new(SysfsNotifyLines),
        IrqBackend::FileWatch => Arc::new(FileWatchLines),
        IrqBackend::Simulated => Arc::new(SimulatedLines::new()),
    }
}

/// Outcome of a successful `register`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// A new monitor thread was started.
    Started,
    /// The source already had an entry; nothing was started.
    AlreadyRegistered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryState {
    Registering,
    Active,
    Deregistering,
}

struct Monitor {
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

struct IrqEntry {
    source: IrqSource,
    callback: IrqCallback,
    state: EntryState,
    monitor: Option<Monitor>,
}

impl IrqEntry {
    fn probe(source: &IrqSource) -> Self {
        Self {
            source: source.clone(),
            callback: Arc::new(|_: &IrqSource| {}),
            state: EntryState::Registering,
            monitor: None,
        }
    }
}

fn same_source(a: &IrqEntry, b: &IrqEntry) -> bool {
    a.source.obj == b.source.obj && a.source.path == b.source.path
}

struct Inner {
    entries: Mutex<List<IrqEntry>>,
    lines: Arc<dyn SignalLines>,
    poll: Duration,
}

/// Directory of interrupt sources and their monitor threads.
///
/// Cloning shares the registry.
#[derive(Clone)]
pub struct InterruptRegistry {
    inner: Arc<Inner>,
}

impl InterruptRegistry {
    /// Create an empty registry. Monitor threads observe cancellation at
    /// least every `poll`.
    pub fn new(lines: Arc<dyn SignalLines>, poll: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(List::new(same_source)),
                lines,
                poll,
            }),
        }
    }

    /// Start monitoring `source`, invoking `callback` on every signal.
    ///
    /// Registering a source that already has an entry starts nothing and
    /// reports [`Registration::AlreadyRegistered`].
    ///
    /// # Errors
    /// `ThreadCreateFailed` if the signal line cannot be opened, the
    /// thread cannot be spawned, or the source is being deregistered.
    pub fn register(
        &self,
        source: IrqSource,
        callback: IrqCallback,
    ) -> Result<Registration, LedgerError> {
        let probe = IrqEntry::probe(&source);
        let mut entries = self.inner.entries.lock();

        if let Some(existing) = entries.find(&probe) {
            if existing.state == EntryState::Deregistering {
                return Err(LedgerError::ThreadCreateFailed(format!(
                    "{source} is being deregistered"
                )));
            }
            debug!("IRQ already registered for {}", source);
            return Ok(Registration::AlreadyRegistered);
        }

        entries.append(IrqEntry {
            source: source.clone(),
            callback: callback.clone(),
            state: EntryState::Registering,
            monitor: None,
        });

        match self.spawn_monitor(&source, callback) {
            Ok(monitor) => {
                if let Some(entry) = entries.find_mut(&probe) {
                    entry.monitor = Some(monitor);
                    entry.state = EntryState::Active;
                }
                info!("IRQ monitor started for {}", source);
                Ok(Registration::Started)
            }
            Err(e) => {
                let _ = entries.remove_matching(&probe);
                error!("Failed to start IRQ monitor for {}: {}", source, e);
                Err(LedgerError::ThreadCreateFailed(format!("{source}: {e}")))
            }
        }
    }

    fn spawn_monitor(&self, source: &IrqSource, callback: IrqCallback) -> io::Result<Monitor> {
        let line = self.inner.lines.open(source)?;
        let cancel = Arc::new(AtomicBool::new(false));
        let name = source
            .path
            .file_name()
            .map_or_else(|| "irq".to_string(), |n| n.to_string_lossy().into_owned());

        let handle = thread::Builder::new()
            .name(format!("{HAL_SERVICE_NAME}-{name}"))
            .spawn({
                let source = source.clone();
                let cancel = Arc::clone(&cancel);
                let poll = self.inner.poll;
                move || monitor_loop(source, line, callback, cancel, poll)
            })?;

        Ok(Monitor { cancel, handle })
    }

    /// Stop monitoring `source`.
    ///
    /// Blocks until the monitor thread has terminated; the entry is removed
    /// only afterwards.
    ///
    /// # Errors
    /// - `IrqNotRegistered` if the source has no entry
    /// - `ThreadCancelFailed` (retryable, entry kept) if called from the
    ///   source's own monitor thread or while another deregistration of the
    ///   same source is in progress
    pub fn deregister(&self, source: &IrqSource) -> Result<(), LedgerError> {
        let probe = IrqEntry::probe(source);

        let handle = {
            let mut entries = self.inner.entries.lock();
            let entry = entries
                .find_mut(&probe)
                .ok_or_else(|| LedgerError::IrqNotRegistered(source.to_string()))?;

            if entry.state == EntryState::Deregistering {
                return Err(LedgerError::ThreadCancelFailed(format!(
                    "{source}: deregistration already in progress"
                )));
            }
            if let Some(monitor) = &entry.monitor {
                if monitor.handle.thread().id() == thread::current().id() {
                    return Err(LedgerError::ThreadCancelFailed(format!(
                        "{source}: monitor thread cannot join itself"
                    )));
                }
            }

            entry.state = EntryState::Deregistering;
            entry.monitor.take().map(|monitor| {
                monitor.cancel.store(true, Ordering::Release);
                monitor.handle
            })
        };

        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("IRQ monitor for {} panicked", source);
            }
        }

        // A concurrent shutdown may already have dropped the entry; the
        // thread is joined either way.
        if self.inner.entries.lock().remove_matching(&probe).is_err() {
            debug!("IRQ entry for {} already released", source);
        }
        info!("IRQ monitor stopped for {}", source);
        Ok(())
    }

    /// Whether `source` has an entry.
    pub fn is_registered(&self, source: &IrqSource) -> bool {
        self.inner
            .entries
            .lock()
            .contains(&IrqEntry::probe(source))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    /// Whether the registry has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered sources in registration order.
    pub fn sources(&self) -> Vec<IrqSource> {
        self.inner
            .entries
            .lock()
            .iter()
            .map(|e| e.source.clone())
            .collect()
    }

    /// Log every entry at TRACE level.
    pub fn dump(&self) {
        let entries = self.inner.entries.lock();
        trace!("IRQ registry: {} entries", entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            trace!("  [{}] {} {:?} ({:?})", idx, entry.source, entry.state, entry.source.kind);
        }
    }

    /// Cancel and join every monitor thread, then drop all entries.
    /// Safe to call more than once.
    ///
    /// A callback may register a new source while its own monitor is being
    /// joined, so teardown repeats until a pass finds no monitor left. The
    /// entries are cleared under the same lock that observed none.
    pub fn shutdown(&self) {
        let mut joined = 0;
        loop {
            let handles: Vec<_> = {
                let mut entries = self.inner.entries.lock();
                let handles: Vec<_> = entries
                    .iter_mut()
                    .filter_map(|entry| {
                        entry.state = EntryState::Deregistering;
                        entry.monitor.take()
                    })
                    .map(|monitor| {
                        monitor.cancel.store(true, Ordering::Release);
                        monitor.handle
                    })
                    .collect();
                if handles.is_empty() {
                    entries.clear();
                    break;
                }
                handles
            };

            for handle in handles {
                if handle.join().is_err() {
                    warn!("IRQ monitor panicked during shutdown");
                }
                joined += 1;
            }
        }

        if joined > 0 {
            info!("IRQ registry shut down, {} monitor(s) joined", joined);
        }
    }
}

impl fmt::Debug for InterruptRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterruptRegistry")
            .field("entries", &self.len())
            .field("poll", &self.inner.poll)
            .finish()
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let current = thread::current().id();
        for entry in self.entries.get_mut().iter_mut() {
            if let Some(monitor) = entry.monitor.take() {
                monitor.cancel.store(true, Ordering::Release);
                // The last handle may be dropped by a monitor's own callback.
                if monitor.handle.thread().id() != current {
                    let _ = monitor.handle.join();
                }
            }
        }
    }
}

fn monitor_loop(
    source: IrqSource,
    mut line: Box<dyn SignalLine>,
    callback: IrqCallback,
    cancel: Arc<AtomicBool>,
    poll: Duration,
) {
    debug!("IRQ monitor running for {}", source);
    while !cancel.load(Ordering::Acquire) {
        match line.wait(poll) {
            Ok(true) => {
                if cancel.load(Ordering::Acquire) {
                    break;
                }
                trace!("IRQ fired: {}", source);
                (callback)(&source);
            }
            Ok(false) => {}
            Err(e) => {
                warn!("IRQ wait failed for {}: {}", source, e);
                thread::sleep(poll);
            }
        }
    }
    debug!("IRQ monitor exiting for {}", source);
}
