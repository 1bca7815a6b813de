//! Signal-wait backends for monitor threads.
//!
//! Every `wait` returns within its timeout so the monitor loop can observe
//! cancellation at each boundary.

use super::{IrqSource, SignalLine, SignalLines};
use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::os::fd::AsFd;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

// ─── sysfs_notify ───────────────────────────────────────────────────

/// `poll(2)` for `POLLPRI` on sysfs attributes.
///
/// The kernel wakes pollers with `sysfs_notify()`; the attribute must be
/// read once before polling and re-read after each wake to re-arm.
#[derive(Debug, Default, Clone, Copy)]
pub struct SysfsNotifyLines;

struct SysfsNotifyLine {
    file: File,
    scratch: String,
}

impl SysfsNotifyLine {
    fn rearm(&mut self) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        self.scratch.clear();
        self.file.read_to_string(&mut self.scratch)?;
        Ok(())
    }
}

impl SignalLines for SysfsNotifyLines {
    fn open(&self, source: &IrqSource) -> io::Result<Box<dyn SignalLine>> {
        let mut line = SysfsNotifyLine {
            file: File::open(&source.path)?,
            scratch: String::new(),
        };
        line.rearm()?;
        Ok(Box::new(line))
    }
}

impl SignalLine for SysfsNotifyLine {
    fn wait(&mut self, timeout: Duration) -> io::Result<bool> {
        let ms = u16::try_from(timeout.as_millis()).unwrap_or(u16::MAX);
        let ready = {
            let mut fds = [PollFd::new(
                self.file.as_fd(),
                PollFlags::POLLPRI | PollFlags::POLLERR,
            )];
            poll(&mut fds, PollTimeout::from(ms))
        };
        match ready {
            Ok(0) | Err(Errno::EINTR) => Ok(false),
            Ok(_) => {
                self.rearm()?;
                Ok(true)
            }
            Err(errno) => Err(io::Error::from(errno)),
        }
    }
}

// ─── File watch ─────────────────────────────────────────────────────

/// File-change watch for attributes backed by regular files.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileWatchLines;

struct FileWatchLine {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
}

impl SignalLines for FileWatchLines {
    fn open(&self, source: &IrqSource) -> io::Result<Box<dyn SignalLine>> {
        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.send(res);
        })
        .map_err(io::Error::other)?;
        watcher
            .watch(&source.path, RecursiveMode::NonRecursive)
            .map_err(io::Error::other)?;
        Ok(Box::new(FileWatchLine {
            _watcher: watcher,
            rx,
        }))
    }
}

fn is_change(event: &Event) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
}

impl SignalLine for FileWatchLine {
    fn wait(&mut self, timeout: Duration) -> io::Result<bool> {
        let first = match self.rx.recv_timeout(timeout) {
            Ok(res) => res.map_err(io::Error::other)?,
            Err(RecvTimeoutError::Timeout) => return Ok(false),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "file watcher stopped",
                ));
            }
        };
        // One write may produce several events; coalesce what is queued.
        let mut changed = is_change(&first);
        while let Ok(res) = self.rx.try_recv() {
            changed |= res.is_ok_and(|event| is_change(&event));
        }
        Ok(changed)
    }
}

// ─── Simulated ──────────────────────────────────────────────────────

/// In-process lines triggered by path.
#[derive(Debug, Default)]
pub struct SimulatedLines {
    waiters: Mutex<HashMap<PathBuf, Vec<Sender<()>>>>,
    opened: AtomicUsize,
}

struct SimulatedLine {
    rx: Receiver<()>,
}

impl SimulatedLines {
    /// Create a set with no open lines.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal every open line on `path`. Returns how many were signalled.
    pub fn trigger(&self, path: &Path) -> usize {
        let mut waiters = self.waiters.lock();
        let Some(senders) = waiters.get_mut(path) else {
            return 0;
        };
        senders.retain(|tx| tx.send(()).is_ok());
        senders.len()
    }

    /// Number of lines opened so far.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl SignalLines for SimulatedLines {
    fn open(&self, source: &IrqSource) -> io::Result<Box<dyn SignalLine>> {
        let (tx, rx) = mpsc::channel();
        self.waiters
            .lock()
            .entry(source.path.clone())
            .or_default()
            .push(tx);
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SimulatedLine { rx }))
    }
}

impl SignalLine for SimulatedLine {
    fn wait(&mut self, timeout: Duration) -> io::Result<bool> {
        match self.rx.recv_timeout(timeout) {
            Ok(()) => Ok(true),
            Err(RecvTimeoutError::Timeout) => Ok(false),
            Err(RecvTimeoutError::Disconnected) => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "simulated line closed",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::irq::IrqKind;
    use node_common::device::{DeviceObject, DeviceType};
    use tempfile::tempdir;

    fn source(path: &Path) -> IrqSource {
        IrqSource {
            obj: DeviceObject::new("ComV1", "TMP464", "PA", DeviceType::Temperature),
            path: path.to_path_buf(),
            kind: IrqKind::Sysfs,
        }
    }

    #[test]
    fn test_simulated_trigger_wakes_line() {
        let lines = SimulatedLines::new();
        let path = Path::new("/sim/temp1_max_alarm");
        let mut line = lines.open(&source(path)).unwrap();
        assert_eq!(lines.opened(), 1);

        assert!(!line.wait(Duration::from_millis(1)).unwrap());
        assert_eq!(lines.trigger(path), 1);
        assert!(line.wait(Duration::from_millis(100)).unwrap());
        assert_eq!(lines.trigger(Path::new("/sim/other")), 0);
    }

    #[test]
    fn test_simulated_prunes_dropped_lines() {
        let lines = SimulatedLines::new();
        let path = Path::new("/sim/temp1_max_alarm");
        let line = lines.open(&source(path)).unwrap();
        drop(line);
        assert_eq!(lines.trigger(path), 0);
    }

    #[test]
    fn test_simulated_line_reports_closed_set() {
        let lines = SimulatedLines::new();
        let mut line = lines.open(&source(Path::new("/sim/a"))).unwrap();
        drop(lines);
        assert!(line.wait(Duration::from_millis(1)).is_err());
    }

    #[test]
    fn test_sysfs_notify_regular_file_times_out() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("temp1_max_alarm");
        std::fs::write(&path, "0\n").unwrap();

        let mut line = SysfsNotifyLines.open(&source(&path)).unwrap();
        // Regular files never raise POLLPRI.
        assert!(!line.wait(Duration::from_millis(10)).unwrap());
    }

    #[test]
    fn test_sysfs_notify_missing_file() {
        let dir = tempdir().unwrap();
        let err = SysfsNotifyLines
            .open(&source(&dir.path().join("missing")))
            .err()
            .unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
