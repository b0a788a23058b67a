//! In-memory installer backend
//!
//! Keeps every session's bytes in memory and records what happened to them.
//! Used for dry runs of the host shim and throughout the tests. Clones share
//! the same record, so a clone can be inspected after the original has been
//! moved into a coordinator.

use sideload_errors::BackendError;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::backend::{
    CommitTarget, InstallerBackend, InstallerSession, SessionParams, SessionWriter,
};

/// Step at which the backend should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Create,
    OpenWrite,
    Write,
    Sync,
    Commit,
}

/// A session that reached the installer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedSession {
    pub session_id: String,
    pub params: SessionParams,
    pub stream_name: String,
    pub declared_length: u64,
    pub bytes: Vec<u8>,
    pub synced: bool,
    pub target: CommitTarget,
}

#[derive(Debug, Default)]
struct Record {
    created: usize,
    abandoned: Vec<String>,
    committed: Vec<CommittedSession>,
    fail_at: Option<FailPoint>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryInstaller {
    record: Arc<Mutex<Record>>,
}

impl MemoryInstaller {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent session fail at `point`
    #[must_use]
    pub fn failing_at(self, point: FailPoint) -> Self {
        self.record().fail_at = Some(point);
        self
    }

    fn record(&self) -> MutexGuard<'_, Record> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn sessions_created(&self) -> usize {
        self.record().created
    }

    #[must_use]
    pub fn abandoned(&self) -> Vec<String> {
        self.record().abandoned.clone()
    }

    #[must_use]
    pub fn committed(&self) -> Vec<CommittedSession> {
        self.record().committed.clone()
    }

    #[must_use]
    pub fn last_commit(&self) -> Option<CommittedSession> {
        self.record().committed.last().cloned()
    }
}

impl InstallerBackend for MemoryInstaller {
    fn create_session(
        &self,
        params: &SessionParams,
    ) -> Result<Box<dyn InstallerSession>, BackendError> {
        let mut record = self.record();
        if record.fail_at == Some(FailPoint::Create) {
            return Err(BackendError::SessionCreateFailed {
                message: "injected failure".to_string(),
            });
        }
        record.created += 1;
        Ok(Box::new(MemorySession {
            id: format!("mem-{}", record.created),
            params: params.clone(),
            fail_at: record.fail_at,
            stream: None,
            record: Arc::clone(&self.record),
        }))
    }
}

#[derive(Debug, Default)]
struct Stream {
    name: String,
    declared_length: u64,
    bytes: Vec<u8>,
    synced: bool,
}

struct MemorySession {
    id: String,
    params: SessionParams,
    fail_at: Option<FailPoint>,
    stream: Option<Stream>,
    record: Arc<Mutex<Record>>,
}

impl InstallerSession for MemorySession {
    fn id(&self) -> &str {
        &self.id
    }

    fn open_write(&mut self, name: &str, length: u64) -> io::Result<Box<dyn SessionWriter + '_>> {
        if self.fail_at == Some(FailPoint::OpenWrite) {
            return Err(io::Error::other("injected open failure"));
        }
        let fail_at = self.fail_at;
        let stream = self.stream.insert(Stream {
            name: name.to_string(),
            declared_length: length,
            ..Stream::default()
        });
        Ok(Box::new(MemoryWriter { stream, fail_at }))
    }

    fn commit(self: Box<Self>, target: &CommitTarget) -> Result<(), BackendError> {
        if self.fail_at == Some(FailPoint::Commit) {
            let session_id = self.id.clone();
            self.abandon();
            return Err(BackendError::CommitFailed {
                session_id,
                message: "injected failure".to_string(),
            });
        }
        let MemorySession {
            id,
            params,
            stream,
            record,
            ..
        } = *self;
        let stream = stream.unwrap_or_default();
        record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .committed
            .push(CommittedSession {
                session_id: id,
                params,
                stream_name: stream.name,
                declared_length: stream.declared_length,
                bytes: stream.bytes,
                synced: stream.synced,
                target: target.clone(),
            });
        Ok(())
    }

    fn abandon(self: Box<Self>) {
        let MemorySession { id, record, .. } = *self;
        record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .abandoned
            .push(id);
    }
}

struct MemoryWriter<'a> {
    stream: &'a mut Stream,
    fail_at: Option<FailPoint>,
}

impl Write for MemoryWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_at == Some(FailPoint::Write) {
            return Err(io::Error::other("injected write failure"));
        }
        self.stream.bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SessionWriter for MemoryWriter<'_> {
    fn sync(&mut self) -> io::Result<()> {
        if self.fail_at == Some(FailPoint::Sync) {
            return Err(io::Error::other("injected sync failure"));
        }
        self.stream.synced = true;
        Ok(())
    }
}
