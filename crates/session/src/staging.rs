//! Filesystem-backed installer backend
//!
//! Each session is a directory under the staging root. The artifact stream
//! is written into it and synced; commit leaves a `commit.json` receipt that
//! an installer daemon picks up, abandon removes the directory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sideload_errors::BackendError;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::backend::{
    CommitTarget, InstallerBackend, InstallerSession, SessionParams, SessionWriter,
};

pub const SESSION_FILE: &str = "session.json";
pub const COMMIT_FILE: &str = "commit.json";

/// Receipt written when a staged session is committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReceipt {
    pub session_id: String,
    pub artifact: String,
    pub target: CommitTarget,
    pub committed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionManifest {
    app_id: String,
    mode: String,
    size_hint: Option<u64>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StagingInstaller {
    root: PathBuf,
}

impl StagingInstaller {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read the receipt of a committed session
    ///
    /// # Errors
    ///
    /// Returns an error if the session was never committed or the receipt is
    /// unreadable.
    pub fn receipt(&self, session_id: &str) -> sideload_errors::Result<CommitReceipt> {
        let path = self.root.join(session_id).join(COMMIT_FILE);
        let contents =
            fs::read_to_string(&path).map_err(|e| sideload_errors::Error::io_with_path(&e, &path))?;
        Ok(serde_json::from_str(&contents)?)
    }
}

impl InstallerBackend for StagingInstaller {
    fn create_session(
        &self,
        params: &SessionParams,
    ) -> Result<Box<dyn InstallerSession>, BackendError> {
        let id = Uuid::new_v4().simple().to_string();
        let dir = self.root.join(&id);
        let manifest = SessionManifest {
            app_id: params.app_id.clone(),
            mode: params.mode.to_string(),
            size_hint: params.size_hint,
            created_at: Utc::now(),
        };

        let create = || -> io::Result<()> {
            fs::create_dir_all(&dir)?;
            let json = serde_json::to_vec_pretty(&manifest).map_err(io::Error::other)?;
            fs::write(dir.join(SESSION_FILE), json)
        };
        create().map_err(|e| BackendError::SessionCreateFailed {
            message: format!("{}: {e}", dir.display()),
        })?;

        debug!(session_id = %id, dir = %dir.display(), "staging session created");
        Ok(Box::new(StagingSession {
            id,
            dir,
            artifact: None,
        }))
    }
}

struct StagingSession {
    id: String,
    dir: PathBuf,
    artifact: Option<String>,
}

impl StagingSession {
    fn write_receipt(&self, target: &CommitTarget) -> Result<(), String> {
        let Some(artifact) = self.artifact.clone() else {
            return Err("nothing was written to the session".to_string());
        };
        let receipt = CommitReceipt {
            session_id: self.id.clone(),
            artifact,
            target: target.clone(),
            committed_at: Utc::now(),
        };
        let json = serde_json::to_vec_pretty(&receipt).map_err(|e| e.to_string())?;
        fs::write(self.dir.join(COMMIT_FILE), json).map_err(|e| e.to_string())
    }
}

impl InstallerSession for StagingSession {
    fn id(&self) -> &str {
        &self.id
    }

    fn open_write(&mut self, name: &str, length: u64) -> io::Result<Box<dyn SessionWriter + '_>> {
        if name.is_empty()
            || name.contains(['/', '\\'])
            || name == SESSION_FILE
            || name == COMMIT_FILE
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid stream name: {name:?}"),
            ));
        }
        let file = File::create(self.dir.join(name))?;
        self.artifact = Some(name.to_string());
        Ok(Box::new(SizedWriter {
            file,
            remaining: length,
        }))
    }

    fn commit(self: Box<Self>, target: &CommitTarget) -> Result<(), BackendError> {
        match self.write_receipt(target) {
            Ok(()) => {
                debug!(session_id = %self.id, token = %target.token, "staging session committed");
                Ok(())
            }
            Err(message) => {
                let session_id = self.id.clone();
                self.abandon();
                Err(BackendError::CommitFailed {
                    session_id,
                    message,
                })
            }
        }
    }

    fn abandon(self: Box<Self>) {
        if let Err(e) = fs::remove_dir_all(&self.dir) {
            warn!(session_id = %self.id, error = %e, "failed to remove abandoned session");
        }
    }
}

/// File writer that refuses to go past the declared length
struct SizedWriter {
    file: File,
    remaining: u64,
}

impl Write for SizedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.len() as u64 > self.remaining {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "write exceeds declared session length",
            ));
        }
        let written = self.file.write(buf)?;
        self.remaining -= written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl SessionWriter for SizedWriter {
    fn sync(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.sync_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sideload_types::{CorrelationToken, InstallMode};
    use tempfile::tempdir;

    fn params() -> SessionParams {
        SessionParams {
            mode: InstallMode::Full,
            app_id: "org.example.app".into(),
            size_hint: Some(4),
        }
    }

    #[test]
    fn test_commit_writes_receipt() {
        let temp = tempdir().unwrap();
        let installer = StagingInstaller::new(temp.path());
        let mut session = installer.create_session(&params()).unwrap();
        let id = session.id().to_string();

        {
            let mut writer = session.open_write("update", 4).unwrap();
            writer.write_all(b"abcd").unwrap();
            writer.sync().unwrap();
        }

        let target = CommitTarget {
            action: "org.example.app.INSTALL_COMPLETE".into(),
            package: "org.example.app".into(),
            token: CorrelationToken::new(),
        };
        session.commit(&target).unwrap();

        let receipt = installer.receipt(&id).unwrap();
        assert_eq!(receipt.target, target);
        assert_eq!(receipt.artifact, "update");
        assert_eq!(fs::read(temp.path().join(&id).join("update")).unwrap(), b"abcd");
    }

    #[test]
    fn test_writer_rejects_overflow() {
        let temp = tempdir().unwrap();
        let installer = StagingInstaller::new(temp.path());
        let mut session = installer.create_session(&params()).unwrap();
        let mut writer = session.open_write("update", 2).unwrap();
        let err = writer.write_all(b"abc").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_abandon_removes_session_dir() {
        let temp = tempdir().unwrap();
        let installer = StagingInstaller::new(temp.path());
        let session = installer.create_session(&params()).unwrap();
        let dir = temp.path().join(session.id());
        assert!(dir.exists());
        session.abandon();
        assert!(!dir.exists());
    }

    #[test]
    fn test_commit_without_stream_fails() {
        let temp = tempdir().unwrap();
        let installer = StagingInstaller::new(temp.path());
        let session = installer.create_session(&params()).unwrap();
        let target = CommitTarget {
            action: "a".into(),
            package: "b".into(),
            token: CorrelationToken::new(),
        };
        let dir = temp.path().join(session.id());
        assert!(matches!(
            session.commit(&target),
            Err(BackendError::CommitFailed { .. })
        ));
        assert!(!dir.exists());
    }

    #[test]
    fn test_failed_receipt_write_removes_session_dir() {
        let temp = tempdir().unwrap();
        let installer = StagingInstaller::new(temp.path());
        let mut session = installer.create_session(&params()).unwrap();
        let dir = temp.path().join(session.id());
        {
            let mut writer = session.open_write("update", 4).unwrap();
            writer.write_all(b"abcd").unwrap();
            writer.sync().unwrap();
        }
        // A directory in the receipt's place makes the write fail.
        fs::create_dir(dir.join(COMMIT_FILE)).unwrap();

        let target = CommitTarget {
            action: "a".into(),
            package: "b".into(),
            token: CorrelationToken::new(),
        };
        assert!(matches!(
            session.commit(&target),
            Err(BackendError::CommitFailed { .. })
        ));
        assert!(!dir.exists());
    }

    #[test]
    fn test_stream_name_cannot_escape_session() {
        let temp = tempdir().unwrap();
        let installer = StagingInstaller::new(temp.path());
        let mut session = installer.create_session(&params()).unwrap();
        assert!(session.open_write("../evil", 1).is_err());
        assert!(session.open_write(COMMIT_FILE, 1).is_err());
    }
}
