//! Persistent per-task build stamps.
//!
//! Each successful task writes `<cache_dir>/stamps/<target>-<format>.json`
//! recording the fingerprint of its inputs. One file per key means concurrent
//! child processes never write the same file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tsbuild_common::{ContentHash, TaskKey};

use crate::error::CacheError;

/// Subdirectory of the cache directory holding stamp files.
const STAMP_SUBDIR: &str = "stamps";

/// The recorded state of one successful task run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStamp {
    /// Tool version that wrote the stamp. Stamps from other versions are ignored.
    pub tool_version: String,
    /// The task this stamp belongs to.
    pub key: TaskKey,
    /// Fingerprint of all inputs.
    pub fingerprint: ContentHash,
    /// Number of input files covered by the fingerprint.
    pub inputs: usize,
    /// Every file the run wrote. The stamp only counts as fresh while all
    /// of them still exist.
    #[serde(default)]
    pub outputs: Vec<PathBuf>,
}

impl BuildStamp {
    /// Returns the recorded outputs that no longer exist.
    pub fn missing_outputs(&self) -> impl Iterator<Item = &Path> {
        self.outputs
            .iter()
            .map(PathBuf::as_path)
            .filter(|path| !path.is_file())
    }
}

/// Reads and writes build stamps under a cache directory.
#[derive(Debug, Clone)]
pub struct StampStore {
    cache_dir: PathBuf,
    tool_version: String,
}

impl StampStore {
    /// Creates a store rooted at `cache_dir` for the given tool version.
    pub fn new(cache_dir: &Path, tool_version: &str) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
            tool_version: tool_version.to_string(),
        }
    }

    /// The stamp file for `key`.
    pub fn path_for(&self, key: &TaskKey) -> PathBuf {
        self.cache_dir
            .join(STAMP_SUBDIR)
            .join(format!("{}.json", key.file_stem()))
    }

    /// Loads the stamp for `key`.
    ///
    /// Fail-safe: a missing, unreadable, malformed or foreign-version stamp
    /// is `None`.
    pub fn load(&self, key: &TaskKey) -> Option<BuildStamp> {
        let content = std::fs::read_to_string(self.path_for(key)).ok()?;
        let stamp: BuildStamp = serde_json::from_str(&content).ok()?;
        (stamp.tool_version == self.tool_version && stamp.key == *key).then_some(stamp)
    }

    /// Returns `true` if the stored stamp for `key` has this fingerprint and
    /// every output it recorded is still on disk.
    pub fn is_fresh(&self, key: &TaskKey, fingerprint: ContentHash) -> bool {
        let Some(stamp) = self.load(key) else {
            return false;
        };
        if stamp.fingerprint != fingerprint {
            return false;
        }
        let fresh = match stamp.missing_outputs().next() {
            Some(missing) => {
                tracing::debug!(%key, missing = %missing.display(), "recorded output is gone");
                false
            }
            None => true,
        };
        fresh
    }

    /// Writes the stamp for `key`, replacing any previous one.
    ///
    /// The file is written to a temporary name and renamed into place so a
    /// reader never sees a partial stamp.
    pub fn record(
        &self,
        key: &TaskKey,
        fingerprint: ContentHash,
        inputs: usize,
        outputs: Vec<PathBuf>,
    ) -> Result<BuildStamp, CacheError> {
        let stamp = BuildStamp {
            tool_version: self.tool_version.clone(),
            key: key.clone(),
            fingerprint,
            inputs,
            outputs,
        };
        let dir = self.cache_dir.join(STAMP_SUBDIR);
        std::fs::create_dir_all(&dir).map_err(|e| CacheError::Io {
            path: dir.clone(),
            source: e,
        })?;
        let json = serde_json::to_string_pretty(&stamp).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| CacheError::Io {
            path: tmp.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp, &path).map_err(|e| CacheError::Io { path, source: e })?;
        Ok(stamp)
    }

    /// Removes the stamp for `key`, if any.
    pub fn invalidate(&self, key: &TaskKey) -> Result<(), CacheError> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Io { path, source: e }),
        }
    }
}
