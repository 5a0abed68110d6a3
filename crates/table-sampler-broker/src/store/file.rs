// crates/table-sampler-broker/src/store/file.rs
// ============================================================================
// Module: Table Sampler File Object Store
// Description: Directory-backed object store for policy and request buckets.
// Purpose: Serve storage documents from the local filesystem.
// Dependencies: table-sampler-core, std
// ============================================================================

//! ## Overview
//! [`FileObjectStore`] maps bucket `b` to the directory `<root>/b` and object
//! `p/d/t.json` to the file `<root>/b/p/d/t.json`. Listings walk the bucket
//! lazily, one directory per step, and skip symbolic links.
//! Security posture: bucket names and object paths are untrusted input;
//! `..` segments are rejected and resolved files must stay under the root.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::VecDeque;
use std::fs;
use std::fs::DirEntry;
use std::io::ErrorKind;
use std::io::Read;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use table_sampler_core::ObjectListing;
use table_sampler_core::ObjectStore;
use table_sampler_core::ObjectStoreError;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of one stored object.
pub const MAX_OBJECT_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: File Object Store
// ============================================================================

/// Object store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FileObjectStore {
    /// Directory holding one subdirectory per bucket.
    root: PathBuf,
}

impl FileObjectStore {
    /// Creates a store rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    /// Returns the store root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes an object, creating its directories.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when the path is invalid, the object is
    /// larger than [`MAX_OBJECT_BYTES`] or the write fails.
    pub fn write_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
    ) -> Result<(), ObjectStoreError> {
        if bytes.len() > MAX_OBJECT_BYTES {
            return Err(ObjectStoreError::TooLarge(format!("{bucket}/{path}")));
        }
        let file = self.object_file(bucket, path)?;
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).map_err(|err| ObjectStoreError::Io(err.to_string()))?;
        }
        fs::write(&file, bytes).map_err(|err| ObjectStoreError::Io(err.to_string()))
    }

    /// Returns the directory of a bucket.
    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf, ObjectStoreError> {
        validate_segment(bucket)
            .map_err(|detail| ObjectStoreError::Invalid(format!("bucket {bucket}: {detail}")))?;
        Ok(self.root.join(bucket))
    }

    /// Returns the file of an object.
    fn object_file(&self, bucket: &str, path: &str) -> Result<PathBuf, ObjectStoreError> {
        let mut file = self.bucket_dir(bucket)?;
        if path.starts_with('/') {
            return Err(ObjectStoreError::Invalid(format!("{path}: absolute object path")));
        }
        for segment in path.split('/') {
            validate_segment(segment)
                .map_err(|detail| ObjectStoreError::Invalid(format!("{path}: {detail}")))?;
            file.push(segment);
        }
        Ok(file)
    }

    /// Fails when `file` resolves outside the store root.
    fn ensure_within_root(&self, file: &Path) -> Result<(), ObjectStoreError> {
        let root = fs::canonicalize(&self.root).map_err(|err| ObjectStoreError::Io(err.to_string()))?;
        let resolved = fs::canonicalize(file).map_err(|err| ObjectStoreError::Io(err.to_string()))?;
        if !resolved.starts_with(&root) {
            return Err(ObjectStoreError::Invalid("object path escapes store root".to_string()));
        }
        Ok(())
    }
}

impl ObjectStore for FileObjectStore {
    fn list_objects<'a>(
        &'a self,
        bucket: &str,
        prefix: Option<&str>,
    ) -> Result<ObjectListing<'a>, ObjectStoreError> {
        let bucket_dir = self.bucket_dir(bucket)?;
        let prefix = prefix.unwrap_or_default();
        if prefix.starts_with('/') || prefix.contains('\\') || prefix.split('/').any(|s| s == "..") {
            return Err(ObjectStoreError::Invalid(format!("{prefix}: invalid listing prefix")));
        }
        let start = match prefix.rfind('/') {
            Some(end) => bucket_dir.join(&prefix[.. end]),
            None => bucket_dir.clone(),
        };
        Ok(Box::new(FileListing {
            bucket_dir,
            prefix: prefix.to_string(),
            pending_dirs: if start.is_dir() { vec![start] } else { Vec::new() },
            ready: VecDeque::new(),
        }))
    }

    fn read_object(&self, bucket: &str, path: &str) -> Result<Option<Vec<u8>>, ObjectStoreError> {
        let file_path = self.object_file(bucket, path)?;
        let file = match fs::File::open(&file_path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(ObjectStoreError::Io(err.to_string())),
        };
        let metadata = file.metadata().map_err(|err| ObjectStoreError::Io(err.to_string()))?;
        if !metadata.is_file() {
            return Ok(None);
        }
        self.ensure_within_root(&file_path)?;
        let mut limited = file.take((MAX_OBJECT_BYTES + 1) as u64);
        let mut bytes = Vec::new();
        limited.read_to_end(&mut bytes).map_err(|err| ObjectStoreError::Io(err.to_string()))?;
        if bytes.len() > MAX_OBJECT_BYTES {
            return Err(ObjectStoreError::TooLarge(format!("{bucket}/{path}")));
        }
        Ok(Some(bytes))
    }

    fn object_exists(&self, bucket: &str, path: &str) -> Result<bool, ObjectStoreError> {
        let file_path = self.object_file(bucket, path)?;
        if !file_path.is_file() {
            return Ok(false);
        }
        self.ensure_within_root(&file_path)?;
        Ok(true)
    }
}

// ============================================================================
// SECTION: Listing
// ============================================================================

/// Depth-first walk over a bucket directory.
struct FileListing {
    /// Bucket directory object keys are relative to.
    bucket_dir: PathBuf,
    /// Key prefix filter.
    prefix: String,
    /// Directories not scanned yet.
    pending_dirs: Vec<PathBuf>,
    /// Keys found but not yielded yet.
    ready: VecDeque<String>,
}

impl FileListing {
    /// Scans one directory, queueing its files and subdirectories in name order.
    fn scan(&mut self, dir: &Path) -> Result<(), ObjectStoreError> {
        let mut entries = fs::read_dir(dir)
            .and_then(|entries| entries.collect::<Result<Vec<DirEntry>, _>>())
            .map_err(|err| ObjectStoreError::Io(err.to_string()))?;
        entries.sort_by_key(DirEntry::file_name);
        let mut subdirs = Vec::new();
        for entry in entries {
            let file_type = entry.file_type().map_err(|err| ObjectStoreError::Io(err.to_string()))?;
            if file_type.is_dir() {
                subdirs.push(entry.path());
            } else if file_type.is_file() {
                let key = self.object_key(&entry.path())?;
                if key.starts_with(&self.prefix) {
                    self.ready.push_back(key);
                }
            }
        }
        self.pending_dirs.extend(subdirs.into_iter().rev());
        Ok(())
    }

    /// Converts a file path into its `/`-separated object key.
    fn object_key(&self, file: &Path) -> Result<String, ObjectStoreError> {
        let relative = file
            .strip_prefix(&self.bucket_dir)
            .map_err(|_| ObjectStoreError::Invalid("listed file outside bucket".to_string()))?;
        let mut key = String::new();
        for component in relative.components() {
            let Component::Normal(part) = component else {
                return Err(ObjectStoreError::Invalid("listed file outside bucket".to_string()));
            };
            let part = part
                .to_str()
                .ok_or_else(|| ObjectStoreError::Invalid("object name is not utf-8".to_string()))?;
            if !key.is_empty() {
                key.push('/');
            }
            key.push_str(part);
        }
        Ok(key)
    }
}

impl Iterator for FileListing {
    type Item = Result<String, ObjectStoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(key) = self.ready.pop_front() {
                return Some(Ok(key));
            }
            let dir = self.pending_dirs.pop()?;
            if let Err(err) = self.scan(&dir) {
                return Some(Err(err));
            }
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Checks one bucket name or path segment.
fn validate_segment(segment: &str) -> Result<(), &'static str> {
    if segment.is_empty() {
        return Err("empty segment");
    }
    if segment == "." || segment == ".." {
        return Err("relative segment");
    }
    if segment.contains(['/', '\\', '\0']) {
        return Err("forbidden character");
    }
    Ok(())
}
