//! Mock object storage.

use crate::error::{RemoteError, Result};
use crate::providers::ObjectStorage;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock object storage.
///
/// Keeps objects in memory and serves `memory://<bucket>/<name>` URLs.
/// Clones share the same objects.
#[derive(Debug, Clone)]
pub struct InMemoryObjectStorage {
    bucket: String,
    objects: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
    failing_files: Arc<Mutex<Vec<String>>>,
    fail_removals: Arc<AtomicBool>,
    put_calls: Arc<AtomicUsize>,
    remove_calls: Arc<AtomicUsize>,
    latency: Arc<Mutex<Option<Duration>>>,
}

impl InMemoryObjectStorage {
    /// Create empty storage for `bucket`.
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::new(Mutex::new(BTreeMap::new())),
            failing_files: Arc::new(Mutex::new(Vec::new())),
            fail_removals: Arc::new(AtomicBool::new(false)),
            put_calls: Arc::new(AtomicUsize::new(0)),
            remove_calls: Arc::new(AtomicUsize::new(0)),
            latency: Arc::new(Mutex::new(None)),
        }
    }

    /// Reject uploads whose object name ends with `_<file_name>`.
    pub fn fail_uploads_of(&self, file_name: impl Into<String>) {
        if let Ok(mut failing) = self.failing_files.lock() {
            failing.push(file_name.into());
        }
    }

    /// Make every removal fail (or succeed again).
    pub fn fail_removals(&self, fail: bool) {
        self.fail_removals.store(fail, Ordering::SeqCst);
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        if let Ok(mut current) = self.latency.lock() {
            *current = latency;
        }
    }

    /// Names of the stored objects, sorted.
    #[must_use]
    pub fn object_names(&self) -> Vec<String> {
        self.objects
            .lock()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of `put` calls so far.
    #[must_use]
    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    /// Number of `remove` calls so far.
    #[must_use]
    pub fn remove_calls(&self) -> usize {
        self.remove_calls.load(Ordering::SeqCst)
    }

    fn latency(&self) -> Option<Duration> {
        self.latency.lock().ok().and_then(|latency| *latency)
    }
}

impl ObjectStorage for InMemoryObjectStorage {
    fn put(
        &self,
        name: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> impl Future<Output = Result<String>> + Send {
        self.put_calls.fetch_add(1, Ordering::SeqCst);

        let objects = Arc::clone(&self.objects);
        let failing_files = Arc::clone(&self.failing_files);
        let latency = self.latency();
        let url = format!("memory://{}/{name}", self.bucket);
        let name = name.to_string();
        let bytes = bytes.to_vec();

        async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }

            let rejected = failing_files
                .lock()
                .map_err(|_| RemoteError::Internal("storage lock poisoned".into()))?
                .iter()
                .any(|file| name.ends_with(&format!("_{file}")));
            if rejected {
                return Err(RemoteError::Storage(format!("upload of {name} rejected")));
            }

            let mut objects = objects
                .lock()
                .map_err(|_| RemoteError::Internal("storage lock poisoned".into()))?;
            if objects.contains_key(&name) {
                return Err(RemoteError::Storage(format!("object {name} already exists")));
            }
            objects.insert(name, bytes);

            Ok(url)
        }
    }

    fn remove(&self, name: &str) -> impl Future<Output = Result<()>> + Send {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);

        let objects = Arc::clone(&self.objects);
        let fail = self.fail_removals.load(Ordering::SeqCst);
        let latency = self.latency();
        let name = name.to_string();

        async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }

            if fail {
                return Err(RemoteError::Storage(format!("removal of {name} rejected")));
            }

            objects
                .lock()
                .map_err(|_| RemoteError::Internal("storage lock poisoned".into()))?
                .remove(&name)
                .map(|_| ())
                .ok_or_else(|| RemoteError::NotFound(format!("object {name}")))
        }
    }
}
