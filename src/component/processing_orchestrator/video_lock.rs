use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError, TryLockError};

// One mutex per video output directory, shared by every orchestrator in the process
static VIDEO_LOCKS: LazyLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Lock handle for one video's output directory.
pub struct VideoLock {
    mutex: Arc<Mutex<()>>,
}

impl VideoLock {
    #[must_use]
    pub fn for_directory(video_dir: &Path) -> Self {
        let mut registry = VIDEO_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
        let mutex = registry
            .entry(video_dir.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        Self { mutex }
    }

    /// `None` when another run currently holds this video.
    pub fn try_acquire(&self) -> Option<MutexGuard<'_, ()>> {
        match self.mutex.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }
}
