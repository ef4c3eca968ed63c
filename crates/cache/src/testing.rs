//! Loader whose loads settle only when a test says so.

use std::collections::HashMap;
use std::sync::Arc;

use asset::{AssetLoadError, AssetLoader, LoadTask, TextureData};
use futures::FutureExt;
use futures::channel::oneshot;
use parking_lot::Mutex;

type Reply = oneshot::Sender<Result<TextureData, AssetLoadError>>;

#[derive(Default)]
struct ManualState {
    calls: Vec<String>,
    pending: HashMap<String, Vec<Reply>>,
}

/// Records every `load` call and parks it until `complete` or `fail` is
/// called with a matching path suffix.
#[derive(Clone, Default)]
pub struct ManualLoader {
    state: Arc<Mutex<ManualState>>,
}

impl ManualLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every path passed to `load`, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn load_count(&self, suffix: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|path| path.ends_with(suffix))
            .count()
    }

    /// Paths with at least one unsettled load.
    pub fn pending(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.state.lock().pending.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Settle matching loads with a small solid texture.
    pub fn complete(&self, suffix: &str) -> usize {
        self.settle(suffix, |_| Ok(TextureData::solid([255, 255, 255, 255])))
    }

    /// Settle matching loads with an I/O error.
    pub fn fail(&self, suffix: &str) -> usize {
        self.settle(suffix, |path| {
            Err(AssetLoadError::Io {
                path: path.to_string(),
                message: "simulated failure".to_string(),
            })
        })
    }

    pub fn complete_all(&self) -> usize {
        self.complete("")
    }

    fn settle(
        &self,
        suffix: &str,
        outcome: impl Fn(&str) -> Result<TextureData, AssetLoadError>,
    ) -> usize {
        let mut state = self.state.lock();
        let matching: Vec<String> = state
            .pending
            .keys()
            .filter(|path| path.ends_with(suffix))
            .cloned()
            .collect();

        let mut settled = 0;
        for path in matching {
            for reply in state.pending.remove(&path).unwrap_or_default() {
                if reply.send(outcome(&path)).is_ok() {
                    settled += 1;
                }
            }
        }
        settled
    }
}

impl AssetLoader for ManualLoader {
    fn load(&self, path: &str) -> LoadTask {
        let (tx, rx) = oneshot::channel();
        let mut state = self.state.lock();
        state.calls.push(path.to_string());
        state.pending.entry(path.to_string()).or_default().push(tx);

        let path = path.to_string();
        rx.map(move |received| {
            received.unwrap_or_else(|_| Err(AssetLoadError::Canceled { path }))
        })
        .boxed()
    }
}
