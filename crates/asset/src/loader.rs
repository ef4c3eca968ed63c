//! Loader interface: turns an opaque asset path into decoded texture data
//! without blocking the frame loop.

use std::path::PathBuf;
use std::thread;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::BoxFuture;
use thiserror::Error;

use crate::texture::TextureData;

/// In-flight load. Resolves exactly once.
pub type LoadTask = BoxFuture<'static, Result<TextureData, AssetLoadError>>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AssetLoadError {
    #[error("failed to read asset {path}: {message}")]
    Io { path: String, message: String },
    #[error("failed to decode asset {path}: {message}")]
    Decode { path: String, message: String },
    #[error("load of asset {path} was dropped before completing")]
    Canceled { path: String },
}

/// Source of raw visual resources. No retry is built in: a failed load stays
/// failed until the caller asks again.
pub trait AssetLoader: Send + Sync {
    /// Start loading `path`. Must not block; the work happens in the returned
    /// task or on a background thread feeding it.
    fn load(&self, path: &str) -> LoadTask;
}

/// Reads and decodes image files on a worker thread per request.
#[derive(Clone, Debug, Default)]
pub struct FsAssetLoader {
    base: Option<PathBuf>,
}

impl FsAssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `base`.
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        match &self.base {
            Some(base) => base.join(path),
            None => PathBuf::from(path),
        }
    }
}

impl AssetLoader for FsAssetLoader {
    fn load(&self, path: &str) -> LoadTask {
        let full = self.full_path(path);
        let label = path.to_string();
        let (tx, rx) = oneshot::channel();

        log::info!("loading texture: {}", label);
        let worker_label = label.clone();
        let spawned = thread::Builder::new()
            .name(format!("asset-load:{label}"))
            .spawn(move || {
                let result = read_and_decode(&full, &worker_label);
                // Receiver gone means nobody waits for this texture anymore.
                let _ = tx.send(result);
            });

        if let Err(err) = spawned {
            let error = AssetLoadError::Io {
                path: label,
                message: format!("failed to spawn loader thread: {err}"),
            };
            return futures::future::ready(Err(error)).boxed();
        }

        rx.map(move |received| match received {
            Ok(result) => result,
            Err(oneshot::Canceled) => Err(AssetLoadError::Canceled { path: label }),
        })
        .boxed()
    }
}

fn read_and_decode(full: &std::path::Path, label: &str) -> Result<TextureData, AssetLoadError> {
    let bytes = std::fs::read(full).map_err(|err| AssetLoadError::Io {
        path: label.to_string(),
        message: err.to_string(),
    })?;
    let texture = TextureData::decode(&bytes).map_err(|err| AssetLoadError::Decode {
        path: label.to_string(),
        message: format!("{err:#}"),
    })?;
    log::info!(
        "finished loading texture: {} ({}x{})",
        label,
        texture.width,
        texture.height
    );
    Ok(texture)
}
