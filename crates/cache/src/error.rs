use asset::{AssetLoadError, ResourceKey};
use thiserror::Error;

/// Why an acquired resource never became usable.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ResourceLoadError {
    #[error(transparent)]
    Asset(#[from] AssetLoadError),
    #[error("no asset registered for {key}")]
    NotInCatalog { key: ResourceKey },
    #[error("{key} was evicted while still awaited")]
    Evicted { key: ResourceKey },
}

/// `release` called more often than `acquire` for a key. Always a bug in the
/// caller's reference accounting.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("release of {key} without a matching acquire")]
pub struct UnderflowError {
    pub key: ResourceKey,
}
