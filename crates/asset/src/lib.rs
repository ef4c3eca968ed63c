//! Asset side of the table: raw visual resources, the card catalog and the
//! loader interface the resource cache pulls textures through.

pub mod catalog;
pub mod key;
pub mod loader;
pub mod mesh;
pub mod texture;

pub use catalog::{AssetCatalog, AssetQuality, CardDefinition, CardKind};
pub use key::{ResourceCategory, ResourceKey};
pub use loader::{AssetLoadError, AssetLoader, FsAssetLoader, LoadTask};
pub use mesh::{MeshData, MeshGroup, MeshVertex};
pub use texture::{TextureData, TextureFormat};
