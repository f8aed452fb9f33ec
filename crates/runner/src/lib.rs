//! Lifecycle workflow contract shared by all storefront backends.
//!
//! Each backend implements [`GameManager`] on top of the same
//! collaborators: the command builders it owns, the process supervisor,
//! the progress parser, and the durable stores. The out-of-scope services
//! (credentials, config, shortcuts, disk usage, connectivity, post-install
//! setup) are narrow trait contracts injected through [`StoreContext`].

pub mod cleanup;
pub mod context;
pub mod error;
pub mod manager;
pub mod moves;
pub mod types;

pub use context::{
    ConfigProvider, Credentials, CredentialsProvider, DiskUsage, InstallMetadata,
    MetadataProvider, OnlineMonitor, SetupService, ShortcutService, StoreContext, StorePaths,
};
pub use error::GameError;
pub use manager::GameManager;
pub use types::{InstallResult, InstallStatus, RemoveArgs};
