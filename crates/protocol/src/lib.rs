//! Shared data model for the gamedock orchestration core.
//!
//! Every crate in the workspace speaks these types: game identity and
//! installed state, lifecycle arguments, subprocess results, progress
//! snapshots, and the one-way event surface towards the UI shell.

pub mod events;
pub mod progress;
pub mod types;

pub use events::{ChannelSink, DialogType, FrontendMessage, FrontendSink, NoopSink};
pub use progress::InstallProgress;
pub use types::{
    ExecResult, GameInfo, GameStatus, HostPlatform, InstallArgs, InstallPlatform, InstalledInfo,
    Runner, SaveLocation, UpdateOverrides, ValidationError,
};
