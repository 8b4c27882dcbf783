//! Zustack Core - Playback session orchestration for the Zustack player
//!
//! This crate configures and supervises an adaptive streaming engine and a player
//! widget; decoding, transport and rendering stay with those collaborators:
//! - Asset addressing (playlist, poster and seek sheet URLs)
//! - Seek preview grid planning
//! - Thumbnail aspect correction
//! - Quality negotiation between widget and engine
//! - Engine error recovery
//! - Session bootstrap with native playback fallback
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Zustack Core                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐                             │
//! │  │   Address    │─▶│  Seek Grid   │                             │
//! │  │   Resolver   │  │   Planner    │                             │
//! │  └──────┬───────┘  └──────┬───────┘                             │
//! │         └────────┬────────┘                                     │
//! │           ┌──────┴──────┐      ┌─────────────┐                  │
//! │           │  Playback   │◀─────│  Event Bus  │◀── engine/widget │
//! │           │  Session    │      └─────────────┘                  │
//! │           └──────┬──────┘                                       │
//! │     ┌────────────┼─────────────────┐                            │
//! │  ┌──┴───────┐ ┌──┴───────┐ ┌───────┴──────┐                     │
//! │  │ Quality  │ │ Recovery │ │  Thumbnail   │                     │
//! │  │ Bridge   │ │Supervisor│ │  Corrector   │                     │
//! │  └──────────┘ └──────────┘ └──────────────┘                     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything runs on one thread. Collaborator callbacks push events onto the
//! [`EventBus`], which hands them to the session one at a time.

pub mod address;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod quality;
pub mod recovery;
pub mod seek;
pub mod session;
pub mod thumbnail;
pub mod widget;

pub use address::{AddressResolver, AssetAddress, AssetResource, MediaUrls, PageRequest, Visibility};
pub use config::{EngineConfig, PlayerOptions, SessionConfig};
pub use engine::{EngineError, EngineEvent, ErrorCategory, Rendition, StreamingEngine};
pub use error::{Error, Result};
pub use events::{EventBus, EventHandler, SessionEvent};
pub use quality::{QualityBridge, QualityLadder, QualitySelection};
pub use recovery::{RecoveryAction, RecoveryPolicy, RecoveryState, RecoverySupervisor};
pub use seek::{SeekGridConfig, SeekGridPlanner};
pub use session::{bootstrap, PlaybackMode, PlaybackSession, Platform, SessionHandle, SessionId, SessionPhase};
pub use thumbnail::ThumbnailAspectCorrector;
pub use widget::{PlayerWidget, PreviewFrame, RenderHook, ThumbnailHeight, WidgetEvent};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log library initialization
pub fn init() {
    tracing::info!(version = VERSION, "Zustack Core initialized");
}
