//! Streaming engine collaborator
//!
//! The engine (hls.js in the browser) owns manifest parsing, segment transport and
//! decoding. The session only configures it, calls into it, and reacts to the
//! events it reports.

use serde::{Deserialize, Serialize};

/// One quality variant of the media as reported by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendition {
    /// Vertical resolution in pixels
    pub height: u32,
    #[serde(default)]
    pub width: u32,
    /// Bandwidth in bits per second
    #[serde(default)]
    pub bitrate: u64,
}

impl Rendition {
    pub fn with_height(height: u32) -> Self {
        Self {
            height,
            width: 0,
            bitrate: 0,
        }
    }
}

/// Category of an engine error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Manifest or segment transport failure
    Network,
    /// Decoding or buffer append failure
    Media,
    /// Anything else (key system, muxing, internal)
    Other,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Network => write!(f, "network"),
            ErrorCategory::Media => write!(f, "media"),
            ErrorCategory::Other => write!(f, "other"),
        }
    }
}

/// Error reported by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    pub fatal: bool,
    pub category: ErrorCategory,
    /// Engine-specific detail code, for logs only
    pub details: String,
}

impl EngineError {
    pub fn fatal(category: ErrorCategory, details: impl Into<String>) -> Self {
        Self {
            fatal: true,
            category,
            details: details.into(),
        }
    }

    pub fn non_fatal(category: ErrorCategory, details: impl Into<String>) -> Self {
        Self {
            fatal: false,
            category,
            details: details.into(),
        }
    }
}

/// Events reported by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    MediaAttached,
    ManifestParsed { renditions: Vec<Rendition> },
    Error(EngineError),
    /// A fragment made it into the media buffer
    FragmentBuffered,
}

impl EngineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::MediaAttached => "media_attached",
            EngineEvent::ManifestParsed { .. } => "manifest_parsed",
            EngineEvent::Error(_) => "error",
            EngineEvent::FragmentBuffered => "fragment_buffered",
        }
    }
}

/// Calls the session makes into the engine. All of them are fire-and-forget;
/// outcomes arrive later as [`EngineEvent`]s.
pub trait StreamingEngine {
    /// Attach the engine to the media surface
    fn attach_media(&mut self);

    /// Start loading a master playlist
    fn load_source(&mut self, url: &url::Url);

    /// Renditions of the parsed manifest, in engine order
    fn renditions(&self) -> Vec<Rendition>;

    /// Index of the actively requested rendition, `None` while in automatic mode
    fn active_rendition(&self) -> Option<usize>;

    fn set_active_rendition(&mut self, index: usize);

    /// Restart loading the current source
    fn start_load(&mut self);

    /// Reset the decoding pipeline without reloading the source
    fn recover_media_error(&mut self);

    /// Dispose of the engine. No other call is made afterwards.
    fn destroy(&mut self);
}
