//! Playback Session - Composes one playback of one asset
//!
//! Coordinates:
//! - Environment detection (adaptive engine, native HLS, or neither)
//! - Engine setup: attach media, load the playlist, build the widget once the
//!   manifest is parsed
//! - Quality negotiation between widget and engine
//! - Engine error recovery
//! - Thumbnail aspect correction on the widget

use crate::{
    address::{AddressResolver, MediaUrls, PageRequest},
    config::{EngineConfig, PlayerOptions, SessionConfig},
    engine::{EngineEvent, StreamingEngine},
    events::{EventBus, EventHandler, SessionEvent},
    quality::{QualityBridge, QualitySelection},
    recovery::{RecoveryAction, RecoveryState, RecoverySupervisor},
    seek::SeekGridPlanner,
    thumbnail::ThumbnailAspectCorrector,
    widget::{PlayerWidget, WidgetEvent},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell};
use std::rc::Rc;
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

/// Unique identifier for a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The page environment a session runs in
pub trait Platform {
    type Engine: StreamingEngine;
    type Widget: PlayerWidget;

    /// The adaptive engine can run here
    fn engine_supported(&self) -> bool;

    /// The media surface can play HLS by itself
    fn native_playback_supported(&self) -> bool;

    fn set_poster(&mut self, url: &Url);

    /// Point the media surface straight at a playlist
    fn set_native_source(&mut self, url: &Url);

    /// Construct the engine. Its callbacks report through `events`.
    fn create_engine(&mut self, config: &EngineConfig, events: EventBus) -> Result<Self::Engine>;

    /// Construct the widget. Its callbacks report through `events`.
    fn create_widget(&mut self, options: &PlayerOptions, events: EventBus) -> Result<Self::Widget>;
}

/// How media reaches the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackMode {
    /// Through the adaptive engine
    Adaptive,
    /// The surface plays the playlist itself
    Native,
}

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Waiting for the engine to attach to the media surface
    AttachingMedia,
    /// Waiting for the manifest
    LoadingSource,
    /// Engine and widget are up
    Playing,
    /// Native playback with the widget up
    Native,
    Terminated,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::AttachingMedia => write!(f, "attaching_media"),
            SessionPhase::LoadingSource => write!(f, "loading_source"),
            SessionPhase::Playing => write!(f, "playing"),
            SessionPhase::Native => write!(f, "native"),
            SessionPhase::Terminated => write!(f, "terminated"),
        }
    }
}

/// One playback of one asset
pub struct PlaybackSession<P: Platform> {
    id: SessionId,
    platform: P,
    mode: PlaybackMode,
    phase: SessionPhase,
    urls: MediaUrls,
    options: PlayerOptions,
    engine: Option<P::Engine>,
    widget: Option<P::Widget>,
    supervisor: RecoverySupervisor,
    bridge: QualityBridge,
    corrector: ThumbnailAspectCorrector,
    events: EventBus,
}

impl<P: Platform> PlaybackSession<P> {
    /// Resolve the asset, pick a playback mode and start it
    fn start(mut platform: P, request: &PageRequest, config: SessionConfig, events: EventBus) -> Result<Self> {
        config.validate()?;

        let id = SessionId::new();
        let address = &request.address;
        let resolver = AddressResolver::new(config.asset_host.clone());
        let urls = resolver.media_urls(address)?;

        let mut options = config.player;
        let planner = SeekGridPlanner::new(resolver, options.thumbnail.width);
        options.thumbnail = planner.plan(address, request.seek_count)?;

        info!(
            session_id = %id,
            url = %urls.playback_url,
            private = address.is_private(),
            seek_sheets = options.thumbnail.tile_urls.len(),
            "Starting playback session"
        );

        platform.set_poster(&urls.poster_url);

        let mode = if platform.engine_supported() {
            PlaybackMode::Adaptive
        } else if platform.native_playback_supported() {
            PlaybackMode::Native
        } else {
            error!(session_id = %id, "HLS is not supported in this browser");
            return Err(Error::UnsupportedEnvironment);
        };

        let mut session = Self {
            id,
            platform,
            mode,
            phase: SessionPhase::AttachingMedia,
            urls,
            corrector: ThumbnailAspectCorrector::new(options.thumbnail.width),
            options,
            engine: None,
            widget: None,
            supervisor: RecoverySupervisor::new(config.recovery),
            bridge: QualityBridge::new(),
            events,
        };

        match mode {
            PlaybackMode::Adaptive => {
                let engine_config = config.engine.with_access_token(address.access_token.clone());
                let mut engine = session.platform.create_engine(&engine_config, session.events.clone())?;
                engine.attach_media();
                session.engine = Some(engine);
            }
            PlaybackMode::Native => {
                info!(session_id = %id, "Using native HLS playback");
                session.platform.set_native_source(&session.urls.playback_url);
                let widget = session.platform.create_widget(&session.options, session.events.clone())?;
                session.widget = Some(widget);
                session.phase = SessionPhase::Native;
            }
        }

        Ok(session)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn urls(&self) -> &MediaUrls {
        &self.urls
    }

    /// Widget options, including the negotiated quality ladder once known
    pub fn options(&self) -> &PlayerOptions {
        &self.options
    }

    pub fn recovery_state(&self) -> RecoveryState {
        self.supervisor.state()
    }

    pub fn engine(&self) -> Option<&P::Engine> {
        self.engine.as_ref()
    }

    pub fn widget(&self) -> Option<&P::Widget> {
        self.widget.as_ref()
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    fn set_phase(&mut self, phase: SessionPhase) {
        info!(session_id = %self.id, from = %self.phase, to = %phase, "Session phase");
        self.phase = phase;
    }

    fn handle_engine_event(&mut self, event: EngineEvent) {
        let Some(engine) = self.engine.as_mut() else {
            debug!(event = event.name(), "No engine, ignoring engine event");
            return;
        };

        match event {
            EngineEvent::MediaAttached if self.phase == SessionPhase::AttachingMedia => {
                info!(session_id = %self.id, "HLS: Media attached");
                engine.load_source(&self.urls.playback_url);
                self.set_phase(SessionPhase::LoadingSource);
            }
            EngineEvent::ManifestParsed { renditions } if self.phase == SessionPhase::LoadingSource => {
                info!(session_id = %self.id, levels = renditions.len(), "HLS: Manifest parsed");
                let ladder = self.bridge.negotiate(&self.options.quality.options, &renditions);
                self.options.apply_ladder(ladder);

                match self.platform.create_widget(&self.options, self.events.clone()) {
                    Ok(widget) => {
                        self.widget = Some(widget);
                        self.set_phase(SessionPhase::Playing);
                    }
                    Err(e) => {
                        error!(session_id = %self.id, error = %e, "Failed to create player widget");
                        engine.destroy();
                        self.terminate();
                    }
                }
            }
            EngineEvent::Error(err) => {
                if self.supervisor.handle(engine, &err) == RecoveryAction::Terminate {
                    self.terminate();
                }
            }
            EngineEvent::FragmentBuffered => self.supervisor.report_progress(),
            other => {
                warn!(event = other.name(), phase = %self.phase, "Out of order engine event, ignoring");
            }
        }
    }

    fn handle_widget_event(&mut self, event: WidgetEvent) {
        match event {
            WidgetEvent::Ready | WidgetEvent::MetadataLoaded => {
                let Some(widget) = self.widget.as_mut() else {
                    return;
                };
                if self.corrector.install(widget) {
                    debug!(session_id = %self.id, on = event.name(), "Thumbnail aspect correction installed");
                }
            }
            WidgetEvent::QualityChange(height) => {
                let Some(engine) = self.engine.as_mut() else {
                    debug!(height, "No engine, ignoring quality change");
                    return;
                };
                if self.bridge.select(engine, height) == QualitySelection::Unavailable {
                    debug!(height, "Quality unavailable");
                }
            }
        }
    }

    /// Drop the engine; the session ignores everything afterwards
    fn terminate(&mut self) {
        self.engine = None;
        self.set_phase(SessionPhase::Terminated);
    }
}

impl<P: Platform> EventHandler for PlaybackSession<P> {
    fn handle_event(&mut self, event: SessionEvent) {
        if self.phase == SessionPhase::Terminated {
            debug!(session_id = %self.id, ?event, "Session terminated, ignoring event");
            return;
        }

        match event {
            SessionEvent::Engine(event) => self.handle_engine_event(event),
            SessionEvent::Widget(event) => self.handle_widget_event(event),
        }
    }
}

/// Shared handle to a running session
pub struct SessionHandle<P: Platform> {
    session: Rc<RefCell<PlaybackSession<P>>>,
    events: EventBus,
}

impl<P: Platform> SessionHandle<P> {
    /// Bus the session listens on
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Deliver an event to the session
    pub fn dispatch(&self, event: impl Into<SessionEvent>) {
        self.events.emit(event);
    }

    /// Borrow the session. Panics if called from inside an event callback.
    pub fn session(&self) -> Ref<'_, PlaybackSession<P>> {
        self.session.borrow()
    }

    pub fn phase(&self) -> SessionPhase {
        self.session.borrow().phase()
    }
}

impl<P: Platform> Clone for SessionHandle<P> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            events: self.events.clone(),
        }
    }
}

/// Start a playback session for a page request
pub fn bootstrap<P: Platform + 'static>(
    platform: P,
    request: &PageRequest,
    config: SessionConfig,
) -> Result<SessionHandle<P>> {
    let events = EventBus::new();
    let session = PlaybackSession::start(platform, request, config, events.clone())?;

    let session = Rc::new(RefCell::new(session));
    let handler: Rc<RefCell<dyn EventHandler>> = session.clone();
    events.bind(Rc::downgrade(&handler));
    events.drain();

    Ok(SessionHandle { session, events })
}
