//! Browser platform: the page's `<video>` element plus hls.js and Plyr

use crate::hls::{describe, hls_supported, HlsEngine};
use crate::plyr::PlyrWidget;
use tracing::{debug, warn};
use url::Url;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlVideoElement};
use zustack_core::{EngineConfig, Error, EventBus, Platform, PlayerOptions, Result, SessionConfig};

/// Selector of the media surface
pub const PLAYER_SELECTOR: &str = "#player";

/// Attribute carrying JSON session overrides
pub const CONFIG_ATTRIBUTE: &str = "data-config";

const HLS_MIME_TYPE: &str = "application/vnd.apple.mpegurl";

pub struct BrowserPlatform {
    video: HtmlVideoElement,
}

impl BrowserPlatform {
    pub fn new(video: HtmlVideoElement) -> Self {
        Self { video }
    }

    /// Locate the media surface in `document`
    pub fn from_document(document: &Document, selector: &str) -> Result<Self> {
        let element = document
            .query_selector(selector)
            .map_err(|e| Error::Internal(describe(&e)))?
            .ok_or_else(|| Error::Internal(format!("no element matches {}", selector)))?;

        let video = element
            .dyn_into::<HtmlVideoElement>()
            .map_err(|_| Error::Internal(format!("{} is not a <video> element", selector)))?;

        Ok(Self::new(video))
    }

    /// Session config from the surface's `data-config` attribute, or defaults
    pub fn session_config(&self) -> Result<SessionConfig> {
        match self.video.get_attribute(CONFIG_ATTRIBUTE) {
            Some(json) => {
                debug!("Using session config overrides from page");
                SessionConfig::from_json(&json)
            }
            None => Ok(SessionConfig::default()),
        }
    }

    pub fn video(&self) -> &HtmlVideoElement {
        &self.video
    }
}

impl Platform for BrowserPlatform {
    type Engine = HlsEngine;
    type Widget = PlyrWidget;

    fn engine_supported(&self) -> bool {
        hls_supported()
    }

    fn native_playback_supported(&self) -> bool {
        !self.video.can_play_type(HLS_MIME_TYPE).is_empty()
    }

    fn set_poster(&mut self, url: &Url) {
        self.video.set_poster(url.as_str());
    }

    fn set_native_source(&mut self, url: &Url) {
        self.video.set_src(url.as_str());
    }

    fn create_engine(&mut self, config: &EngineConfig, events: EventBus) -> Result<HlsEngine> {
        HlsEngine::new(self.video.clone().into(), config, events)
    }

    fn create_widget(&mut self, options: &PlayerOptions, events: EventBus) -> Result<PlyrWidget> {
        PlyrWidget::new(&self.video, options, events).inspect_err(|e| {
            warn!(error = %e, "Plyr construction failed");
        })
    }
}
