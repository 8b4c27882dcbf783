//! Session configuration
//!
//! Everything the engine and the widget are constructed with, typed and validated
//! once before a session starts. Serialized field names match what hls.js and Plyr
//! expect so the browser layer can hand the values over unchanged.

use crate::address::default_asset_host;
use crate::quality::{QualityLadder, DEFAULT_QUALITY};
use crate::recovery::RecoveryPolicy;
use crate::seek::SeekGridConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Buffering and network configuration of the streaming engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub debug: bool,
    pub enable_worker: bool,
    pub low_latency_mode: bool,
    /// Seconds of already played media kept in the buffer
    pub back_buffer_length: f64,
    /// Target forward buffer in seconds
    pub max_buffer_length: f64,
    /// Upper bound on the forward buffer in seconds
    pub max_max_buffer_length: f64,
    /// Forward buffer size limit in bytes
    pub max_buffer_size: u64,
    /// Largest gap in seconds jumped over when buffered ranges are discontinuous
    pub max_buffer_hole: f64,
    pub initial_live_manifest_size: u32,
    /// Bearer token sent with every manifest and segment request
    #[serde(skip)]
    pub access_token: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debug: false,
            enable_worker: true,
            low_latency_mode: true,
            back_buffer_length: 90.0,
            max_buffer_length: 30.0,
            max_max_buffer_length: 600.0,
            max_buffer_size: 60 * 1000 * 1000,
            max_buffer_hole: 0.5,
            initial_live_manifest_size: 1,
            access_token: None,
        }
    }
}

impl EngineConfig {
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token;
        self
    }

    /// `Authorization` header value, if a token is set
    pub fn authorization_header(&self) -> Option<String> {
        self.access_token.as_ref().map(|t| format!("Bearer {}", t))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_buffer_length <= 0.0 {
            return Err(Error::config("maxBufferLength must be positive"));
        }
        if self.max_max_buffer_length < self.max_buffer_length {
            return Err(Error::config("maxMaxBufferLength must not be below maxBufferLength"));
        }
        if self.back_buffer_length < 0.0 || self.max_buffer_hole < 0.0 {
            return Err(Error::config("buffer lengths must not be negative"));
        }
        if self.initial_live_manifest_size == 0 {
            return Err(Error::config("initialLiveManifestSize must be at least 1"));
        }
        Ok(())
    }
}

/// Quality menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityOptions {
    #[serde(rename = "default")]
    pub default_height: u32,
    pub options: QualityLadder,
    pub forced: bool,
}

impl Default for QualityOptions {
    fn default() -> Self {
        Self {
            default_height: DEFAULT_QUALITY,
            options: QualityLadder::fallback(),
            forced: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionOptions {
    pub active: bool,
    pub update: bool,
}

impl Default for CaptionOptions {
    fn default() -> Self {
        Self {
            active: true,
            update: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TooltipOptions {
    pub controls: bool,
    pub seek: bool,
}

impl Default for TooltipOptions {
    fn default() -> Self {
        Self {
            controls: true,
            seek: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardOptions {
    pub focused: bool,
    pub global: bool,
}

impl Default for KeyboardOptions {
    fn default() -> Self {
        Self {
            focused: true,
            global: true,
        }
    }
}

/// Player controls, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Control {
    PlayLarge,
    Rewind,
    Play,
    FastForward,
    Progress,
    CurrentTime,
    Duration,
    Mute,
    Volume,
    Captions,
    Settings,
    Pip,
    Airplay,
    Fullscreen,
}

impl Control {
    pub const DEFAULT: [Control; 14] = [
        Control::PlayLarge,
        Control::Rewind,
        Control::Play,
        Control::FastForward,
        Control::Progress,
        Control::CurrentTime,
        Control::Duration,
        Control::Mute,
        Control::Volume,
        Control::Captions,
        Control::Settings,
        Control::Pip,
        Control::Airplay,
        Control::Fullscreen,
    ];
}

/// Entries of the settings menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsMenu {
    Captions,
    Quality,
    Speed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedOptions {
    pub selected: f64,
    pub options: Vec<f64>,
}

impl Default for SpeedOptions {
    fn default() -> Self {
        Self {
            selected: 1.0,
            options: vec![0.5, 0.75, 1.0, 1.25, 1.5, 2.0],
        }
    }
}

/// Persistence of the user's widget settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    pub enabled: bool,
    pub key: String,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            key: "plyr-settings".to_string(),
        }
    }
}

/// Options the player widget is constructed with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerOptions {
    pub quality: QualityOptions,
    pub captions: CaptionOptions,
    pub tooltips: TooltipOptions,
    pub keyboard: KeyboardOptions,
    pub controls: Vec<Control>,
    pub settings: Vec<SettingsMenu>,
    pub speed: SpeedOptions,
    pub storage: StorageOptions,
    pub thumbnail: SeekGridConfig,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            quality: QualityOptions::default(),
            captions: CaptionOptions::default(),
            tooltips: TooltipOptions::default(),
            keyboard: KeyboardOptions::default(),
            controls: Control::DEFAULT.to_vec(),
            settings: vec![SettingsMenu::Captions, SettingsMenu::Quality, SettingsMenu::Speed],
            speed: SpeedOptions::default(),
            storage: StorageOptions::default(),
            thumbnail: SeekGridConfig::default(),
        }
    }
}

impl PlayerOptions {
    /// Offer exactly the given ladder. If the default quality is not on it, the
    /// highest rung becomes the default.
    pub fn apply_ladder(&mut self, ladder: QualityLadder) {
        if !ladder.contains(self.quality.default_height) {
            if let Some(highest) = ladder.highest() {
                self.quality.default_height = highest;
            }
        }
        self.quality.options = ladder;
    }

    pub fn validate(&self) -> Result<()> {
        if self.quality.options.is_empty() {
            return Err(Error::config("quality ladder must not be empty"));
        }
        if self.quality.default_height == 0 {
            return Err(Error::config("default quality must be positive"));
        }
        if self.speed.options.iter().any(|s| *s <= 0.0) {
            return Err(Error::config("playback speeds must be positive"));
        }
        if !self.speed.options.contains(&self.speed.selected) {
            return Err(Error::config(format!(
                "selected speed {} is not one of the speed options",
                self.speed.selected
            )));
        }
        if self.storage.enabled && self.storage.key.is_empty() {
            return Err(Error::config("storage key must be set when storage is enabled"));
        }
        if self.thumbnail.width == 0 {
            return Err(Error::config("thumbnail width must be positive"));
        }
        Ok(())
    }
}

/// Complete configuration of a playback session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub asset_host: Url,
    pub engine: EngineConfig,
    pub player: PlayerOptions,
    pub recovery: RecoveryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            asset_host: default_asset_host(),
            engine: EngineConfig::default(),
            player: PlayerOptions::default(),
            recovery: RecoveryPolicy::default(),
        }
    }
}

impl SessionConfig {
    /// Parse JSON overrides; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if !matches!(self.asset_host.scheme(), "http" | "https") || self.asset_host.cannot_be_a_base() {
            return Err(Error::config(format!("asset host {} is not an http(s) base URL", self.asset_host)));
        }
        if self.recovery.max_attempts == Some(0) {
            return Err(Error::config("recovery max_attempts must be at least 1"));
        }
        self.engine.validate()?;
        self.player.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_defaults_serialize_camel_case() {
        let json = serde_json::to_value(EngineConfig::default()).unwrap();
        assert_eq!(json["enableWorker"], true);
        assert_eq!(json["lowLatencyMode"], true);
        assert_eq!(json["backBufferLength"], 90.0);
        assert_eq!(json["maxBufferLength"], 30.0);
        assert_eq!(json["maxMaxBufferLength"], 600.0);
        assert_eq!(json["maxBufferSize"], 60_000_000);
        assert_eq!(json["maxBufferHole"], 0.5);
        assert_eq!(json["initialLiveManifestSize"], 1);
        assert!(json.get("accessToken").is_none());
    }

    #[test]
    fn test_authorization_header() {
        assert_eq!(EngineConfig::default().authorization_header(), None);
        let config = EngineConfig::default().with_access_token(Some("abc".into()));
        assert_eq!(config.authorization_header().as_deref(), Some("Bearer abc"));
    }

    #[test]
    fn test_player_options_shape() {
        let json = serde_json::to_value(PlayerOptions::default()).unwrap();
        assert_eq!(json["quality"]["default"], 720);
        assert_eq!(json["quality"]["options"][0], 2160);
        assert_eq!(json["quality"]["forced"], true);
        assert_eq!(json["controls"][0], "play-large");
        assert_eq!(json["controls"][5], "current-time");
        assert_eq!(json["settings"][1], "quality");
        assert_eq!(json["speed"]["options"].as_array().unwrap().len(), 6);
        assert_eq!(json["storage"]["key"], "plyr-settings");
        assert_eq!(json["thumbnail"]["enabled"], false);
    }

    #[test]
    fn test_apply_ladder() {
        let mut options = PlayerOptions::default();
        options.apply_ladder(QualityLadder::new([1080, 720, 480]));
        assert_eq!(options.quality.default_height, 720);
        assert_eq!(options.quality.options.heights(), &[1080, 720, 480]);

        options.apply_ladder(QualityLadder::new([480, 360]));
        assert_eq!(options.quality.default_height, 480);
    }

    #[test]
    fn test_validation() {
        assert!(SessionConfig::default().validate().is_ok());

        let mut config = SessionConfig::default();
        config.player.speed.selected = 3.0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = SessionConfig::default();
        config.engine.max_max_buffer_length = 10.0;
        assert!(config.validate().is_err());

        let mut config = SessionConfig::default();
        config.recovery = RecoveryPolicy::bounded(0);
        assert!(config.validate().is_err());

        let mut config = SessionConfig::default();
        config.asset_host = Url::parse("data:text/plain,hi").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_overrides() {
        let config = SessionConfig::from_json(
            r#"{"asset_host":"https://cdn.example.com","recovery":{"max_attempts":5},"player":{"storage":{"enabled":false}}}"#,
        )
        .unwrap();
        assert_eq!(config.asset_host.as_str(), "https://cdn.example.com/");
        assert_eq!(config.recovery, RecoveryPolicy::bounded(5));
        assert!(!config.player.storage.enabled);
        assert_eq!(config.player.storage.key, "plyr-settings");
        assert_eq!(config.engine, EngineConfig::default());
    }
}
