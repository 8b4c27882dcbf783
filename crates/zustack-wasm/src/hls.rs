//! hls.js binding
//!
//! Wraps an `Hls` instance as a [`StreamingEngine`] and forwards the events the
//! session cares about onto its [`EventBus`].

use js_sys::{Array, Function, Reflect};
use serde::Serialize;
use tracing::warn;
use url::Url;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlMediaElement, XmlHttpRequest};
use zustack_core::{
    EngineConfig, EngineError, EngineEvent, Error, ErrorCategory, EventBus, Rendition, Result,
    StreamingEngine,
};

/// `Hls.Events.MEDIA_ATTACHED`
pub const MEDIA_ATTACHED: &str = "hlsMediaAttached";
/// `Hls.Events.MANIFEST_PARSED`
pub const MANIFEST_PARSED: &str = "hlsManifestParsed";
/// `Hls.Events.ERROR`
pub const ERROR: &str = "hlsError";
/// `Hls.Events.FRAG_BUFFERED`
pub const FRAG_BUFFERED: &str = "hlsFragBuffered";

#[wasm_bindgen]
extern "C" {
    /// hls.js player instance
    pub type Hls;

    #[wasm_bindgen(static_method_of = Hls, js_name = isSupported, catch)]
    fn is_supported() -> std::result::Result<bool, JsValue>;

    #[wasm_bindgen(constructor, catch)]
    fn new(config: &JsValue) -> std::result::Result<Hls, JsValue>;

    #[wasm_bindgen(method, js_name = attachMedia)]
    fn attach_media(this: &Hls, media: &HtmlMediaElement);

    #[wasm_bindgen(method, js_name = loadSource)]
    fn load_source(this: &Hls, url: &str);

    #[wasm_bindgen(method, js_name = startLoad)]
    fn start_load(this: &Hls);

    #[wasm_bindgen(method, js_name = recoverMediaError)]
    fn recover_media_error(this: &Hls);

    #[wasm_bindgen(method)]
    fn destroy(this: &Hls);

    #[wasm_bindgen(method)]
    fn on(this: &Hls, event: &str, listener: &Function);

    #[wasm_bindgen(method, getter)]
    fn levels(this: &Hls) -> JsValue;

    #[wasm_bindgen(method, getter, js_name = manualLevel)]
    fn manual_level(this: &Hls) -> i32;

    #[wasm_bindgen(method, setter, js_name = currentLevel)]
    fn set_current_level(this: &Hls, level: i32);
}

/// Whether hls.js is loaded and Media Source Extensions are available
pub fn hls_supported() -> bool {
    Hls::is_supported().unwrap_or(false)
}

/// Map `ErrorData.type` to an error category
pub fn error_category(kind: &str) -> ErrorCategory {
    match kind {
        "networkError" => ErrorCategory::Network,
        "mediaError" => ErrorCategory::Media,
        _ => ErrorCategory::Other,
    }
}

pub(crate) fn describe(value: &JsValue) -> String {
    value
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}

fn property(target: &JsValue, key: &str) -> JsValue {
    Reflect::get(target, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}

fn read_levels(levels: &JsValue) -> Vec<Rendition> {
    let Some(levels) = levels.dyn_ref::<Array>() else {
        return Vec::new();
    };

    levels
        .iter()
        .map(|level| Rendition {
            height: property(&level, "height").as_f64().unwrap_or(0.0) as u32,
            width: property(&level, "width").as_f64().unwrap_or(0.0) as u32,
            bitrate: property(&level, "bitrate").as_f64().unwrap_or(0.0) as u64,
        })
        .collect()
}

fn read_error(data: &JsValue) -> EngineError {
    let kind = property(data, "type").as_string().unwrap_or_default();
    EngineError {
        fatal: property(data, "fatal").as_bool().unwrap_or(false),
        category: error_category(&kind),
        details: property(data, "details").as_string().unwrap_or(kind),
    }
}

type Listener = Closure<dyn FnMut(JsValue, JsValue)>;

/// An `Hls` instance driven by a session
pub struct HlsEngine {
    hls: Hls,
    media: HtmlMediaElement,
    _listeners: Vec<Listener>,
    _xhr_setup: Option<Closure<dyn FnMut(XmlHttpRequest, JsValue)>>,
}

impl HlsEngine {
    pub fn new(media: HtmlMediaElement, config: &EngineConfig, events: EventBus) -> Result<Self> {
        let options = config
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| Error::EngineCreation(e.to_string()))?;

        let xhr_setup = config.authorization_header().map(|authorization| {
            Closure::<dyn FnMut(XmlHttpRequest, JsValue)>::new(move |xhr: XmlHttpRequest, _url: JsValue| {
                if let Err(e) = xhr.set_request_header("Authorization", &authorization) {
                    warn!(error = %describe(&e), "Failed to set Authorization header");
                }
            })
        });
        if let Some(setup) = &xhr_setup {
            Reflect::set(&options, &JsValue::from_str("xhrSetup"), setup.as_ref())
                .map_err(|e| Error::EngineCreation(describe(&e)))?;
        }

        let hls = Hls::new(&options).map_err(|e| Error::EngineCreation(describe(&e)))?;

        let listeners = vec![
            listen(&hls, MEDIA_ATTACHED, {
                let events = events.clone();
                move |_, _| events.emit(EngineEvent::MediaAttached)
            }),
            listen(&hls, MANIFEST_PARSED, {
                let events = events.clone();
                move |_, data| {
                    let renditions = read_levels(&property(&data, "levels"));
                    events.emit(EngineEvent::ManifestParsed { renditions })
                }
            }),
            listen(&hls, ERROR, {
                let events = events.clone();
                move |_, data| events.emit(EngineEvent::Error(read_error(&data)))
            }),
            listen(&hls, FRAG_BUFFERED, move |_, _| {
                events.emit(EngineEvent::FragmentBuffered)
            }),
        ];

        Ok(Self {
            hls,
            media,
            _listeners: listeners,
            _xhr_setup: xhr_setup,
        })
    }
}

fn listen(hls: &Hls, event: &str, handler: impl FnMut(JsValue, JsValue) + 'static) -> Listener {
    let listener = Listener::new(handler);
    hls.on(event, listener.as_ref().unchecked_ref());
    listener
}

impl StreamingEngine for HlsEngine {
    fn attach_media(&mut self) {
        self.hls.attach_media(&self.media);
    }

    fn load_source(&mut self, url: &Url) {
        self.hls.load_source(url.as_str());
    }

    fn renditions(&self) -> Vec<Rendition> {
        read_levels(&self.hls.levels())
    }

    fn active_rendition(&self) -> Option<usize> {
        // -1 while automatic level switching is on
        usize::try_from(self.hls.manual_level()).ok()
    }

    fn set_active_rendition(&mut self, index: usize) {
        match i32::try_from(index) {
            Ok(level) => self.hls.set_current_level(level),
            Err(_) => warn!(index, "Rendition index out of range"),
        }
    }

    fn start_load(&mut self) {
        self.hls.start_load();
    }

    fn recover_media_error(&mut self) {
        self.hls.recover_media_error();
    }

    fn destroy(&mut self) {
        self.hls.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category() {
        assert_eq!(error_category("networkError"), ErrorCategory::Network);
        assert_eq!(error_category("mediaError"), ErrorCategory::Media);
        assert_eq!(error_category("keySystemError"), ErrorCategory::Other);
        assert_eq!(error_category("muxError"), ErrorCategory::Other);
        assert_eq!(error_category("otherError"), ErrorCategory::Other);
    }
}
