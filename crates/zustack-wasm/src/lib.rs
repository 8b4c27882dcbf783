//! Zustack WASM - browser entry point for the Zustack player
//!
//! Binds hls.js and Plyr to the session core and starts playback for the
//! asset named by the page URL:
//!
//! ```text
//! https://player.zustack.com/watch/{location}/{bucket}/{file}?jwt=...&seek=...
//! ```
//!
//! Load hls.js and Plyr before this module:
//!
//! ```javascript
//! import init from '@zustack/player';
//!
//! await init();
//! ```

use std::cell::RefCell;
use url::Url;
use wasm_bindgen::prelude::*;
use zustack_core::{PageRequest, SessionHandle};

mod hls;
mod platform;
mod plyr;

pub use hls::HlsEngine;
pub use platform::BrowserPlatform;
pub use plyr::PlyrWidget;

thread_local! {
    static SESSION: RefCell<Option<SessionHandle<BrowserPlatform>>> = const { RefCell::new(None) };
}

/// Initialize the WASM module and schedule playback
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
    zustack_core::init();

    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        tracing::error!("No document available");
        return;
    };

    if document.ready_state() == "loading" {
        let start = Closure::once_into_js(start);
        if let Err(e) = document.add_event_listener_with_callback("DOMContentLoaded", start.unchecked_ref()) {
            tracing::error!(error = %hls::describe(&e), "Failed to schedule player start");
        }
    } else {
        start();
    }
}

fn start() {
    if let Err(e) = run() {
        tracing::error!(error = %e, "Player failed to start");
    }
}

fn run() -> anyhow::Result<()> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let document = window.document().ok_or_else(|| anyhow::anyhow!("no document"))?;
    let href = window.location().href().map_err(|e| anyhow::anyhow!(hls::describe(&e)))?;

    let request = PageRequest::from_url(&Url::parse(&href)?)?;
    let platform = BrowserPlatform::from_document(&document, platform::PLAYER_SELECTOR)?;
    let config = platform.session_config()?;

    let handle = zustack_core::bootstrap(platform, &request, config)?;
    tracing::info!(
        session = %handle.session().id(),
        mode = ?handle.session().mode(),
        "Player started"
    );

    SESSION.with(|session| *session.borrow_mut() = Some(handle));
    Ok(())
}

/// Library version
#[wasm_bindgen]
pub fn version() -> String {
    zustack_core::VERSION.to_string()
}

/// Lifecycle phase of the running session, if one started
#[wasm_bindgen(js_name = sessionPhase)]
pub fn session_phase() -> Option<String> {
    SESSION.with(|session| session.borrow().as_ref().map(|h| h.phase().to_string()))
}
