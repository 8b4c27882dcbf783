//! Plyr binding

use crate::hls::describe;
use js_sys::{Array, Function, Reflect};
use serde::Serialize;
use tracing::warn;
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;
use zustack_core::{
    Error, EventBus, PlayerOptions, PlayerWidget, PreviewFrame, RenderHook, Result, ThumbnailHeight,
    WidgetEvent,
};

#[wasm_bindgen]
extern "C" {
    /// Plyr player instance
    pub type Plyr;

    #[wasm_bindgen(constructor, catch)]
    fn new(target: &HtmlElement, options: &JsValue) -> std::result::Result<Plyr, JsValue>;

    #[wasm_bindgen(method)]
    fn on(this: &Plyr, event: &str, listener: &Function);

    #[wasm_bindgen(method, getter)]
    fn config(this: &Plyr) -> JsValue;

    #[wasm_bindgen(method, getter)]
    fn thumbnails(this: &Plyr) -> JsValue;
}

fn property(target: &JsValue, key: &str) -> JsValue {
    Reflect::get(target, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}

/// Arguments of one `thumbnails.showImage` call, passed through unchanged
pub struct PlyrFrame {
    args: Array,
}

impl PreviewFrame for PlyrFrame {
    fn image_size(&self) -> (f64, f64) {
        let image = self.args.get(0);
        (
            property(&image, "width").as_f64().unwrap_or(0.0),
            property(&image, "height").as_f64().unwrap_or(0.0),
        )
    }
}

/// `config.thumbnail.height` of one Plyr instance
#[derive(Clone)]
pub struct PlyrThumbnailHeight {
    thumbnail: JsValue,
}

impl ThumbnailHeight for PlyrThumbnailHeight {
    fn get(&self) -> f64 {
        property(&self.thumbnail, "height").as_f64().unwrap_or(0.0)
    }

    fn set(&self, height: f64) {
        if let Err(e) = Reflect::set(&self.thumbnail, &JsValue::from_str("height"), &JsValue::from_f64(height)) {
            warn!(error = %describe(&e), "Failed to update thumbnail height");
        }
    }
}

/// Plyr events forwarded as-is. Quality picks arrive through `quality.onChange`.
const LIFECYCLE_EVENTS: [WidgetEvent; 2] = [WidgetEvent::Ready, WidgetEvent::MetadataLoaded];

type ShowImage = Closure<dyn FnMut(JsValue, JsValue, JsValue, JsValue, JsValue)>;

/// A Plyr instance driven by a session
pub struct PlyrWidget {
    player: Plyr,
    _listeners: Vec<Closure<dyn FnMut(JsValue)>>,
    _on_change: Closure<dyn FnMut(JsValue)>,
    render_hooks: Vec<ShowImage>,
}

impl PlyrWidget {
    pub fn new(target: &HtmlElement, options: &PlayerOptions, events: EventBus) -> Result<Self> {
        let config = options
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| Error::WidgetCreation(e.to_string()))?;

        // Sole source of QualityChange; Plyr's `qualitychange` event repeats it
        let on_change = Closure::<dyn FnMut(JsValue)>::new({
            let events = events.clone();
            move |quality: JsValue| {
                if let Some(height) = quality.as_f64() {
                    events.emit(WidgetEvent::QualityChange(height as u32));
                }
            }
        });
        Reflect::set(&property(&config, "quality"), &JsValue::from_str("onChange"), on_change.as_ref())
            .map_err(|e| Error::WidgetCreation(describe(&e)))?;

        let player = Plyr::new(target, &config).map_err(|e| Error::WidgetCreation(describe(&e)))?;

        let listeners = LIFECYCLE_EVENTS
            .into_iter()
            .map(|event| {
                let events = events.clone();
                listen(&player, event.name(), move |_| events.emit(event.clone()))
            })
            .collect();

        Ok(Self {
            player,
            _listeners: listeners,
            _on_change: on_change,
            render_hooks: Vec::new(),
        })
    }
}

fn listen(player: &Plyr, event: &str, handler: impl FnMut(JsValue) + 'static) -> Closure<dyn FnMut(JsValue)> {
    let listener = Closure::<dyn FnMut(JsValue)>::new(handler);
    player.on(event, listener.as_ref().unchecked_ref());
    listener
}

impl PlayerWidget for PlyrWidget {
    type Frame = PlyrFrame;
    type Height = PlyrThumbnailHeight;

    fn take_render_hook(&mut self) -> Option<RenderHook<PlyrFrame>> {
        let thumbnails = self.player.thumbnails();
        if thumbnails.is_undefined() || thumbnails.is_null() {
            return None;
        }
        let show_image = property(&thumbnails, "showImage").dyn_into::<Function>().ok()?;

        Some(Box::new(move |frame: &PlyrFrame| {
            if let Err(e) = show_image.apply(&thumbnails, &frame.args) {
                warn!(error = %describe(&e), "Thumbnail render failed");
            }
        }))
    }

    fn set_render_hook(&mut self, mut hook: RenderHook<PlyrFrame>) {
        let thumbnails = self.player.thumbnails();
        let show_image = ShowImage::new(
            move |image: JsValue, quality: JsValue, number: JsValue, file: JsValue, new_image: JsValue| {
                let args = Array::new();
                for arg in [image, quality, number, file, new_image] {
                    args.push(&arg);
                }
                hook(&PlyrFrame { args });
            },
        );

        match Reflect::set(&thumbnails, &JsValue::from_str("showImage"), show_image.as_ref()) {
            Ok(_) => self.render_hooks.push(show_image),
            Err(e) => warn!(error = %describe(&e), "Failed to install thumbnail renderer"),
        }
    }

    fn thumbnail_height(&self) -> PlyrThumbnailHeight {
        PlyrThumbnailHeight {
            thumbnail: property(&self.player.config(), "thumbnail"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_change_has_single_source() {
        let names: Vec<&str> = LIFECYCLE_EVENTS.iter().map(WidgetEvent::name).collect();
        assert_eq!(names, vec!["ready", "loadedmetadata"]);
        assert!(!names.contains(&WidgetEvent::QualityChange(720).name()));
    }
}
