//! Player widget collaborator
//!
//! The widget (Plyr in the browser) renders controls and seek previews. The session
//! constructs it from [`PlayerOptions`](crate::config::PlayerOptions) and listens to
//! the events it reports.

/// Events reported by the widget
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    Ready,
    MetadataLoaded,
    /// The user picked a display quality (rendition height)
    QualityChange(u32),
}

impl WidgetEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WidgetEvent::Ready => "ready",
            WidgetEvent::MetadataLoaded => "loadedmetadata",
            WidgetEvent::QualityChange(_) => "qualitychange",
        }
    }
}

/// Arguments of one thumbnail render call
pub trait PreviewFrame {
    /// Width and height of the loaded sheet image, zero while not loaded
    fn image_size(&self) -> (f64, f64);
}

/// The widget's thumbnail render step
pub type RenderHook<F> = Box<dyn FnMut(&F)>;

/// Live thumbnail height read by the widget at render time
pub trait ThumbnailHeight {
    fn get(&self) -> f64;
    fn set(&self, height: f64);
}

impl ThumbnailHeight for std::rc::Rc<std::cell::Cell<f64>> {
    fn get(&self) -> f64 {
        std::cell::Cell::get(self)
    }

    fn set(&self, height: f64) {
        std::cell::Cell::set(self, height)
    }
}

/// A constructed player widget
pub trait PlayerWidget {
    type Frame: PreviewFrame + 'static;
    type Height: ThumbnailHeight + 'static;

    /// Take the current thumbnail render step. `None` while the widget has not set
    /// up its thumbnail machinery yet.
    fn take_render_hook(&mut self) -> Option<RenderHook<Self::Frame>>;

    /// Replace the thumbnail render step
    fn set_render_hook(&mut self, hook: RenderHook<Self::Frame>);

    /// Handle to the live thumbnail height of this instance
    fn thumbnail_height(&self) -> Self::Height;
}
