//! Thumbnail aspect correction
//!
//! The grid starts out assuming 16:9 previews. Once the widget renders its first
//! loaded sheet, the on-screen height is recomputed from the sheet's real aspect
//! ratio so portrait or 4:3 assets are not squashed.
//!
//! The corrector wraps the widget's render step and always delegates to it with
//! the original arguments. It is owned per widget instance; installing it again
//! on the same instance does nothing.

use crate::widget::{PlayerWidget, PreviewFrame, RenderHook, ThumbnailHeight};
use tracing::{debug, info};

/// Height that preserves an image's aspect ratio at `configured_width`
pub fn corrected_height(configured_width: u32, image_width: f64, image_height: f64) -> Option<f64> {
    if image_width <= 0.0 || image_height <= 0.0 {
        return None;
    }
    let aspect_ratio = image_width / image_height;
    Some((f64::from(configured_width) / aspect_ratio).floor())
}

/// Installs the aspect-correcting render step on one widget instance
#[derive(Debug)]
pub struct ThumbnailAspectCorrector {
    configured_width: u32,
    installed: bool,
}

impl ThumbnailAspectCorrector {
    pub fn new(configured_width: u32) -> Self {
        Self {
            configured_width,
            installed: false,
        }
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// Wrap the widget's render step. Returns true when the hook was installed by
    /// this call; false if already installed or the widget has no render step yet.
    pub fn install<W: PlayerWidget>(&mut self, widget: &mut W) -> bool {
        if self.installed {
            return false;
        }

        let Some(mut original) = widget.take_render_hook() else {
            debug!("Thumbnail renderer not ready, deferring aspect correction");
            return false;
        };

        let height = widget.thumbnail_height();
        let width = self.configured_width;
        let mut corrected = false;

        let hook: RenderHook<W::Frame> = Box::new(move |frame: &W::Frame| {
            if !corrected {
                let (image_width, image_height) = frame.image_size();
                if let Some(h) = corrected_height(width, image_width, image_height) {
                    height.set(h);
                    corrected = true;
                    info!(width, height = h, "Seek thumbnail height corrected");
                }
            }
            original(frame);
        });

        widget.set_render_hook(hook);
        self.installed = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    struct Frame(f64, f64);

    impl PreviewFrame for Frame {
        fn image_size(&self) -> (f64, f64) {
            (self.0, self.1)
        }
    }

    struct Widget {
        hook: Option<RenderHook<Frame>>,
        height: Rc<Cell<f64>>,
        calls: Rc<RefCell<Vec<f64>>>,
    }

    impl Widget {
        fn new() -> Self {
            let calls = Rc::new(RefCell::new(Vec::new()));
            let height = Rc::new(Cell::new(168.75));
            let (c, h) = (calls.clone(), height.clone());
            let hook: RenderHook<Frame> = Box::new(move |_: &Frame| c.borrow_mut().push(h.get()));
            Self {
                hook: Some(hook),
                height,
                calls,
            }
        }

        fn render(&mut self, frame: Frame) {
            if let Some(hook) = self.hook.as_mut() {
                hook(&frame);
            }
        }
    }

    impl PlayerWidget for Widget {
        type Frame = Frame;
        type Height = Rc<Cell<f64>>;

        fn take_render_hook(&mut self) -> Option<RenderHook<Frame>> {
            self.hook.take()
        }

        fn set_render_hook(&mut self, hook: RenderHook<Frame>) {
            self.hook = Some(hook);
        }

        fn thumbnail_height(&self) -> Rc<Cell<f64>> {
            self.height.clone()
        }
    }

    #[test]
    fn test_corrected_height() {
        assert_eq!(corrected_height(300, 1920.0, 1080.0), Some(168.0));
        assert_eq!(corrected_height(300, 1440.0, 1080.0), Some(225.0));
        assert_eq!(corrected_height(300, 1080.0, 1920.0), Some(533.0));
        assert_eq!(corrected_height(300, 0.0, 1080.0), None);
        assert_eq!(corrected_height(300, 1920.0, 0.0), None);
    }

    #[test]
    fn test_height_applied_before_delegation() {
        let mut widget = Widget::new();
        let mut corrector = ThumbnailAspectCorrector::new(300);
        assert!(corrector.install(&mut widget));

        widget.render(Frame(1440.0, 1080.0));
        assert_eq!(*widget.calls.borrow(), vec![225.0]);
        assert_eq!(widget.height.get(), 225.0);
    }

    #[test]
    fn test_unloaded_image_keeps_default() {
        let mut widget = Widget::new();
        let mut corrector = ThumbnailAspectCorrector::new(300);
        corrector.install(&mut widget);

        widget.render(Frame(0.0, 0.0));
        assert_eq!(widget.height.get(), 168.75);
        widget.render(Frame(1920.0, 1080.0));
        assert_eq!(widget.height.get(), 168.0);
        assert_eq!(widget.calls.borrow().len(), 2);
    }

    #[test]
    fn test_only_first_loaded_image_counts() {
        let mut widget = Widget::new();
        let mut corrector = ThumbnailAspectCorrector::new(300);
        corrector.install(&mut widget);

        widget.render(Frame(1920.0, 1080.0));
        widget.height.set(99.0);
        widget.render(Frame(1440.0, 1080.0));
        assert_eq!(widget.height.get(), 99.0);
    }

    #[test]
    fn test_double_install_does_not_double_wrap() {
        let mut widget = Widget::new();
        let mut corrector = ThumbnailAspectCorrector::new(300);
        assert!(corrector.install(&mut widget));
        assert!(!corrector.install(&mut widget));
        assert!(corrector.is_installed());

        widget.render(Frame(1920.0, 1080.0));
        assert_eq!(widget.calls.borrow().len(), 1);
    }

    #[test]
    fn test_install_deferred_until_renderer_exists() {
        let mut widget = Widget::new();
        let original = widget.hook.take();
        let mut corrector = ThumbnailAspectCorrector::new(300);

        assert!(!corrector.install(&mut widget));
        assert!(!corrector.is_installed());

        widget.hook = original;
        assert!(corrector.install(&mut widget));
    }
}
