use std::time::Duration;

use eframe::egui::Context;

/// Asks the host for another frame. Producers running off the UI thread use it
/// to get a freshly published snapshot onto the screen.
pub trait FrameScheduler: Send + Sync {
    fn request_frame(&self);

    fn request_frame_after(&self, delay: Duration);
}

impl FrameScheduler for Context {
    fn request_frame(&self) {
        self.request_repaint();
    }

    fn request_frame_after(&self, delay: Duration) {
        self.request_repaint_after(delay);
    }
}
