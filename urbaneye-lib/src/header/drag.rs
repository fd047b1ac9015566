use crate::repository::BannerOffset;

/// Pointer bookkeeping for panning the banner.
///
/// Tracking is incremental: every move is applied relative to the previous pointer position, so
/// resuming a drag never makes the image jump.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DragTracker {
    last_y: Option<f64>,
}

impl DragTracker {
    pub fn start(&mut self, y: f64) {
        self.last_y = Some(y);
    }

    /// Move the pointer to `y`, returning `offset` shifted by the movement. Returns `None` when no
    /// drag is in progress.
    pub fn track(&mut self, y: f64, offset: BannerOffset) -> Option<BannerOffset> {
        let last_y = self.last_y?;
        self.last_y = Some(y);
        Some(offset.shifted(y - last_y))
    }

    pub fn end(&mut self) {
        self.last_y = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.last_y.is_some()
    }
}
