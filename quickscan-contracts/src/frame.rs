//! Ephemeral camera frames and their release discipline.
//!
//! A [`CapturedFrame`] owns a slot the capture source lent out. The slot is
//! handed back exactly once: either through [`CapturedFrame::release`] or,
//! if every explicit path was skipped, when the frame is dropped.

use std::fmt;

/// Monotonic id assigned by the capture source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameId(pub u64);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame-{}", self.0)
    }
}

/// Sensor rotation relative to the natural display orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Normalises any multiple of 90 degrees; other angles are rejected.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }
}

/// Pixel data and metadata of one captured frame.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameImage {
    pub id: FrameId,
    pub width: u32,
    pub height: u32,
    pub rotation: Rotation,
    /// Luma plane, row-major, one byte per pixel.
    pub pixels: Vec<u8>,
}

impl FrameImage {
    pub fn new(
        id: FrameId,
        width: u32,
        height: u32,
        rotation: Rotation,
        pixels: Vec<u8>,
    ) -> Self {
        Self {
            id,
            width,
            height,
            rotation,
            pixels,
        }
    }

    /// Zero-sized placeholder, handy for sources that only forward
    /// metadata.
    pub fn empty(id: FrameId) -> Self {
        Self::new(id, 0, 0, Rotation::Deg0, Vec::new())
    }
}

impl fmt::Debug for FrameImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameImage")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rotation", &self.rotation)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}

type ReleaseFn = Box<dyn FnOnce(FrameId) + Send + 'static>;

/// A frame on loan from the capture source.
pub struct CapturedFrame {
    image: FrameImage,
    release: Option<ReleaseFn>,
}

impl CapturedFrame {
    /// Wraps `image`; `on_release` runs exactly once when the frame is
    /// handed back.
    pub fn new(
        image: FrameImage,
        on_release: impl FnOnce(FrameId) + Send + 'static,
    ) -> Self {
        Self {
            image,
            release: Some(Box::new(on_release)),
        }
    }

    pub fn id(&self) -> FrameId {
        self.image.id
    }

    pub fn image(&self) -> &FrameImage {
        &self.image
    }

    /// Hands the frame back to its source.
    pub fn release(mut self) {
        self.hand_back();
    }

    fn hand_back(&mut self) -> bool {
        match self.release.take() {
            Some(release) => {
                release(self.image.id);
                true
            }
            None => false,
        }
    }
}

impl Drop for CapturedFrame {
    fn drop(&mut self) {
        if self.hand_back() {
            log::debug!("{} released by drop guard", self.image.id);
        }
    }
}

impl fmt::Debug for CapturedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedFrame")
            .field("image", &self.image)
            .field("released", &self.release.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counted_frame(id: u64, counter: &Arc<AtomicUsize>) -> CapturedFrame {
        let counter = Arc::clone(counter);
        CapturedFrame::new(FrameImage::empty(FrameId(id)), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn explicit_release_runs_once() {
        let releases = Arc::new(AtomicUsize::new(0));
        let frame = counted_frame(1, &releases);
        frame.release();
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_an_unreleased_frame_releases_it() {
        let releases = Arc::new(AtomicUsize::new(0));
        {
            let _frame = counted_frame(2, &releases);
        }
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn release_callback_receives_frame_id() {
        let seen = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&seen);
        let frame = CapturedFrame::new(FrameImage::empty(FrameId(7)), move |id| {
            sink.store(id.0 as usize, Ordering::SeqCst);
        });
        frame.release();
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn rotation_normalises_multiples_of_ninety() {
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::Deg90));
        assert_eq!(Rotation::from_degrees(-90), Some(Rotation::Deg270));
        assert_eq!(Rotation::from_degrees(45), None);
        assert_eq!(Rotation::Deg180.degrees(), 180);
    }
}
