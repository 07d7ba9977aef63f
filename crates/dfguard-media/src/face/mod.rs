//! Face Locator: finds faces in RGB frames and cuts them into classifier crops.
//!
//! The detector itself is an opaque capability behind [`FaceLocator`]. This
//! module owns the box bookkeeping around it: clipping boxes to the frame,
//! discarding degenerate ones and resizing the survivors to 224x224.

#[cfg(feature = "opencv")]
pub mod yunet;

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::error::MediaResult;
use crate::sample::{FaceCrop, FACE_CROP_SIZE};

#[cfg(feature = "opencv")]
pub use yunet::YuNetLocator;

/// Axis-aligned face box in integer pixel coordinates, `x1 < x2`, `y1 < y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl FaceBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build from a floating-point `(x, y, w, h)` detection, truncating like
    /// an integer cast.
    pub fn from_xywh(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            x1: x as i32,
            y1: y as i32,
            x2: (x + w) as i32,
            y2: (y + h) as i32,
        }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// Intersect with a `width` x `height` frame. Returns `None` when nothing
    /// with positive area remains.
    pub fn clip(&self, width: u32, height: u32) -> Option<FaceBox> {
        let clipped = FaceBox {
            x1: self.x1.clamp(0, width as i32),
            y1: self.y1.clamp(0, height as i32),
            x2: self.x2.clamp(0, width as i32),
            y2: self.y2.clamp(0, height as i32),
        };
        (clipped.width() > 0 && clipped.height() > 0).then_some(clipped)
    }
}

/// Face detection capability.
///
/// Implementations must be safe to call from several requests at once.
#[cfg_attr(test, mockall::automock)]
pub trait FaceLocator: Send + Sync {
    /// Detect faces in an RGB frame. An empty vector means no face was found.
    fn detect(&self, frame: &RgbImage) -> MediaResult<Vec<FaceBox>>;
}

/// Crop every usable box out of `frame` as a classifier-ready sample.
///
/// Boxes are kept in detection order. Boxes that fall outside the frame or
/// clip to zero area are skipped.
pub fn crop_faces(frame: &RgbImage, boxes: &[FaceBox]) -> MediaResult<Vec<FaceCrop>> {
    let (width, height) = frame.dimensions();
    let mut crops = Vec::with_capacity(boxes.len());

    for b in boxes {
        let Some(region) = b.clip(width, height) else {
            continue;
        };
        let patch = imageops::crop_imm(
            frame,
            region.x1 as u32,
            region.y1 as u32,
            region.width() as u32,
            region.height() as u32,
        )
        .to_image();
        let resized = imageops::resize(&patch, FACE_CROP_SIZE, FACE_CROP_SIZE, FilterType::Triangle);
        crops.push(FaceCrop::from_rgb(&resized)?);
    }

    Ok(crops)
}
