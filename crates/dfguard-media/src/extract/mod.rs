//! Frame/Sample Extractor.
//!
//! Turns a media file into classifier-ready samples:
//! - video: face crops from evenly sampled frames ([`video`])
//! - image: the whole picture as one crop ([`still`])
//! - audio: one fixed-length mono window ([`audio`])

pub mod audio;
pub mod still;
pub mod video;

pub use audio::{decode_audio, load_samples};
pub use still::load_image_crop;
pub use video::{extract_faces, extract_video_faces, OpenCvBackend, VideoBackend, VideoSource};
