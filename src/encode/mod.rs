//! Encoding sinks.
//!
//! Sinks consume exported frames in order: a single PNG still, a video track fed to a
//! [`video::VideoEncoder`], or a directory of numbered stills.

pub(crate) mod codec;
pub(crate) mod ffmpeg;
pub(crate) mod image_file;
pub(crate) mod sequence;
pub(crate) mod sink;
pub(crate) mod still;
pub(crate) mod video;
