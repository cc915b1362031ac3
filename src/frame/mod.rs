//! Pixel buffers and the per-pixel transforms applied between readback and encoding.

pub(crate) mod accumulate;
pub(crate) mod buffer;
pub(crate) mod composite;
pub(crate) mod flip;
