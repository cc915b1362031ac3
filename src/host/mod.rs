//! Capabilities viewcap consumes from its host: the viewer, progress UI and file storage.

pub(crate) mod progress;
pub(crate) mod renderer;
pub(crate) mod scene;
pub(crate) mod storage;
