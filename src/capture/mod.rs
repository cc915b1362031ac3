//! Offscreen capture: the session guard, frame preparation, readback and cancellation.

pub(crate) mod cancel;
pub(crate) mod grab;
pub(crate) mod prepare;
pub(crate) mod session;
