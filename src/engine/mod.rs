//! Engine module housing the gesture recognition core.
//!
//! `core` holds the single-threaded `GestureEngine`; `handle` wraps it in the
//! `EngineHandle` shared by the frame loop and the control surfaces.

pub mod core;
pub mod handle;

pub use self::core::{EngineSettings, GestureEngine};
pub use self::handle::EngineHandle;
