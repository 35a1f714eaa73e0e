//! gaze.recording.v1 input schema
//!
//! Raw samples as exported by the eye tracker plus the phase timestamps of
//! each trial. Phase extraction from tracker event logs happens upstream.

mod adapter;
mod recording;

pub use adapter::*;
pub use recording::*;
