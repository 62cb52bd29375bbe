//! Library side of `quickscanctl`: scan scripts, the scripted session
//! driver and the command line surface.
#![allow(missing_docs)]

pub mod cli;
pub mod script;
pub mod simulate;

pub use script::{Script, ScriptDetection, ScriptPermission, ScriptStep};
pub use simulate::{FrameStats, SimulationReport, simulate};
