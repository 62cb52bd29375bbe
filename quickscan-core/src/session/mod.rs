//! Scan session: the state machine and the async driver around it.

pub mod runtime;
pub mod state;

pub use runtime::{
    SessionHandle, SessionRunner, SessionServices, UserAction,
    capture_request, run_session,
};
pub use state::{ScanSession, SessionEvent, SessionState, TransitionResult};
