//! Use-case layer over the chart store.
//!
//! # Responsibility
//! - Own the editor state machine so UI/FFI layers stay thin.
//! - Keep storage details behind the `ChartStore` trait.

pub mod chart_session;

pub use chart_session::{
    AiOutcome, AiTicket, ChartSession, SessionError, SessionResult, SessionStatus,
    ADVICE_UNAVAILABLE,
};
