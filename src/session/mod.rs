//! Match session tracking and lifecycle handling
//!
//! A session is the set of ephemeral voice channels created for one match.
//! The registry owns the in-memory mapping; the lifecycle handler is the sole
//! authority permitted to mutate it. State lives only in process memory: a
//! restart loses all in-flight sessions, which is an accepted limitation of
//! the design rather than something this module papers over.

pub mod lifecycle;
pub mod registry;

// Re-export commonly used types
pub use lifecycle::{
    EventOutcome, LifecycleHandler, MemberPlacement, Placement, ReadyReport, TeardownReport,
};
pub use registry::{AlreadyRegistered, MatchSession, SessionRegistry, TeamChannel};
