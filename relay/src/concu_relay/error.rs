use common::utils::json_parser::Role;
use thiserror::Error;

use super::session::{SessionEvent, SessionState};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("{role} {id} is already connected")]
    AlreadyConnected { role: Role, id: u32 },

    #[error("unknown {role} {id}")]
    UnknownConnection { role: Role, id: u32 },

    #[error("passenger {0} is already matched")]
    AlreadyMatched(u32),

    #[error("driver {0} already has an active ride")]
    DriverBusy(u32),

    #[error("passenger {0} has no pending request")]
    NoPendingRequest(u32),

    #[error("{role} {id} has no active ride")]
    NoActiveRide { role: Role, id: u32 },

    #[error("route unavailable: {0}")]
    RouteUnavailable(String),

    #[error("invalid transition from {from:?} on {event:?}")]
    InvalidTransition {
        from: SessionState,
        event: SessionEvent,
    },

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("configuration error: {0}")]
    Config(String),
}
