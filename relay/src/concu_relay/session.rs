use common::utils::json_parser::RideRequest;

use super::error::RelayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Requesting,
    Matched,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Request,
    Accept,
    Cancel,
    Expire,
    Disconnect,
    End,
}

impl SessionState {
    pub fn on(self, event: SessionEvent) -> Result<SessionState, RelayError> {
        use SessionEvent::*;
        use SessionState::*;

        match (self, event) {
            (Idle | Closed | Requesting, Request) => Ok(Requesting),
            (Requesting, Accept) => Ok(Matched),
            (Requesting, Cancel | Expire) => Ok(Idle),
            (Matched, Disconnect | End) => Ok(Closed),
            (Idle | Requesting, Disconnect) => Ok(Closed),
            (from, event) => Err(RelayError::InvalidTransition { from, event }),
        }
    }
}

/// Ride state of one connected passenger.
#[derive(Debug)]
pub struct Session {
    pub passenger_id: u32,
    state: SessionState,
    /// Pending request while Requesting
    request: Option<RideRequest>,
    /// Bumped on every new request so stale timeouts can be told apart
    request_seq: u64,
}

impl Session {
    pub fn new(passenger_id: u32) -> Self {
        Self {
            passenger_id,
            state: SessionState::Idle,
            request: None,
            request_seq: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn request(&self) -> Option<&RideRequest> {
        self.request.as_ref()
    }

    pub fn request_seq(&self) -> u64 {
        self.request_seq
    }

    /// Applies `event`; on error the session is left untouched.
    pub fn apply(&mut self, event: SessionEvent) -> Result<SessionState, RelayError> {
        let next = self.state.on(event)?;

        log::debug!(
            "Passenger {} session {:?} -> {:?}",
            self.passenger_id,
            self.state,
            next
        );

        self.state = next;
        if next != SessionState::Requesting {
            self.request = None;
        }

        Ok(next)
    }

    pub fn start_request(&mut self, request: RideRequest) -> Result<u64, RelayError> {
        self.apply(SessionEvent::Request)?;
        self.request = Some(request);
        self.request_seq += 1;

        Ok(self.request_seq)
    }
}
