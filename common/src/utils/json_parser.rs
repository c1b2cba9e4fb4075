use std::fmt;

use serde::{Deserialize, Serialize};

use super::position::Position;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Driver,
    Passenger,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Driver => write!(f, "driver"),
            Role::Passenger => write!(f, "passenger"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum CommonMessages {
    Identification { id: u32, role: Role },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LocationUpdate {
    pub position: Position,
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RideRequest {
    pub passenger_id: u32,
    pub origin: Position,
    /// Destination place reference, as given by the directions provider
    pub destination: String,
    pub route: Vec<Position>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripStatus {
    RequestDelivered,
    Info,
    Success,
    Error,
}

/// Sent by clients to the relay
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum TripMessages {
    PassengerRequest {
        origin: Position,
    },
    TaxiRequest {
        origin: Position,
        destination: String,
        polyline: String,
    },
    Acceptance {
        passenger_id: u32,
    },
    DriverLocation {
        location: LocationUpdate,
    },
    CancelRequest {},
    EndRide {},
}

/// Sent by the relay to clients
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum RelayMessages {
    Registered {
        id: u32,
        role: Role,
    },
    TaxiRequest {
        request: RideRequest,
    },
    TripResponse {
        status: TripStatus,
        detail: String,
    },
    Matched {
        driver_id: u32,
    },
    AcceptanceConfirmed {
        passenger_id: u32,
        request: RideRequest,
    },
    AlreadyMatched {
        passenger_id: u32,
    },
    DriverLocation {
        location: LocationUpdate,
    },
    RouteUnavailable {
        detail: String,
    },
    RideCancelled {
        reason: String,
    },
    RideEnded {
        by: Role,
    },
    RequestExpired {},
}
