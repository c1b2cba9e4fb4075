use std::collections::HashMap;

use actix::MessageResponse;
use common::utils::{
    json_parser::{LocationUpdate, RelayMessages, RideRequest, Role, TripStatus},
    polyline,
    position::Position,
};

use super::{
    arbiter::{AcceptanceArbiter, Match},
    broadcaster::broadcast_request,
    error::RelayError,
    location_relay::{relay_location, LocationOutcome},
    registry::ConnectionRegistry,
    session::{Session, SessionEvent, SessionState},
    transport::Transport,
};

/// Counters kept for observability, never sent to clients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, MessageResponse)]
pub struct RelayStats {
    pub requests_broadcast: u64,
    pub matches_created: u64,
    pub matches_closed: u64,
    pub late_acceptances: u64,
    pub dropped_locations: u64,
    pub stale_locations: u64,
    pub failed_deliveries: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOutcome {
    pub seq: u64,
    pub drivers_notified: usize,
}

/// All relay state: who is connected, what each passenger is doing, who is matched.
///
/// Not synchronized; the owner must serialize calls (see `CentralRelay`).
pub struct RideRelay<T> {
    registry: ConnectionRegistry<T>,
    sessions: HashMap<u32, Session>,
    arbiter: AcceptanceArbiter,
    stats: RelayStats,
}

impl<T: Transport> Default for RideRelay<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> RideRelay<T> {
    pub fn new() -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            sessions: HashMap::new(),
            arbiter: AcceptanceArbiter::new(),
            stats: RelayStats::default(),
        }
    }

    pub fn stats(&self) -> RelayStats {
        self.stats
    }

    pub fn session_state(&self, passenger_id: u32) -> Option<SessionState> {
        self.sessions.get(&passenger_id).map(Session::state)
    }

    pub fn match_for_passenger(&self, passenger_id: u32) -> Option<&Match> {
        self.arbiter.for_passenger(passenger_id)
    }

    pub fn active_matches(&self) -> usize {
        self.arbiter.len()
    }

    fn send(&mut self, role: Role, id: u32, message: RelayMessages) {
        let Some(conn) = self.registry.get(role, id) else {
            log::debug!("{} {} is gone, dropping {:?}", role, id, message);
            return;
        };

        if let Err(e) = conn.transport.deliver(&message) {
            log::warn!("Could not deliver to {} {}: {}", role, id, e);
            self.stats.failed_deliveries += 1;
        }
    }

    fn respond(&mut self, role: Role, id: u32, status: TripStatus, detail: String) {
        self.send(role, id, RelayMessages::TripResponse { status, detail });
    }

    pub fn register(&mut self, id: u32, role: Role, transport: T) -> Result<(), RelayError> {
        self.registry.register(id, role, transport)?;

        if role == Role::Passenger {
            self.sessions.insert(id, Session::new(id));
        }

        log::info!("{} {} connected", role, id);
        self.send(role, id, RelayMessages::Registered { id, role });

        Ok(())
    }

    pub fn looking_for_passengers(&mut self, driver_id: u32, origin: Position) -> Result<(), RelayError> {
        if !self.registry.contains(Role::Driver, driver_id) {
            return Err(RelayError::UnknownConnection {
                role: Role::Driver,
                id: driver_id,
            });
        }

        self.registry.update_position(driver_id, origin);
        log::info!("Driver {} is looking for passengers at {}", driver_id, origin);

        Ok(())
    }

    pub fn request_ride(
        &mut self,
        passenger_id: u32,
        origin: Position,
        destination: String,
        encoded_route: &str,
    ) -> Result<RequestOutcome, RelayError> {
        let state = self
            .session_state(passenger_id)
            .ok_or(RelayError::UnknownConnection {
                role: Role::Passenger,
                id: passenger_id,
            })?;

        if state == SessionState::Matched {
            log::warn!(
                "Passenger {} asked for a ride while matched, ignoring",
                passenger_id
            );
            return Err(RelayError::AlreadyMatched(passenger_id));
        }

        let route = match polyline::decode(encoded_route) {
            Ok(route) if !route.is_empty() => route,
            Ok(_) => return Err(self.route_unavailable(passenger_id, "empty route".into())),
            Err(e) => return Err(self.route_unavailable(passenger_id, e.to_string())),
        };

        let request = RideRequest {
            passenger_id,
            origin,
            destination,
            route,
        };

        let seq = match self.sessions.get_mut(&passenger_id) {
            Some(session) => session.start_request(request.clone())?,
            None => {
                return Err(RelayError::UnknownConnection {
                    role: Role::Passenger,
                    id: passenger_id,
                })
            }
        };

        let report = broadcast_request(&self.registry, &request);
        self.stats.requests_broadcast += 1;
        self.stats.failed_deliveries += report.failed as u64;

        self.respond(
            Role::Passenger,
            passenger_id,
            TripStatus::RequestDelivered,
            format!(
                "Your request has been delivered to {} drivers, waiting for one to accept",
                report.delivered
            ),
        );

        Ok(RequestOutcome {
            seq,
            drivers_notified: report.delivered,
        })
    }

    fn route_unavailable(&mut self, passenger_id: u32, detail: String) -> RelayError {
        log::warn!("Route unavailable for passenger {}: {}", passenger_id, detail);
        self.send(
            Role::Passenger,
            passenger_id,
            RelayMessages::RouteUnavailable {
                detail: detail.clone(),
            },
        );

        RelayError::RouteUnavailable(detail)
    }

    pub fn accept(&mut self, driver_id: u32, passenger_id: u32) -> Result<(), RelayError> {
        if !self.registry.contains(Role::Driver, driver_id) {
            return Err(RelayError::UnknownConnection {
                role: Role::Driver,
                id: driver_id,
            });
        }

        if self.arbiter.for_passenger(passenger_id).is_some() {
            return Err(self.late_acceptance(driver_id, passenger_id));
        }

        let pending = self
            .sessions
            .get(&passenger_id)
            .and_then(Session::request)
            .cloned();

        let request = match pending {
            Some(request) => request,
            None => {
                self.respond(
                    Role::Driver,
                    driver_id,
                    TripStatus::Error,
                    format!("The request of passenger {} is no longer available", passenger_id),
                );
                return Err(RelayError::NoPendingRequest(passenger_id));
            }
        };

        let accepted = self.arbiter.try_accept(driver_id, &request).map(|_| ());

        match accepted {
            Ok(()) => (),
            Err(RelayError::AlreadyMatched(_)) => {
                return Err(self.late_acceptance(driver_id, passenger_id))
            }
            Err(e) => {
                self.respond(Role::Driver, driver_id, TripStatus::Error, e.to_string());
                return Err(e);
            }
        }

        if let Some(session) = self.sessions.get_mut(&passenger_id) {
            session.apply(SessionEvent::Accept)?;
        }

        self.stats.matches_created += 1;
        log::info!(
            "[TRIP] Driver {} will take the trip for passenger {}",
            driver_id,
            passenger_id
        );

        self.send(
            Role::Passenger,
            passenger_id,
            RelayMessages::Matched { driver_id },
        );
        self.send(
            Role::Driver,
            driver_id,
            RelayMessages::AcceptanceConfirmed {
                passenger_id,
                request,
            },
        );

        Ok(())
    }

    fn late_acceptance(&mut self, driver_id: u32, passenger_id: u32) -> RelayError {
        log::info!(
            "[TRIP] Driver {} was late for passenger {}",
            driver_id,
            passenger_id
        );
        self.stats.late_acceptances += 1;
        self.send(
            Role::Driver,
            driver_id,
            RelayMessages::AlreadyMatched { passenger_id },
        );

        RelayError::AlreadyMatched(passenger_id)
    }

    pub fn relay_location(&mut self, driver_id: u32, update: LocationUpdate) -> LocationOutcome {
        let outcome = relay_location(&mut self.registry, &mut self.arbiter, driver_id, update);

        match outcome {
            LocationOutcome::NoMatch => self.stats.dropped_locations += 1,
            LocationOutcome::Stale => self.stats.stale_locations += 1,
            LocationOutcome::Lost => self.stats.failed_deliveries += 1,
            LocationOutcome::Forwarded { .. } => (),
        }

        outcome
    }

    pub fn cancel_request(&mut self, passenger_id: u32) -> Result<(), RelayError> {
        let session = self
            .sessions
            .get_mut(&passenger_id)
            .ok_or(RelayError::UnknownConnection {
                role: Role::Passenger,
                id: passenger_id,
            })?;

        session.apply(SessionEvent::Cancel)?;
        log::info!("[TRIP] Passenger {} cancelled the request", passenger_id);

        Ok(())
    }

    /// Expires the request numbered `seq` if it is still waiting. Newer requests are untouched.
    pub fn expire_request(&mut self, passenger_id: u32, seq: u64) -> bool {
        let Some(session) = self.sessions.get_mut(&passenger_id) else {
            return false;
        };

        if session.state() != SessionState::Requesting || session.request_seq() != seq {
            return false;
        }

        if session.apply(SessionEvent::Expire).is_err() {
            return false;
        }

        log::info!("[TRIP] Request of passenger {} expired", passenger_id);
        self.send(Role::Passenger, passenger_id, RelayMessages::RequestExpired {});

        true
    }

    pub fn end_ride(&mut self, role: Role, id: u32) -> Result<(), RelayError> {
        let closed = match role {
            Role::Driver => self.arbiter.dissolve_by_driver(id),
            Role::Passenger => self.arbiter.dissolve_by_passenger(id),
        }
        .ok_or(RelayError::NoActiveRide { role, id })?;

        self.close_session(closed.passenger_id, SessionEvent::End);

        log::info!(
            "[TRIP] Ride of passenger {} with driver {} ended by {}",
            closed.passenger_id,
            closed.driver_id,
            role
        );

        let (other_role, other_id) = match role {
            Role::Driver => (Role::Passenger, closed.passenger_id),
            Role::Passenger => (Role::Driver, closed.driver_id),
        };
        self.send(other_role, other_id, RelayMessages::RideEnded { by: role });

        Ok(())
    }

    /// Deregisters the connection and tears down whatever referenced it.
    ///
    /// Returns false if `transport` does not own the registration.
    pub fn disconnect(&mut self, role: Role, id: u32, transport: &T) -> bool {
        if self.registry.deregister(role, id, transport).is_none() {
            return false;
        }

        log::info!("{} {} disconnected", role, id);

        match role {
            Role::Driver => {
                if let Some(closed) = self.arbiter.dissolve_by_driver(id) {
                    self.close_session(closed.passenger_id, SessionEvent::Disconnect);
                    self.send(
                        Role::Passenger,
                        closed.passenger_id,
                        RelayMessages::RideCancelled {
                            reason: format!("Driver {} disconnected", id),
                        },
                    );
                }
            }
            Role::Passenger => {
                if let Some(mut session) = self.sessions.remove(&id) {
                    if let Err(e) = session.apply(SessionEvent::Disconnect) {
                        log::error!("{}:{}, {}", std::file!(), std::line!(), e);
                    }
                }

                if let Some(closed) = self.arbiter.dissolve_by_passenger(id) {
                    self.stats.matches_closed += 1;
                    self.send(
                        Role::Driver,
                        closed.driver_id,
                        RelayMessages::RideCancelled {
                            reason: format!("Passenger {} disconnected", id),
                        },
                    );
                }
            }
        }

        true
    }

    fn close_session(&mut self, passenger_id: u32, event: SessionEvent) {
        self.stats.matches_closed += 1;

        if let Some(session) = self.sessions.get_mut(&passenger_id) {
            if let Err(e) = session.apply(event) {
                log::error!("{}:{}, {}", std::file!(), std::line!(), e);
            }
        }
    }
}
