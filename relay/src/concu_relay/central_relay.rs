use std::time::Duration;

use actix::{Actor, Addr, AsyncContext, Context, Handler, Message};
use common::utils::{
    json_parser::{LocationUpdate, Role},
    position::Position,
};

use super::{
    error::RelayError,
    location_relay::LocationOutcome,
    ride_relay::{RelayStats, RequestOutcome, RideRelay},
    session::SessionState,
    transport::Transport,
};

/// Owner of all relay state. Its mailbox is the single serialization point:
/// two acceptances for the same passenger are handled one after the other.
pub struct CentralRelay<T> {
    relay: RideRelay<T>,
    // Unmatched requests expire after this long, if set
    request_timeout: Option<Duration>,
}

impl<T> Actor for CentralRelay<T>
where
    T: Transport + Unpin + 'static,
{
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        match self.request_timeout {
            Some(t) => log::info!("Relay started, requests expire after {:?}", t),
            None => log::info!("Relay started, requests never expire"),
        }
    }
}

impl<T> CentralRelay<T>
where
    T: Transport + Unpin + 'static,
{
    pub fn new(request_timeout: Option<Duration>) -> Self {
        Self {
            relay: RideRelay::new(),
            request_timeout,
        }
    }

    pub fn create_new(request_timeout: Option<Duration>) -> Addr<Self> {
        Self::new(request_timeout).start()
    }
}

pub struct RegisterConnection<T> {
    pub id: u32,
    pub role: Role,
    pub transport: T,
}

impl<T: 'static> Message for RegisterConnection<T> {
    type Result = Result<(), RelayError>;
}

impl<T> Handler<RegisterConnection<T>> for CentralRelay<T>
where
    T: Transport + Unpin + 'static,
{
    type Result = Result<(), RelayError>;

    fn handle(&mut self, msg: RegisterConnection<T>, _ctx: &mut Context<Self>) -> Self::Result {
        self.relay.register(msg.id, msg.role, msg.transport)
    }
}

pub struct RemoveConnection<T> {
    pub id: u32,
    pub role: Role,
    pub transport: T,
}

impl<T: 'static> Message for RemoveConnection<T> {
    type Result = bool;
}

impl<T> Handler<RemoveConnection<T>> for CentralRelay<T>
where
    T: Transport + Unpin + 'static,
{
    type Result = bool;

    /// Cascade: any match of this connection is gone before the next message is handled.
    fn handle(&mut self, msg: RemoveConnection<T>, _ctx: &mut Context<Self>) -> Self::Result {
        self.relay.disconnect(msg.role, msg.id, &msg.transport)
    }
}

#[derive(Message)]
#[rtype(result = "Result<(), RelayError>")]
pub struct LookingForPassengers {
    pub driver_id: u32,
    pub origin: Position,
}

impl<T> Handler<LookingForPassengers> for CentralRelay<T>
where
    T: Transport + Unpin + 'static,
{
    type Result = Result<(), RelayError>;

    fn handle(&mut self, msg: LookingForPassengers, _ctx: &mut Context<Self>) -> Self::Result {
        self.relay.looking_for_passengers(msg.driver_id, msg.origin)
    }
}

#[derive(Message)]
#[rtype(result = "Result<RequestOutcome, RelayError>")]
pub struct RedirectNewTrip {
    pub passenger_id: u32,
    pub origin: Position,
    pub destination: String,
    pub polyline: String,
}

impl<T> Handler<RedirectNewTrip> for CentralRelay<T>
where
    T: Transport + Unpin + 'static,
{
    type Result = Result<RequestOutcome, RelayError>;

    fn handle(&mut self, msg: RedirectNewTrip, ctx: &mut Context<Self>) -> Self::Result {
        let outcome = self.relay.request_ride(
            msg.passenger_id,
            msg.origin,
            msg.destination,
            &msg.polyline,
        )?;

        if let Some(timeout) = self.request_timeout {
            ctx.notify_later(
                ExpireRequest {
                    passenger_id: msg.passenger_id,
                    seq: outcome.seq,
                },
                timeout,
            );
        }

        Ok(outcome)
    }
}

#[derive(Message)]
#[rtype(result = "Result<(), RelayError>")]
pub struct AcceptTrip {
    pub driver_id: u32,
    pub passenger_id: u32,
}

impl<T> Handler<AcceptTrip> for CentralRelay<T>
where
    T: Transport + Unpin + 'static,
{
    type Result = Result<(), RelayError>;

    fn handle(&mut self, msg: AcceptTrip, _ctx: &mut Context<Self>) -> Self::Result {
        self.relay.accept(msg.driver_id, msg.passenger_id)
    }
}

#[derive(Message)]
#[rtype(result = "LocationOutcome")]
pub struct RelayDriverLocation {
    pub driver_id: u32,
    pub location: LocationUpdate,
}

impl<T> Handler<RelayDriverLocation> for CentralRelay<T>
where
    T: Transport + Unpin + 'static,
{
    type Result = LocationOutcome;

    fn handle(&mut self, msg: RelayDriverLocation, _ctx: &mut Context<Self>) -> Self::Result {
        self.relay.relay_location(msg.driver_id, msg.location)
    }
}

#[derive(Message)]
#[rtype(result = "Result<(), RelayError>")]
pub struct CancelTrip {
    pub passenger_id: u32,
}

impl<T> Handler<CancelTrip> for CentralRelay<T>
where
    T: Transport + Unpin + 'static,
{
    type Result = Result<(), RelayError>;

    fn handle(&mut self, msg: CancelTrip, _ctx: &mut Context<Self>) -> Self::Result {
        self.relay.cancel_request(msg.passenger_id)
    }
}

#[derive(Message)]
#[rtype(result = "Result<(), RelayError>")]
pub struct EndRide {
    pub role: Role,
    pub id: u32,
}

impl<T> Handler<EndRide> for CentralRelay<T>
where
    T: Transport + Unpin + 'static,
{
    type Result = Result<(), RelayError>;

    fn handle(&mut self, msg: EndRide, _ctx: &mut Context<Self>) -> Self::Result {
        self.relay.end_ride(msg.role, msg.id)
    }
}

#[derive(Message)]
#[rtype(result = "bool")]
pub struct ExpireRequest {
    pub passenger_id: u32,
    pub seq: u64,
}

impl<T> Handler<ExpireRequest> for CentralRelay<T>
where
    T: Transport + Unpin + 'static,
{
    type Result = bool;

    fn handle(&mut self, msg: ExpireRequest, _ctx: &mut Context<Self>) -> Self::Result {
        self.relay.expire_request(msg.passenger_id, msg.seq)
    }
}

#[derive(Message)]
#[rtype(result = "RelayStats")]
pub struct GetStats {}

impl<T> Handler<GetStats> for CentralRelay<T>
where
    T: Transport + Unpin + 'static,
{
    type Result = RelayStats;

    fn handle(&mut self, _msg: GetStats, _ctx: &mut Context<Self>) -> Self::Result {
        self.relay.stats()
    }
}

#[derive(Message)]
#[rtype(result = "Option<SessionState>")]
pub struct GetSessionState {
    pub passenger_id: u32,
}

impl<T> Handler<GetSessionState> for CentralRelay<T>
where
    T: Transport + Unpin + 'static,
{
    type Result = Option<SessionState>;

    fn handle(&mut self, msg: GetSessionState, _ctx: &mut Context<Self>) -> Self::Result {
        self.relay.session_state(msg.passenger_id)
    }
}
