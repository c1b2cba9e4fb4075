use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use actix::{Actor, Addr, AsyncContext, Context, Handler, Message, SpawnHandle, WrapFuture};
use common::utils::{
    json_parser::{LocationUpdate, RideRequest, TripMessages},
    position::Position,
};
use rand::Rng;
use tokio::{sync::Mutex, time::sleep};

use super::{
    input_handler::DriverSettings,
    relay_connection::{RelayConnection, SendToRelay},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    /// Acceptance sent, waiting for the relay's verdict
    Accepting(u32),
    OnTrip(u32),
}

pub struct TripHandler {
    relay: Addr<RelayConnection>,
    // Where the driver is now
    current_location: Arc<Mutex<Position>>,
    state: DriverState,
    // Running trip, cancelled if the ride is torn down
    trip_task: Option<SpawnHandle>,
    settings: DriverSettings,
}

impl Actor for TripHandler {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.announce(ctx);
    }
}

impl TripHandler {
    pub fn new(relay: Addr<RelayConnection>, origin: Position, settings: DriverSettings) -> Self {
        Self {
            relay,
            current_location: Arc::new(Mutex::new(origin)),
            state: DriverState::Idle,
            trip_task: None,
            settings,
        }
    }

    /// Tells the relay where this driver waits for passengers.
    fn announce(&self, ctx: &mut Context<Self>) {
        let relay = self.relay.clone();
        let position_lock = Arc::clone(&self.current_location);

        ctx.spawn(
            async move {
                let origin = *position_lock.lock().await;
                log::info!("Looking for passengers at {}", origin);

                relay.do_send(SendToRelay {
                    message: TripMessages::PassengerRequest { origin },
                });
            }
            .into_actor(self),
        );
    }

    fn back_to_idle(&mut self, ctx: &mut Context<Self>) {
        self.state = DriverState::Idle;
        self.trip_task = None;
        log::info!("Now i'm ready for another trip!");
        self.announce(ctx);
    }
}

/// Pickup point first, then the requested route.
pub fn trip_waypoints(request: &RideRequest) -> Vec<Position> {
    std::iter::once(request.origin)
        .chain(request.route.iter().copied())
        .collect()
}

pub fn location_sample(position: Position, gps_noise_m: f64) -> LocationUpdate {
    let mut sample = position;
    sample.simulate(gps_noise_m);

    let timestamp_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();

    LocationUpdate {
        position: sample,
        timestamp_ms,
    }
}

#[derive(Message)]
#[rtype(result = "bool")]
pub struct CanHandleTrip {
    pub request: RideRequest,
}

impl Handler<CanHandleTrip> for TripHandler {
    type Result = bool;

    fn handle(&mut self, msg: CanHandleTrip, _ctx: &mut Context<Self>) -> Self::Result {
        let passenger_id = msg.request.passenger_id;

        if self.state != DriverState::Idle {
            log::debug!("Busy ({:?}), skipping passenger {}", self.state, passenger_id);
            return false;
        }

        let mut rng = rand::thread_rng();
        if !rng.gen_bool(self.settings.take_trip_probability.clamp(0.0, 1.0)) {
            log::info!("[TRIP] Not taking the trip of passenger {}", passenger_id);
            return false;
        }

        log::info!(
            "[TRIP] Accepting passenger {} going to {}",
            passenger_id,
            msg.request.destination
        );

        self.state = DriverState::Accepting(passenger_id);
        self.relay.do_send(SendToRelay {
            message: TripMessages::Acceptance { passenger_id },
        });

        true
    }
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct TripStart {
    pub request: RideRequest,
}

impl Handler<TripStart> for TripHandler {
    type Result = ();

    fn handle(&mut self, msg: TripStart, ctx: &mut Context<Self>) -> Self::Result {
        let passenger_id = msg.request.passenger_id;

        if self.state != DriverState::Accepting(passenger_id) {
            log::warn!(
                "Confirmation for passenger {} while {:?}",
                passenger_id,
                self.state
            );
        }

        self.state = DriverState::OnTrip(passenger_id);

        let relay = self.relay.clone();
        let current_pos = Arc::clone(&self.current_location);
        let self_addr = ctx.address();
        let settings = self.settings;
        let waypoints = trip_waypoints(&msg.request);
        let step_m = settings.speed_mps * settings.notification_interval.as_secs_f64();

        self.trip_task = Some(
            ctx.spawn(
                async move {
                    let mut lock = current_pos.lock().await;

                    log::info!("[TRIP] Start trip for passenger {}", passenger_id);

                    for (i, waypoint) in waypoints.iter().enumerate() {
                        loop {
                            let arrived = lock.go_to(waypoint, step_m);

                            relay.do_send(SendToRelay {
                                message: TripMessages::DriverLocation {
                                    location: location_sample(*lock, settings.gps_noise_m),
                                },
                            });
                            log::debug!("Current {} -> Waypoint {}", *lock, waypoint);

                            sleep(settings.notification_interval).await;

                            if arrived {
                                break;
                            }
                        }

                        if i == 0 {
                            log::info!("[TRIP] Passenger {} picked up", passenger_id);
                        }
                    }

                    log::info!(
                        "[TRIP] Arrived at destination for passenger {}",
                        passenger_id
                    );

                    relay.do_send(SendToRelay {
                        message: TripMessages::EndRide {},
                    });

                    self_addr.do_send(TripFinished {});
                }
                .into_actor(self),
            ),
        );
    }
}

#[derive(Message)]
#[rtype(result = "()")]
struct TripFinished {}

impl Handler<TripFinished> for TripHandler {
    type Result = ();

    fn handle(&mut self, _msg: TripFinished, ctx: &mut Context<Self>) -> Self::Result {
        self.back_to_idle(ctx);
    }
}

/// The acceptance lost or the request is gone.
#[derive(Message)]
#[rtype(result = "()")]
pub struct ClearPending {}

impl Handler<ClearPending> for TripHandler {
    type Result = ();

    fn handle(&mut self, _msg: ClearPending, ctx: &mut Context<Self>) -> Self::Result {
        if let DriverState::Accepting(_) = self.state {
            self.back_to_idle(ctx);
        }
    }
}

/// The ride was torn down by the other side.
#[derive(Message)]
#[rtype(result = "()")]
pub struct ClearPassenger {}

impl Handler<ClearPassenger> for TripHandler {
    type Result = ();

    fn handle(&mut self, _msg: ClearPassenger, ctx: &mut Context<Self>) -> Self::Result {
        if self.state == DriverState::Idle {
            return;
        }

        if let Some(task) = self.trip_task.take() {
            ctx.cancel_future(task);
            log::warn!("The passenger jumped out of the car!");
        }

        self.back_to_idle(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pickup_comes_before_the_route() {
        let request = RideRequest {
            passenger_id: 1,
            origin: Position::new(38.4, -120.1),
            destination: "ChIJdest".into(),
            route: vec![Position::new(38.5, -120.2), Position::new(40.7, -120.95)],
        };

        let waypoints = trip_waypoints(&request);

        assert_eq!(
            waypoints,
            vec![
                Position::new(38.4, -120.1),
                Position::new(38.5, -120.2),
                Position::new(40.7, -120.95)
            ]
        );
    }

    #[test]
    fn samples_carry_a_current_timestamp() {
        let position = Position::new(41.0, 29.0);
        let before = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;

        let sample = location_sample(position, 0.0);

        assert_eq!(sample.position, position);
        assert!(sample.timestamp_ms >= before);
    }

    #[test]
    fn gps_noise_stays_close() {
        let position = Position::new(41.0, 29.0);

        let sample = location_sample(position, 5.0);

        assert!(position.distance_to(&sample.position) < 10.0);
    }
}
