use std::sync::Arc;

use actix::{
    dev::ContextFutureSpawner, fut::wrap_future, Actor, Addr, Context, Handler,
    Message, StreamHandler, System,
};
use common::utils::json_parser::{RelayMessages, TripMessages, TripStatus};
use tokio::{
    io::{AsyncWriteExt, WriteHalf},
    net::TcpStream,
    sync::Mutex,
};

use super::handle_trip::{CanHandleTrip, ClearPassenger, ClearPending, TripHandler, TripStart};

/// The driver's only socket: everything to and from the relay goes through here.
pub struct RelayConnection {
    // Serialized writes to the relay
    relay_write_stream: Arc<Mutex<WriteHalf<TcpStream>>>,
    trip_handler: Addr<TripHandler>,
    driver_id: u32,
}

impl RelayConnection {
    pub fn new(
        write_stream: WriteHalf<TcpStream>,
        trip_handler: Addr<TripHandler>,
        driver_id: u32,
    ) -> Self {
        Self {
            relay_write_stream: Arc::new(Mutex::new(write_stream)),
            trip_handler,
            driver_id,
        }
    }

    fn dispatch(&self, message: RelayMessages) {
        match message {
            RelayMessages::TaxiRequest { request } => {
                self.trip_handler.do_send(CanHandleTrip { request })
            }

            RelayMessages::AcceptanceConfirmed {
                passenger_id,
                request,
            } => {
                log::info!("[TRIP] Passenger {} is mine", passenger_id);
                self.trip_handler.do_send(TripStart { request });
            }

            RelayMessages::AlreadyMatched { passenger_id } => {
                log::info!("[TRIP] Passenger {} was taken by another driver", passenger_id);
                self.trip_handler.do_send(ClearPending {});
            }

            RelayMessages::RideCancelled { reason } => {
                log::warn!("[TRIP] Ride cancelled: {}", reason);
                self.trip_handler.do_send(ClearPassenger {});
            }

            RelayMessages::RideEnded { by } => {
                log::info!("[TRIP] Ride ended by the {}", by);
                self.trip_handler.do_send(ClearPassenger {});
            }

            RelayMessages::TripResponse {
                status: TripStatus::Error,
                detail,
            } => {
                log::warn!("{}", detail);
                self.trip_handler.do_send(ClearPending {});
            }

            RelayMessages::TripResponse { detail, .. } => log::info!("{}", detail),

            other => log::debug!("Driver {} ignoring {:?}", self.driver_id, other),
        }
    }
}

impl Actor for RelayConnection {
    type Context = Context<Self>;
}

impl StreamHandler<Result<String, std::io::Error>> for RelayConnection {
    fn handle(&mut self, msg: Result<String, std::io::Error>, _ctx: &mut Self::Context) {
        let data = match msg {
            Ok(data) => data,
            Err(e) => {
                log::error!("{}:{}, {}", std::file!(), std::line!(), e.to_string());
                return;
            }
        };

        log::debug!("recv {}", data);

        match serde_json::from_str::<RelayMessages>(&data) {
            Ok(message) => self.dispatch(message),
            Err(e) => log::error!("{}:{}, {}, str: {}", std::file!(), std::line!(), e, data),
        }
    }

    fn finished(&mut self, _ctx: &mut Self::Context) {
        log::warn!("Broken pipe with relay, driver {} is going home", self.driver_id);
        System::current().stop();
    }
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct SendToRelay {
    pub message: TripMessages,
}

impl Handler<SendToRelay> for RelayConnection {
    type Result = ();

    fn handle(&mut self, msg: SendToRelay, ctx: &mut Context<Self>) -> Self::Result {
        let data = match serde_json::to_string(&msg.message) {
            Ok(data) => data + "\n",
            Err(e) => {
                log::error!("{}:{}, {}", std::file!(), std::line!(), e.to_string());
                return;
            }
        };

        let w = self.relay_write_stream.clone();
        wrap_future::<_, Self>(async move {
            let mut writer = w.lock().await;

            let _ = writer.write_all(data.as_bytes()).await.inspect_err(|e| {
                log::error!("{}:{}, {}", std::file!(), std::line!(), e.to_string())
            });

            let _ = writer.flush().await.inspect_err(|e| {
                log::error!("{}:{}, {}", std::file!(), std::line!(), e.to_string())
            });
        })
        .wait(ctx);
    }
}
