use std::sync::Arc;

use actix::{
    dev::ContextFutureSpawner, fut::wrap_future, Actor, ActorContext, ActorFutureExt, Addr,
    AsyncContext, Context, Handler, Message, StreamHandler, WrapFuture,
};
use common::utils::{
    error::CodecError,
    json_parser::{RelayMessages, Role, TripMessages, TripStatus},
};
use tokio::{
    io::{AsyncWriteExt, WriteHalf},
    net::TcpStream,
    sync::Mutex,
};

use super::central_relay::{
    AcceptTrip, CancelTrip, CentralRelay, EndRide, LookingForPassengers, RedirectNewTrip,
    RegisterConnection, RelayDriverLocation, RemoveConnection,
};

pub type RelayAddr = Addr<CentralRelay<Addr<ClientConnection>>>;

/// One identified driver or passenger socket.
pub struct ClientConnection {
    central_relay: RelayAddr,
    write_stream: Arc<Mutex<WriteHalf<TcpStream>>>,
    id: u32,
    role: Role,
    // Set once the relay accepted the identification
    registered: bool,
}

impl ClientConnection {
    pub fn new(
        central_relay: RelayAddr,
        write_stream: WriteHalf<TcpStream>,
        id: u32,
        role: Role,
    ) -> Self {
        Self {
            central_relay,
            write_stream: Arc::new(Mutex::new(write_stream)),
            id,
            role,
            registered: false,
        }
    }

    /// Tells the peer why it was refused, then closes.
    fn refuse(&self, detail: String, ctx: &mut Context<Self>) {
        let data = serde_json::to_string(&RelayMessages::TripResponse {
            status: TripStatus::Error,
            detail,
        })
        .unwrap_or_default();

        let w = self.write_stream.clone();
        wrap_future::<_, Self>(async move { write_line(&w, data).await })
            .map(|_, _act, ctx: &mut Context<Self>| ctx.stop())
            .wait(ctx);
    }

    fn forward<M>(&self, msg: M) -> Result<(), String>
    where
        M: Message + Send + 'static,
        M::Result: Send,
        CentralRelay<Addr<ClientConnection>>: Handler<M>,
    {
        if !self.central_relay.connected() {
            log::error!("{}:{}, relay is gone", std::file!(), std::line!());
            return Err("relay is gone".into());
        }

        self.central_relay.do_send(msg);
        Ok(())
    }
}

async fn write_line(w: &Mutex<WriteHalf<TcpStream>>, data: String) {
    let message = data + "\n";
    let mut writer = w.lock().await;

    let _ = writer.write_all(message.as_bytes()).await.inspect_err(|e| {
        log::error!("{}:{}, {}", std::file!(), std::line!(), e.to_string())
    });

    let _ = writer.flush().await.inspect_err(|e| {
        log::error!("{}:{}, {}", std::file!(), std::line!(), e.to_string())
    });
}

impl Actor for ClientConnection {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let msg = RegisterConnection {
            id: self.id,
            role: self.role,
            transport: ctx.address(),
        };

        // Nothing from the socket is handled before the relay answers
        self.central_relay
            .send(msg)
            .into_actor(self)
            .map(|res, act, ctx: &mut Context<Self>| match res {
                Ok(Ok(())) => {
                    act.registered = true;
                    log::debug!("{} {} registered", act.role, act.id);
                }
                Ok(Err(e)) => {
                    log::warn!("Refusing {} {}: {}", act.role, act.id, e);
                    act.refuse(e.to_string(), ctx);
                }
                Err(e) => {
                    log::error!("{}:{}, {}", std::file!(), std::line!(), e.to_string());
                    ctx.stop();
                }
            })
            .wait(ctx);
    }
}

impl StreamHandler<Result<String, CodecError>> for ClientConnection {
    fn handle(&mut self, msg: Result<String, CodecError>, ctx: &mut Self::Context) {
        match msg {
            Ok(data) => {
                log::debug!("recv from {} {}: {}", self.role, self.id, data);

                // notify keeps line order and is not bounded by the mailbox capacity
                ctx.notify(RecvAll { data });
            }
            Err(e) => log::error!("{}:{}, {}", std::file!(), std::line!(), e.to_string()),
        }
    }

    fn finished(&mut self, ctx: &mut Self::Context) {
        log::warn!("Broken pipe with {} {}", self.role, self.id);

        if self.registered {
            self.central_relay.do_send(RemoveConnection {
                id: self.id,
                role: self.role,
                transport: ctx.address(),
            });
        }

        ctx.stop();
    }
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct SendAll {
    pub data: String,
}

impl Handler<SendAll> for ClientConnection {
    type Result = ();

    /// Writes are awaited one at a time so the peer sees them in send order.
    fn handle(&mut self, msg: SendAll, ctx: &mut Context<Self>) -> Self::Result {
        log::debug!("send to {} {}: {}", self.role, self.id, msg.data);

        let w = self.write_stream.clone();
        wrap_future::<_, Self>(async move { write_line(&w, msg.data).await }).wait(ctx);
    }
}

#[derive(Message)]
#[rtype(result = "Result<(), String>")]
pub struct RecvAll {
    pub data: String,
}

impl Handler<RecvAll> for ClientConnection {
    type Result = Result<(), String>;

    fn handle(&mut self, msg: RecvAll, _ctx: &mut Context<Self>) -> Self::Result {
        if !self.registered {
            return Err(format!("{} {} is not registered", self.role, self.id));
        }

        let data: TripMessages = serde_json::from_str(&msg.data).map_err(|e| {
            log::error!("{}:{}, {}", std::file!(), std::line!(), e.to_string());
            e.to_string()
        })?;

        match (self.role, data) {
            (Role::Driver, TripMessages::PassengerRequest { origin }) => {
                self.forward(LookingForPassengers {
                    driver_id: self.id,
                    origin,
                })
            }

            (Role::Driver, TripMessages::Acceptance { passenger_id }) => self.forward(AcceptTrip {
                driver_id: self.id,
                passenger_id,
            }),

            (Role::Driver, TripMessages::DriverLocation { location }) => {
                self.forward(RelayDriverLocation {
                    driver_id: self.id,
                    location,
                })
            }

            (
                Role::Passenger,
                TripMessages::TaxiRequest {
                    origin,
                    destination,
                    polyline,
                },
            ) => self.forward(RedirectNewTrip {
                passenger_id: self.id,
                origin,
                destination,
                polyline,
            }),

            (Role::Passenger, TripMessages::CancelRequest {}) => self.forward(CancelTrip {
                passenger_id: self.id,
            }),

            (role, TripMessages::EndRide {}) => self.forward(EndRide { role, id: self.id }),

            (role, other) => {
                log::warn!("Ignoring {:?} from {} {}", other, role, self.id);
                Err(format!("{} cannot send that message", role))
            }
        }
    }
}
