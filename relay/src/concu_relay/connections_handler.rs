use std::time::Duration;

use actix::{Actor, AsyncContext};
use common::utils::{
    json_parser::CommonMessages,
    line_codec::{lines, read_message},
};
use tokio::{
    io::{split, BufReader},
    net::{TcpListener, TcpStream},
    task::JoinHandle,
    time::timeout,
};

use super::client_connection::{ClientConnection, RelayAddr};

pub struct ConnectionsHandler;

impl ConnectionsHandler {
    pub async fn bind(addr: &str) -> Result<TcpListener, String> {
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            log::error!("{}:{}, {}", std::file!(), std::line!(), e.to_string());
            e.to_string()
        })?;

        log::info!("My addr is {}", addr);

        Ok(listener)
    }

    /// Accepts connections until the listener fails
    pub fn run(
        listener: TcpListener,
        central_relay: RelayAddr,
        handshake_timeout: Duration,
    ) -> JoinHandle<Result<(), String>> {
        actix::spawn(async move { Self::listen(listener, central_relay, handshake_timeout).await })
    }

    async fn listen(
        listener: TcpListener,
        central_relay: RelayAddr,
        handshake_timeout: Duration,
    ) -> Result<(), String> {
        log::info!("Listening to new connections!");

        loop {
            let (socket, addr) = listener.accept().await.map_err(|e| {
                log::error!("{}:{}, {}", std::file!(), std::line!(), e.to_string());
                e.to_string()
            })?;

            log::debug!("Connection accepted from {}", addr);

            // A slow client must not hold up the accept loop
            let central_relay = central_relay.clone();
            actix::spawn(async move {
                if let Err(e) = Self::identify(socket, central_relay, handshake_timeout).await {
                    log::warn!("Dropping connection from {}: {}", addr, e);
                }
            });
        }
    }

    /// The first line must be an identification. Anything else, an over-long line,
    /// or silence past `handshake_timeout` closes the socket.
    async fn identify(
        socket: TcpStream,
        central_relay: RelayAddr,
        handshake_timeout: Duration,
    ) -> Result<(), String> {
        let (r, w) = split(socket);
        let mut reader = BufReader::new(r);

        let identification: Option<CommonMessages> =
            timeout(handshake_timeout, read_message(&mut reader))
                .await
                .map_err(|_| format!("no identification within {:?}", handshake_timeout))?
                .map_err(|e| e.to_string())?;

        let Some(CommonMessages::Identification { id, role }) = identification else {
            return Err("closed before identifying".into());
        };

        log::debug!("Identified {} {}", role, id);

        // Keep the BufReader, it may already hold lines sent right after the identification
        ClientConnection::create(|ctx| {
            ctx.add_stream(lines(reader));
            ClientConnection::new(central_relay, w, id, role)
        });

        Ok(())
    }
}
