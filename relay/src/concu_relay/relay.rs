use std::{error::Error, net::SocketAddr};

use actix::{Addr, System};
use tokio::task::JoinHandle;

use super::{
    central_relay::CentralRelay, client_connection::ClientConnection, config::RelayConfig,
    connections_handler::ConnectionsHandler,
};

pub fn serve(config: RelayConfig) -> Result<(), Box<dyn Error>> {
    System::new().block_on(listen(config))?;

    Ok(())
}

/// Binds the relay and starts accepting connections on the current actix system.
/// Returns the bound address, useful when the configured port is 0.
pub async fn start(
    config: &RelayConfig,
) -> Result<(SocketAddr, JoinHandle<Result<(), String>>), Box<dyn Error>> {
    let central_relay = CentralRelay::<Addr<ClientConnection>>::create_new(config.request_timeout());

    let listener = ConnectionsHandler::bind(&config.addr()).await?;
    let local_addr = listener.local_addr()?;

    let task = ConnectionsHandler::run(listener, central_relay, config.handshake_timeout());

    Ok((local_addr, task))
}

async fn listen(config: RelayConfig) -> Result<(), Box<dyn Error>> {
    let (_, connections_task) = start(&config).await?;

    connections_task.await.map_err(|e| {
        log::error!("{}:{}, {}", std::file!(), std::line!(), e.to_string());
        e.to_string()
    })??;

    Ok(())
}
