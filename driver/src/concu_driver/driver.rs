use std::error::Error;

use actix::{Actor, Addr, AsyncContext, System};
use common::utils::{
    json_parser::{CommonMessages, RelayMessages, Role},
    line_codec::{read_message, write_message},
};
use tokio::{
    io::{split, AsyncBufReadExt, BufReader},
    net::TcpStream,
};
use tokio_stream::wrappers::LinesStream;

use super::{
    handle_trip::TripHandler,
    input_handler::{DriverArgs, DriverSettings},
    relay_connection::RelayConnection,
};

pub fn drive(args: DriverArgs, settings: DriverSettings) -> Result<(), Box<dyn Error>> {
    let system = System::new();
    system.block_on(connect(args, settings))?;
    system.run()?;

    Ok(())
}

/// Identifies with the relay and starts the driver actors on the current system.
pub async fn connect(
    args: DriverArgs,
    settings: DriverSettings,
) -> Result<Addr<RelayConnection>, Box<dyn Error>> {
    let socket = TcpStream::connect(&args.relay).await.map_err(|e| {
        log::error!("{}:{}, {}", std::file!(), std::line!(), e.to_string());
        format!("Error connecting with relay {}, reason: {}", args.relay, e)
    })?;

    let (r, mut w) = split(socket);
    let mut reader = BufReader::new(r);

    write_message(
        &mut w,
        &CommonMessages::Identification {
            id: args.id,
            role: Role::Driver,
        },
    )
    .await?;

    match read_message::<_, RelayMessages>(&mut reader).await? {
        Some(RelayMessages::Registered { id, .. }) => log::info!("Registered as driver {}", id),
        Some(RelayMessages::TripResponse { detail, .. }) => return Err(detail.into()),
        Some(other) => return Err(format!("Unexpected handshake answer {:?}", other).into()),
        None => return Err("Relay closed the connection".into()),
    }

    let relay_conn = RelayConnection::create(|ctx| {
        ctx.add_stream(LinesStream::new(reader.lines()));
        let trip_handler = TripHandler::new(ctx.address(), args.origin, settings).start();
        RelayConnection::new(w, trip_handler, args.id)
    });

    Ok(relay_conn)
}
