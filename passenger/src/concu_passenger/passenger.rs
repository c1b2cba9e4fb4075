use std::error::Error;

use common::utils::{
    directions::DirectionsClient,
    json_parser::{CommonMessages, RelayMessages, Role, TripMessages, TripStatus},
    line_codec::{read_message, write_message},
};
use tokio::{
    io::{split, AsyncBufRead, AsyncWrite, BufReader},
    net::TcpStream,
};

use crate::concu_passenger::{consts::MAX_REQUEST_ATTEMPTS, utils::TripData};

#[derive(Debug, PartialEq)]
pub enum RideOutcome {
    /// The ride ended, normally at the destination
    Arrived,
    /// Cancelled or expired; the request may be sent again
    RequestAgain(String),
}

/// Handles a complete trip
/// - Resolves the route
/// - Identifies with the relay
/// - Requests a taxi until the ride ends or the attempts run out
#[tokio::main]
pub(crate) async fn handle_complete_trip(trip_data: TripData) -> Result<(), Box<dyn Error>> {
    let polyline = resolve_route(&trip_data).await?;

    let socket = TcpStream::connect(&trip_data.relay).await.map_err(|e| {
        log::error!("{}:{}, {}", std::file!(), std::line!(), e.to_string());
        format!("Error connecting with relay {}, reason: {}", trip_data.relay, e)
    })?;

    let (r, mut w) = split(socket);
    let mut reader = BufReader::new(r);

    identify(&mut reader, &mut w, trip_data.id).await?;

    request_trip(
        &mut reader,
        &mut w,
        &trip_data,
        &polyline,
        MAX_REQUEST_ATTEMPTS,
    )
    .await
}

/// The route given on the command line wins; otherwise ask the directions provider.
async fn resolve_route(trip_data: &TripData) -> Result<String, Box<dyn Error>> {
    if let Some(route) = &trip_data.route {
        return Ok(route.clone());
    }

    let client = DirectionsClient::from_env().inspect_err(|e| log::error!("{}", e))?;

    let route = client
        .route(&trip_data.origin, &trip_data.destination)
        .await
        .inspect_err(|e| log::error!("{}", e))?;

    log::info!(
        "Route to {} resolved with {} points",
        route.destination,
        route.points.len()
    );

    Ok(route.polyline)
}

/// Sends the identification and waits for the relay to accept it
pub async fn identify<R, W>(reader: &mut R, writer: &mut W, id: u32) -> Result<(), Box<dyn Error>>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    write_message(
        writer,
        &CommonMessages::Identification {
            id,
            role: Role::Passenger,
        },
    )
    .await?;

    match read_message::<_, RelayMessages>(reader).await? {
        Some(RelayMessages::Registered { id, .. }) => {
            log::info!("Registered as passenger {}", id);
            Ok(())
        }
        Some(RelayMessages::TripResponse { detail, .. }) => Err(detail.into()),
        Some(other) => Err(format!("Unexpected handshake answer {:?}", other).into()),
        None => Err("Relay closed the connection".into()),
    }
}

/// Requests the trip again when the driver is lost or nobody accepts in time
pub async fn request_trip<R, W>(
    reader: &mut R,
    writer: &mut W,
    trip_data: &TripData,
    polyline: &str,
    max_attempts: u32,
) -> Result<(), Box<dyn Error>>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    for attempt in 1..=max_attempts {
        log::info!("Requesting trip ({}/{})", attempt, max_attempts);

        write_message(
            writer,
            &TripMessages::TaxiRequest {
                origin: trip_data.origin,
                destination: trip_data.destination.clone(),
                polyline: polyline.to_string(),
            },
        )
        .await
        .inspect_err(|e| log::error!("{}:{}, {}", std::file!(), std::line!(), e.to_string()))?;

        match wait_relay_responses(reader).await? {
            RideOutcome::Arrived => return Ok(()),
            RideOutcome::RequestAgain(reason) => log::warn!("{}, requesting trip again", reason),
        }
    }

    Err(format!("No ride after {} attempts. Exiting the program.", max_attempts).into())
}

pub async fn wait_relay_responses<R>(reader: &mut R) -> Result<RideOutcome, Box<dyn Error>>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let response = read_message::<_, RelayMessages>(reader)
            .await?
            .ok_or("Relay closed the connection")?;

        match response {
            RelayMessages::TripResponse { status, detail } => match status {
                TripStatus::Error => return Err(detail.into()),
                TripStatus::RequestDelivered | TripStatus::Info | TripStatus::Success => {
                    log::info!("{}", detail)
                }
            },
            RelayMessages::RouteUnavailable { detail } => {
                log::error!("Route unavailable: {}", detail);
                return Err(format!("route unavailable: {}", detail).into());
            }
            RelayMessages::Matched { driver_id } => {
                log::info!("[TRIP] Driver {} will pick you up", driver_id)
            }
            RelayMessages::DriverLocation { location } => {
                log::info!("Driver is at {}", location.position)
            }
            RelayMessages::RideCancelled { reason } => return Ok(RideOutcome::RequestAgain(reason)),
            RelayMessages::RequestExpired {} => {
                return Ok(RideOutcome::RequestAgain(
                    "No driver accepted in time".into(),
                ))
            }
            RelayMessages::RideEnded { by } => {
                log::info!("[TRIP] We arrived at your destination! (ended by the {})", by);
                return Ok(RideOutcome::Arrived);
            }
            other => log::debug!("Ignoring {:?}", other),
        }
    }
}
