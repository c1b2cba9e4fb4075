use std::time::Duration;

use common::utils::{
    consts::MAX_LINE_BYTES,
    json_parser::{CommonMessages, LocationUpdate, RelayMessages, Role, TripMessages, TripStatus},
    line_codec::{read_message, write_message},
    position::Position,
};
use relay::concu_relay::{config::RelayConfig, relay::start};
use tokio::{
    io::{split, AsyncWriteExt, BufReader, ReadHalf, WriteHalf},
    net::TcpStream,
    time::timeout,
};

const ROUTE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";
const WAIT: Duration = Duration::from_secs(2);

struct Client {
    reader: BufReader<ReadHalf<TcpStream>>,
    writer: WriteHalf<TcpStream>,
}

impl Client {
    async fn raw(addr: &str) -> Self {
        let socket = TcpStream::connect(addr).await.unwrap();
        let (r, w) = split(socket);

        Self {
            reader: BufReader::new(r),
            writer: w,
        }
    }

    async fn identify(addr: &str, id: u32, role: Role) -> Self {
        let mut client = Self::raw(addr).await;
        write_message(
            &mut client.writer,
            &CommonMessages::Identification { id, role },
        )
        .await
        .unwrap();

        client
    }

    async fn connect(addr: &str, id: u32, role: Role) -> Self {
        let mut client = Self::identify(addr, id, role).await;
        assert_eq!(
            client.recv().await,
            Some(RelayMessages::Registered { id, role })
        );

        client
    }

    async fn send(&mut self, message: TripMessages) {
        write_message(&mut self.writer, &message).await.unwrap();
    }

    async fn recv(&mut self) -> Option<RelayMessages> {
        timeout(WAIT, read_message(&mut self.reader))
            .await
            .expect("relay did not answer in time")
            .unwrap()
    }
}

async fn spawn_relay(config: RelayConfig) -> String {
    let (addr, _task) = start(&RelayConfig {
        host: "127.0.0.1".into(),
        port: 0,
        ..config
    })
    .await
    .unwrap();

    addr.to_string()
}

#[actix::test]
async fn ride_is_matched_and_tracked_over_tcp() {
    let addr = spawn_relay(RelayConfig::default()).await;

    let mut passenger = Client::connect(&addr, 1, Role::Passenger).await;
    let mut fast = Client::connect(&addr, 10, Role::Driver).await;
    let mut slow = Client::connect(&addr, 11, Role::Driver).await;

    passenger
        .send(TripMessages::TaxiRequest {
            origin: Position::new(38.5, -120.2),
            destination: "ChIJdest".into(),
            polyline: ROUTE.into(),
        })
        .await;

    assert!(matches!(
        passenger.recv().await,
        Some(RelayMessages::TripResponse {
            status: TripStatus::RequestDelivered,
            ..
        })
    ));
    for driver in [&mut fast, &mut slow] {
        match driver.recv().await {
            Some(RelayMessages::TaxiRequest { request }) => {
                assert_eq!(request.passenger_id, 1);
                assert_eq!(request.route.len(), 3);
            }
            other => panic!("expected a taxi request, got {:?}", other),
        }
    }

    fast.send(TripMessages::Acceptance { passenger_id: 1 }).await;
    assert!(matches!(
        fast.recv().await,
        Some(RelayMessages::AcceptanceConfirmed { passenger_id: 1, .. })
    ));
    assert_eq!(
        passenger.recv().await,
        Some(RelayMessages::Matched { driver_id: 10 })
    );

    slow.send(TripMessages::Acceptance { passenger_id: 1 }).await;
    assert_eq!(
        slow.recv().await,
        Some(RelayMessages::AlreadyMatched { passenger_id: 1 })
    );

    let location = LocationUpdate {
        position: Position::new(38.6, -120.3),
        timestamp_ms: 1,
    };
    fast.send(TripMessages::DriverLocation { location }).await;
    assert_eq!(
        passenger.recv().await,
        Some(RelayMessages::DriverLocation { location })
    );

    drop(fast);
    assert!(matches!(
        passenger.recv().await,
        Some(RelayMessages::RideCancelled { .. })
    ));
}

#[actix::test]
async fn duplicate_identity_is_refused() {
    let addr = spawn_relay(RelayConfig::default()).await;
    let _first = Client::connect(&addr, 7, Role::Driver).await;

    let mut second = Client::identify(&addr, 7, Role::Driver).await;

    assert!(matches!(
        second.recv().await,
        Some(RelayMessages::TripResponse {
            status: TripStatus::Error,
            ..
        })
    ));
    assert_eq!(second.recv().await, None);
}

#[actix::test]
async fn silent_connections_are_closed() {
    let addr = spawn_relay(RelayConfig {
        handshake_timeout_ms: 100,
        ..RelayConfig::default()
    })
    .await;

    let mut client = Client::raw(&addr).await;

    assert_eq!(client.recv().await, None);
}

#[actix::test]
async fn undecodable_route_is_reported_to_the_passenger() {
    let addr = spawn_relay(RelayConfig::default()).await;
    let mut passenger = Client::connect(&addr, 1, Role::Passenger).await;
    let mut driver = Client::connect(&addr, 10, Role::Driver).await;

    passenger
        .send(TripMessages::TaxiRequest {
            origin: Position::new(38.5, -120.2),
            destination: "ChIJdest".into(),
            polyline: "_p~iF ~ps|U".into(),
        })
        .await;

    assert!(matches!(
        passenger.recv().await,
        Some(RelayMessages::RouteUnavailable { .. })
    ));

    // Nothing was broadcast, so there is nothing to accept
    driver
        .send(TripMessages::Acceptance { passenger_id: 1 })
        .await;
    assert!(matches!(
        driver.recv().await,
        Some(RelayMessages::TripResponse {
            status: TripStatus::Error,
            ..
        })
    ));
}

#[actix::test]
async fn hostile_route_does_not_stop_the_relay() {
    let addr = spawn_relay(RelayConfig::default()).await;
    let mut passenger = Client::connect(&addr, 1, Role::Passenger).await;

    let big = format!("}}{}F", "~".repeat(11));
    passenger
        .send(TripMessages::TaxiRequest {
            origin: Position::new(38.5, -120.2),
            destination: "ChIJdest".into(),
            polyline: format!("{b}?{b}?{b}?", b = big),
        })
        .await;

    assert!(matches!(
        passenger.recv().await,
        Some(RelayMessages::RouteUnavailable { .. })
    ));

    // Still registering and broadcasting
    let mut driver = Client::connect(&addr, 10, Role::Driver).await;
    passenger
        .send(TripMessages::TaxiRequest {
            origin: Position::new(38.5, -120.2),
            destination: "ChIJdest".into(),
            polyline: ROUTE.into(),
        })
        .await;

    assert!(matches!(
        driver.recv().await,
        Some(RelayMessages::TaxiRequest { .. })
    ));
}

#[actix::test]
async fn endless_identification_line_is_closed() {
    let addr = spawn_relay(RelayConfig {
        handshake_timeout_ms: 60_000,
        ..RelayConfig::default()
    })
    .await;

    let mut client = Client::raw(&addr).await;
    client
        .writer
        .write_all("x".repeat(MAX_LINE_BYTES).as_bytes())
        .await
        .unwrap();

    // Closed long before the handshake timeout, as EOF or a reset
    let answer = timeout(WAIT, read_message::<_, RelayMessages>(&mut client.reader))
        .await
        .expect("relay kept the connection open");
    assert!(!matches!(answer, Ok(Some(_))));
}
