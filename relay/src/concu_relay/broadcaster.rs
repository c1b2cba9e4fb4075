use common::utils::json_parser::{RelayMessages, RideRequest};

use super::{registry::ConnectionRegistry, transport::Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Fans the request out to every driver registered right now.
///
/// Nothing is kept: drivers that connect later never see this request.
pub fn broadcast_request<T: Transport>(
    registry: &ConnectionRegistry<T>,
    request: &RideRequest,
) -> BroadcastReport {
    let message = RelayMessages::TaxiRequest {
        request: request.clone(),
    };

    let mut report = BroadcastReport::default();

    for driver in registry.drivers() {
        match driver.transport.deliver(&message) {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                log::warn!(
                    "Could not deliver request of passenger {} to driver {}: {}",
                    request.passenger_id,
                    driver.id,
                    e
                );
                report.failed += 1;
            }
        }
    }

    log::info!(
        "[TRIP] Request of passenger {} broadcast to {} drivers",
        request.passenger_id,
        report.delivered
    );

    report
}

#[cfg(test)]
mod tests {
    use common::utils::{json_parser::Role, position::Position};

    use super::*;
    use crate::concu_relay::transport::testing::RecordingTransport;

    fn request() -> RideRequest {
        RideRequest {
            passenger_id: 5,
            origin: Position::new(41.0, 29.0),
            destination: "ChIJdest".into(),
            route: vec![],
        }
    }

    #[test]
    fn reaches_every_driver_and_no_passenger() {
        let mut registry = ConnectionRegistry::new();
        let d1 = RecordingTransport::new();
        let d2 = RecordingTransport::new();
        let p = RecordingTransport::new();
        registry.register(1, Role::Driver, d1.clone()).unwrap();
        registry.register(2, Role::Driver, d2.clone()).unwrap();
        registry.register(5, Role::Passenger, p.clone()).unwrap();

        let report = broadcast_request(&registry, &request());

        assert_eq!(report, BroadcastReport { delivered: 2, failed: 0 });
        let expected = RelayMessages::TaxiRequest { request: request() };
        assert_eq!(d1.messages(), vec![expected.clone()]);
        assert_eq!(d2.messages(), vec![expected]);
        assert!(p.messages().is_empty());
    }

    #[test]
    fn zero_drivers_is_fine() {
        let registry: ConnectionRegistry<RecordingTransport> = ConnectionRegistry::new();

        assert_eq!(broadcast_request(&registry, &request()), BroadcastReport::default());
    }

    #[test]
    fn a_dead_driver_does_not_stop_the_fan_out() {
        let mut registry = ConnectionRegistry::new();
        let dead = RecordingTransport::new();
        dead.close();
        let alive = RecordingTransport::new();
        registry.register(1, Role::Driver, dead).unwrap();
        registry.register(2, Role::Driver, alive.clone()).unwrap();

        let report = broadcast_request(&registry, &request());

        assert_eq!(report, BroadcastReport { delivered: 1, failed: 1 });
        assert_eq!(alive.messages().len(), 1);
    }
}
