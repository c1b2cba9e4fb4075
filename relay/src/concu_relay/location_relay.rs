use actix::MessageResponse;
use common::utils::json_parser::{LocationUpdate, RelayMessages, Role};

use super::{arbiter::AcceptanceArbiter, registry::ConnectionRegistry, transport::Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, MessageResponse)]
pub enum LocationOutcome {
    Forwarded { passenger_id: u32 },
    /// The driver has no active match
    NoMatch,
    /// Older than the last sample already forwarded
    Stale,
    /// Passenger gone or its transport failed, the sample is lost
    Lost,
}

/// Forwards a driver's position to its matched passenger, best effort and unbuffered.
pub fn relay_location<T: Transport>(
    registry: &mut ConnectionRegistry<T>,
    arbiter: &mut AcceptanceArbiter,
    driver_id: u32,
    update: LocationUpdate,
) -> LocationOutcome {
    let Some(active) = arbiter.for_driver_mut(driver_id) else {
        log::debug!("Dropping location of unmatched driver {}", driver_id);
        return LocationOutcome::NoMatch;
    };

    if let Some(last) = active.last_location {
        if update.timestamp_ms < last.timestamp_ms {
            log::debug!(
                "Dropping stale location of driver {} ({} < {})",
                driver_id,
                update.timestamp_ms,
                last.timestamp_ms
            );
            return LocationOutcome::Stale;
        }
    }

    active.last_location = Some(update);
    let passenger_id = active.passenger_id;

    registry.update_position(driver_id, update.position);

    let Some(passenger) = registry.get(Role::Passenger, passenger_id) else {
        return LocationOutcome::Lost;
    };

    match passenger
        .transport
        .deliver(&RelayMessages::DriverLocation { location: update })
    {
        Ok(()) => LocationOutcome::Forwarded { passenger_id },
        Err(e) => {
            log::warn!(
                "Location of driver {} lost for passenger {}: {}",
                driver_id,
                passenger_id,
                e
            );
            LocationOutcome::Lost
        }
    }
}

#[cfg(test)]
mod tests {
    use common::utils::{json_parser::RideRequest, position::Position};

    use super::*;
    use crate::concu_relay::transport::testing::RecordingTransport;

    fn update(ts: u64) -> LocationUpdate {
        LocationUpdate {
            position: Position::new(41.0, 29.0 + ts as f64 * 1e-4),
            timestamp_ms: ts,
        }
    }

    fn matched() -> (
        ConnectionRegistry<RecordingTransport>,
        AcceptanceArbiter,
        RecordingTransport,
        RecordingTransport,
    ) {
        let mut registry = ConnectionRegistry::new();
        let passenger = RecordingTransport::new();
        let driver = RecordingTransport::new();
        registry.register(1, Role::Passenger, passenger.clone()).unwrap();
        registry.register(7, Role::Driver, driver.clone()).unwrap();

        let mut arbiter = AcceptanceArbiter::new();
        arbiter
            .try_accept(
                7,
                &RideRequest {
                    passenger_id: 1,
                    origin: Position::new(41.0, 29.0),
                    destination: "ChIJdest".into(),
                    route: vec![],
                },
            )
            .unwrap();

        (registry, arbiter, passenger, driver)
    }

    #[test]
    fn forwards_to_the_matched_passenger_only() {
        let (mut registry, mut arbiter, passenger, driver) = matched();

        let outcome = relay_location(&mut registry, &mut arbiter, 7, update(1));

        assert_eq!(outcome, LocationOutcome::Forwarded { passenger_id: 1 });
        assert_eq!(
            passenger.messages(),
            vec![RelayMessages::DriverLocation { location: update(1) }]
        );
        assert!(driver.messages().is_empty());
        assert_eq!(
            registry.get(Role::Driver, 7).unwrap().position,
            Some(update(1).position)
        );
    }

    #[test]
    fn unmatched_driver_is_dropped() {
        let (mut registry, mut arbiter, passenger, _) = matched();
        registry.register(8, Role::Driver, RecordingTransport::new()).unwrap();

        let outcome = relay_location(&mut registry, &mut arbiter, 8, update(1));

        assert_eq!(outcome, LocationOutcome::NoMatch);
        assert!(passenger.messages().is_empty());
    }

    #[test]
    fn latest_sample_wins() {
        let (mut registry, mut arbiter, passenger, _) = matched();

        relay_location(&mut registry, &mut arbiter, 7, update(10));
        let outcome = relay_location(&mut registry, &mut arbiter, 7, update(5));

        assert_eq!(outcome, LocationOutcome::Stale);
        assert_eq!(passenger.messages().len(), 1);
        assert_eq!(arbiter.for_driver(7).unwrap().last_location, Some(update(10)));
    }

    #[test]
    fn unreachable_passenger_loses_the_sample() {
        let (mut registry, mut arbiter, passenger, _) = matched();
        passenger.close();

        assert_eq!(
            relay_location(&mut registry, &mut arbiter, 7, update(1)),
            LocationOutcome::Lost
        );
    }
}
