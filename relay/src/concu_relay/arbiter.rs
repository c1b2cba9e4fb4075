use std::collections::{hash_map::Entry, HashMap};

use common::utils::json_parser::{LocationUpdate, RideRequest};

use super::error::RelayError;

#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub passenger_id: u32,
    pub driver_id: u32,
    pub request: RideRequest,
    /// Last update forwarded to the passenger
    pub last_location: Option<LocationUpdate>,
}

/// Active matches, indexed from both sides.
///
/// `try_accept` is a compare-and-set on match existence: callers must hold
/// `&mut self`, so whoever owns the arbiter is the serialization point.
#[derive(Debug, Default)]
pub struct AcceptanceArbiter {
    by_passenger: HashMap<u32, Match>,
    by_driver: HashMap<u32, u32>,
}

impl AcceptanceArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// First acceptance wins. Later ones for the same passenger get `AlreadyMatched`.
    pub fn try_accept(&mut self, driver_id: u32, request: &RideRequest) -> Result<&Match, RelayError> {
        let passenger_id = request.passenger_id;

        if self.by_driver.contains_key(&driver_id) && !self.by_passenger.contains_key(&passenger_id) {
            return Err(RelayError::DriverBusy(driver_id));
        }

        match self.by_passenger.entry(passenger_id) {
            Entry::Occupied(_) => Err(RelayError::AlreadyMatched(passenger_id)),
            Entry::Vacant(slot) => {
                self.by_driver.insert(driver_id, passenger_id);

                Ok(slot.insert(Match {
                    passenger_id,
                    driver_id,
                    request: request.clone(),
                    last_location: None,
                }))
            }
        }
    }

    pub fn for_passenger(&self, passenger_id: u32) -> Option<&Match> {
        self.by_passenger.get(&passenger_id)
    }

    pub fn for_driver(&self, driver_id: u32) -> Option<&Match> {
        self.by_driver
            .get(&driver_id)
            .and_then(|pid| self.by_passenger.get(pid))
    }

    pub fn for_driver_mut(&mut self, driver_id: u32) -> Option<&mut Match> {
        let pid = self.by_driver.get(&driver_id)?;
        self.by_passenger.get_mut(pid)
    }

    pub fn dissolve_by_passenger(&mut self, passenger_id: u32) -> Option<Match> {
        let m = self.by_passenger.remove(&passenger_id)?;
        self.by_driver.remove(&m.driver_id);
        Some(m)
    }

    pub fn dissolve_by_driver(&mut self, driver_id: u32) -> Option<Match> {
        let pid = self.by_driver.remove(&driver_id)?;
        self.by_passenger.remove(&pid)
    }

    pub fn len(&self) -> usize {
        self.by_passenger.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_passenger.is_empty()
    }
}
