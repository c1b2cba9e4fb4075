use std::collections::HashMap;

use common::utils::{json_parser::Role, position::Position};

use super::error::RelayError;

#[derive(Debug)]
pub struct Connection<T> {
    pub id: u32,
    pub role: Role,
    pub transport: T,
    /// Last position the client reported, drivers only
    pub position: Option<Position>,
}

/// Active connections, one id space per role.
#[derive(Debug)]
pub struct ConnectionRegistry<T> {
    drivers: HashMap<u32, Connection<T>>,
    passengers: HashMap<u32, Connection<T>>,
}

impl<T> Default for ConnectionRegistry<T> {
    fn default() -> Self {
        Self {
            drivers: HashMap::new(),
            passengers: HashMap::new(),
        }
    }
}

impl<T: PartialEq> ConnectionRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, role: Role) -> &HashMap<u32, Connection<T>> {
        match role {
            Role::Driver => &self.drivers,
            Role::Passenger => &self.passengers,
        }
    }

    fn table_mut(&mut self, role: Role) -> &mut HashMap<u32, Connection<T>> {
        match role {
            Role::Driver => &mut self.drivers,
            Role::Passenger => &mut self.passengers,
        }
    }

    pub fn register(&mut self, id: u32, role: Role, transport: T) -> Result<(), RelayError> {
        let table = self.table_mut(role);

        if table.contains_key(&id) {
            return Err(RelayError::AlreadyConnected { role, id });
        }

        table.insert(
            id,
            Connection {
                id,
                role,
                transport,
                position: None,
            },
        );

        Ok(())
    }

    /// Removes the connection only if `transport` is the one that registered it.
    pub fn deregister(&mut self, role: Role, id: u32, transport: &T) -> Option<Connection<T>> {
        let table = self.table_mut(role);

        match table.get(&id) {
            Some(conn) if conn.transport == *transport => table.remove(&id),
            _ => None,
        }
    }

    pub fn get(&self, role: Role, id: u32) -> Option<&Connection<T>> {
        self.table(role).get(&id)
    }

    pub fn contains(&self, role: Role, id: u32) -> bool {
        self.table(role).contains_key(&id)
    }

    pub fn drivers(&self) -> impl Iterator<Item = &Connection<T>> {
        self.drivers.values()
    }

    pub fn passengers(&self) -> impl Iterator<Item = &Connection<T>> {
        self.passengers.values()
    }

    pub fn update_position(&mut self, driver_id: u32, position: Position) {
        if let Some(conn) = self.drivers.get_mut(&driver_id) {
            conn.position = Some(position);
        }
    }
}
