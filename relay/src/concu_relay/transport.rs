use actix::Addr;
use common::utils::json_parser::RelayMessages;

use super::{client_connection::{ClientConnection, SendAll}, error::RelayError};

/// Outbound half of a client connection.
///
/// Equality identifies the underlying connection, so a refused duplicate
/// cannot deregister the connection that owns the id.
pub trait Transport: PartialEq {
    fn deliver(&self, message: &RelayMessages) -> Result<(), RelayError>;
}

impl Transport for Addr<ClientConnection> {
    fn deliver(&self, message: &RelayMessages) -> Result<(), RelayError> {
        if !self.connected() {
            return Err(RelayError::Delivery("connection closed".into()));
        }

        let data =
            serde_json::to_string(message).map_err(|e| RelayError::Delivery(e.to_string()))?;

        // do_send ignores the mailbox capacity, location bursts must not fail here
        self.do_send(SendAll { data });

        Ok(())
    }
}
