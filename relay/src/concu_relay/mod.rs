pub mod arbiter;
pub mod broadcaster;
pub mod central_relay;
pub mod client_connection;
pub mod config;
pub mod connections_handler;
pub mod consts;
pub mod error;
pub mod location_relay;
pub mod registry;
pub mod relay;
pub mod ride_relay;
pub mod session;
pub mod transport;
