pub mod consts;
pub mod driver;
pub mod handle_trip;
pub mod input_handler;
pub mod relay_connection;
