pub mod consts;
pub mod input_handler;
pub mod passenger;
pub mod utils;
