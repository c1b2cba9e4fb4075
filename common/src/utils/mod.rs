pub mod consts;
pub mod directions;
pub mod error;
pub mod input_handler;
pub mod json_parser;
pub mod line_codec;
pub mod polyline;
pub mod position;
