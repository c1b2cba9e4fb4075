use std::error::Error;

use concu_driver::{
    driver::drive,
    input_handler::{validate_args, DriverSettings},
};

pub mod concu_driver;

/// Reads `id=<n> origin=(lat,lng) [relay=host:port]` and drives until the relay goes away
pub fn run() -> Result<(), Box<dyn Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    let args = validate_args(&argv)
        .map_err(|e| format!("{}\nexpected: <program> id=<n> origin=(lat,lng) [relay=host:port]", e))?;

    log::info!("Driver {} starting at {}", args.id, args.origin);

    drive(args, DriverSettings::default())
}
