use std::{error::Error, path::Path};

use concu_relay::{config, relay::serve};

pub mod concu_relay;

/// Runs the relay, optionally reading its configuration from the TOML file in argv[1]
pub fn run() -> Result<(), Box<dyn Error>> {
    let argv: Vec<String> = std::env::args().collect();

    if argv.len() > 2 {
        return Err("Wrong args, expected: <program> [config.toml]".into());
    }

    let config = config::load(argv.get(1).map(Path::new))?;

    log::info!("Starting relay with {:?}", config);

    serve(config)
}
