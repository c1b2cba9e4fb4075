use std::error::Error;

use common::utils::consts::LOG_LEVEL;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::builder()
        .filter_level(LOG_LEVEL)
        .parse_default_env()
        .init();

    relay::run()
}
