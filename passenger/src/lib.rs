use concu_passenger::input_handler;
use concu_passenger::passenger::handle_complete_trip;
use std::error::Error;

pub mod concu_passenger;

pub fn run() -> Result<(), Box<dyn Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    match input_handler::validate_args(&argv) {
        Ok(trip_data) => {
            log::info!("Validated trip data: {:?}", trip_data);
            handle_complete_trip(trip_data)?;
            Ok(())
        }
        Err(error) => {
            eprintln!(
                "{}\nexpected: <program> id=<n> origin=(lat,lng) dest=<place_id> [route=<polyline>] [relay=host:port]",
                error
            );
            Err(Box::from(error))
        }
    }
}
