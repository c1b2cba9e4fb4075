use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolylineError {
    #[error("invalid character {character:?} at byte {index}")]
    InvalidCharacter { character: char, index: usize },

    #[error("truncated value at byte {0}")]
    Truncated(usize),

    #[error("latitude without longitude at byte {0}")]
    MissingLongitude(usize),

    #[error("value starting at byte {0} overflows")]
    Overflow(usize),

    #[error("coordinate starting at byte {0} is off the globe")]
    OutOfRange(usize),
}

#[derive(Error, Debug)]
pub enum DirectionsError {
    #[error("route unavailable: {0}")]
    Http(#[from] reqwest::Error),

    #[error("route unavailable: provider answered {0}")]
    Api(String),

    #[error("route unavailable: no route found")]
    NoRoute,

    #[error("route unavailable: {0}")]
    Polyline(#[from] PolylineError),

    #[error("route unavailable: no api key in {0}")]
    MissingApiKey(&'static str),
}

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("line longer than {0} bytes")]
    LineTooLong(usize),
}
