use common::utils::position::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct TripData {
    pub id: u32,
    pub origin: Position,
    /// Destination place id
    pub destination: String,
    /// Pre-encoded route; resolved with the directions provider when absent
    pub route: Option<String>,
    pub relay: String,
}
