//! Thin client for the Google Directions JSON API.
//!
//! Only the overview polyline and the destination place id are read from the
//! response. Every failure surfaces as a [`DirectionsError`], which displays as
//! "route unavailable"; there is no retry.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

use super::{
    consts::{DIRECTIONS_API_KEY_ENV, DIRECTIONS_URL},
    error::DirectionsError,
    polyline,
    position::Position,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// A resolved route between the passenger and the destination.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub polyline: String,
    pub destination: String,
    pub points: Vec<Position>,
}

#[derive(Debug, Clone)]
pub struct DirectionsClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl DirectionsClient {
    pub fn new(endpoint: &str, api_key: String) -> Result<Self, DirectionsError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Builds a client against the public endpoint with the key from the environment.
    pub fn from_env() -> Result<Self, DirectionsError> {
        let api_key = std::env::var(DIRECTIONS_API_KEY_ENV)
            .map_err(|_| DirectionsError::MissingApiKey(DIRECTIONS_API_KEY_ENV))?;

        Self::new(DIRECTIONS_URL, api_key)
    }

    pub async fn route(
        &self,
        origin: &Position,
        destination_place_id: &str,
    ) -> Result<Route, DirectionsError> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| DirectionsError::Api(format!("bad endpoint: {}", e)))?;

        url.query_pairs_mut()
            .append_pair(
                "origin",
                &format!("{},{}", origin.latitude, origin.longitude),
            )
            .append_pair("destination", &format!("place_id:{}", destination_place_id))
            .append_pair("key", &self.api_key);

        log::debug!("Requesting directions to {}", destination_place_id);

        let response: DirectionsResponse = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_response(response, destination_place_id)
    }
}

#[derive(Debug, Deserialize)]
pub struct DirectionsResponse {
    pub status: String,
    #[serde(default)]
    pub geocoded_waypoints: Vec<GeocodedWaypoint>,
    #[serde(default)]
    pub routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodedWaypoint {
    pub place_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DirectionsRoute {
    pub overview_polyline: OverviewPolyline,
}

#[derive(Debug, Deserialize)]
pub struct OverviewPolyline {
    pub points: String,
}

/// Picks the first route. The destination falls back to the last geocoded
/// waypoint when the caller did not know the place id.
pub fn parse_response(
    response: DirectionsResponse,
    destination_place_id: &str,
) -> Result<Route, DirectionsError> {
    if response.status != "OK" {
        return Err(DirectionsError::Api(response.status));
    }

    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or(DirectionsError::NoRoute)?;

    let points = polyline::decode(&route.overview_polyline.points)?;
    if points.is_empty() {
        return Err(DirectionsError::NoRoute);
    }

    let destination = if destination_place_id.is_empty() {
        response
            .geocoded_waypoints
            .last()
            .and_then(|w| w.place_id.clone())
            .unwrap_or_default()
    } else {
        destination_place_id.to_string()
    };

    Ok(Route {
        polyline: route.overview_polyline.points,
        destination,
        points,
    })
}
