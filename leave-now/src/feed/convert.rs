//! Conversion from feed DTOs to domain types.

use crate::domain::{LiveArrival, minutes_from_seconds};

use super::error::FeedError;
use super::types::{ArrivalItem, ArrivalResponse};

/// Result code the service uses for success.
const RESULT_OK: &str = "00";

/// Error during DTO to domain conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// Decode a raw response body into live arrivals, in feed order.
///
/// The service answers some failures (bad key, quota) with an XML envelope
/// under a 200 status, so the body is sniffed before JSON parsing.
pub fn parse_arrivals(body: &str) -> Result<Vec<LiveArrival>, FeedError> {
    if body.contains("<OpenAPI_ServiceResponse>") || body.contains("SERVICE ERROR") {
        return Err(FeedError::Service {
            code: extract_xml_tag(body, "returnReasonCode").unwrap_or_else(|| "xml".to_string()),
            message: extract_xml_tag(body, "returnAuthMsg")
                .or_else(|| extract_xml_tag(body, "errMsg"))
                .unwrap_or_else(|| "SERVICE ERROR".to_string()),
        });
    }

    let response: ArrivalResponse = serde_json::from_str(body).map_err(|e| FeedError::Json {
        message: e.to_string(),
        body: Some(body.chars().take(500).collect()),
    })?;

    convert_response(response)
}

/// Convert a decoded response, checking the result code.
pub fn convert_response(response: ArrivalResponse) -> Result<Vec<LiveArrival>, FeedError> {
    let header = response.response.header;
    if header.result_code != RESULT_OK {
        return Err(FeedError::Service {
            code: header.result_code,
            message: header.result_msg,
        });
    }

    let items = response
        .response
        .body
        .map(|b| b.items.into_vec())
        .unwrap_or_default();

    let mut arrivals = Vec::with_capacity(items.len());
    for item in &items {
        match convert_arrival_item(item) {
            Ok(arrival) => arrivals.push(arrival),
            Err(e) => {
                // Skip malformed entries rather than failing the whole board
                tracing::warn!(
                    route = item.routeno.as_deref().unwrap_or("?"),
                    error = %e,
                    "Skipping arrival entry"
                );
            }
        }
    }

    Ok(arrivals)
}

/// Convert a single feed entry.
///
/// An entry needs an arrival time and at least one of route id / number.
pub fn convert_arrival_item(item: &ArrivalItem) -> Result<LiveArrival, ConversionError> {
    let route_id = item.routeid.clone().unwrap_or_default();
    let route_number = item.routeno.clone().unwrap_or_default();
    if route_id.is_empty() && route_number.is_empty() {
        return Err(ConversionError::MissingField("routeid/routeno"));
    }

    let seconds = item.arrtime.ok_or(ConversionError::MissingField("arrtime"))?;

    Ok(LiveArrival {
        route_id,
        route_number,
        stops_away: item
            .arrprevstationcnt
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0),
        minutes_to_arrival: minutes_from_seconds(seconds),
        // The arrival service reports no vehicle identifier
        vehicle_id: None,
        vehicle_type: item.vehicletp.clone(),
        direction: None,
        route_type: item.routetp.clone(),
    })
}

fn extract_xml_tag(body: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)? + start;
    Some(body[start..end].trim().to_string())
}
