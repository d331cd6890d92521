//! Arrival feed response DTOs.
//!
//! These types map the public bus arrival API's JSON envelope
//! (`response.header` / `response.body.items.item`). The service is loose
//! about types: `items` is an empty string when there are no results,
//! `item` is a bare object when there is exactly one, and identifiers such
//! as `routeno` arrive as numbers or strings depending on the city.

use serde::{Deserialize, Deserializer};

/// Top-level response object.
#[derive(Debug, Clone, Deserialize)]
pub struct ArrivalResponse {
    pub response: ResponseEnvelope,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseEnvelope {
    pub header: ResponseHeader,
    pub body: Option<ResponseBody>,
}

/// Result status. `"00"` means success.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseHeader {
    #[serde(deserialize_with = "string_or_number")]
    pub result_code: String,
    #[serde(default)]
    pub result_msg: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    #[serde(default)]
    pub items: Items,
    pub num_of_rows: Option<u32>,
    pub page_no: Option<u32>,
    pub total_count: Option<u32>,
}

/// The `items` field: an object wrapping `item`, or a blank string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Items {
    Present {
        #[serde(default)]
        item: Option<OneOrMany<ArrivalItem>>,
    },
    Blank(String),
}

impl Default for Items {
    fn default() -> Self {
        Items::Blank(String::new())
    }
}

impl Items {
    /// Flatten into a list in feed order.
    pub fn into_vec(self) -> Vec<ArrivalItem> {
        match self {
            Items::Present { item: Some(items) } => items.into_vec(),
            _ => Vec::new(),
        }
    }
}

/// A JSON value that is either a single `T` or an array of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(v) => v,
            OneOrMany::One(t) => vec![t],
        }
    }
}

/// One predicted arrival at the requested stop.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArrivalItem {
    /// Stop ID.
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub nodeid: Option<String>,

    /// Stop name.
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub nodenm: Option<String>,

    /// Route ID.
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub routeid: Option<String>,

    /// Public route number. Numeric in most cities, text in some.
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub routeno: Option<String>,

    /// Route type name (e.g. "간선버스").
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub routetp: Option<String>,

    /// Number of stops before arrival.
    #[serde(default, deserialize_with = "opt_integer")]
    pub arrprevstationcnt: Option<i64>,

    /// Seconds until arrival.
    #[serde(default, deserialize_with = "opt_integer")]
    pub arrtime: Option<i64>,

    /// Vehicle class (e.g. "저상버스", low-floor). Not a vehicle identifier.
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub vehicletp: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Str(s) => s,
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
        }
    }

    fn into_integer(self) -> Option<i64> {
        match self {
            Scalar::Str(s) => s.trim().parse().ok(),
            Scalar::Int(i) => Some(i),
            Scalar::Float(f) if f.is_finite() => Some(f as i64),
            Scalar::Float(_) => None,
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Scalar::deserialize(d).map(Scalar::into_string)
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(d)?.map(Scalar::into_string))
}

fn opt_integer<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    Ok(Option::<Scalar>::deserialize(d)?.and_then(Scalar::into_integer))
}
