//! Matching a registered route against a live arrival board.

use crate::domain::{LiveArrival, RegisteredRoute};

/// Result of looking up a registered route on a stop's arrival list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrivalMatch<'a> {
    /// The first arrival in feed order belonging to the route.
    Found(&'a LiveArrival),
    /// The feed returned arrivals, none of them for this route.
    NoMatch,
    /// The feed returned nothing at all for the stop.
    NoFeedData,
}

impl<'a> ArrivalMatch<'a> {
    pub fn arrival(&self) -> Option<&'a LiveArrival> {
        match self {
            ArrivalMatch::Found(a) => Some(a),
            _ => None,
        }
    }
}

/// Find the arrival for `route` in `arrivals`.
///
/// An entry matches if its route id **or** its route number equals the
/// registered one. Feed order decides between several matches; an id match
/// has no priority over an earlier number match.
pub fn match_arrival<'a>(route: &RegisteredRoute, arrivals: &'a [LiveArrival]) -> ArrivalMatch<'a> {
    if arrivals.is_empty() {
        return ArrivalMatch::NoFeedData;
    }

    arrivals
        .iter()
        .find(|a| a.route_id == route.route_id || a.route_number == route.route_number)
        .map_or(ArrivalMatch::NoMatch, ArrivalMatch::Found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RouteKey;
    use chrono::DateTime;

    fn route(route_id: &str, route_number: &str) -> RegisteredRoute {
        RegisteredRoute {
            id: RouteKey(1),
            stop_id: "SJB293064313".to_string(),
            stop_name: "Sejong City Hall".to_string(),
            route_id: route_id.to_string(),
            route_number: route_number.to_string(),
            direction: None,
            city_code: 12,
            stop_location: None,
            created_at: DateTime::from_timestamp(0, 0).unwrap(),
            active: true,
            alias: None,
        }
    }

    #[test]
    fn empty_feed_is_no_data() {
        assert_eq!(match_arrival(&route("Z", "370"), &[]), ArrivalMatch::NoFeedData);
    }

    #[test]
    fn number_match_in_feed_order() {
        let feed = vec![LiveArrival::new("X", "100", 4), LiveArrival::new("Y", "370", 7)];
        let result = match_arrival(&route("Z", "370"), &feed);
        assert_eq!(result, ArrivalMatch::Found(&feed[1]));
    }

    #[test]
    fn id_match() {
        let feed = vec![LiveArrival::new("X", "100", 4), LiveArrival::new("Z", "999", 7)];
        let result = match_arrival(&route("Z", "370"), &feed);
        assert_eq!(result.arrival().map(|a| a.route_id.as_str()), Some("Z"));
    }

    #[test]
    fn earlier_number_match_beats_later_id_match() {
        let feed = vec![LiveArrival::new("Q", "370", 3), LiveArrival::new("Z", "370", 12)];
        let result = match_arrival(&route("Z", "370"), &feed);
        assert_eq!(result.arrival().map(|a| a.minutes_to_arrival), Some(3));
    }

    #[test]
    fn nothing_matches() {
        let feed = vec![LiveArrival::new("X", "100", 4), LiveArrival::new("Y", "200", 7)];
        assert_eq!(match_arrival(&route("Z", "370"), &feed), ArrivalMatch::NoMatch);
        assert!(match_arrival(&route("Z", "370"), &feed).arrival().is_none());
    }
}
