//! Conversion from DataMall DTOs to domain types.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::domain::{BusArrival, BusStop, NextBus};

use super::types::{BusArrivalResponse, BusStopDto, NextBusDto, ServiceArrivalDto};

/// Whole minutes from `now` until the estimated arrival.
///
/// Returns `Ok(None)` for an empty estimate. Estimates at or before `now`
/// give zero; later ones are rounded down.
pub fn compute_arrival_minutes(
    estimate: &str,
    now: DateTime<Utc>,
) -> Result<Option<u32>, chrono::ParseError> {
    if estimate.is_empty() {
        return Ok(None);
    }

    let arrival = DateTime::parse_from_rfc3339(estimate)?.with_timezone(&Utc);
    let seconds = arrival.signed_duration_since(now).num_seconds();
    if seconds <= 0 {
        return Ok(Some(0));
    }

    Ok(Some(u32::try_from(seconds / 60).unwrap_or(u32::MAX)))
}

/// Convert an arrivals response, one record per service.
pub fn convert_bus_arrivals(response: &BusArrivalResponse, now: DateTime<Utc>) -> Vec<BusArrival> {
    response
        .services
        .iter()
        .map(|service| convert_service(&response.bus_stop_code, service, now))
        .collect()
}

fn convert_service(stop_code: &str, service: &ServiceArrivalDto, now: DateTime<Utc>) -> BusArrival {
    let slots = [&service.next_bus, &service.next_bus2, &service.next_bus3];
    BusArrival {
        stop_code: stop_code.to_string(),
        service_number: service.service_no.clone(),
        operator: service.operator.clone(),
        next_buses: slots.map(|slot| match slot {
            Some(dto) => convert_next_bus(dto, now, &service.service_no),
            None => NextBus::empty(),
        }),
    }
}

fn convert_next_bus(dto: &NextBusDto, now: DateTime<Utc>, service_no: &str) -> NextBus {
    let minutes = match compute_arrival_minutes(&dto.estimated_arrival, now) {
        Ok(Some(minutes)) => minutes,
        Ok(None) => return NextBus::empty(),
        Err(e) => {
            // Skip a bad slot rather than failing the whole board
            warn!(
                service = service_no,
                estimate = %dto.estimated_arrival,
                error = %e,
                "Unparseable arrival estimate, treating slot as empty"
            );
            return NextBus::empty();
        }
    };

    let feature = if dto.feature.is_empty() {
        "none".to_string()
    } else {
        dto.feature.to_lowercase()
    };

    NextBus {
        minutes_to_arrival: Some(minutes),
        vehicle_type: non_empty_lower(&dto.vehicle_type),
        feature: Some(feature),
        load: non_empty_lower(&dto.load),
    }
}

fn non_empty_lower(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_lowercase())
}

impl From<BusStopDto> for BusStop {
    fn from(dto: BusStopDto) -> Self {
        BusStop {
            code: dto.bus_stop_code,
            road_name: dto.road_name,
            description: dto.description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 14, 8, 30, 0).unwrap()
    }

    fn slot(estimate: &str, load: &str, feature: &str, vehicle_type: &str) -> NextBusDto {
        NextBusDto {
            estimated_arrival: estimate.to_string(),
            load: load.to_string(),
            feature: feature.to_string(),
            vehicle_type: vehicle_type.to_string(),
        }
    }

    #[test]
    fn empty_estimate_is_none() {
        assert_eq!(compute_arrival_minutes("", now()).unwrap(), None);
    }

    #[test]
    fn local_offset_is_respected() {
        // 16:35:30 +08:00 is 08:35:30 UTC, five and a half minutes away
        let minutes = compute_arrival_minutes("2024-08-14T16:35:30+08:00", now()).unwrap();
        assert_eq!(minutes, Some(5));
    }

    #[test]
    fn past_estimate_clamps_to_zero() {
        let minutes = compute_arrival_minutes("2024-08-14T16:20:00+08:00", now()).unwrap();
        assert_eq!(minutes, Some(0));
    }

    #[test]
    fn far_future_estimate_is_positive() {
        let minutes = compute_arrival_minutes("9999-12-31T12:00:00+08:00", now()).unwrap();
        assert!(minutes.unwrap() > 0);
    }

    #[test]
    fn garbage_estimate_is_an_error() {
        assert!(compute_arrival_minutes("soon", now()).is_err());
    }

    #[test]
    fn next_bus_fields_are_lower_cased() {
        let bus = convert_next_bus(&slot("2024-08-14T16:40:00+08:00", "SDA", "WAB", "DD"), now(), "15");
        assert_eq!(bus.minutes_to_arrival, Some(10));
        assert_eq!(bus.load.as_deref(), Some("sda"));
        assert_eq!(bus.feature.as_deref(), Some("wab"));
        assert_eq!(bus.vehicle_type.as_deref(), Some("dd"));
    }

    #[test]
    fn empty_feature_maps_to_none_literal() {
        let bus = convert_next_bus(&slot("2024-08-14T16:40:00+08:00", "SEA", "", "SD"), now(), "15");
        assert_eq!(bus.feature.as_deref(), Some("none"));
    }

    #[test]
    fn blank_slot_is_all_null() {
        let bus = convert_next_bus(&slot("", "SEA", "WAB", "SD"), now(), "15");
        assert_eq!(bus, NextBus::empty());
    }

    #[test]
    fn missing_slots_still_give_three_entries() {
        let response = BusArrivalResponse {
            bus_stop_code: "83139".into(),
            services: vec![ServiceArrivalDto {
                service_no: "15".into(),
                operator: "GAS".into(),
                next_bus: Some(slot("2024-08-14T16:40:00+08:00", "SEA", "", "SD")),
                next_bus2: None,
                next_bus3: None,
            }],
        };

        let arrivals = convert_bus_arrivals(&response, now());
        assert_eq!(arrivals.len(), 1);
        assert_eq!(arrivals[0].stop_code, "83139");
        assert_eq!(arrivals[0].next_buses.len(), 3);
        assert!(!arrivals[0].next_buses[0].is_empty());
        assert_eq!(arrivals[0].next_buses[1], NextBus::empty());
        assert_eq!(arrivals[0].next_buses[2], NextBus::empty());
    }

    proptest! {
        #[test]
        fn future_estimates_round_down(secs in 1i64..10_000_000) {
            let arrival = now() + Duration::seconds(secs);
            let minutes = compute_arrival_minutes(&arrival.to_rfc3339(), now()).unwrap();
            prop_assert_eq!(minutes, Some((secs / 60) as u32));
        }

        #[test]
        fn past_estimates_are_zero(secs in 0i64..10_000_000) {
            let arrival = now() - Duration::seconds(secs);
            let minutes = compute_arrival_minutes(&arrival.to_rfc3339(), now()).unwrap();
            prop_assert_eq!(minutes, Some(0));
        }
    }
}
