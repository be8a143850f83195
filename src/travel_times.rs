//! Station-name level travel times, built directly on the round-based
//! search: resolve a name to its platforms, search, keep the best platform
//! per destination name.

use std::collections::{hash_map::Entry, HashMap};

use tracing::warn;

use crate::{
    error::Error,
    filter::FilteredTimetable,
    raptor::{raptor, Keep, RaptorConfig, DEFAULT_DEPARTURE_TIME_RANGE, DEFAULT_MAX_TRANSFERS},
    timetable::{parse_hms, Time},
};

/// Latest accepted journey departure, absolute seconds or a clock literal.
#[derive(Debug, Clone)]
pub enum MaxDeparture {
    Seconds(Time),
    Clock(String),
}

impl MaxDeparture {
    fn seconds(&self) -> Result<Time, Error> {
        match self {
            MaxDeparture::Seconds(seconds) => Ok(*seconds),
            MaxDeparture::Clock(literal) => parse_hms(literal),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TravelTimesConfig {
    /// Seeded departure window; `None` means one hour after the first
    /// origin departure.
    pub departure_time_range: Option<Time>,
    /// Overrides the window with an absolute cutoff. Wins over
    /// `departure_time_range` when both are set.
    pub max_departure_time: Option<MaxDeparture>,
    pub max_transfers: Option<u32>,
    /// Return the columnar table form instead of plain rows.
    pub columnar: bool,
}

/// One row per reached stop name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TravelTimeRow {
    pub stop_name: String,
    pub stop_id: String,
    pub travel_time: u32,
    pub journey_departure_time: Time,
    pub journey_arrival_time: Time,
    pub min_arrival_time: Time,
    pub transfers: u32,
}

/// Column-oriented form of the same rows.
#[derive(Debug, Clone, Default)]
pub struct TravelTimeTable {
    pub stop_name: Vec<String>,
    pub stop_id: Vec<String>,
    pub travel_time: Vec<u32>,
    pub journey_departure_time: Vec<Time>,
    pub journey_arrival_time: Vec<Time>,
    pub min_arrival_time: Vec<Time>,
    pub transfers: Vec<u32>,
}

impl From<Vec<TravelTimeRow>> for TravelTimeTable {
    fn from(rows: Vec<TravelTimeRow>) -> Self {
        let mut table = Self::default();
        for row in rows {
            table.stop_name.push(row.stop_name);
            table.stop_id.push(row.stop_id);
            table.travel_time.push(row.travel_time);
            table.journey_departure_time.push(row.journey_departure_time);
            table.journey_arrival_time.push(row.journey_arrival_time);
            table.min_arrival_time.push(row.min_arrival_time);
            table.transfers.push(row.transfers);
        }
        table
    }
}

/// Both shapes carry the same content.
#[derive(Debug, Clone)]
pub enum TravelTimes {
    Rows(Vec<TravelTimeRow>),
    Table(TravelTimeTable),
}

impl TravelTimes {
    pub fn len(&self) -> usize {
        match self {
            TravelTimes::Rows(rows) => rows.len(),
            TravelTimes::Table(table) => table.stop_id.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Minimal travel time from every platform named `from_stop_name` to every
/// reachable stop name.
pub fn travel_times(
    timetable: &FilteredTimetable,
    from_stop_name: &str,
    config: &TravelTimesConfig,
) -> Result<TravelTimes, Error> {
    let origins = timetable.stops_named(from_stop_name);
    if origins.is_empty() {
        return Err(Error::UnknownStopName {
            name: from_stop_name.to_owned(),
        });
    }
    let origin_ids: Vec<String> = origins.iter().map(|stop| stop.id.to_owned()).collect();

    let range = match (&config.max_departure_time, config.departure_time_range) {
        (Some(max), explicit_range) => {
            if explicit_range.is_some() {
                warn!(
                    "both departure_time_range and max_departure_time given, \
                     using max_departure_time"
                );
            }
            let max = max.seconds()?;
            let t0 = origins
                .iter()
                .flat_map(|stop| timetable.departures_at(stop))
                .min()
                .copied();
            match t0 {
                Some(t0) if max > t0 => max - t0,
                Some(t0) => return Err(Error::BadMaxDeparture { max, t0 }),
                // No departures at all: the search itself warns and comes
                // back empty, the window width no longer matters.
                None => DEFAULT_DEPARTURE_TIME_RANGE,
            }
        }
        (None, range) => range.unwrap_or(DEFAULT_DEPARTURE_TIME_RANGE),
    };

    let search = RaptorConfig::new(Keep::Shortest)
        .with_departure_time_range(range)
        .with_max_transfers(config.max_transfers.unwrap_or(DEFAULT_MAX_TRANSFERS));
    let result = raptor(timetable, &origin_ids, &search)?;

    let mut best: HashMap<String, TravelTimeRow> = HashMap::new();
    for row in result.rows {
        let Some(stop) = timetable.stop(&row.stop_id) else {
            continue;
        };
        let entry = TravelTimeRow {
            stop_name: stop.name.to_owned(),
            stop_id: row.stop_id,
            travel_time: row.travel_time,
            journey_departure_time: row.journey_departure_time,
            journey_arrival_time: row.journey_arrival_time,
            min_arrival_time: row.min_arrival_time,
            transfers: row.transfers,
        };
        match best.entry(stop.name.to_owned()) {
            Entry::Occupied(mut slot) => {
                let current = slot.get_mut();
                if (entry.travel_time, &entry.stop_id) < (current.travel_time, &current.stop_id) {
                    *current = entry;
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
        }
    }

    let mut rows: Vec<TravelTimeRow> = best.into_values().collect();
    rows.sort_by(|a, b| a.stop_name.cmp(&b.stop_name));

    Ok(if config.columnar {
        TravelTimes::Table(rows.into())
    } else {
        TravelTimes::Rows(rows)
    })
}
