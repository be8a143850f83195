//! Restricts a timetable to one service date and an absolute time window,
//! and prepares the route-pattern index the search runs on.
//!
//! The filtered view is a self-contained bundle: it carries the transfer
//! table and the stops table along with the surviving stop events, so a
//! search needs nothing beyond it.

use std::{collections::HashMap, sync::Arc};

use chrono::{Datelike, NaiveDate};
use itertools::Itertools;
use tracing::debug;

use crate::{
    error::Error,
    gtfs,
    timetable::{Stop, StopEvent, Time, Timetable, Trip},
};

#[derive(Debug, Clone)]
struct Service {
    id: String,
    weekdays: [bool; 7],
    first: NaiveDate,
    last: NaiveDate,
}

/// Which services run on which dates, resolved from calendar rows.
#[derive(Debug, Clone, Default)]
pub struct ServiceCalendar {
    services: Vec<Service>,
}

fn parse_yyyymmdd(literal: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(literal, "%Y%m%d").map_err(|_| Error::BadDateLiteral {
        literal: literal.to_owned(),
    })
}

impl ServiceCalendar {
    pub fn new(rows: Vec<gtfs::Calendar>) -> Result<Self, Error> {
        let services = rows
            .into_iter()
            .map(|row| {
                Ok(Service {
                    weekdays: [
                        row.monday != 0,
                        row.tuesday != 0,
                        row.wednesday != 0,
                        row.thursday != 0,
                        row.friday != 0,
                        row.saturday != 0,
                        row.sunday != 0,
                    ],
                    first: parse_yyyymmdd(&row.start_date)?,
                    last: parse_yyyymmdd(&row.end_date)?,
                    id: row.service_id,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(Self { services })
    }

    /// Ids of services running on `date`.
    pub fn active_on(&self, date: NaiveDate) -> Vec<&str> {
        let weekday = date.weekday().num_days_from_monday() as usize;
        self.services
            .iter()
            .filter(|service| {
                service.first <= date && date <= service.last && service.weekdays[weekday]
            })
            .map(|service| service.id.as_str())
            .collect()
    }
}

/// One trip as it survives the filter: a contiguous-in-order subset of its
/// stop events.
#[derive(Debug, Clone)]
pub struct PatternTrip {
    pub trip: Arc<Trip>,
    pub events: Vec<StopEvent>,
}

/// Trips sharing the same ordered stop sequence within the window.
#[derive(Debug)]
pub struct Pattern {
    pub stops: Vec<Arc<Stop>>,
    pub trips: Vec<PatternTrip>,
    /// Departure column per position, aligned with `trips`, for boarding
    /// lookups.
    departures_by_position: Vec<Vec<Time>>,
}

impl Pattern {
    fn new(mut trips: Vec<PatternTrip>) -> Self {
        trips.sort_by_key(|entry| entry.events[0].departure_time);
        let stops = trips[0]
            .events
            .iter()
            .map(|event| Arc::clone(&event.stop))
            .collect::<Vec<_>>();
        let departures_by_position = (0..stops.len())
            .map(|position| {
                trips
                    .iter()
                    .map(|entry| entry.events[position].departure_time)
                    .collect()
            })
            .collect();
        Self {
            stops,
            trips,
            departures_by_position,
        }
    }

    /// Index of the earliest trip of this pattern departing `position` at
    /// or after `ready`. Trips are assumed not to overtake each other, so
    /// the departure column is sorted and a binary search suffices.
    pub fn earliest_boardable(&self, position: usize, ready: Time) -> Option<usize> {
        let column = &self.departures_by_position[position];
        let index = column.partition_point(|departure| *departure < ready);
        (index < self.trips.len()).then_some(index)
    }
}

/// Where a pattern touches a stop.
#[derive(Debug, Clone, Copy)]
pub struct PatternStop {
    pub pattern: usize,
    pub position: usize,
}

/// The filtered timetable plus the metadata the search needs: transfers as
/// an adjacency list and the full stops table.
#[derive(Debug)]
pub struct FilteredTimetable {
    pub date: NaiveDate,
    pub t_min: Time,
    pub t_max: Time,
    patterns: Vec<Pattern>,
    patterns_at_stop: HashMap<Arc<Stop>, Vec<PatternStop>>,
    transfers_from: HashMap<Arc<Stop>, Vec<(Arc<Stop>, Time)>>,
    departures_at: HashMap<Arc<Stop>, Vec<Time>>,
    stops_by_id: HashMap<String, Arc<Stop>>,
    stops_by_name: HashMap<String, Vec<Arc<Stop>>>,
}

/// Restrict `timetable` to trips active on `date` whose departures fall in
/// `[t_min, t_max)`.
pub fn filter_stop_times(
    timetable: &Timetable,
    calendar: &ServiceCalendar,
    date: NaiveDate,
    t_min: Time,
    t_max: Time,
) -> Result<FilteredTimetable, Error> {
    if t_max <= t_min {
        return Err(Error::EmptyWindow { t_min, t_max });
    }
    let active = calendar.active_on(date);
    if active.is_empty() {
        return Err(Error::NoServiceOnDate { date });
    }

    let survivors: Vec<PatternTrip> = timetable
        .trips
        .iter()
        .filter(|trip| active.contains(&trip.service_id.as_str()))
        .filter_map(|trip| {
            let events: Vec<StopEvent> = trip
                .events
                .iter()
                .filter(|event| (t_min..t_max).contains(&event.departure_time))
                .cloned()
                .collect();
            (!events.is_empty()).then(|| PatternTrip {
                trip: Arc::clone(trip),
                events,
            })
        })
        .collect();
    if survivors.is_empty() {
        return Err(Error::EmptyFilter { date, t_min, t_max });
    }

    let mut departures_at: HashMap<Arc<Stop>, Vec<Time>> = HashMap::new();
    for entry in &survivors {
        for event in &entry.events {
            departures_at
                .entry(Arc::clone(&event.stop))
                .or_default()
                .push(event.departure_time);
        }
    }
    for column in departures_at.values_mut() {
        column.sort_unstable();
    }

    let patterns: Vec<Pattern> = survivors
        .into_iter()
        .map(|entry| (Trip::fingerprint(&entry.events), entry))
        .into_group_map()
        .into_values()
        .map(Pattern::new)
        .collect();

    let mut patterns_at_stop: HashMap<Arc<Stop>, Vec<PatternStop>> = HashMap::new();
    for (index, pattern) in patterns.iter().enumerate() {
        for (position, stop) in pattern.stops.iter().enumerate() {
            patterns_at_stop
                .entry(Arc::clone(stop))
                .or_default()
                .push(PatternStop {
                    pattern: index,
                    position,
                });
        }
    }

    let mut transfers_from: HashMap<Arc<Stop>, Vec<(Arc<Stop>, Time)>> = HashMap::new();
    for transfer in &timetable.transfers {
        transfers_from
            .entry(Arc::clone(&transfer.from))
            .or_default()
            .push((Arc::clone(&transfer.to), transfer.min_transfer_time));
    }

    debug!(
        %date,
        t_min,
        t_max,
        patterns = patterns.len(),
        "filtered timetable"
    );

    Ok(FilteredTimetable {
        date,
        t_min,
        t_max,
        patterns,
        patterns_at_stop,
        transfers_from,
        departures_at,
        stops_by_id: timetable.stops_by_id.clone(),
        stops_by_name: timetable.stops_by_name.clone(),
    })
}

impl FilteredTimetable {
    pub fn stop(&self, id: &str) -> Option<Arc<Stop>> {
        self.stops_by_id.get(id).cloned()
    }

    pub fn stops_named(&self, name: &str) -> &[Arc<Stop>] {
        self.stops_by_name
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn pattern(&self, index: usize) -> &Pattern {
        &self.patterns[index]
    }

    pub fn patterns_at(&self, stop: &Arc<Stop>) -> &[PatternStop] {
        self.patterns_at_stop
            .get(stop)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn transfers_from(&self, stop: &Arc<Stop>) -> &[(Arc<Stop>, Time)] {
        self.transfers_from
            .get(stop)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Sorted departure times of the surviving stop events at `stop`.
    pub fn departures_at(&self, stop: &Arc<Stop>) -> &[Time] {
        self.departures_at
            .get(stop)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
