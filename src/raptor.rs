//! Round-based earliest-arrival search.
//!
//! Each round boards at most one more trip: round k labels are reachable
//! with k boardings. Footpaths relax within a round, after the route scan,
//! and do not advance the round. One full search runs per distinct origin
//! departure time in the requested range, so results can distinguish
//! journeys by when they actually leave.

use std::{collections::HashMap, sync::Arc};

use tracing::warn;

use crate::{
    error::Error,
    filter::FilteredTimetable,
    result::{shape, Candidate, RaptorResult},
    timetable::{Stop, Time},
};

pub const DEFAULT_DEPARTURE_TIME_RANGE: Time = 3600;
pub const DEFAULT_MAX_TRANSFERS: u32 = 10;

/// Which view of the label matrix a search returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keep {
    /// Minimal arrival time per reached stop.
    Earliest,
    /// Minimal travel time (arrival minus journey departure) per reached
    /// stop.
    Shortest,
    /// Every Pareto-distinct (journey, arrival, transfers) label per stop.
    All,
}

#[derive(Debug, Clone)]
pub struct RaptorConfig {
    pub keep: Keep,
    /// Width of the seeded departure window, in seconds after the first
    /// origin departure.
    pub departure_time_range: Time,
    /// Cap on boardings minus one; rounds stop there even if labels could
    /// still improve.
    pub max_transfers: u32,
}

impl RaptorConfig {
    pub fn new(keep: Keep) -> Self {
        Self {
            keep,
            departure_time_range: DEFAULT_DEPARTURE_TIME_RANGE,
            max_transfers: DEFAULT_MAX_TRANSFERS,
        }
    }

    pub fn with_departure_time_range(mut self, seconds: Time) -> Self {
        self.departure_time_range = seconds;
        self
    }

    pub fn with_max_transfers(mut self, max_transfers: u32) -> Self {
        self.max_transfers = max_transfers;
        self
    }

    fn validate(&self) -> Result<(), Error> {
        if self.departure_time_range == 0 {
            return Err(Error::EmptyDepartureRange);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Witness {
    Origin,
    Ride,
    Footpath,
}

#[derive(Debug, Clone)]
struct Label {
    arrival: Time,
    boardings: u32,
    witness: Witness,
}

impl Label {
    /// Transfer count of the journey this label witnesses. A footpath hop
    /// after alighting counts as a platform change, so footpath-witnessed
    /// labels report one more than ride-witnessed ones.
    fn transfers(&self) -> u32 {
        match self.witness {
            Witness::Origin => 0,
            Witness::Ride => self.boardings.saturating_sub(1),
            Witness::Footpath => self.boardings,
        }
    }
}

/// Compute labels for every stop reachable from `from_stop_ids` and shape
/// them according to `config.keep`.
///
/// Unknown origins and origins without any departure in the window are not
/// errors: they produce a warning and an empty, schema-complete result.
pub fn raptor(
    timetable: &FilteredTimetable,
    from_stop_ids: &[String],
    config: &RaptorConfig,
) -> Result<RaptorResult, Error> {
    config.validate()?;

    let mut origins: Vec<Arc<Stop>> = Vec::new();
    for id in from_stop_ids {
        match timetable.stop(id) {
            Some(stop) if !origins.contains(&stop) => origins.push(stop),
            Some(_) => {}
            None => warn!(stop_id = %id, "unknown origin stop, ignoring"),
        }
    }
    if origins.is_empty() {
        warn!("no known origin stops, returning empty result");
        return Ok(RaptorResult::empty());
    }

    let t0 = origins
        .iter()
        .flat_map(|stop| timetable.departures_at(stop))
        .min()
        .copied();
    let Some(t0) = t0 else {
        warn!("origin stops have no departures in the filtered window");
        return Ok(RaptorResult::empty());
    };

    let mut seeds: Vec<Time> = origins
        .iter()
        .flat_map(|stop| timetable.departures_at(stop))
        .copied()
        .filter(|departure| (t0..t0 + config.departure_time_range).contains(departure))
        .collect();
    seeds.sort_unstable();
    seeds.dedup();

    let mut candidates = Vec::new();
    for seed in seeds {
        run_journey(
            timetable,
            &origins,
            seed,
            config.max_transfers + 1,
            &mut candidates,
        );
    }

    Ok(shape(candidates, config.keep, t0, &origins))
}

/// One full round-based search for a single journey departure time.
fn run_journey(
    timetable: &FilteredTimetable,
    origins: &[Arc<Stop>],
    seed: Time,
    max_rounds: u32,
    candidates: &mut Vec<Candidate>,
) {
    let mut labels: HashMap<Arc<Stop>, Label> = HashMap::new();
    let mut improved: Vec<Arc<Stop>> = Vec::new();

    for origin in origins {
        labels.insert(
            Arc::clone(origin),
            Label {
                arrival: seed,
                boardings: 0,
                witness: Witness::Origin,
            },
        );
        improved.push(Arc::clone(origin));
    }
    for origin in origins {
        for (to, walk) in timetable.transfers_from(origin) {
            let arrival = seed + walk;
            if better(&labels, to, arrival) {
                labels.insert(
                    Arc::clone(to),
                    Label {
                        arrival,
                        boardings: 0,
                        witness: Witness::Footpath,
                    },
                );
                improved.push(Arc::clone(to));
            }
        }
    }
    record(candidates, &labels, &improved, 0, seed);

    let mut marked = improved;
    for round in 1..=max_rounds {
        // Boarding decisions use the labels as they stood when the round
        // started; improvements only become boardable next round.
        let ready = labels.clone();

        let mut queue: HashMap<usize, usize> = HashMap::new();
        for stop in &marked {
            for entry in timetable.patterns_at(stop) {
                queue
                    .entry(entry.pattern)
                    .and_modify(|position| *position = (*position).min(entry.position))
                    .or_insert(entry.position);
            }
        }
        if queue.is_empty() {
            break;
        }

        let mut improved: Vec<Arc<Stop>> = Vec::new();
        for (&pattern_index, &start) in &queue {
            let pattern = timetable.pattern(pattern_index);
            let mut onboard: Option<(usize, u32)> = None;

            for position in start..pattern.stops.len() {
                let stop = &pattern.stops[position];

                if let Some((trip_index, boardings)) = onboard {
                    let arrival = pattern.trips[trip_index].events[position].arrival_time;
                    if better(&labels, stop, arrival) {
                        labels.insert(
                            Arc::clone(stop),
                            Label {
                                arrival,
                                boardings,
                                witness: Witness::Ride,
                            },
                        );
                        improved.push(Arc::clone(stop));
                    }
                }

                // Hop on the earliest trip we can still catch here, or onto
                // an earlier one than the trip we are riding.
                if let Some(label) = ready.get(stop) {
                    if let Some(candidate) = pattern.earliest_boardable(position, label.arrival) {
                        let departs = pattern.trips[candidate].events[position].departure_time;
                        let current = onboard.map(|(trip_index, _)| {
                            pattern.trips[trip_index].events[position].departure_time
                        });
                        if current.map_or(true, |riding| departs < riding) {
                            onboard = Some((candidate, label.boardings + 1));
                        }
                    }
                }
            }
        }

        let scanned = improved.clone();
        for stop in &scanned {
            let source = labels[stop].clone();
            for (to, walk) in timetable.transfers_from(stop) {
                let arrival = source.arrival + walk;
                if better(&labels, to, arrival) {
                    labels.insert(
                        Arc::clone(to),
                        Label {
                            arrival,
                            boardings: source.boardings,
                            witness: Witness::Footpath,
                        },
                    );
                    improved.push(Arc::clone(to));
                }
            }
        }

        record(candidates, &labels, &improved, round, seed);
        marked = improved;
        if marked.is_empty() {
            break;
        }
    }
}

fn better(labels: &HashMap<Arc<Stop>, Label>, stop: &Arc<Stop>, arrival: Time) -> bool {
    labels
        .get(stop)
        .map(|label| arrival < label.arrival)
        .unwrap_or(true)
}

/// Emit one candidate row per stop whose label improved this round, with
/// the label as it stands at the end of the round.
fn record(
    candidates: &mut Vec<Candidate>,
    labels: &HashMap<Arc<Stop>, Label>,
    improved: &[Arc<Stop>],
    round: u32,
    seed: Time,
) {
    let mut seen: Vec<&Arc<Stop>> = Vec::new();
    for stop in improved {
        if seen.contains(&stop) {
            continue;
        }
        seen.push(stop);
        let label = &labels[stop];
        candidates.push(Candidate {
            stop: Arc::clone(stop),
            round,
            journey_departure: seed,
            arrival: label.arrival,
            transfers: label.transfers(),
        });
    }
}
