//! Projects the label matrix of a search into its tabular result forms.

use std::{collections::HashMap, sync::Arc};

use crate::{
    raptor::Keep,
    timetable::{Stop, Time},
};

/// One label as recorded during the search: stop reached, in which round,
/// by the journey leaving at `journey_departure`.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub stop: Arc<Stop>,
    pub round: u32,
    pub journey_departure: Time,
    pub arrival: Time,
    pub transfers: u32,
}

/// One result row. The schema is identical across all result modes and for
/// empty results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JourneyRow {
    pub stop_id: String,
    pub travel_time: u32,
    pub journey_departure_time: Time,
    pub journey_arrival_time: Time,
    pub min_arrival_time: Time,
    pub transfers: u32,
}

#[derive(Debug, Clone, Default)]
pub struct RaptorResult {
    pub rows: Vec<JourneyRow>,
}

impl RaptorResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Shape recorded candidates into the requested view. Row order is
/// unspecified; callers sort.
pub fn shape(
    candidates: Vec<Candidate>,
    keep: Keep,
    t0: Time,
    origins: &[Arc<Stop>],
) -> RaptorResult {
    let mut by_stop: HashMap<Arc<Stop>, Vec<Candidate>> = HashMap::new();
    for candidate in candidates {
        by_stop
            .entry(Arc::clone(&candidate.stop))
            .or_default()
            .push(candidate);
    }

    let mut rows = Vec::new();
    for (stop, group) in by_stop {
        let min_arrival = group
            .iter()
            .map(|candidate| candidate.arrival)
            .min()
            .unwrap_or(Time::MAX);

        let is_origin = origins.contains(&stop);
        match keep {
            Keep::Earliest => {
                let best = group.iter().min_by_key(|candidate| {
                    (
                        candidate.arrival,
                        candidate.arrival - candidate.journey_departure,
                        candidate.transfers,
                    )
                });
                if let Some(best) = best {
                    rows.push(row(&stop, best, min_arrival));
                }
            }
            Keep::Shortest => {
                let best = group.iter().min_by_key(|candidate| {
                    (
                        candidate.arrival - candidate.journey_departure,
                        candidate.arrival,
                        candidate.transfers,
                    )
                });
                if let Some(best) = best {
                    rows.push(row(&stop, best, min_arrival));
                }
            }
            Keep::All => {
                if is_origin {
                    rows.push(JourneyRow {
                        stop_id: stop.id.to_owned(),
                        travel_time: 0,
                        journey_departure_time: t0,
                        journey_arrival_time: t0,
                        min_arrival_time: min_arrival,
                        transfers: 0,
                    });
                    continue;
                }
                for candidate in pareto(&group) {
                    rows.push(row(&stop, candidate, min_arrival));
                }
            }
        }
    }

    RaptorResult { rows }
}

fn row(stop: &Arc<Stop>, candidate: &Candidate, min_arrival: Time) -> JourneyRow {
    JourneyRow {
        stop_id: stop.id.to_owned(),
        travel_time: candidate.arrival - candidate.journey_departure,
        journey_departure_time: candidate.journey_departure,
        journey_arrival_time: candidate.arrival,
        min_arrival_time: min_arrival,
        transfers: candidate.transfers,
    }
}

/// Keep labels no other label dominates. Leaving later, arriving earlier
/// and transferring less are each better; a label weakly worse on all
/// three loses.
fn pareto(group: &[Candidate]) -> Vec<&Candidate> {
    group
        .iter()
        .enumerate()
        .filter(|(index, candidate)| {
            !group.iter().enumerate().any(|(other_index, other)| {
                other_index != *index && dominates(other, candidate)
            })
        })
        .map(|(_, candidate)| candidate)
        .collect()
}

fn dominates(a: &Candidate, b: &Candidate) -> bool {
    a.journey_departure >= b.journey_departure
        && a.arrival <= b.arrival
        && a.transfers <= b.transfers
        && (a.journey_departure > b.journey_departure
            || a.arrival < b.arrival
            || a.transfers < b.transfers)
}
