//! In-memory timetable: stops, trips and the transfer table, interned and
//! validated once at load time.

use std::{collections::HashMap, sync::Arc};

use crate::{error::Error, gtfs};

/// Seconds since midnight of the service day. May exceed 86400 for
/// overnight trips.
pub type Time = u32;

/// Parse a `HH:MM:SS` literal. Hours may exceed 23.
pub fn parse_hms(literal: &str) -> Result<Time, Error> {
    let bad = || Error::BadTimeLiteral {
        literal: literal.to_owned(),
    };

    let mut parts = literal.split(':');
    let mut fields = [0u32; 3];
    for field in fields.iter_mut() {
        *field = parts
            .next()
            .and_then(|part| part.parse::<u32>().ok())
            .ok_or_else(bad)?;
    }
    if parts.next().is_some() || fields[1] > 59 || fields[2] > 59 {
        return Err(bad());
    }
    Ok(fields[0] * 3600 + fields[1] * 60 + fields[2])
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Stop {
    pub id: String,
    pub name: String,
}

/// One visit of a trip at a stop.
#[derive(Clone, Debug)]
pub struct StopEvent {
    pub stop: Arc<Stop>,
    pub stop_sequence: u32,
    pub arrival_time: Time,
    pub departure_time: Time,
}

#[derive(Clone, Debug)]
pub struct Trip {
    pub id: String,
    pub service_id: String,
    pub events: Vec<StopEvent>,
}

impl Trip {
    /// Trips visiting the same ordered stops share a fingerprint; the
    /// filtered view groups them into patterns by it.
    pub fn fingerprint(events: &[StopEvent]) -> String {
        events.iter().fold(String::default(), |acc, event| {
            format!("{}_{}", acc, event.stop.id)
        })
    }

    fn validate(&self) -> Result<(), Error> {
        for pair in self.events.windows(2) {
            if pair[1].stop_sequence <= pair[0].stop_sequence {
                return Err(Error::UnorderedTrip {
                    trip_id: self.id.to_owned(),
                });
            }
            if pair[1].arrival_time < pair[0].departure_time {
                return Err(Error::NonMonotoneTrip {
                    trip_id: self.id.to_owned(),
                });
            }
        }
        if self
            .events
            .iter()
            .any(|event| event.departure_time < event.arrival_time)
        {
            return Err(Error::NonMonotoneTrip {
                trip_id: self.id.to_owned(),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct Transfer {
    pub from: Arc<Stop>,
    pub to: Arc<Stop>,
    pub min_transfer_time: Time,
}

/// The full feed after interning: every entity immutable from here on.
#[derive(Debug, Default)]
pub struct Timetable {
    pub stops: Vec<Arc<Stop>>,
    pub trips: Vec<Arc<Trip>>,
    pub transfers: Vec<Transfer>,
    pub(crate) stops_by_id: HashMap<String, Arc<Stop>>,
    pub(crate) stops_by_name: HashMap<String, Vec<Arc<Stop>>>,
}

impl Timetable {
    pub fn new(
        stops: Vec<gtfs::Stop>,
        trips: Vec<gtfs::Trip>,
        stop_times: Vec<gtfs::StopTime>,
        transfers: Vec<gtfs::Transfer>,
    ) -> Result<Self, Error> {
        let stops: Vec<Arc<Stop>> = stops
            .into_iter()
            .map(|stop| {
                Arc::new(Stop {
                    id: stop.stop_id,
                    name: stop.stop_name,
                })
            })
            .collect();

        let mut stops_by_id = HashMap::new();
        let mut stops_by_name: HashMap<String, Vec<Arc<Stop>>> = HashMap::new();
        for stop in &stops {
            stops_by_id.insert(stop.id.to_owned(), Arc::clone(stop));
            stops_by_name
                .entry(stop.name.to_owned())
                .or_default()
                .push(Arc::clone(stop));
        }

        let mut events_by_trip: HashMap<String, Vec<StopEvent>> = HashMap::new();
        for row in stop_times {
            let stop = stops_by_id
                .get(&row.stop_id)
                .cloned()
                .ok_or_else(|| Error::UnknownStop {
                    stop_id: row.stop_id.to_owned(),
                    trip_id: row.trip_id.to_owned(),
                })?;
            events_by_trip
                .entry(row.trip_id)
                .or_default()
                .push(StopEvent {
                    stop,
                    stop_sequence: row.stop_sequence,
                    arrival_time: parse_hms(&row.arrival_time)?,
                    departure_time: parse_hms(&row.departure_time)?,
                });
        }

        let trips = trips
            .into_iter()
            .filter_map(|trip| {
                let mut events = events_by_trip.remove(&trip.trip_id)?;
                events.sort_by_key(|event| event.stop_sequence);
                Some(Trip {
                    id: trip.trip_id,
                    service_id: trip.service_id,
                    events,
                })
            })
            .map(|trip| {
                trip.validate()?;
                Ok(Arc::new(trip))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let transfers = transfers
            .into_iter()
            .map(|transfer| {
                let resolve = |id: &str| {
                    stops_by_id
                        .get(id)
                        .cloned()
                        .ok_or_else(|| Error::UnknownTransferStop {
                            stop_id: id.to_owned(),
                        })
                };
                Ok(Transfer {
                    from: resolve(&transfer.from_stop_id)?,
                    to: resolve(&transfer.to_stop_id)?,
                    min_transfer_time: transfer.min_transfer_time,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Self {
            stops,
            trips,
            transfers,
            stops_by_id,
            stops_by_name,
        })
    }

    pub fn stop(&self, id: &str) -> Option<Arc<Stop>> {
        self.stops_by_id.get(id).cloned()
    }

    /// All platforms sharing a public-facing name.
    pub fn stops_named(&self, name: &str) -> &[Arc<Stop>] {
        self.stops_by_name
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
