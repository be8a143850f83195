use thiserror::Error;

/// Coarse classification of [`Error`]: bad caller input versus a broken
/// invariant inside the timetable itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    Internal,
}

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("invalid time literal {literal:?}, expected HH:MM:SS")]
    BadTimeLiteral { literal: String },

    #[error("invalid date literal {literal:?}, expected YYYYMMDD")]
    BadDateLiteral { literal: String },

    #[error("departure_time_range must be a positive number of seconds")]
    EmptyDepartureRange,

    #[error("max_departure_time {max} is not after the first origin departure {t0}")]
    BadMaxDeparture { max: u32, t0: u32 },

    #[error("no service runs on {date}")]
    NoServiceOnDate { date: chrono::NaiveDate },

    #[error("time window [{t_min}, {t_max}) is empty")]
    EmptyWindow { t_min: u32, t_max: u32 },

    #[error("no stop events on {date} within [{t_min}, {t_max})")]
    EmptyFilter {
        date: chrono::NaiveDate,
        t_min: u32,
        t_max: u32,
    },

    #[error("no stop named {name:?}")]
    UnknownStopName { name: String },

    #[error("stop_time on trip {trip_id:?} references unknown stop {stop_id:?}")]
    UnknownStop { stop_id: String, trip_id: String },

    #[error("transfer references unknown stop {stop_id:?}")]
    UnknownTransferStop { stop_id: String },

    #[error("stop_sequence is not strictly increasing on trip {trip_id:?}")]
    UnorderedTrip { trip_id: String },

    #[error("stop times are not monotone on trip {trip_id:?}")]
    NonMonotoneTrip { trip_id: String },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnorderedTrip { .. } | Error::NonMonotoneTrip { .. } => ErrorKind::Internal,
            _ => ErrorKind::InvalidArgument,
        }
    }
}
