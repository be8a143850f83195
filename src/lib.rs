//! Round-based earliest-arrival routing over GTFS-like timetables.
//!
//! The crate takes the three tables a search needs (stop_times, transfers,
//! stops), restricts them to a service date and time window, and computes
//! per-stop arrival labels for one or more origin stops across a range of
//! departure times. Results come in three shapes: earliest arrival,
//! shortest travel time, or every Pareto-distinct label.

mod error;
pub mod filter;
pub mod gtfs;
pub mod raptor;
pub mod result;
pub mod timetable;
pub mod travel_times;

pub use error::{Error, ErrorKind};
pub use filter::{filter_stop_times, FilteredTimetable, ServiceCalendar};
pub use raptor::{raptor, Keep, RaptorConfig};
pub use result::{JourneyRow, RaptorResult};
pub use timetable::{parse_hms, Time, Timetable};
pub use travel_times::{travel_times, MaxDeparture, TravelTimes, TravelTimesConfig};
