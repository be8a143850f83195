use chrono::NaiveDate;
use tracing::info;

use transit_raptor::{
    filter_stop_times, gtfs, parse_hms, travel_times, ServiceCalendar, Timetable, TravelTimes,
    TravelTimesConfig,
};

fn deserialize_into<T: serde::de::DeserializeOwned>(
    path: &std::path::Path,
) -> Result<Vec<T>, Box<dyn std::error::Error>> {
    let mut rows = Vec::new();
    for parsed in csv::Reader::from_path(path)?.deserialize() {
        rows.push(parsed?);
    }
    Ok(rows)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let feed_dir = std::path::PathBuf::from(args.next().unwrap_or_else(|| "timetable".into()));
    let date: NaiveDate = args
        .next()
        .unwrap_or_else(|| "2018-10-01".into())
        .parse()?;
    let from_stop_name = args.next().unwrap_or_else(|| "One".into());

    info!(feed = %feed_dir.display(), "loading feed");
    let stops = deserialize_into::<gtfs::Stop>(&feed_dir.join("stops.txt"))?;
    let trips = deserialize_into::<gtfs::Trip>(&feed_dir.join("trips.txt"))?;
    let stop_times = deserialize_into::<gtfs::StopTime>(&feed_dir.join("stop_times.txt"))?;
    let calendar = deserialize_into::<gtfs::Calendar>(&feed_dir.join("calendar.txt"))?;
    let transfers = if feed_dir.join("transfers.txt").exists() {
        deserialize_into::<gtfs::Transfer>(&feed_dir.join("transfers.txt"))?
    } else {
        Vec::new()
    };

    let feed = gtfs::Feed {
        stops,
        trips,
        stop_times,
        transfers,
        calendar,
    };
    let timetable = Timetable::new(feed.stops, feed.trips, feed.stop_times, feed.transfers)?;
    let calendar = ServiceCalendar::new(feed.calendar)?;

    let filtered = filter_stop_times(
        &timetable,
        &calendar,
        date,
        parse_hms("00:00:00")?,
        parse_hms("32:00:00")?,
    )?;

    let result = travel_times(&filtered, &from_stop_name, &TravelTimesConfig::default())?;
    match result {
        TravelTimes::Rows(rows) => {
            for row in rows {
                println!(
                    "{}\t{}\t{}s\t{} transfer(s)",
                    row.stop_name, row.stop_id, row.travel_time, row.transfers
                );
            }
        }
        TravelTimes::Table(table) => {
            for index in 0..table.stop_id.len() {
                println!(
                    "{}\t{}\t{}s\t{} transfer(s)",
                    table.stop_name[index],
                    table.stop_id[index],
                    table.travel_time[index],
                    table.transfers[index]
                );
            }
        }
    }
    Ok(())
}
