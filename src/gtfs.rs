use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Stop {
    pub stop_id: String,
    pub stop_name: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Trip {
    pub route_id: String,
    pub service_id: String,
    pub trip_id: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct StopTime {
    pub trip_id: String,
    pub arrival_time: String,
    pub departure_time: String,
    pub stop_id: String,
    pub stop_sequence: u32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Transfer {
    pub from_stop_id: String,
    pub to_stop_id: String,
    pub min_transfer_time: u32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Calendar {
    pub service_id: String,
    pub monday: u8,
    pub tuesday: u8,
    pub wednesday: u8,
    pub thursday: u8,
    pub friday: u8,
    pub saturday: u8,
    pub sunday: u8,
    pub start_date: String,
    pub end_date: String,
}

/// Raw tables of a feed, as deserialized from its csv files.
#[derive(Debug)]
pub struct Feed {
    pub stops: Vec<Stop>,
    pub trips: Vec<Trip>,
    pub stop_times: Vec<StopTime>,
    pub transfers: Vec<Transfer>,
    pub calendar: Vec<Calendar>,
}
