use odpt_proxy_model::{BusVehicle, OdptBus, OdptTimestamp};
use url::Url;

pub const BUS_ENDPOINT: &str = "odpt:Bus";
pub const OPERATOR_PARAM: &str = "odpt:operator";
pub const CONSUMER_KEY_PARAM: &str = "acl:consumerKey";

/// Optional filters of `/location/busvehicle`, forwarded to the ODPT API
/// as `odpt:`-prefixed query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleFilter {
    BusNumber,
    BusTimetable,
    ToBusstopPole,
    BusroutePattern,
    FromBusstopPole,
    StartingBusstopPole,
    TerminalBusstopPole,
}

impl VehicleFilter {
    pub const ALL: [VehicleFilter; 7] = [
        VehicleFilter::BusNumber,
        VehicleFilter::BusTimetable,
        VehicleFilter::ToBusstopPole,
        VehicleFilter::BusroutePattern,
        VehicleFilter::FromBusstopPole,
        VehicleFilter::StartingBusstopPole,
        VehicleFilter::TerminalBusstopPole,
    ];

    /// Query parameter name accepted by the proxy.
    pub fn param_name(self) -> &'static str {
        match self {
            VehicleFilter::BusNumber => "busNumber",
            VehicleFilter::BusTimetable => "busTimetable",
            VehicleFilter::ToBusstopPole => "toBusstopPole",
            VehicleFilter::BusroutePattern => "busroutePattern",
            VehicleFilter::FromBusstopPole => "fromBusstopPole",
            VehicleFilter::StartingBusstopPole => "startingBusstopPole",
            VehicleFilter::TerminalBusstopPole => "terminalBusstopPole",
        }
    }

    /// Query parameter name understood by the ODPT API.
    pub fn upstream_name(self) -> &'static str {
        match self {
            VehicleFilter::BusNumber => "odpt:busNumber",
            VehicleFilter::BusTimetable => "odpt:busTimetable",
            VehicleFilter::ToBusstopPole => "odpt:toBusstopPole",
            VehicleFilter::BusroutePattern => "odpt:busroutePattern",
            VehicleFilter::FromBusstopPole => "odpt:fromBusstopPole",
            VehicleFilter::StartingBusstopPole => "odpt:startingBusstopPole",
            VehicleFilter::TerminalBusstopPole => "odpt:terminalBusstopPole",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleQuery {
    operator: String,
    filters: Vec<(VehicleFilter, String)>,
}

impl VehicleQuery {
    pub fn new(operator: impl Into<String>) -> Self {
        Self {
            operator: operator.into(),
            filters: Vec::new(),
        }
    }

    /// Adds a filter; empty values are dropped, a repeated filter keeps the
    /// latest value.
    pub fn with_filter(mut self, filter: VehicleFilter, value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            return self;
        }
        self.filters.retain(|(existing, _)| *existing != filter);
        self.filters.push((filter, value));
        self
    }

    pub fn filters(&self) -> &[(VehicleFilter, String)] {
        &self.filters
    }

    pub fn to_url(&self, base_url: &str, consumer_key: Option<&str>) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            BUS_ENDPOINT
        ))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair(OPERATOR_PARAM, &self.operator);
            for (filter, value) in &self.filters {
                pairs.append_pair(filter.upstream_name(), value);
            }
            if let Some(key) = consumer_key.filter(|key| !key.is_empty()) {
                pairs.append_pair(CONSUMER_KEY_PARAM, key);
            }
        }
        Ok(url)
    }
}

pub fn map_vehicle(bus: OdptBus) -> BusVehicle {
    let date = OdptTimestamp::parse(&bus.date).unwrap_or_default();
    let from_busstop_pole_time = if bus.from_busstop_pole_time.is_empty() {
        None
    } else {
        OdptTimestamp::parse(&bus.from_busstop_pole_time).ok()
    };

    BusVehicle {
        id: bus.id,
        record_type: bus.record_type,
        date,
        note: bus.note,
        operator: bus.operator,
        bus_number: bus.bus_number,
        bus_timetable: bus.bus_timetable,
        to_busstop_pole: bus.to_busstop_pole,
        busroute_pattern: bus.busroute_pattern,
        from_busstop_pole: bus.from_busstop_pole,
        from_busstop_pole_time,
        starting_busstop_pole: bus.starting_busstop_pole,
        terminal_busstop_pole: bus.terminal_busstop_pole,
    }
}

pub fn map_vehicles(buses: Vec<OdptBus>) -> Vec<BusVehicle> {
    buses.into_iter().map(map_vehicle).collect()
}
