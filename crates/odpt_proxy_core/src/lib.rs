pub mod busstop;
pub mod client;
pub mod dataset;
pub mod operator;
pub mod vehicle;

pub use busstop::{filter_busstops, map_busstop, parse_busstops, resolve_title, StopFilter};
pub use client::{redact_consumer_key, OdptClient, UpstreamError, DEFAULT_API_BASE_URL};
pub use dataset::{dataset_file_name, DatasetError, DatasetRegistry, DatasetSource};
pub use operator::{OperatorId, OperatorIdError};
pub use vehicle::{map_vehicle, map_vehicles, VehicleFilter, VehicleQuery};

pub use odpt_proxy_model::{
    BusVehicle, BusstopPole, OdptBus, OdptBusstopPole, OdptTimestamp, OdptTitle,
};
