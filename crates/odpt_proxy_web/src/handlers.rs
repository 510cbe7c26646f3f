use axum::extract::{RawQuery, State};
use axum::Json;
use odpt_proxy_core::{
    filter_busstops, BusVehicle, BusstopPole, OperatorId, StopFilter, VehicleFilter, VehicleQuery,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::query::QueryParams;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    version: String,
}

pub async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn log_failure(operation: &str, operator: Option<&str>, err: &ApiError) {
    warn!(
        operation,
        operator = operator.unwrap_or_default(),
        status = err.status().as_u16(),
        error = %err,
        "request failed"
    );
}

pub async fn bus_vehicle_location(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Vec<BusVehicle>>, ApiError> {
    let params = QueryParams::parse(raw.as_deref());
    let operator = params
        .operator()
        .inspect_err(|err| log_failure("bus_vehicle_location", None, err))?;

    let query = VehicleFilter::ALL
        .iter()
        .fold(VehicleQuery::new(operator), |query, filter| {
            match params.get(filter.param_name()) {
                Some(value) => query.with_filter(*filter, value),
                None => query,
            }
        });

    let buses = state
        .client
        .bus_vehicles(&query)
        .await
        .map_err(ApiError::from)
        .inspect_err(|err| log_failure("bus_vehicle_location", Some(operator), err))?;

    info!(
        count = buses.len(),
        operator, "returned bus vehicle records"
    );
    Ok(Json(buses))
}

pub async fn busstop_pole(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Vec<BusstopPole>>, ApiError> {
    let params = QueryParams::parse(raw.as_deref());
    let operator = params
        .operator()
        .inspect_err(|err| log_failure("busstop_pole", None, err))?;
    let operator_id = OperatorId::parse(operator)
        .map_err(ApiError::from)
        .inspect_err(|err| log_failure("busstop_pole", Some(operator), err))?;

    let filter = StopFilter {
        id: params.get_owned("id"),
        title: params.get_owned("title"),
        same_as: params.get_owned("sameAs"),
    };

    let datasets = state.datasets.clone();
    let operator_name = operator_id.name().to_string();
    let busstops = tokio::task::spawn_blocking(move || {
        datasets
            .load(&operator_name)
            .map(|poles| filter_busstops(poles, &filter))
    })
    .await
    .map_err(ApiError::from)
    .and_then(|result| result.map_err(|err| ApiError::dataset(&operator_id, err)))
    .inspect_err(|err| log_failure("busstop_pole", Some(operator), err))?;

    info!(
        count = busstops.len(),
        operator, "returned busstop records"
    );
    Ok(Json(busstops))
}

pub async fn operators(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let datasets = state.datasets.clone();
    let names = tokio::task::spawn_blocking(move || datasets.operator_names())
        .await
        .inspect_err(|err| warn!(operation = "operators", error = %err, "request failed"))?;
    Ok(Json(names))
}
