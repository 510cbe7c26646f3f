use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use odpt_proxy_core::{DatasetError, OperatorId, OperatorIdError, UpstreamError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("operator parameter is required")]
    MissingOperator,
    #[error(transparent)]
    Operator(#[from] OperatorIdError),
    #[error("no bus stop dataset for operator {0}")]
    UnknownOperator(String),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    /// Wraps a dataset failure for `operator`; a missing dataset is reported
    /// under the full operator identifier rather than the file name part.
    pub fn dataset(operator: &OperatorId, err: DatasetError) -> Self {
        match err {
            DatasetError::NotFound(_) => ApiError::UnknownOperator(operator.to_string()),
            other => ApiError::Dataset(other),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingOperator | ApiError::Operator(_) => StatusCode::BAD_REQUEST,
            ApiError::UnknownOperator(_) | ApiError::Dataset(DatasetError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Upstream(UpstreamError::Status(code)) => {
                StatusCode::from_u16(*code).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::Dataset(_) | ApiError::Upstream(_) | ApiError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Response body. Internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::MissingOperator => self.to_string(),
            ApiError::Operator(_) => "invalid operator format".to_string(),
            ApiError::UnknownOperator(operator)
            | ApiError::Dataset(DatasetError::NotFound(operator)) => {
                format!("Data not found for operator: {}", operator)
            }
            ApiError::Dataset(DatasetError::Parse { .. }) => "Error parsing data".to_string(),
            ApiError::Dataset(DatasetError::Io { .. }) => "Error reading data".to_string(),
            ApiError::Upstream(UpstreamError::Request(_)) => {
                "Error requesting external API".to_string()
            }
            ApiError::Upstream(UpstreamError::Status(code)) => {
                format!("External API returned status: {}", code)
            }
            ApiError::Upstream(UpstreamError::Body(_)) => "Error reading response".to_string(),
            ApiError::Upstream(UpstreamError::Parse(_)) => "Error parsing response".to_string(),
            ApiError::Upstream(UpstreamError::Client(_) | UpstreamError::Url(_))
            | ApiError::Task(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("{}\n", self.public_message()),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_client_errors() {
        assert_eq!(ApiError::MissingOperator.status(), StatusCode::BAD_REQUEST);
        let err = ApiError::from(OperatorIdError::InvalidFormat("Toei".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "invalid operator format");
    }

    #[test]
    fn missing_dataset_names_the_full_operator() {
        let operator = OperatorId::parse("odpt.Operator:Keio").unwrap();
        let err = ApiError::dataset(&operator, DatasetError::NotFound("Keio".to_string()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            err.public_message(),
            "Data not found for operator: odpt.Operator:Keio"
        );
    }

    #[test]
    fn unreadable_dataset_is_internal() {
        let operator = OperatorId::parse("odpt.Operator:Keio").unwrap();
        let err = ApiError::dataset(
            &operator,
            DatasetError::Io {
                path: "odpt_BusstopPole_Keio.json".into(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            },
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Error reading data");
    }

    #[test]
    fn passes_upstream_status_through() {
        let err = ApiError::from(UpstreamError::Status(503));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.public_message(), "External API returned status: 503");

        let err = ApiError::from(UpstreamError::Status(404));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn parse_failures_are_internal() {
        let source = serde_json::from_str::<Vec<u8>>("{").unwrap_err();
        let err = ApiError::from(UpstreamError::Parse(source));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Error parsing response");
    }
}
