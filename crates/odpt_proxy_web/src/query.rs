use crate::error::ApiError;

/// Decoded query string. Lookups return the first value for a key, and an
/// empty value counts as absent.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn parse(raw: Option<&str>) -> Self {
        let pairs = url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes())
            .into_owned()
            .collect();
        Self { pairs }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.is_empty())
    }

    pub fn get_owned(&self, name: &str) -> Option<String> {
        self.get(name).map(str::to_string)
    }

    pub fn operator(&self) -> Result<&str, ApiError> {
        self.get("operator").ok_or(ApiError::MissingOperator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_percent_encoded_values() {
        let params = QueryParams::parse(Some("operator=odpt.Operator%3AToei&title=%E9%A7%85"));
        assert_eq!(params.operator().unwrap(), "odpt.Operator:Toei");
        assert_eq!(params.get("title"), Some("駅"));
    }

    #[test]
    fn first_value_wins() {
        let params = QueryParams::parse(Some("id=A&id=B"));
        assert_eq!(params.get("id"), Some("A"));

        let params = QueryParams::parse(Some("id=&id=B"));
        assert_eq!(params.get("id"), None);
    }

    #[test]
    fn missing_operator_is_an_error() {
        assert!(matches!(
            QueryParams::parse(None).operator(),
            Err(ApiError::MissingOperator)
        ));
        assert!(matches!(
            QueryParams::parse(Some("operator=")).operator(),
            Err(ApiError::MissingOperator)
        ));
    }
}
