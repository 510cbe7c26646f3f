use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OperatorIdError {
    #[error("invalid operator format: {0}")]
    InvalidFormat(String),
}

/// An operator identifier of the form `<namespace>:<OperatorName>`,
/// e.g. `odpt.Operator:Toei`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperatorId {
    raw: String,
    split: usize,
}

impl OperatorId {
    pub fn parse(value: &str) -> Result<Self, OperatorIdError> {
        let mut parts = value.split(':');
        let namespace = parts.next().unwrap_or_default();
        if parts.next().is_none() || parts.next().is_some() {
            return Err(OperatorIdError::InvalidFormat(value.to_string()));
        }
        Ok(Self {
            raw: value.to_string(),
            split: namespace.len(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.raw[..self.split]
    }

    pub fn name(&self) -> &str {
        &self.raw[self.split + 1..]
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_namespace_and_name() {
        let operator = OperatorId::parse("odpt.Operator:Toei").unwrap();
        assert_eq!(operator.namespace(), "odpt.Operator");
        assert_eq!(operator.name(), "Toei");
        assert_eq!(operator.to_string(), "odpt.Operator:Toei");
    }

    #[test]
    fn allows_empty_segments() {
        let operator = OperatorId::parse("odpt.Operator:").unwrap();
        assert_eq!(operator.name(), "");
        let operator = OperatorId::parse(":Toei").unwrap();
        assert_eq!(operator.namespace(), "");
        assert_eq!(operator.name(), "Toei");
    }

    #[test]
    fn rejects_wrong_colon_count() {
        assert!(OperatorId::parse("Toei").is_err());
        assert!(OperatorId::parse("").is_err());
        assert!(OperatorId::parse("odpt.Operator:Toei:Extra").is_err());
        assert!(OperatorId::parse("a::b").is_err());
    }
}
