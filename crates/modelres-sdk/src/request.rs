//! Per-request query input

/// Comma-separated ordering keys, `-` prefix for descending
pub const ORDERING: &str = "ordering";
pub const OFFSET: &str = "offset";
pub const LIMIT: &str = "limit";
/// Condition expression, e.g. `a=p1 AND b=p2`
pub const CONDITIONS: &str = "conditions";
/// Placeholder values, e.g. `p1=x,p2=y,`
pub const PARAMETERS: &str = "parameters";
/// Primary key; may repeat
pub const PK: &str = "pk";

/// Query parameters of one request, split into the names the dispatcher
/// understands and the remaining flat lookups
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRequest {
    pub ordering: Option<String>,
    pub offset: Option<String>,
    pub limit: Option<String>,
    pub conditions: Option<String>,
    pub parameters: Option<String>,
    /// Raw primary keys in request order
    pub pks: Vec<String>,
    /// Remaining `field=value` pairs; a repeated name keeps its last value
    pub lookups: Vec<(String, String)>,
}

impl QueryRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort decoded query pairs into a request
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .fold(Self::new(), |request, (key, value)| request.with_param(key, value))
    }

    /// Add one query parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match key.as_str() {
            ORDERING => self.ordering = Some(value),
            OFFSET => self.offset = Some(value),
            LIMIT => self.limit = Some(value),
            CONDITIONS => self.conditions = Some(value),
            PARAMETERS => self.parameters = Some(value),
            PK => self.pks.push(value),
            _ => match self.lookups.iter_mut().find(|(name, _)| *name == key) {
                Some(slot) => slot.1 = value,
                None => self.lookups.push((key, value)),
            },
        }
        self
    }

    pub fn with_ordering(self, ordering: impl Into<String>) -> Self {
        self.with_param(ORDERING, ordering)
    }

    pub fn with_offset(self, offset: usize) -> Self {
        self.with_param(OFFSET, offset.to_string())
    }

    pub fn with_limit(self, limit: usize) -> Self {
        self.with_param(LIMIT, limit.to_string())
    }

    /// Set condition text and its parameter string
    pub fn with_conditions(
        self,
        conditions: impl Into<String>,
        parameters: impl Into<String>,
    ) -> Self {
        self.with_param(CONDITIONS, conditions)
            .with_param(PARAMETERS, parameters)
    }

    pub fn with_pk(self, pk: impl Into<String>) -> Self {
        self.with_param(PK, pk)
    }

    pub fn with_lookup(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_param(field, value)
    }

    /// Condition text when present and not blank
    pub fn condition_text(&self) -> Option<&str> {
        self.conditions
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_splits_reserved_names() {
        let request = QueryRequest::from_pairs([
            ("ordering", "-name"),
            ("pk", "1"),
            ("user", "frank"),
            ("pk", "2"),
            ("limit", "10"),
            ("user", "anna"),
            ("ip", "10.0.0.1"),
        ]);

        assert_eq!(request.ordering.as_deref(), Some("-name"));
        assert_eq!(request.limit.as_deref(), Some("10"));
        assert_eq!(request.pks, vec!["1", "2"]);
        assert_eq!(
            request.lookups,
            vec![
                ("user".to_string(), "anna".to_string()),
                ("ip".to_string(), "10.0.0.1".to_string())
            ]
        );
    }

    #[test]
    fn test_blank_conditions_are_absent() {
        assert_eq!(QueryRequest::new().condition_text(), None);
        assert_eq!(
            QueryRequest::new().with_conditions("   ", "").condition_text(),
            None
        );
        assert_eq!(
            QueryRequest::new().with_conditions("a=p", "p=1").condition_text(),
            Some("a=p")
        );
    }
}
