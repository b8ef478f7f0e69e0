use crate::error::RecallError;
use crate::util::non_empty;

/// Search criteria for `recalls/recallsByVehicle`.
///
/// Every attribute is optional, but at least one must be set before the
/// query is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleQuery {
    pub make: Option<String>,
    pub model: Option<String>,
    pub model_year: Option<String>,
}

impl VehicleQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn make(mut self, make: impl Into<String>) -> Self {
        self.make = Some(make.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn model_year(mut self, year: impl ToString) -> Self {
        self.model_year = Some(year.to_string());
        self
    }

    /// Query-string parameters for the supplied attributes only.
    ///
    /// The year is sent under the registry's `modelYear` key. Blank values
    /// count as absent.
    pub fn params(&self) -> Result<Vec<(&'static str, String)>, RecallError> {
        let params: Vec<(&'static str, String)> = [
            ("make", self.make.as_deref()),
            ("model", self.model.as_deref()),
            ("modelYear", self.model_year.as_deref()),
        ]
        .into_iter()
        .filter_map(|(k, v)| non_empty(v).map(|v| (k, v.to_string())))
        .collect();

        if params.is_empty() {
            return Err(RecallError::InvalidArgument(
                "at least one of make, model or model year must be provided".to_string(),
            ));
        }
        Ok(params)
    }
}
