//! OQL query builder.

use gridstore_protocol::EncodedValue;
use gridstore_types::ToValue;

use crate::error::Error;

/// An OQL query with positional bind parameters.
///
/// Borrows the query text and parameters for the duration of the call; the
/// destination type parameter of
/// [`query_single`](crate::Client::query_single) and friends selects how
/// each result value is decoded.
///
/// # Example
///
/// ```rust,ignore
/// let query = Query::new("SELECT * FROM /orders WHERE total > $1").bind(&100i32);
/// let totals: Vec<f64> = client.query_list(&query).await?;
/// ```
pub struct Query<'a> {
    oql: &'a str,
    parameters: Vec<&'a dyn ToValue>,
}

impl<'a> Query<'a> {
    /// Create a query from OQL text.
    #[must_use]
    pub fn new(oql: &'a str) -> Self {
        Self {
            oql,
            parameters: Vec::new(),
        }
    }

    /// Append one positional bind parameter.
    #[must_use]
    pub fn bind(mut self, parameter: &'a dyn ToValue) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// The query text.
    #[must_use]
    pub fn oql(&self) -> &str {
        self.oql
    }

    pub(crate) fn encode_parameters(&self) -> Result<Vec<EncodedValue>, Error> {
        self.parameters
            .iter()
            .map(|parameter| parameter.to_encoded().map_err(Error::Value))
            .collect()
    }
}

impl std::fmt::Debug for Query<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("oql", &self.oql)
            .field("parameters", &self.parameters.len())
            .finish()
    }
}
