//! The operation facade.

use std::collections::HashMap;
use std::sync::Arc;

use gridstore_pool::Pool;
use gridstore_protocol::{EncodedValue, Message, MessageKind, QueryResult};
use gridstore_types::{FromValue, ToValue, Value, decode_value, decode_value_list, encode_list};

use crate::error::Error;
use crate::exchange::{Exchange, RetryPolicy};
use crate::query::Query;

/// Outcome of a bulk fetch.
///
/// Entries that decoded cleanly land in `entries`. Per-key failures,
/// whether reported by the server or hit while decoding a stored value,
/// land in `failures`, keyed by the decoded key. When nothing failed,
/// `failures` is absent rather than empty.
#[derive(Debug, Default)]
pub struct GetAllResult {
    /// Successfully fetched and decoded entries.
    pub entries: HashMap<Value, Value>,
    /// Per-key failures, absent when every key succeeded.
    pub failures: Option<HashMap<Value, Error>>,
}

/// High-level client for a GridStore cluster.
///
/// Thin operation builders over the shared connection pool: each call
/// assembles one schema message, runs it through the exchange engine (which
/// handles framing and transparent retry on transient transport failure)
/// and decodes the response.
///
/// # Example
///
/// ```rust,ignore
/// use gridstore_client::{Client, Pool};
///
/// let pool = Arc::new(Pool::new());
/// pool.add_server("grid-1.internal", 40404).await;
/// pool.add_credentials("app", "secret").await;
///
/// let client = Client::new(pool);
/// client.put("orders", "o-1001", &Json(order)).await?;
/// let total: f64 = client.get("totals", "o-1001").await?;
/// ```
pub struct Client {
    pool: Arc<Pool>,
    exchange: Exchange,
}

impl Client {
    /// Create a client over the given pool with the default retry policy.
    #[must_use]
    pub fn new(pool: Arc<Pool>) -> Self {
        Self::with_retry_policy(pool, RetryPolicy::default())
    }

    /// Create a client with an explicit retry policy.
    #[must_use]
    pub fn with_retry_policy(pool: Arc<Pool>, retry: RetryPolicy) -> Self {
        Self {
            exchange: Exchange::new(pool.clone(), retry),
            pool,
        }
    }

    /// The pool this client draws connections from.
    #[must_use]
    pub fn pool(&self) -> &Arc<Pool> {
        &self.pool
    }

    /// Store `value` under `key` in `region`.
    pub async fn put<K, V>(&self, region: &str, key: &K, value: &V) -> Result<(), Error>
    where
        K: ToValue + ?Sized,
        V: ToValue + ?Sized,
    {
        let request = Message::PutRequest {
            region: region.to_string(),
            key: key.to_encoded()?,
            value: value.to_encoded()?,
        };
        let response = self.exchange.execute(&request).await?;
        match response {
            Message::PutResponse => Ok(()),
            other => Err(Error::unexpected(MessageKind::PutResponse, other.kind())),
        }
    }

    /// Store `value` under `key` unless the key already exists.
    pub async fn put_if_absent<K, V>(&self, region: &str, key: &K, value: &V) -> Result<(), Error>
    where
        K: ToValue + ?Sized,
        V: ToValue + ?Sized,
    {
        let request = Message::PutIfAbsentRequest {
            region: region.to_string(),
            key: key.to_encoded()?,
            value: value.to_encoded()?,
        };
        let response = self.exchange.execute(&request).await?;
        match response {
            Message::PutIfAbsentResponse => Ok(()),
            other => Err(Error::unexpected(
                MessageKind::PutIfAbsentResponse,
                other.kind(),
            )),
        }
    }

    /// Fetch the value stored under `key`.
    ///
    /// The destination type selects the decoding: use `Option<T>` when the
    /// key may be absent (the null tag decodes to `None`), [`Value`] for
    /// dynamic scalars, or [`Json<T>`](gridstore_types::Json) for
    /// structured values.
    pub async fn get<K, V>(&self, region: &str, key: &K) -> Result<V, Error>
    where
        K: ToValue + ?Sized,
        V: FromValue,
    {
        let request = Message::GetRequest {
            region: region.to_string(),
            key: key.to_encoded()?,
        };
        let response = self.exchange.execute(&request).await?;
        let result = match response {
            Message::GetResponse { result } => result,
            other => return Err(Error::unexpected(MessageKind::GetResponse, other.kind())),
        };
        Ok(decode_value(&result)?)
    }

    /// Fetch many keys at once.
    ///
    /// Dynamic decoding applies to every returned entry; a value that
    /// fails to decode diverts that key into the failure map without
    /// aborting the rest. Structured values need the typed
    /// [`get`](Self::get) path and will surface here as per-key failures.
    pub async fn get_all<K>(&self, region: &str, keys: &[K]) -> Result<GetAllResult, Error>
    where
        K: ToValue,
    {
        let request = Message::GetAllRequest {
            region: region.to_string(),
            keys: encode_list(keys)?,
        };
        let response = self.exchange.execute(&request).await?;
        let (entries, failures) = match response {
            Message::GetAllResponse { entries, failures } => (entries, failures),
            other => {
                return Err(Error::unexpected(MessageKind::GetAllResponse, other.kind()));
            }
        };

        let mut decoded_entries = HashMap::with_capacity(entries.len());
        let mut decoded_failures = HashMap::new();

        for entry in entries {
            let key: Value = decode_value(&entry.key)
                .map_err(Error::decode_context("unable to decode bulk fetch key"))?;
            match decode_value::<Value>(&entry.value) {
                Ok(value) => {
                    decoded_entries.insert(key, value);
                }
                Err(source) => {
                    let context = format!("unable to decode value for key {key}");
                    decoded_failures.insert(key, Error::Decode { context, source });
                }
            }
        }

        for failure in failures {
            let key: Value = decode_value(&failure.key).map_err(Error::decode_context(
                "unable to decode bulk fetch failure key",
            ))?;
            decoded_failures.insert(key, Error::Server(failure.error));
        }

        Ok(GetAllResult {
            entries: decoded_entries,
            failures: (!decoded_failures.is_empty()).then_some(decoded_failures),
        })
    }

    /// Store many entries at once.
    ///
    /// Returns the per-key failures the server reported, or `None` when
    /// every entry stored cleanly.
    pub async fn put_all<K, V>(
        &self,
        region: &str,
        entries: &HashMap<K, V>,
    ) -> Result<Option<HashMap<Value, Error>>, Error>
    where
        K: ToValue,
        V: ToValue,
    {
        let mut encoded = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            encoded.push(gridstore_protocol::Entry {
                key: key.to_encoded()?,
                value: value.to_encoded()?,
            });
        }
        let request = Message::PutAllRequest {
            region: region.to_string(),
            entries: encoded,
        };
        let response = self.exchange.execute(&request).await?;
        let failed_keys = match response {
            Message::PutAllResponse { failed_keys } => failed_keys,
            other => {
                return Err(Error::unexpected(MessageKind::PutAllResponse, other.kind()));
            }
        };

        let mut failures = HashMap::with_capacity(failed_keys.len());
        for failed in failed_keys {
            let key: Value = decode_value(&failed.key).map_err(Error::decode_context(
                "unable to decode failed bulk store key",
            ))?;
            failures.insert(key, Error::Server(failed.error));
        }
        Ok((!failures.is_empty()).then_some(failures))
    }

    /// Delete the entry stored under `key`.
    pub async fn remove<K>(&self, region: &str, key: &K) -> Result<(), Error>
    where
        K: ToValue + ?Sized,
    {
        let request = Message::RemoveRequest {
            region: region.to_string(),
            key: key.to_encoded()?,
        };
        let response = self.exchange.execute(&request).await?;
        match response {
            Message::RemoveResponse => Ok(()),
            other => Err(Error::unexpected(MessageKind::RemoveResponse, other.kind())),
        }
    }

    /// Number of entries in `region`.
    pub async fn size(&self, region: &str) -> Result<i32, Error> {
        let request = Message::GetSizeRequest {
            region: region.to_string(),
        };
        let response = self.exchange.execute(&request).await?;
        match response {
            Message::GetSizeResponse { size } => Ok(size),
            other => Err(Error::unexpected(
                MessageKind::GetSizeResponse,
                other.kind(),
            )),
        }
    }

    /// Invoke a server-side function against a region.
    pub async fn execute_on_region<A>(
        &self,
        function_id: &str,
        region: &str,
        arguments: &A,
    ) -> Result<Vec<Value>, Error>
    where
        A: ToValue + ?Sized,
    {
        let request = Message::ExecuteFunctionOnRegionRequest {
            function_id: function_id.to_string(),
            region: region.to_string(),
            arguments: arguments.to_encoded()?,
        };
        let response = self.exchange.execute(&request).await?;
        let results = match response {
            Message::ExecuteFunctionOnRegionResponse { results } => results,
            other => {
                return Err(Error::unexpected(
                    MessageKind::ExecuteFunctionOnRegionResponse,
                    other.kind(),
                ));
            }
        };
        decode_function_results(&results)
    }

    /// Invoke a server-side function on the named members.
    pub async fn execute_on_members<A>(
        &self,
        function_id: &str,
        members: &[String],
        arguments: &A,
    ) -> Result<Vec<Value>, Error>
    where
        A: ToValue + ?Sized,
    {
        let request = Message::ExecuteFunctionOnMemberRequest {
            function_id: function_id.to_string(),
            members: members.to_vec(),
            arguments: arguments.to_encoded()?,
        };
        let response = self.exchange.execute(&request).await?;
        let results = match response {
            Message::ExecuteFunctionOnMemberResponse { results } => results,
            other => {
                return Err(Error::unexpected(
                    MessageKind::ExecuteFunctionOnMemberResponse,
                    other.kind(),
                ));
            }
        };
        decode_function_results(&results)
    }

    /// Invoke a server-side function on the named groups.
    pub async fn execute_on_groups<A>(
        &self,
        function_id: &str,
        groups: &[String],
        arguments: &A,
    ) -> Result<Vec<Value>, Error>
    where
        A: ToValue + ?Sized,
    {
        let request = Message::ExecuteFunctionOnGroupRequest {
            function_id: function_id.to_string(),
            groups: groups.to_vec(),
            arguments: arguments.to_encoded()?,
        };
        let response = self.exchange.execute(&request).await?;
        let results = match response {
            Message::ExecuteFunctionOnGroupResponse { results } => results,
            other => {
                return Err(Error::unexpected(
                    MessageKind::ExecuteFunctionOnGroupResponse,
                    other.kind(),
                ));
            }
        };
        decode_function_results(&results)
    }

    /// Run a query expecting a single result value.
    pub async fn query_single<T: FromValue>(&self, query: &Query<'_>) -> Result<T, Error> {
        match self.run_query(query).await? {
            QueryResult::Single(value) => {
                decode_value(&value).map_err(Error::decode_context("unable to decode query result"))
            }
            other => Err(unexpected_shape("single", &other)),
        }
    }

    /// Run a query expecting a flat list of result values.
    pub async fn query_list<T: FromValue>(&self, query: &Query<'_>) -> Result<Vec<T>, Error> {
        match self.run_query(query).await? {
            QueryResult::List(list) => decode_value_list(&list)
                .map_err(Error::decode_context("unable to decode query result")),
            other => Err(unexpected_shape("list", &other)),
        }
    }

    /// Run a query expecting a tabular result.
    ///
    /// Column order in the returned map is not meaningful; row order
    /// within each column is.
    pub async fn query_table<T: FromValue>(
        &self,
        query: &Query<'_>,
    ) -> Result<HashMap<String, Vec<T>>, Error> {
        match self.run_query(query).await? {
            QueryResult::Table(table) => Ok(gridstore_types::decode_table(&table)?),
            other => Err(unexpected_shape("table", &other)),
        }
    }

    async fn run_query(&self, query: &Query<'_>) -> Result<QueryResult, Error> {
        let request = Message::OqlQueryRequest {
            query: query.oql().to_string(),
            bind_parameters: query.encode_parameters()?,
        };
        let response = self.exchange.execute(&request).await?;
        match response {
            Message::OqlQueryResponse { result } => Ok(result),
            other => Err(Error::unexpected(
                MessageKind::OqlQueryResponse,
                other.kind(),
            )),
        }
    }
}

fn decode_function_results(results: &[EncodedValue]) -> Result<Vec<Value>, Error> {
    results
        .iter()
        .map(|value| {
            decode_value::<Value>(value)
                .map_err(Error::decode_context("unable to decode function result value"))
        })
        .collect()
}

fn unexpected_shape(expected: &'static str, actual: &QueryResult) -> Error {
    let actual = match actual {
        QueryResult::Single(_) => "single",
        QueryResult::List(_) => "list",
        QueryResult::Table(_) => "table",
    };
    Error::UnexpectedQueryShape { expected, actual }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}
