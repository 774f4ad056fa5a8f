//! End-to-end driver tests against scripted servers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use gridstore_client::{Client, Error, Json, Pool, Query, RetryPolicy, Value};
use gridstore_pool::ConnectionMetrics;
use gridstore_protocol::{
    EncodedValue, EncodedValueList, Entry, ErrorDetail, KeyedError, Message, QueryResult, Table,
};
use gridstore_testing::{ScriptedProvider, ScriptedTransport};

async fn client_replying(responses: &[Message]) -> Client {
    let pool = Arc::new(Pool::new());
    pool.add_provider(Box::new(ScriptedProvider::with_transports(
        "server",
        vec![ScriptedTransport::replying(responses)],
    )))
    .await;
    Client::new(pool)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Order {
    id: u32,
    total: f64,
}

#[tokio::test]
async fn test_put_sends_encoded_entry() {
    let transport = ScriptedTransport::replying(&[Message::PutResponse]);
    let log = transport.write_log();
    let pool = Arc::new(Pool::new());
    pool.add_provider(Box::new(ScriptedProvider::with_transports(
        "server",
        vec![transport],
    )))
    .await;
    let client = Client::new(pool);

    client.put("orders", "o-1", &42i32).await.expect("put");

    let written = log.lock().clone();
    let mut frame = bytes::Bytes::from(written);
    let (len, prefix) = gridstore_protocol::varint::peek_varint(&frame)
        .expect("prefix")
        .expect("complete");
    use bytes::Buf;
    frame.advance(prefix);
    assert_eq!(frame.len(), len as usize);
    let request = Message::decode(frame).expect("decode request");
    assert_eq!(
        request,
        Message::PutRequest {
            region: "orders".to_string(),
            key: EncodedValue::String("o-1".to_string()),
            value: EncodedValue::Int(42),
        }
    );
}

#[tokio::test]
async fn test_get_decodes_scalar() {
    let client = client_replying(&[Message::GetResponse {
        result: EncodedValue::Double(12.5),
    }])
    .await;

    let value: f64 = client.get("totals", "o-1").await.expect("get");
    assert!((value - 12.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_get_absent_key_decodes_to_none() {
    let client = client_replying(&[Message::GetResponse {
        result: EncodedValue::Null,
    }])
    .await;

    let value: Option<i32> = client.get("totals", "missing").await.expect("get");
    assert_eq!(value, None);
}

#[tokio::test]
async fn test_get_structured_value() {
    let order = Order {
        id: 7,
        total: 99.5,
    };
    use gridstore_client::ToValue;
    let client = client_replying(&[Message::GetResponse {
        result: Json(order.clone()).to_encoded().expect("encode"),
    }])
    .await;

    let Json(decoded): Json<Order> = client.get("orders", "o-7").await.expect("get");
    assert_eq!(decoded, order);
}

#[tokio::test]
async fn test_get_all_partial_failure() {
    // k2's stored value cannot be decoded dynamically; k1 and k3 can
    let response = Message::GetAllResponse {
        entries: vec![
            Entry {
                key: EncodedValue::String("k1".to_string()),
                value: EncodedValue::Int(1),
            },
            Entry {
                key: EncodedValue::String("k2".to_string()),
                value: EncodedValue::Json(r#"{"id":2}"#.to_string()),
            },
            Entry {
                key: EncodedValue::String("k3".to_string()),
                value: EncodedValue::Int(3),
            },
        ],
        failures: vec![],
    };
    let client = client_replying(&[response]).await;

    let result = client
        .get_all("orders", &["k1", "k2", "k3"])
        .await
        .expect("get_all");

    assert_eq!(result.entries.len(), 2);
    assert_eq!(
        result.entries.get(&Value::Text("k1".to_string())),
        Some(&Value::Int(1))
    );
    assert_eq!(
        result.entries.get(&Value::Text("k3".to_string())),
        Some(&Value::Int(3))
    );

    let failures = result.failures.expect("failures present");
    assert_eq!(failures.len(), 1);
    assert!(failures.contains_key(&Value::Text("k2".to_string())));
}

#[tokio::test]
async fn test_get_all_server_reported_failures() {
    let response = Message::GetAllResponse {
        entries: vec![],
        failures: vec![KeyedError {
            key: EncodedValue::String("k9".to_string()),
            error: ErrorDetail {
                code: 500,
                message: "partition offline".to_string(),
            },
        }],
    };
    let client = client_replying(&[response]).await;

    let result = client.get_all("orders", &["k9"]).await.expect("get_all");
    let failures = result.failures.expect("failures present");
    let failure = failures
        .get(&Value::Text("k9".to_string()))
        .expect("k9 failure");
    assert_eq!(failure.server_code(), Some(500));
}

#[tokio::test]
async fn test_get_all_no_failures_reports_absence() {
    let response = Message::GetAllResponse {
        entries: vec![Entry {
            key: EncodedValue::String("k1".to_string()),
            value: EncodedValue::Int(1),
        }],
        failures: vec![],
    };
    let client = client_replying(&[response]).await;

    let result = client.get_all("orders", &["k1"]).await.expect("get_all");
    assert!(result.failures.is_none());
}

#[tokio::test]
async fn test_put_all_reports_failed_keys() {
    let response = Message::PutAllResponse {
        failed_keys: vec![KeyedError {
            key: EncodedValue::String("bad".to_string()),
            error: ErrorDetail {
                code: 23,
                message: "constraint violated".to_string(),
            },
        }],
    };
    let client = client_replying(&[response]).await;

    let mut entries = HashMap::new();
    entries.insert("good", 1i32);
    entries.insert("bad", 2i32);

    let failures = client
        .put_all("orders", &entries)
        .await
        .expect("put_all")
        .expect("failures present");
    assert_eq!(failures.len(), 1);
    assert_eq!(
        failures
            .get(&Value::Text("bad".to_string()))
            .and_then(Error::server_code),
        Some(23)
    );
}

#[tokio::test]
async fn test_remove_and_size() {
    let client = client_replying(&[
        Message::RemoveResponse,
        Message::GetSizeResponse { size: 41 },
    ])
    .await;

    client.remove("orders", "o-1").await.expect("remove");
    assert_eq!(client.size("orders").await.expect("size"), 41);
}

#[tokio::test]
async fn test_function_execution_decodes_results() {
    let client = client_replying(&[Message::ExecuteFunctionOnRegionResponse {
        results: vec![EncodedValue::Int(3), EncodedValue::String("done".to_string())],
    }])
    .await;

    let results = client
        .execute_on_region("rebalance", "orders", &Value::Null)
        .await
        .expect("execute");
    assert_eq!(
        results,
        vec![Value::Int(3), Value::Text("done".to_string())]
    );
}

#[tokio::test]
async fn test_query_single_and_list() {
    let client = client_replying(&[
        Message::OqlQueryResponse {
            result: QueryResult::Single(EncodedValue::Long(99)),
        },
        Message::OqlQueryResponse {
            result: QueryResult::List(EncodedValueList {
                elements: vec![EncodedValue::Int(1), EncodedValue::Int(2)],
            }),
        },
    ])
    .await;

    let query = Query::new("SELECT COUNT(*) FROM /orders");
    let count: i64 = client.query_single(&query).await.expect("single");
    assert_eq!(count, 99);

    let query = Query::new("SELECT id FROM /orders WHERE total > $1").bind(&10i32);
    let ids: Vec<i32> = client.query_list(&query).await.expect("list");
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn test_query_table_preserves_per_column_order() {
    let client = client_replying(&[Message::OqlQueryResponse {
        result: QueryResult::Table(Table {
            columns: vec!["a".to_string(), "b".to_string()],
            values: vec![
                EncodedValueList {
                    elements: vec![EncodedValue::Int(1), EncodedValue::Int(2)],
                },
                EncodedValueList {
                    elements: vec![EncodedValue::Int(3), EncodedValue::Int(4)],
                },
            ],
        }),
    }])
    .await;

    let query = Query::new("SELECT a, b FROM /numbers");
    let table: HashMap<String, Vec<i32>> = client.query_table(&query).await.expect("table");
    assert_eq!(table.get("a"), Some(&vec![1, 2]));
    assert_eq!(table.get("b"), Some(&vec![3, 4]));
}

#[tokio::test]
async fn test_query_shape_mismatch() {
    let client = client_replying(&[Message::OqlQueryResponse {
        result: QueryResult::Single(EncodedValue::Int(1)),
    }])
    .await;

    let query = Query::new("SELECT id FROM /orders");
    let err = client
        .query_list::<i32>(&query)
        .await
        .expect_err("shape mismatch");
    assert!(matches!(err, Error::UnexpectedQueryShape { .. }));
}

#[tokio::test]
async fn test_retry_uses_a_fresh_connection_and_resends_request() {
    let dead = ScriptedTransport::closed_by_server();
    let dead_log = dead.write_log();
    let live = ScriptedTransport::replying(&[Message::GetSizeResponse { size: 7 }]);
    let live_log = live.write_log();

    let metrics = ConnectionMetrics::new();
    let pool = Arc::new(Pool::with_metrics(metrics.clone()));
    pool.add_provider(Box::new(ScriptedProvider::with_transports(
        "server",
        vec![dead, live],
    )))
    .await;
    let client = Client::with_retry_policy(
        pool,
        RetryPolicy::default().with_backoff(Duration::ZERO),
    );

    assert_eq!(client.size("orders").await.expect("size"), 7);

    // The whole operation restarted on a second connection: the first
    // (discarded) transport and the fresh one both saw the same request.
    let first = dead_log.lock().clone();
    let second = live_log.lock().clone();
    assert!(!first.is_empty());
    assert_eq!(first, second);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.created, 2);
    assert_eq!(snapshot.discarded, 1);
    assert_eq!(snapshot.active, 0);
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let client = client_replying(&[Message::ErrorResponse {
        error: ErrorDetail {
            code: 404,
            message: "region missing".to_string(),
        },
    }])
    .await;

    let err = client.size("nowhere").await.expect_err("server error");
    assert_eq!(err.server_code(), Some(404));
    assert!(!err.is_retryable());
}
