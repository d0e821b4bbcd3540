// Contract tests for transaction submissions through the public API.
use std::error::Error as _;

use serde_json::{Map, Value, json};
use txjson::api::{
    DocId, ErrorKind, OpTag, TableName, TxOp, TxOptions, TxRequest, parse_tx_op,
    parse_tx_request, parse_tx_request_str,
};

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).expect("pretty json")
}

fn docs() -> TableName {
    TableName::parse("docs").expect("table")
}

#[test]
fn single_put_request() {
    let request = parse_tx_request(&json!({"tx_ops": [{"put": "docs", "doc": {}}]})).unwrap();
    assert_eq!(
        request,
        TxRequest {
            ops: vec![TxOp::put(docs(), Map::new())],
            options: TxOptions::default(),
        }
    );
}

#[test]
fn mixed_batch_keeps_order() {
    let request = parse_tx_request_str(
        r#"{
            "tx_ops": [
                {"put": "docs", "doc": {"xt/id": 1, "name": "a"}},
                {"delete": "docs", "id": 1, "valid_from": "2024-01-01T00:00:00Z"},
                {"erase": "docs", "id": "k"},
                {"call": "inc", "args": [1]},
                {"sql": "UPDATE docs SET n = ? WHERE xt$id = ?", "arg_rows": [[1, 2]]}
            ],
            "tx_options": {"default_tz": "UTC"}
        }"#,
    )
    .unwrap();

    let tags: Vec<OpTag> = request.ops.iter().map(TxOp::tag).collect();
    assert_eq!(
        tags,
        vec![OpTag::Put, OpTag::Delete, OpTag::Erase, OpTag::Call, OpTag::Sql]
    );
    assert_eq!(
        request.ops[2],
        TxOp::Erase {
            table: docs(),
            id: DocId::Str("k".to_string()),
        }
    );
    assert_eq!(request.options.default_tz.as_deref(), Some("UTC"));
}

#[test]
fn missing_tx_ops_reports_whole_document() {
    let node = json!({});
    let err = parse_tx_request(&node).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingTxOps);
    assert_eq!(err.kind().code(), "tx/missing-tx-ops");
    assert_eq!(err.json(), Some(pretty(&node).as_str()));
}

#[test]
fn non_array_tx_ops_is_malformed_tx_ops() {
    let err = parse_tx_request(&json!({"tx_ops": {}})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedTxOps);
}

#[test]
fn non_object_document_is_malformed_tx() {
    for node in [json!([]), json!("tx"), json!(1), json!([{"tx_ops": []}])] {
        let err = parse_tx_request(&node).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedTx, "input: {node}");
        assert_eq!(err.json(), Some(pretty(&node).as_str()));
    }
}

#[test]
fn omitted_options_are_default() {
    let request = parse_tx_request(&json!({"tx_ops": []})).unwrap();
    assert_eq!(request.options, TxOptions::default());
}

#[test]
fn nested_op_error_is_not_rewrapped() {
    let op = json!({"put": "docs", "doc": "not-a-map"});
    let err = parse_tx_request(&json!({"tx_ops": [op.clone()]})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedOpPayload(OpTag::Put));
    assert_eq!(err.json(), Some(pretty(&op).as_str()));
    assert!(err.source().is_none());

    let direct = parse_tx_op(&op).unwrap_err();
    assert_eq!(direct.kind(), err.kind());
    assert_eq!(direct.json(), err.json());
}

#[test]
fn malformed_options_carry_a_cause() {
    let err = parse_tx_request(&json!({"tx_ops": [], "tx_options": {"nope": true}})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedTxOptions);
    assert!(err.source().is_some());
}

#[test]
fn invalid_text_is_invalid_json() {
    let err = parse_tx_request_str("{tx_ops: []}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidJson);
}

#[test]
fn parsing_is_safe_across_threads() {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                let node = json!({"tx_ops": [{"erase": "docs", "id": i}]});
                parse_tx_request(&node).map(|request| request.ops)
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        let ops = handle.join().expect("thread").unwrap();
        assert_eq!(
            ops,
            vec![TxOp::Erase {
                table: docs(),
                id: DocId::Int(i as i64),
            }]
        );
    }
}
