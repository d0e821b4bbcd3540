//! Purpose: Map one JSON operation object onto the closed `TxOp` union.
//! Exports: `TxOp`, `OpTag`, `TableName`, `DocId`, `parse_tx_op`.
//! Role: Operation dispatcher used by the transaction request parser.
//! Invariants: Exactly one discriminator key selects the variant; zero or several is `tx/malformed-op`.
//! Invariants: A variant constructor reads only its own fields and reports `tx/malformed-op-<tag>`.
//! Invariants: Every error carries the pretty-printed operation object.
use std::fmt;

use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum OpTag {
    Put,
    Delete,
    Erase,
    Call,
    Sql,
}

impl OpTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Put => "put",
            Self::Delete => "delete",
            Self::Erase => "erase",
            Self::Call => "call",
            Self::Sql => "sql",
        }
    }
}

impl fmt::Display for OpTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-empty table identifier.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TableName(String);

impl TableName {
    pub fn parse(name: &str) -> Option<Self> {
        if name.is_empty() {
            None
        } else {
            Some(Self(name.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum DocId {
    Str(String),
    Int(i64),
}

impl DocId {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self::Str(s.clone())),
            Value::Number(n) => n.as_i64().map(Self::Int),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TxOp {
    Put {
        table: TableName,
        doc: Map<String, Value>,
        valid_from: Option<OffsetDateTime>,
        valid_to: Option<OffsetDateTime>,
    },
    Delete {
        table: TableName,
        id: DocId,
        valid_from: Option<OffsetDateTime>,
        valid_to: Option<OffsetDateTime>,
    },
    Erase {
        table: TableName,
        id: DocId,
    },
    Call {
        fn_id: DocId,
        args: Vec<Value>,
    },
    Sql {
        sql: String,
        arg_rows: Vec<Vec<Value>>,
    },
}

impl TxOp {
    pub fn put(table: TableName, doc: Map<String, Value>) -> Self {
        Self::Put {
            table,
            doc,
            valid_from: None,
            valid_to: None,
        }
    }

    pub fn tag(&self) -> OpTag {
        match self {
            Self::Put { .. } => OpTag::Put,
            Self::Delete { .. } => OpTag::Delete,
            Self::Erase { .. } => OpTag::Erase,
            Self::Call { .. } => OpTag::Call,
            Self::Sql { .. } => OpTag::Sql,
        }
    }
}

type OpParser = fn(&OpFields<'_>) -> Result<TxOp, Error>;

const DISPATCH: &[(OpTag, OpParser)] = &[
    (OpTag::Put, parse_put),
    (OpTag::Delete, parse_delete),
    (OpTag::Erase, parse_erase),
    (OpTag::Call, parse_call),
    (OpTag::Sql, parse_sql),
];

pub fn parse_tx_op(node: &Value) -> Result<TxOp, Error> {
    let Some(map) = node.as_object() else {
        return Err(Error::new(ErrorKind::MalformedOp)
            .with_message("operation must be a JSON object")
            .with_json(node));
    };

    let mut found = DISPATCH
        .iter()
        .filter(|(tag, _)| map.contains_key(tag.as_str()));
    let (tag, parse) = match (found.next(), found.next()) {
        (Some(entry), None) => *entry,
        (None, _) => {
            let known = DISPATCH
                .iter()
                .map(|(tag, _)| tag.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(Error::new(ErrorKind::MalformedOp)
                .with_message("unrecognized operation")
                .with_hint(format!("Operations carry exactly one of: {known}."))
                .with_json(node));
        }
        (Some((first, _)), Some((second, _))) => {
            return Err(Error::new(ErrorKind::MalformedOp)
                .with_message(format!(
                    "ambiguous operation: both `{first}` and `{second}` present"
                ))
                .with_json(node));
        }
    };

    tracing::trace!(op = %tag, "dispatching tx op");
    parse(&OpFields { tag, map, node })
}

/// Field accessors that attribute failures to one operation variant.
struct OpFields<'a> {
    tag: OpTag,
    map: &'a Map<String, Value>,
    node: &'a Value,
}

impl OpFields<'_> {
    fn error(&self, message: impl Into<String>) -> Error {
        Error::new(ErrorKind::MalformedOpPayload(self.tag))
            .with_message(message)
            .with_json(self.node)
    }

    fn table(&self) -> Result<TableName, Error> {
        let key = self.tag.as_str();
        self.map
            .get(key)
            .and_then(Value::as_str)
            .and_then(TableName::parse)
            .ok_or_else(|| self.error(format!("`{key}` must name a table")))
    }

    fn doc_id(&self, key: &str) -> Result<DocId, Error> {
        match self.map.get(key) {
            None => Err(self.error(format!("missing `{key}`"))),
            Some(value) => DocId::from_json(value).ok_or_else(|| {
                self.error(format!("`{key}` must be a non-empty string or an integer"))
            }),
        }
    }

    fn optional_time(&self, key: &str) -> Result<Option<OffsetDateTime>, Error> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(text)) => OffsetDateTime::parse(text, &Rfc3339)
                .map(Some)
                .map_err(|err| {
                    self.error(format!("`{key}` must be an RFC 3339 timestamp"))
                        .with_source(err)
                }),
            Some(_) => Err(self.error(format!("`{key}` must be an RFC 3339 timestamp string"))),
        }
    }

    fn valid_time(&self) -> Result<(Option<OffsetDateTime>, Option<OffsetDateTime>), Error> {
        let valid_from = self.optional_time("valid_from")?;
        let valid_to = self.optional_time("valid_to")?;
        if let (Some(from), Some(to)) = (valid_from, valid_to)
            && to < from
        {
            return Err(self.error("`valid_to` precedes `valid_from`"));
        }
        Ok((valid_from, valid_to))
    }

    fn optional_list(&self, key: &str) -> Result<&[Value], Error> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(&[]),
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err(self.error(format!("`{key}` must be a list"))),
        }
    }
}

fn parse_put(fields: &OpFields<'_>) -> Result<TxOp, Error> {
    let table = fields.table()?;
    let doc = match fields.map.get("doc") {
        Some(Value::Object(doc)) => doc.clone(),
        Some(_) => return Err(fields.error("`doc` must be a JSON object")),
        None => return Err(fields.error("missing `doc`")),
    };
    let (valid_from, valid_to) = fields.valid_time()?;
    Ok(TxOp::Put {
        table,
        doc,
        valid_from,
        valid_to,
    })
}

fn parse_delete(fields: &OpFields<'_>) -> Result<TxOp, Error> {
    let table = fields.table()?;
    let id = fields.doc_id("id")?;
    let (valid_from, valid_to) = fields.valid_time()?;
    Ok(TxOp::Delete {
        table,
        id,
        valid_from,
        valid_to,
    })
}

fn parse_erase(fields: &OpFields<'_>) -> Result<TxOp, Error> {
    Ok(TxOp::Erase {
        table: fields.table()?,
        id: fields.doc_id("id")?,
    })
}

fn parse_call(fields: &OpFields<'_>) -> Result<TxOp, Error> {
    let fn_id = fields.doc_id(OpTag::Call.as_str())?;
    let args = fields.optional_list("args")?.to_vec();
    Ok(TxOp::Call { fn_id, args })
}

fn parse_sql(fields: &OpFields<'_>) -> Result<TxOp, Error> {
    let sql = match fields.map.get(OpTag::Sql.as_str()).and_then(Value::as_str) {
        Some(sql) if !sql.trim().is_empty() => sql.to_string(),
        _ => return Err(fields.error("`sql` must be a non-empty string")),
    };
    let arg_rows = fields
        .optional_list("arg_rows")?
        .iter()
        .map(|row| match row {
            Value::Array(args) => Ok(args.clone()),
            _ => Err(fields.error("each entry of `arg_rows` must be a list")),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TxOp::Sql { sql, arg_rows })
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::{DocId, OpTag, TableName, TxOp, parse_tx_op};
    use crate::core::error::ErrorKind;
    use serde_json::{Map, json};
    use time::macros::datetime;

    fn docs() -> TableName {
        TableName::parse("docs").expect("table")
    }

    #[test]
    fn put_equals_literal_construction() {
        let op = parse_tx_op(&json!({"put": "docs", "doc": {}})).unwrap();
        assert_eq!(op, TxOp::put(docs(), Map::new()));
        assert_eq!(op.tag(), OpTag::Put);
    }

    #[test]
    fn put_with_valid_time() {
        let op = parse_tx_op(&json!({
            "put": "docs",
            "doc": {"xt/id": 1},
            "valid_from": "2024-01-01T00:00:00Z",
            "valid_to": "2024-06-01T00:00:00Z"
        }))
        .unwrap();
        let TxOp::Put {
            valid_from,
            valid_to,
            doc,
            ..
        } = op
        else {
            panic!("expected put");
        };
        assert_eq!(valid_from, Some(datetime!(2024-01-01 0:00 UTC)));
        assert_eq!(valid_to, Some(datetime!(2024-06-01 0:00 UTC)));
        assert_eq!(doc.get("xt/id"), Some(&json!(1)));
    }

    #[test]
    fn delete_erase_call_sql() {
        assert_eq!(
            parse_tx_op(&json!({"delete": "docs", "id": "a"})).unwrap(),
            TxOp::Delete {
                table: docs(),
                id: DocId::Str("a".to_string()),
                valid_from: None,
                valid_to: None,
            }
        );
        assert_eq!(
            parse_tx_op(&json!({"erase": "docs", "id": 4})).unwrap(),
            TxOp::Erase {
                table: docs(),
                id: DocId::Int(4),
            }
        );
        assert_eq!(
            parse_tx_op(&json!({"call": "inc", "args": [1, "x"]})).unwrap(),
            TxOp::Call {
                fn_id: DocId::Str("inc".to_string()),
                args: vec![json!(1), json!("x")],
            }
        );
        assert_eq!(
            parse_tx_op(&json!({"call": 9})).unwrap(),
            TxOp::Call {
                fn_id: DocId::Int(9),
                args: Vec::new(),
            }
        );
        assert_eq!(
            parse_tx_op(&json!({"sql": "INSERT INTO t RECORDS ?", "arg_rows": [[1], [2]]}))
                .unwrap(),
            TxOp::Sql {
                sql: "INSERT INTO t RECORDS ?".to_string(),
                arg_rows: vec![vec![json!(1)], vec![json!(2)]],
            }
        );
    }

    #[test]
    fn unknown_discriminator_is_malformed_op() {
        let node = json!({"upsert": "docs", "doc": {}});
        let err = parse_tx_op(&node).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedOp);
        assert_eq!(
            err.json(),
            Some(serde_json::to_string_pretty(&node).unwrap().as_str())
        );

        let err = parse_tx_op(&json!("put")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedOp);
    }

    #[test]
    fn two_discriminators_are_rejected() {
        let err = parse_tx_op(&json!({"put": "docs", "doc": {}, "erase": "docs", "id": 1}))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedOp);
        assert!(err.message().unwrap().contains("ambiguous"));
    }

    #[test]
    fn missing_payload_names_the_variant() {
        let cases = [
            (json!({"put": "docs"}), OpTag::Put),
            (json!({"put": 3, "doc": {}}), OpTag::Put),
            (json!({"put": "", "doc": {}}), OpTag::Put),
            (json!({"put": "docs", "doc": []}), OpTag::Put),
            (json!({"delete": "docs"}), OpTag::Delete),
            (json!({"delete": "docs", "id": 1.5}), OpTag::Delete),
            (json!({"erase": "docs", "id": ""}), OpTag::Erase),
            (json!({"call": "f", "args": {}}), OpTag::Call),
            (json!({"call": null}), OpTag::Call),
            (json!({"sql": "  "}), OpTag::Sql),
            (json!({"sql": "SELECT 1", "arg_rows": [1]}), OpTag::Sql),
        ];
        for (node, tag) in cases {
            let err = parse_tx_op(&node).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedOpPayload(tag), "input: {node}");
            assert_eq!(err.kind().code(), format!("tx/malformed-op-{tag}"));
        }
    }

    #[test]
    fn bad_timestamp_keeps_cause() {
        let err = parse_tx_op(&json!({"put": "docs", "doc": {}, "valid_from": "yesterday"}))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedOpPayload(OpTag::Put));
        assert!(err.source().is_some());
    }

    #[test]
    fn inverted_valid_time_is_rejected() {
        let err = parse_tx_op(&json!({
            "delete": "docs",
            "id": 1,
            "valid_from": "2024-06-01T00:00:00Z",
            "valid_to": "2024-01-01T00:00:00Z"
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedOpPayload(OpTag::Delete));
    }
}
