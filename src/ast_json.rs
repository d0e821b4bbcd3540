//! Purpose: Render typed requests and clauses back to JSON for CLI output.
//! Exports: `request_json`, `op_json`, `with_json`, `return_json`.
//! Role: Display-only envelope; downstream consumers take the typed values, not this JSON.
//! Invariants: Stable key names/order per variant; `op` names the variant.
//! Invariants: Expressions render in the same notation the parsers accept.

use serde_json::{Map, Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use txjson::api::{
    DocId, Error, ErrorKind, Expr, ReturnClause, TxOp, TxOptions, TxRequest, WithClause,
};

pub(crate) fn request_json(request: &TxRequest) -> Result<Value, Error> {
    let ops = request
        .ops
        .iter()
        .map(op_json)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(json!({
        "ops": ops,
        "options": options_json(&request.options)?,
    }))
}

pub(crate) fn op_json(op: &TxOp) -> Result<Value, Error> {
    let mut map = Map::new();
    map.insert("op".to_string(), json!(op.tag().as_str()));
    match op {
        TxOp::Put {
            table,
            doc,
            valid_from,
            valid_to,
        } => {
            map.insert("table".to_string(), json!(table.as_str()));
            map.insert("doc".to_string(), Value::Object(doc.clone()));
            insert_time(&mut map, "valid_from", *valid_from)?;
            insert_time(&mut map, "valid_to", *valid_to)?;
        }
        TxOp::Delete {
            table,
            id,
            valid_from,
            valid_to,
        } => {
            map.insert("table".to_string(), json!(table.as_str()));
            map.insert("id".to_string(), doc_id_json(id));
            insert_time(&mut map, "valid_from", *valid_from)?;
            insert_time(&mut map, "valid_to", *valid_to)?;
        }
        TxOp::Erase { table, id } => {
            map.insert("table".to_string(), json!(table.as_str()));
            map.insert("id".to_string(), doc_id_json(id));
        }
        TxOp::Call { fn_id, args } => {
            map.insert("fn_id".to_string(), doc_id_json(fn_id));
            map.insert("args".to_string(), json!(args));
        }
        TxOp::Sql { sql, arg_rows } => {
            map.insert("sql".to_string(), json!(sql));
            map.insert("arg_rows".to_string(), json!(arg_rows));
        }
    }
    Ok(Value::Object(map))
}

pub(crate) fn with_json(clause: &WithClause) -> Value {
    let bindings = clause
        .bindings
        .iter()
        .map(|binding| json!({ "name": binding.name, "expr": expr_json(&binding.expr) }))
        .collect::<Vec<_>>();
    json!({ "with": bindings })
}

pub(crate) fn return_json(clause: &ReturnClause) -> Value {
    let cols = clause
        .cols
        .iter()
        .map(|col| json!({ "column": col.column, "expr": expr_json(&col.expr) }))
        .collect::<Vec<_>>();
    json!({ "return": cols })
}

fn options_json(options: &TxOptions) -> Result<Value, Error> {
    let mut map = Map::new();
    insert_time(&mut map, "system_time", options.system_time)?;
    if let Some(tz) = &options.default_tz {
        map.insert("default_tz".to_string(), json!(tz));
    }
    map.insert(
        "default_all_valid_time".to_string(),
        json!(options.default_all_valid_time),
    );
    Ok(Value::Object(map))
}

fn insert_time(
    map: &mut Map<String, Value>,
    key: &str,
    time: Option<OffsetDateTime>,
) -> Result<(), Error> {
    let Some(time) = time else {
        return Ok(());
    };
    let text = time.format(&Rfc3339).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message(format!("failed to format {key}"))
            .with_source(err)
    })?;
    map.insert(key.to_string(), json!(text));
    Ok(())
}

fn doc_id_json(id: &DocId) -> Value {
    match id {
        DocId::Str(s) => json!(s),
        DocId::Int(n) => json!(n),
    }
}

fn expr_json(expr: &Expr) -> Value {
    match expr {
        Expr::Null => Value::Null,
        Expr::Bool(b) => json!(b),
        Expr::Int(n) => json!(n),
        Expr::Float(n) => json!(n),
        Expr::Str(s) => json!({ "@value": s }),
        Expr::Var(name) => json!(name),
        Expr::Param(name) => json!(format!("${name}")),
        Expr::List(items) => Value::Array(items.iter().map(expr_json).collect()),
        Expr::Call { f, args } => {
            let args = args.iter().map(expr_json).collect::<Vec<_>>();
            let mut map = Map::new();
            map.insert(f.clone(), Value::Array(args));
            Value::Object(map)
        }
    }
}
