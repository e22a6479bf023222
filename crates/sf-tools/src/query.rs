//! Ad-hoc SOQL reads.

use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::context::{QueryScope, ToolContext};
use crate::envelope::ToolResponse;
use crate::error::{Error, Result};
use crate::registry::{invoke, ToolArgs, ToolDefinition, ToolHandler};

#[derive(Debug, Clone, Deserialize)]
pub struct QueryArgs {
    pub query: String,
    #[serde(default)]
    pub use_tooling_api: bool,
}

impl ToolArgs for QueryArgs {}

/// Collapse runs of whitespace, including newlines, to single spaces.
pub fn normalize_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove the `attributes` envelope from records and every nested record.
pub fn strip_attributes(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.remove("attributes");
            map.values_mut().for_each(strip_attributes);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_attributes),
        _ => {}
    }
}

/// Run the query verbatim and return the first page of records.
pub async fn execute_soql_query(ctx: &ToolContext, args: QueryArgs) -> Result<ToolResponse> {
    let query = normalize_query(&args.query);
    if query.is_empty() {
        return Err(Error::validation("query must not be empty"));
    }

    let conn = ctx.connect().await?;
    let scope = if args.use_tooling_api {
        QueryScope::Tooling
    } else {
        QueryScope::Rest
    };
    let result = match scope {
        QueryScope::Rest => conn.client().query::<Value>(&query).await,
        QueryScope::Tooling => conn.client().tooling_query::<Value>(&query).await,
    };

    match result {
        Ok(mut result) => {
            result.records.iter_mut().for_each(strip_attributes);
            Ok(ToolResponse::success(Some("execute_soql_query"))
                .with("totalSize", result.total_size)
                .with("done", result.done)
                .with_opt("nextRecordsUrl", result.next_records_url)
                .with("records", result.records))
        }
        Err(e) => Ok(ToolResponse::from_error(Some("execute_soql_query"), &Error::from(e)).with("query", query)),
    }
}

pub struct ExecuteSoqlQuery;

impl ToolHandler for ExecuteSoqlQuery {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "execute_soql_query",
            "Run a SOQL query and return the first page of records. Set use_tooling_api \
             to query Tooling objects such as ApexClass or FieldDefinition.",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "SOQL query text"},
                    "use_tooling_api": {"type": "boolean", "default": false}
                },
                "required": ["query"]
            }),
        )
    }

    fn call<'a>(&'a self, ctx: &'a ToolContext, args: Value) -> BoxFuture<'a, ToolResponse> {
        Box::pin(invoke("execute_soql_query", args, move |a| {
            execute_soql_query(ctx, a)
        }))
    }
}
