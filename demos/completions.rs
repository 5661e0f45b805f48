//! Code completion / intellisense
//!
//! Demonstrates cursor positions and completion suggestions for half-typed
//! PromQL queries.
//!
//! Run: cargo run --example completions

use promql_language_tools::{Column, CompletionKind, Error, PromqlLanguageService, Schema};

fn main() -> Result<(), Error> {
    let service = PromqlLanguageService::new()?;

    // Schema for context-aware completions
    let schema = Schema::with_index("metrics-*")
        .column(Column::counter("http_requests_total").description("Requests served"))
        .column(Column::gauge("memory_bytes"))
        .column(Column::keyword("job"))
        .column(Column::keyword("instance"));

    let queries = [
        "",
        "sum ",
        "rate(http_requests_total",
        "http_requests_total{job=\"api\", ",
        "sum(rate(http_requests_total[5m])) by (",
        "histogram_quantile(0.9, ",
        "http_requests_total / ",
    ];

    for query in queries {
        let cursor = query.len();
        let position = service.get_query_position(query, cursor);
        println!("Query: \"{query}\" (cursor at {cursor})");
        println!("Position: {}", serde_json::to_string(&position)?);

        let result = service.get_completions(query, cursor, Some(&schema));
        println!("Suggestions ({} items):", result.items.len());
        for item in result.items.iter().take(8) {
            println!("  {:24} {:?}", item.label, item.kind);
        }
        println!();
    }

    // Only labels inside a label map
    let query = "up{";
    let result = service.get_completions(query, query.len(), Some(&schema));
    println!("Label suggestions for \"{query}\":");
    for item in result
        .items
        .iter()
        .filter(|i| i.kind == CompletionKind::Label)
    {
        println!("  {} - {:?}", item.label, item.detail);
    }

    Ok(())
}
