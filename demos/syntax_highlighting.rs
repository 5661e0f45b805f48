//! Syntax highlighting with classifications
//!
//! Prints the classification spans of a PromQL query, then the query
//! colorized with ANSI escapes.
//!
//! Run: `cargo run --example syntax_highlighting`

use promql_language_tools::{ClassificationKind, ClassifiedSpan, Error, PromqlLanguageService};

fn main() -> Result<(), Error> {
    let service = PromqlLanguageService::new()?;

    let query = r#"sum by (job) (rate(http_requests_total{code=~"5.."}[5m])) > bool 0.5"#;
    println!("Query: {query}\n");

    let result = service.get_classifications(query);

    println!("Classifications:");
    for span in &result.spans {
        let text = &query[span.start..span.start + span.length];
        println!(
            "  {:24} {:?} ({}..{})",
            format!("\"{text}\""),
            span.kind,
            span.start,
            span.start + span.length
        );
    }

    println!("\nColorized (ANSI):");
    print_colorized(query, &result.spans);

    Ok(())
}

fn kind_to_color(kind: ClassificationKind) -> &'static str {
    match kind {
        ClassificationKind::Keyword | ClassificationKind::Operator => "\x1b[94m", // Blue
        ClassificationKind::Function | ClassificationKind::AggregateFunction => "\x1b[93m", // Yellow
        ClassificationKind::StringLiteral => "\x1b[92m", // Green
        ClassificationKind::Number | ClassificationKind::Duration => "\x1b[95m", // Magenta
        ClassificationKind::Metric => "\x1b[96m", // Cyan
        ClassificationKind::Label => "\x1b[97m",  // White
        _ => "\x1b[0m",
    }
}

fn print_colorized(query: &str, spans: &[ClassifiedSpan]) {
    let mut last_end = 0;

    for span in spans {
        if span.start > last_end {
            print!("{}", &query[last_end..span.start]);
        }

        let text = &query[span.start..span.start + span.length];
        let color = kind_to_color(span.kind);
        print!("{color}{text}\x1b[0m");

        last_end = span.start + span.length;
    }

    if last_end < query.len() {
        print!("{}", &query[last_end..]);
    }
    println!();
}
