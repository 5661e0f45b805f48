//! Basic PromQL syntax validation
//!
//! Checks a few queries for syntax errors and prints the diagnostics.
//!
//! Run: `cargo run --example basic_validation`

use promql_language_tools::{Error, PromqlLanguageService};

fn main() -> Result<(), Error> {
    let service = PromqlLanguageService::new()?;

    let result = service.validate_syntax(r#"rate(http_requests_total{job="api"}[5m])"#);
    println!("Valid query: {}", result.is_valid());

    let result = service.validate_syntax("sum(rate(http_requests_total[5m]");
    println!("\nInvalid query diagnostics:");
    for diag in result.diagnostics() {
        println!(
            "  [{:?}] {} (line {}, col {})",
            diag.severity, diag.message, diag.line, diag.column
        );
    }

    let result = service.validate_syntax("up{job=} + ) [5m");
    println!("\nMultiple errors ({} total):", result.diagnostics().len());
    for diag in result.errors() {
        println!("  {}", diag.message);
    }

    Ok(())
}
