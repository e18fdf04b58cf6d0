use std::env;

use parley_ingest::{parse_args, run};

/// Reads inbound message bodies, normalizes them and prints canonical drafts.
///
/// Diagnostics go to stderr so stdout carries only the JSON result.
fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let result = parse_args(env::args().skip(1)).and_then(|args| run(&args));
    match result {
        Ok(output) => println!("{output}"),
        Err(error) => {
            tracing::error!("ingest failed: {error}");
            eprintln!("ingest_error={error}");
            std::process::exit(1);
        }
    }
}
