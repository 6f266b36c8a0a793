//! `roadnet`: analyze road networks without a renderer.
//!
//! ```text
//! roadnet <batch.json>
//! roadnet --estimate <City> [--estimate <City> ...]
//! ```
//!
//! A batch document carries an optional `config`, a list of `networks` and
//! a list of catalog cities to `estimate`. Each finished request is written
//! to stdout as one JSON line; logs go to stderr.

mod batch;

use std::process::ExitCode;

const USAGE: &str = "usage: roadnet <batch.json> | roadnet --estimate <City> [--estimate <City> ...]";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let input = match batch::parse_args(&args) {
        Ok(input) => input,
        Err(message) => {
            eprintln!("roadnet: {message}");
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    let lines = batch::run(input);
    let mut failed = false;
    for line in &lines {
        failed |= line.is_error();
        println!("{}", line.to_json());
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
