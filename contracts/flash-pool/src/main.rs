//! Flash Pool - Host Entry Point
//!
//! Reads one CBOR `HostRequest` from stdin, runs the group against the
//! snapshot it carries and writes a CBOR `HostResponse` to stdout.
//!
//! ```text
//! stdin:  { config, chain, group, state }
//! stdout: { approved, error, recoverable, state, payments, events, app_balance }
//! ```
//!
//! Exit status is 0 when the group is approved, 1 when it is rejected and
//! 2 when the request cannot be decoded.

use std::io::{self, Read, Write};
use std::process::ExitCode;

use flashpool_contract::host::{decode_request, handle_request};

fn main() -> ExitCode {
    let mut input = Vec::new();
    if io::stdin().read_to_end(&mut input).is_err() {
        return ExitCode::from(2);
    }

    let response = match decode_request(&input).and_then(|request| handle_request(&request)) {
        Ok(response) => response,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::from(2);
        }
    };

    if io::stdout().write_all(&response.to_cbor()).is_err() {
        return ExitCode::from(2);
    }
    if response.approved {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
