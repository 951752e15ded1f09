use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match easeld::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(io::stderr(), "easeld: {error}");
            ExitCode::FAILURE
        }
    }
}
