use std::process::ExitCode;

fn main() -> ExitCode {
    match crunchyd::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            // Telemetry may not be installed when bootstrap fails early.
            eprintln!("crunchyd: {error}");
            ExitCode::FAILURE
        }
    }
}
