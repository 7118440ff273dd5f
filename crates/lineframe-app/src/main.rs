//! Main application entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let result = lineframe_app::Command::parse(std::env::args().skip(1)).and_then(lineframe_app::run);
    match result {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
