use std::process::ExitCode;

fn main() -> ExitCode {
    match flashverify_lib::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
