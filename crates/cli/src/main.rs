use std::process::ExitCode;

fn main() -> ExitCode {
    reimbly_cli::run()
}
