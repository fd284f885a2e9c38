//! The `docmanager` binary only invokes `cli::run()` and turns its outcome
//! into a process exit code; everything else lives in the library.

use docmanager::error::ReturnCode;

mod cli;

fn main() {
    match cli::run() {
        Ok(ReturnCode::Ok) => {}
        Ok(code) => std::process::exit(code.code()),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.return_code().code());
        }
    }
}
