//! logkeep CLI entry point.
//!
//! main.rs only parses args and dispatches; it never touches the cleanup
//! core's modules directly.

use std::process;

use logkeep::cli::{run_command, write_error, Cli};

fn main() {
    let cli = Cli::parse_args();

    if let Err(e) = run_command(cli.command) {
        let _ = write_error(e.code_str(), e.message());
        process::exit(1);
    }
}
