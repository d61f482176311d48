//! Binary entry point for `json-file-change`.

use std::process;

fn main() {
    if let Err(e) = json_file_change::run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
