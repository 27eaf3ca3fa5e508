//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = kerbside_cli::run() {
        eprintln!("kerbside: {err}");
        std::process::exit(1);
    }
}
