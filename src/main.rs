//! predictext entry point.

mod cli;

fn main() {
    env_logger::init();
    if let Err(e) = cli::run_cli() {
        eprintln!("error: {}", e);
        std::process::exit(-1);
    }
}
