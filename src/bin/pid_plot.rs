use pid_lpp::chart::render;
use pid_lpp::load;
use pid_lpp::plot::parse_cli;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let config = parse_cli();

    let default_level = if config.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("read data from {}", config.log_file_path.display());
    let table = match load(&config.log_file_path) {
        Ok(t) => t,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = render(&table, &config) {
        error!("could not plot {}: {}", config.log_file_path.display(), e);
        std::process::exit(1);
    }
}
