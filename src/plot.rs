use super::{DEFAULT_LOG_FILE, VERSION};
use clap::{App, Arg, ArgMatches};
use std::path::PathBuf;

pub const DEFAULT_TITLE: &str = "PID Controller Log Analysis";
pub const DEFAULT_WIDTH: u32 = 1500;
pub const DEFAULT_HEIGHT: u32 = 1200;

/// Settings for loading the log and drawing the window
#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    pub log_file_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub verbose: bool,
}

impl Default for PlotConfig {
    fn default() -> PlotConfig {
        PlotConfig {
            log_file_path: PathBuf::from(DEFAULT_LOG_FILE),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            title: String::from(DEFAULT_TITLE),
            verbose: false,
        }
    }
}

fn is_pixel_size(v: String) -> Result<(), String> {
    match v.parse::<u32>() {
        Ok(p) if p >= 100 && p <= 8000 => Ok(()),
        _ => Err(format!("{} is not a window size between 100 and 8000 pixels", v)),
    }
}

fn cli_app<'a, 'b>() -> App<'a, 'b> {
    let arg_csvin = Arg::with_name("input_csvfile")
        .help("name of the csv log with the columns error, derivative, mv (no header)")
        .short("f")
        .long("csvfile")
        .takes_value(true)
        .default_value(DEFAULT_LOG_FILE);
    let arg_width = Arg::with_name("width")
        .help("window width, in pixels")
        .long("width")
        .takes_value(true)
        .validator(is_pixel_size);
    let arg_height = Arg::with_name("height")
        .help("window height, in pixels")
        .long("height")
        .takes_value(true)
        .validator(is_pixel_size);
    let arg_title = Arg::with_name("title")
        .help("figure title")
        .long("title")
        .takes_value(true);
    let arg_verbose = Arg::with_name("verbose")
        .help("print verbose information")
        .short("v")
        .long("verbose")
        .takes_value(false)
        .required(false);
    App::new("PID_plot")
        .version(VERSION.unwrap_or("unknown"))
        .author("Luca Peruzzo")
        .about("cli app to plot the error, derivative and output of a PID controller log")
        .arg(arg_csvin)
        .arg(arg_width)
        .arg(arg_height)
        .arg(arg_title)
        .arg(arg_verbose)
}

fn config_from_matches(cli_args: &ArgMatches) -> PlotConfig {
    let defaults = PlotConfig::default();
    let log_file_path = cli_args
        .value_of("input_csvfile")
        .map(PathBuf::from)
        .unwrap_or(defaults.log_file_path);
    // already checked by is_pixel_size
    let width = cli_args
        .value_of("width")
        .and_then(|w| w.parse::<u32>().ok())
        .unwrap_or(defaults.width);
    let height = cli_args
        .value_of("height")
        .and_then(|h| h.parse::<u32>().ok())
        .unwrap_or(defaults.height);
    let title = cli_args
        .value_of("title")
        .map(String::from)
        .unwrap_or(defaults.title);
    PlotConfig {
        log_file_path,
        width,
        height,
        title,
        verbose: cli_args.is_present("verbose"),
    }
}

/// Takes the CLI arguments that control the loading and plotting of the PID log.
/// With no arguments the log is read from log.csv in the working directory.
pub fn parse_cli() -> PlotConfig {
    config_from_matches(&cli_app().get_matches())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> PlotConfig {
        let matches = cli_app().get_matches_from_safe(args).unwrap();
        config_from_matches(&matches)
    }

    #[test]
    fn no_arguments_gives_defaults() {
        assert_eq!(parse(&["pid_plot"]), PlotConfig::default());
        assert_eq!(PlotConfig::default().log_file_path, PathBuf::from("log.csv"));
    }

    #[test]
    fn arguments_override_defaults() {
        let cfg = parse(&[
            "pid_plot", "-f", "run3.csv", "--width", "800", "--height", "600", "--title", "run 3",
            "-v",
        ]);
        assert_eq!(cfg.log_file_path, PathBuf::from("run3.csv"));
        assert_eq!((cfg.width, cfg.height), (800, 600));
        assert_eq!(cfg.title, "run 3");
        assert!(cfg.verbose);
    }

    #[test]
    fn rejects_bad_window_size() {
        assert!(cli_app()
            .get_matches_from_safe(&["pid_plot", "--width", "wide"])
            .is_err());
        assert!(cli_app()
            .get_matches_from_safe(&["pid_plot", "--height", "10"])
            .is_err());
    }
}
