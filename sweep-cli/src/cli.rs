//! Application definition.

extern crate simplelog;

use anyhow::{Context, Error, Result};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use colored::*;
use sweep::config::CONFIG_FILE;
use sweep::{
    grid, ConsoleReporter, Dispatcher, JobQueue, Mode, ProcessLauncher, Strategy, SweepConfig,
};

use crate::init;
use crate::util;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const MODES: &[&str] = &["simulate", "create_landscapes", "convergence"];

fn config_args<'a, 'b>() -> Vec<Arg<'a, 'b>> {
    vec![
        Arg::with_name("path")
            .value_name("config-path")
            .help("Path to the sweep config file, or a directory containing sweep.toml"),
        Arg::with_name("mode")
            .long("mode")
            .takes_value(true)
            .value_name("mode")
            .possible_values(MODES)
            .help("Override the job generation mode"),
        Arg::with_name("create-landscapes")
            .long("create-landscapes")
            .conflicts_with("mode")
            .help("Generate the landscapes instead of simulating on them (same as --mode create_landscapes)"),
    ]
}

pub fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("sweep")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .version(VERSION)
        .about("Run fitness landscape parameter sweeps, a bounded number of simulations at a time.")
        .arg(Arg::with_name("verbosity")
            .long("verbosity")
            .short("v")
            .takes_value(true)
            .default_value("warn")
            .value_name("verb")
            .global(true)
            .validator(|v| match level_filter(&v) {
                Some(_) => Ok(()),
                None => Err(format!("expected 0-5 or one of: {}", VERBOSITY.join(", "))),
            })
            .help("Set the verbosity of the log output: 0-5 or none, error, warn, info, debug, trace"))

        // new subcommand
        .subcommand(SubCommand::with_name("new")
            .display_order(10)
            .about("Create a new sweep config file")
            .arg(Arg::with_name("path")
                .value_name("path")
                .default_value(CONFIG_FILE))
            .arg(Arg::with_name("template")
                .possible_values(&["commented", "landscapes"])
                .takes_value(true)
                .default_value("commented")
                .help("Init with a template")
                .long("template")
                .short("t")))

        // list subcommand
        .subcommand(SubCommand::with_name("list")
            .display_order(20)
            .about("Print the command line of every job the sweep would run")
            .args(&config_args()))

        // run subcommand
        .subcommand(SubCommand::with_name("run")
            .display_order(30)
            .about("Run every job of the sweep")
            .args(&config_args())
            .arg(Arg::with_name("parallel")
                .long("parallel")
                .short("p")
                .takes_value(true)
                .value_name("jobs")
                .help("Maximum number of jobs running at the same time"))
            .arg(Arg::with_name("strategy")
                .long("strategy")
                .takes_value(true)
                .possible_values(&["poll", "notify"])
                .help("How terminated jobs are detected"))
            .arg(Arg::with_name("poll-interval")
                .long("poll-interval")
                .takes_value(true)
                .value_name("millis")
                .help("Sleep between idle polling cycles"))
            .arg(Arg::with_name("dry-run")
                .long("dry-run")
                .short("n")
                .help("List the jobs instead of running them")))
}

pub fn init() -> ArgMatches<'static> {
    app().get_matches()
}

/// Runs based on specified subcommand.
pub fn start(matches: ArgMatches) -> Result<()> {
    let (subcmd, sub_matches) = matches.subcommand();
    if let Some(m) = sub_matches {
        setup_log_verbosity(m);
    }
    match (subcmd, sub_matches) {
        ("new", Some(m)) => start_new(m),
        ("list", Some(m)) => start_list(m),
        ("run", Some(m)) => start_run(m),
        _ => Ok(()),
    }
}

fn start_new(matches: &ArgMatches) -> Result<()> {
    let path = util::resolve_path(matches.value_of("path"), CONFIG_FILE)?;
    let template = matches.value_of("template").unwrap_or("commented");
    init::init_at_path(&path, template)
}

fn start_list(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;
    let jobs = grid::enumerate(&config.grid)?;
    print_jobs(&jobs);
    Ok(())
}

fn start_run(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;
    let jobs = grid::enumerate(&config.grid)?;

    if matches.is_present("dry-run") {
        print_jobs(&jobs);
        return Ok(());
    }

    println!(
        "Running {} job(s) in {} mode, {} at a time",
        jobs.len(),
        mode_name(config.grid.mode),
        config.dispatch.parallelism
    );
    let mut dispatcher = Dispatcher::new(
        &config.dispatch,
        ProcessLauncher,
        ConsoleReporter::stdout(),
    )?;
    let summary = dispatcher.run(JobQueue::new(jobs))?;

    if summary.is_success() {
        return Ok(());
    }
    for r in &summary.failed {
        println!("{} job #{} {}: {}", "failed:".red(), r.index, r.outcome, r.job);
    }
    Err(Error::msg(format!(
        "{} of {} job(s) failed",
        summary.failed.len(),
        summary.total
    )))
}

/// Reads the sweep config and applies command line overrides.
fn load_config(matches: &ArgMatches) -> Result<SweepConfig> {
    let path = util::config_file_at(
        util::resolve_path(matches.value_of("path"), CONFIG_FILE)?,
        CONFIG_FILE,
    );
    let mut config = if path.exists() {
        SweepConfig::from_path(&path)
            .with_context(|| format!("failed reading sweep config at {}", path.to_string_lossy()))?
    } else if matches.value_of("path").is_some() {
        return Err(Error::msg(format!(
            "sweep config not found at {}",
            path.to_string_lossy()
        )));
    } else {
        warn!(
            "no {} found in current directory, using default sweep config",
            CONFIG_FILE
        );
        SweepConfig::default()
    };
    apply_overrides(&mut config, matches)?;
    config.validate()?;
    Ok(config)
}

fn apply_overrides(config: &mut SweepConfig, matches: &ArgMatches) -> Result<()> {
    if matches.is_present("create-landscapes") {
        config.grid.mode = Mode::CreateLandscapes;
    }
    if let Some(mode) = matches.value_of("mode") {
        config.grid.mode = parse_mode(mode)?;
    }
    if let Some(p) = matches.value_of("parallel") {
        config.dispatch.parallelism = p
            .parse::<usize>()
            .with_context(|| format!("invalid number of parallel jobs: {}", p))?;
    }
    if let Some(s) = matches.value_of("strategy") {
        config.dispatch.strategy = s.parse::<Strategy>()?;
    }
    if let Some(ms) = matches.value_of("poll-interval") {
        config.dispatch.poll_interval = ms
            .parse::<u64>()
            .with_context(|| format!("invalid poll interval: {}", ms))?;
    }
    Ok(())
}

fn parse_mode(s: &str) -> Result<Mode> {
    match s {
        "simulate" => Ok(Mode::Simulate),
        "create_landscapes" => Ok(Mode::CreateLandscapes),
        "convergence" => Ok(Mode::Convergence),
        _ => Err(Error::msg(format!("unknown mode: {}", s))),
    }
}

fn mode_name(mode: Mode) -> &'static str {
    match mode {
        Mode::Simulate => MODES[0],
        Mode::CreateLandscapes => MODES[1],
        Mode::Convergence => MODES[2],
    }
}

fn print_jobs(jobs: &[sweep::JobDescriptor]) {
    for (n, job) in jobs.iter().enumerate() {
        println!("{:>5}  {}", n, job);
    }
    println!("{} job(s)", jobs.len());
}

const VERBOSITY: &[&str] = &["none", "error", "warn", "info", "debug", "trace"];

/// Maps a `--verbosity` value, a level name or its position in
/// `VERBOSITY`, to a log level filter.
fn level_filter(verbosity: &str) -> Option<simplelog::LevelFilter> {
    use self::simplelog::LevelFilter;
    let level = verbosity
        .parse::<usize>()
        .ok()
        .or_else(|| VERBOSITY.iter().position(|v| *v == verbosity))?;
    match level {
        0 => Some(LevelFilter::Off),
        1 => Some(LevelFilter::Error),
        2 => Some(LevelFilter::Warn),
        3 => Some(LevelFilter::Info),
        4 => Some(LevelFilter::Debug),
        5 => Some(LevelFilter::Trace),
        _ => None,
    }
}

fn setup_log_verbosity(matches: &ArgMatches) {
    use self::simplelog::{LevelFilter, TermLogger};
    let level_filter = matches
        .value_of("verbosity")
        .and_then(level_filter)
        .unwrap_or(LevelFilter::Warn);
    let logger_conf = simplelog::ConfigBuilder::new()
        .set_time_level(LevelFilter::Error)
        .set_target_level(LevelFilter::Debug)
        .set_location_level(LevelFilter::Trace)
        .set_time_format_str("%H:%M:%S%.3f")
        .build();
    if TermLogger::init(level_filter, logger_conf, simplelog::TerminalMode::Mixed).is_err() {
        eprintln!("failed initializing terminal logger");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(args: &[&str]) -> ArgMatches<'static> {
        app().get_matches_from_safe(args).unwrap()
    }

    #[test]
    fn run_overrides_dispatch_settings() {
        let m = matches(&[
            "sweep", "run", "--parallel", "2", "--strategy", "poll", "--poll-interval", "10",
            "--create-landscapes",
        ]);
        let (_, sub) = m.subcommand();
        let mut config = SweepConfig::default();
        apply_overrides(&mut config, sub.unwrap()).unwrap();
        assert_eq!(config.dispatch.parallelism, 2);
        assert_eq!(config.dispatch.strategy, Strategy::Poll);
        assert_eq!(config.dispatch.poll_interval, 10);
        assert_eq!(config.grid.mode, Mode::CreateLandscapes);
    }

    #[test]
    fn mode_flag_and_shorthand_conflict() {
        let res = app().get_matches_from_safe(&[
            "sweep",
            "list",
            "--mode",
            "convergence",
            "--create-landscapes",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn invalid_parallelism_is_reported() {
        let m = matches(&["sweep", "run", "-p", "many"]);
        let (_, sub) = m.subcommand();
        let mut config = SweepConfig::default();
        assert!(apply_overrides(&mut config, sub.unwrap()).is_err());
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let m = matches(&["sweep", "list", "/nonexistent/sweep.toml"]);
        let (_, sub) = m.subcommand();
        assert!(load_config(sub.unwrap()).is_err());
    }

    #[test]
    fn verbosity_accepts_level_names_and_numbers() {
        use simplelog::LevelFilter;
        assert_eq!(level_filter("none"), Some(LevelFilter::Off));
        assert_eq!(level_filter("3"), Some(LevelFilter::Info));
        assert_eq!(level_filter("trace"), Some(LevelFilter::Trace));
        assert_eq!(level_filter("6"), None);
        assert_eq!(level_filter("loud"), None);
        assert!(app()
            .get_matches_from_safe(&["sweep", "list", "--verbosity", "loud"])
            .is_err());
    }

    #[test]
    fn every_mode_name_parses_back() {
        for name in MODES {
            assert_eq!(mode_name(parse_mode(name).unwrap()), *name);
        }
    }
}
