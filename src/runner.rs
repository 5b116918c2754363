use std::error::Error;
use std::io::{self, Write};
use std::path::Path;

use clap::{Args, Command, FromArgMatches as _};

use crate::error::EpiError;
use crate::history::{DailySnapshot, RunSummary};
use crate::log::{info, set_log_level, set_module_filters, LevelFilter};
use crate::orchestrator::Orchestrator;
use crate::parameters::Scenario;

/// Default cli arguments for the epinet runner
#[derive(Args, Debug, Default)]
pub struct BaseArgs {
    /// Random seed
    #[arg(short, long, default_value = "0")]
    pub random_seed: u64,

    /// Optional path for a JSON scenario file
    #[arg(short, long, default_value = "")]
    pub config: String,

    /// Stop after this many days even if the epidemic is still active
    #[arg(short, long)]
    pub max_days: Option<u32>,

    /// Log level, either global (`info`) or per module (`epinet::engine=trace,warn`)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Only print the summary
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct PlaceholderCustom {}

fn create_epinet_cli() -> Command {
    let cli = Command::new("epinet");
    BaseArgs::augment_args(cli)
}

/// Runs a simulation with custom cli arguments.
///
/// `setup_fn` receives the loaded scenario before the run starts and may change it, along with
/// the base arguments and the parsed custom arguments `A`.
///
/// # Errors
/// Returns an error if argument parsing, scenario loading, the setup function or the run fails
#[allow(clippy::missing_errors_doc)]
pub fn run_with_custom_args<A, F>(setup_fn: F) -> Result<Orchestrator, Box<dyn Error>>
where
    A: Args,
    F: Fn(&mut Scenario, &BaseArgs, Option<A>) -> Result<(), EpiError>,
{
    let mut cli = create_epinet_cli();
    cli = A::augment_args(cli);
    let matches = cli.get_matches();

    let base_args_matches = BaseArgs::from_arg_matches(&matches)?;
    let custom_matches = A::from_arg_matches(&matches)?;
    run_with_args_internal(
        &base_args_matches,
        Some(custom_matches),
        setup_fn,
        &mut io::stdout().lock(),
    )
}

/// Runs a simulation with the default cli arguments, printing one line per day to stdout.
///
/// # Errors
/// Returns an error if argument parsing, scenario loading or the run fails
#[allow(clippy::missing_errors_doc)]
pub fn run_with_args() -> Result<Orchestrator, Box<dyn Error>> {
    let cli = create_epinet_cli();
    let matches = cli.get_matches();

    let base_args_matches = BaseArgs::from_arg_matches(&matches)?;
    run_with_args_internal(
        &base_args_matches,
        None::<PlaceholderCustom>,
        |_, _, _| Ok(()),
        &mut io::stdout().lock(),
    )
}

fn run_with_args_internal<A, F, W>(
    args: &BaseArgs,
    custom_args: Option<A>,
    setup_fn: F,
    out: &mut W,
) -> Result<Orchestrator, Box<dyn Error>>
where
    F: Fn(&mut Scenario, &BaseArgs, Option<A>) -> Result<(), EpiError>,
    W: Write,
{
    if let Some(levels) = &args.log_level {
        let (global, modules) = parse_log_levels(levels)?;
        set_log_level(global);
        set_module_filters(&modules);
    }

    let mut scenario = if args.config.is_empty() {
        Scenario::default()
    } else {
        Scenario::from_json_file(Path::new(&args.config))?
    };
    if let Some(max_days) = args.max_days {
        scenario.max_days = Some(max_days);
    }

    setup_fn(&mut scenario, args, custom_args)?;

    let mut orchestrator = Orchestrator::new(args.random_seed);
    orchestrator.start(scenario)?;
    if let Some(day_zero) = orchestrator.history().and_then(|history| history.get(0)) {
        write_day(out, args.quiet, day_zero)?;
    }
    while orchestrator.status().is_running() {
        let snapshot = orchestrator.step()?;
        write_day(out, args.quiet, &snapshot)?;
    }

    info!("run ended: {}", orchestrator.status());
    if let Some(summary) = orchestrator.summary() {
        write_summary(out, &summary)?;
    }
    Ok(orchestrator)
}

fn write_day<W: Write>(out: &mut W, quiet: bool, snapshot: &DailySnapshot) -> io::Result<()> {
    if quiet {
        return Ok(());
    }
    writeln!(
        out,
        "{} {} {} {} {} {}",
        snapshot.day,
        snapshot.susceptible,
        snapshot.exposed,
        snapshot.infectious,
        snapshot.recovered,
        snapshot.dead
    )
}

fn write_summary<W: Write>(out: &mut W, summary: &RunSummary) -> io::Result<()> {
    writeln!(
        out,
        "days={} peak_infectious={} peak_day={} total_cases={} deaths={} attack_rate={:.4} case_fatality_ratio={:.4}",
        summary.days,
        summary.peak_infectious,
        summary.peak_day,
        summary.total_cases,
        summary.deaths,
        summary.attack_rate,
        summary.case_fatality_ratio
    )
}

/// Parses `level` or `module=level` items separated by commas. The last bare level wins and
/// defaults to `off`, so `epinet::engine=debug` shows only the engine.
fn parse_log_levels(levels: &str) -> Result<(LevelFilter, Vec<(String, LevelFilter)>), EpiError> {
    let parse_level = |text: &str| {
        text.trim().parse::<LevelFilter>().map_err(|_| {
            EpiError::parameter("log_level", format!("`{}` is not a log level", text.trim()))
        })
    };

    let mut global = LevelFilter::Off;
    let mut modules = Vec::new();
    for item in levels.split(',').filter(|item| !item.trim().is_empty()) {
        match item.split_once('=') {
            Some((module, level)) => {
                let module = module.trim();
                if module.is_empty() {
                    return Err(EpiError::parameter(
                        "log_level",
                        format!("`{}` has no module path before `=`", item.trim()),
                    ));
                }
                modules.push((module.to_string(), parse_level(level)?));
            }
            None => global = parse_level(item)?,
        }
    }
    Ok((global, modules))
}
