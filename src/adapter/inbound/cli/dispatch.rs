//! Global flag handling and command dispatch.

use std::path::Path;

use super::command::{Cli, ColorChoice, Commands, ConfigCommand};
use super::diagnostic::ConfigDiagnostic;
use super::output::{self, OutputConfig};
use super::report::{ConsoleSink, FanoutSink};
use super::{buyers, config, run, stream};
use crate::adapter::outbound::JsonLinesSink;
use crate::error::{ConfigError, Error, Result};
use crate::infrastructure::config::settings::Config;
use crate::port::ReportSink;

/// Apply global flags and run the selected command.
///
/// # Errors
///
/// Returns the command's error; the caller decides how to present it.
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }
    output::configure(OutputConfig::new(cli.json, cli.quiet));

    match cli.command {
        Commands::Run(args) => run::execute(&args, cli.verbose),
        Commands::Stream(args) => stream::execute(&args, cli.verbose).await,
        Commands::Config(ConfigCommand::Init(args)) => config::execute_init(&args.path, args.force),
        Commands::Config(ConfigCommand::Show(arg)) => config::execute_show(&arg.path),
        Commands::Config(ConfigCommand::Validate(arg)) => config::execute_validate(&arg.path),
        Commands::Buyers(arg) => buyers::execute(&arg.path),
    }
}

/// Load and validate a config file, then start logging.
///
/// `-v` raises the configured level to debug, `-vv` to trace. TOML syntax
/// errors are rendered with source context before being returned.
pub(crate) fn load_config(path: &Path, verbose: u8) -> Result<Config> {
    let mut config = read_config(path)?;
    match verbose {
        0 => {}
        1 => config.logging.level = "debug".into(),
        _ => config.logging.level = "trace".into(),
    }
    config.init_logging();
    Ok(config)
}

/// Load and validate a config file without touching logging.
pub(crate) fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
    Config::parse_toml(&content).map_err(|err| {
        if let Error::Config(ConfigError::Parse(parse)) = &err {
            if !output::is_json() {
                let name = path.display().to_string();
                if let Some(diagnostic) = ConfigDiagnostic::from_toml(&name, &content, parse) {
                    eprintln!("{:?}", miette::Report::new(diagnostic));
                }
            }
        }
        err
    })
}

/// Terminal sink, plus a JSON-lines file when `report` is given.
pub(crate) fn sink_for(report: Option<&Path>) -> Result<Box<dyn ReportSink>> {
    let Some(path) = report else {
        return Ok(Box::new(ConsoleSink));
    };
    Ok(Box::new(FanoutSink::new(vec![
        Box::new(ConsoleSink),
        Box::new(JsonLinesSink::create(path)?),
    ])))
}
