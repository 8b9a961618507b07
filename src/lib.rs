pub mod config;
pub mod scenario;
pub mod scripting;
pub mod scripts;
pub mod telemetry;
pub mod world;

pub use config::{AppConfig, Command, ConfigError, ScenarioSource};
pub use scenario::{Outcome, RunOptions, Scenario, ScenarioError};
pub use scripting::controller::{ActorScript, Controller, ScriptContext, Trigger};
pub use world::host::ScriptHost;

pub fn run(args: &[String]) -> Result<(), String> {
    let config = AppConfig::from_args(args).map_err(|err| err.to_string())?;
    telemetry::logging::init(&config.log)?;

    let source = match &config.command {
        Command::List => {
            println!("tundra: built-in scenarios");
            for name in scenario::builtin_names() {
                match Scenario::builtin(name) {
                    Ok(scenario) => println!("- {}: {}", name, scenario.description.trim()),
                    Err(err) => println!("- {}: {}", name, err),
                }
            }
            return Ok(());
        }
        Command::Run(source) => source,
    };

    let scenario = match source {
        ScenarioSource::Builtin(name) => Scenario::builtin(name),
        ScenarioSource::File(path) => Scenario::load(path),
    }
    .map_err(|err| err.to_string())?;

    let defaults = scenario.default_options();
    let options = RunOptions {
        tick: config.tick_or_default(scenario.tick_ms),
        duration: config.duration.unwrap_or(defaults.duration),
        seed: config.seed.unwrap_or(defaults.seed),
    };
    let outcome = scenario.run(options).map_err(|err| err.to_string())?;
    print!("{}", outcome.render());
    Ok(())
}
