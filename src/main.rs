use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use std::error::Error;
use std::path::{Path, PathBuf};
use topology_synth::config::Settings;
use topology_synth::output::{print_apply_batches, print_routes, write_topology};
use topology_synth::{read_scenario_file, synthesize};

fn init_logging(log_config: &Path) -> Result<(), Box<dyn Error>> {
    if log_config.exists() {
        log4rs::init_file(log_config, Default::default())?;
    } else {
        let stdout = ConsoleAppender::builder().build();
        let config = Config::builder()
            .appender(Appender::builder().build("stdout", Box::new(stdout)))
            .build(Root::builder().appender("stdout").build(LevelFilter::Warn))?;
        log4rs::init_config(config)?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    dotenv::dotenv().ok();
    let mut settings = Settings::from_env();
    init_logging(&settings.log_config)?;
    log::info!("#Start main()");

    if let Some(arg) = std::env::args().nth(1) {
        settings.scenario_file = PathBuf::from(arg);
    }

    let file = read_scenario_file(&settings.scenario_file)?;
    let synthesis = synthesize(&file)?;
    synthesis.graph.apply()?;

    print_routes(synthesis.all_networks());
    print_apply_batches(&synthesis.graph.apply_batches()?);
    let path = write_topology(&synthesis, &settings.output_dir)?;
    println!("Wrote {}", path.display());

    Ok(())
}
