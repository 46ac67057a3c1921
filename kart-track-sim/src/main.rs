//! A headless kart race driving the track items and objects logic.

use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod race;

use race::Race;


pub fn main() -> ExitCode {

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env_lossy())
        .init();

    let mut race = match Race::load(*config::item_config(), race::TRACK) {
        Ok(race) => race,
        Err(e) => {
            error!("failed to load track: {e}");
            return ExitCode::FAILURE;
        }
    };

    let ticks = config::ticks();
    info!("simulating {ticks} ticks of {:.1} ms", race::DT * 1000.0);

    race.start();
    race.run(ticks);
    race.summary();

    ExitCode::SUCCESS

}
