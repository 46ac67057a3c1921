//! The configuration for the simulator, given from environment variables and lazy
//! initialized when needed.

use std::num::NonZeroUsize;
use std::env;

use once_cell::race::{OnceBox, OnceNonZeroUsize};

use tracing::warn;

use kart_track::config::ItemConfig;


/// Default number of ticks to simulate, one minute of race.
const DEFAULT_TICKS: NonZeroUsize = NonZeroUsize::new(60 * 60).unwrap();


/// Return the number of ticks to simulate.
///
/// To change it, set `KART_TRACK_TICKS=<count>`.
pub fn ticks() -> usize {
    static ENV: OnceNonZeroUsize = OnceNonZeroUsize::new();
    ENV.get_or_init(|| {
        env::var("KART_TRACK_TICKS").ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_TICKS)
    }).get()
}

/// Return the item configuration, defaults are overridden by options.
///
/// To change it, set `KART_TRACK_OPTIONS=<key>=<value>,...`, for example
/// `KART_TRACK_OPTIONS=bubblegum-counter=3,item-switch-time=4`.
pub fn item_config() -> &'static ItemConfig {
    static ENV: OnceBox<ItemConfig> = OnceBox::new();
    ENV.get_or_init(|| {

        let options = env::var("KART_TRACK_OPTIONS").unwrap_or_default();
        let options = options.split(',')
            .filter(|option| !option.trim().is_empty())
            .map(|option| option.split_once('=').unwrap_or((option, "")))
            .map(|(key, value)| (key.trim(), value));

        let config = ItemConfig::from_options(options).unwrap_or_else(|e| {
            warn!("invalid KART_TRACK_OPTIONS, using defaults: {e}");
            ItemConfig::default()
        });

        Box::new(config)

    })
}
