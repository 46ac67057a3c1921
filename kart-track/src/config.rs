//! Tunable values shared by items and track objects. The configuration is always given
//! explicitly to the functions needing it, there is no process-wide store.

use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;


/// Gameplay tunables for items and track objects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemConfig {
    /// Number of times a bubblegum can be driven over before it stops disappearing
    /// and behaves like a regular collected item.
    pub bubblegum_counter: i32,
    /// Duration in seconds of an item switch, before all items are switched back.
    pub switch_time: f32,
    /// Impulse given to physical track objects by an explosion.
    pub explosion_impulse: f32,
    /// Radius in meters of an explosion, items further away are not affected.
    pub explosion_radius: f32,
}

impl Default for ItemConfig {
    fn default() -> Self {
        Self {
            bubblegum_counter: 1,
            switch_time: 5.0,
            explosion_impulse: 500.0,
            explosion_radius: 5.0,
        }
    }
}

impl ItemConfig {

    /// Build a configuration from the default one with the given options overriding
    /// it. Recognized keys are `bubblegum-counter`, `item-switch-time`,
    /// `explosion-impulse-objects` and `explosion-radius`, any other key is rejected.
    pub fn from_options<'a, I>(options: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {

        let mut config = Self::default();

        for (key, value) in options {
            match key {
                "bubblegum-counter" => {
                    config.bubblegum_counter = value.trim().parse()
                        .map_err(|e| ConfigError::InvalidInt(key.to_string(), e))?;
                }
                "item-switch-time" => {
                    config.switch_time = parse_f32(key, value)?;
                }
                "explosion-impulse-objects" => {
                    config.explosion_impulse = parse_f32(key, value)?;
                }
                "explosion-radius" => {
                    config.explosion_radius = parse_f32(key, value)?;
                }
                _ => return Err(ConfigError::UnknownOption(key.to_string())),
            }
        }

        Ok(config)

    }

}

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.trim().parse().map_err(|e| ConfigError::InvalidFloat(key.to_string(), e))
}


/// Error while building an [`ItemConfig`] from options.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unknown option: {0}")]
    UnknownOption(String),
    #[error("option {0}: {1}")]
    InvalidInt(String, ParseIntError),
    #[error("option {0}: {1}")]
    InvalidFloat(String, ParseFloatError),
}
