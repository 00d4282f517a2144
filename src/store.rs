//! Host configuration the scheduler reads and writes
//!
//! The scheduler is one writer among several, so every access goes through
//! the [`ConfigStore`] accessors. Read-modify-write sequences use
//! [`ConfigStore::update`], which implementations must run atomically.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Stereoscopic rendering mode; the stereo toggle group writes these
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StereoMode {
    #[default]
    Off,
    SideBySide,
    TopAndBottom,
    Anaglyph,
    Nvidia3DVision,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectMode {
    #[default]
    Auto,
    ForceWide,
    ForceStandard,
    Stretch,
}

impl AspectMode {
    /// Next mode in the four-step cycle
    pub fn next(self) -> Self {
        match self {
            AspectMode::Auto => AspectMode::ForceWide,
            AspectMode::ForceWide => AspectMode::ForceStandard,
            AspectMode::ForceStandard => AspectMode::Stretch,
            AspectMode::Stretch => AspectMode::Auto,
        }
    }
}

/// Parameters the scheduler touches
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigKey {
    EmulationSpeed,
    StereoMode,
    StereoDepth,
    StereoConvergence,
    PostShader,
    EfbScale,
    Volume,
    AudioMuted,
    Crop,
    AspectRatio,
    SkipEfbCopyToRam,
    SkipXfbCopyToRam,
    ImmediateXfb,
    DisableFog,
    DumpTextures,
    HiresTextures,
    ThrottlerTempDisabled,
    BluetoothPassthrough,
    DebuggingEnabled,
    WiiMode,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 20] = [
        ConfigKey::EmulationSpeed,
        ConfigKey::StereoMode,
        ConfigKey::StereoDepth,
        ConfigKey::StereoConvergence,
        ConfigKey::PostShader,
        ConfigKey::EfbScale,
        ConfigKey::Volume,
        ConfigKey::AudioMuted,
        ConfigKey::Crop,
        ConfigKey::AspectRatio,
        ConfigKey::SkipEfbCopyToRam,
        ConfigKey::SkipXfbCopyToRam,
        ConfigKey::ImmediateXfb,
        ConfigKey::DisableFog,
        ConfigKey::DumpTextures,
        ConfigKey::HiresTextures,
        ConfigKey::ThrottlerTempDisabled,
        ConfigKey::BluetoothPassthrough,
        ConfigKey::DebuggingEnabled,
        ConfigKey::WiiMode,
    ];

    /// Value a fresh store starts with
    pub fn default_value(self) -> ConfigValue {
        match self {
            ConfigKey::EmulationSpeed => ConfigValue::Float(1.0),
            ConfigKey::StereoMode => ConfigValue::Stereo(StereoMode::Off),
            ConfigKey::StereoDepth => ConfigValue::Int(20),
            ConfigKey::StereoConvergence => ConfigValue::Int(20),
            ConfigKey::PostShader => ConfigValue::Text(String::new()),
            ConfigKey::EfbScale => ConfigValue::Int(1),
            ConfigKey::Volume => ConfigValue::Int(100),
            ConfigKey::AspectRatio => ConfigValue::Aspect(AspectMode::Auto),
            ConfigKey::AudioMuted
            | ConfigKey::Crop
            | ConfigKey::SkipEfbCopyToRam
            | ConfigKey::SkipXfbCopyToRam
            | ConfigKey::ImmediateXfb
            | ConfigKey::DisableFog
            | ConfigKey::DumpTextures
            | ConfigKey::HiresTextures
            | ConfigKey::ThrottlerTempDisabled
            | ConfigKey::BluetoothPassthrough
            | ConfigKey::DebuggingEnabled
            | ConfigKey::WiiMode => ConfigValue::Bool(false),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ConfigValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    Text(String),
    Stereo(StereoMode),
    Aspect(AspectMode),
}

impl ConfigValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(value) => Some(*value),
            ConfigValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_aspect(&self) -> Option<AspectMode> {
        match self {
            ConfigValue::Aspect(mode) => Some(*mode),
            _ => None,
        }
    }

    /// Replaces the number while keeping the representation
    ///
    /// Integer parameters round to the nearest integer.
    pub fn with_number(&self, number: f64) -> ConfigValue {
        match self {
            ConfigValue::Int(_) => ConfigValue::Int(number.round() as i64),
            _ => ConfigValue::Float(number),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Float(value) => write!(f, "{value}"),
            ConfigValue::Int(value) => write!(f, "{value}"),
            ConfigValue::Bool(value) => write!(f, "{value}"),
            ConfigValue::Text(value) => write!(f, "{value:?}"),
            ConfigValue::Stereo(mode) => write!(f, "{mode:?}"),
            ConfigValue::Aspect(mode) => write!(f, "{mode:?}"),
        }
    }
}

/// Thread-safe named parameter storage shared with the rest of the host
pub trait ConfigStore: Send + Sync {
    fn get(&self, key: ConfigKey) -> ConfigValue;

    fn set(&self, key: ConfigKey, value: ConfigValue);

    /// Atomically replaces the value of `key` with `f(current)` and returns
    /// the new value
    fn update(&self, key: ConfigKey, f: &mut dyn FnMut(&ConfigValue) -> ConfigValue) -> ConfigValue;

    fn get_bool(&self, key: ConfigKey) -> bool {
        self.get(key).as_bool().unwrap_or(false)
    }

    fn get_f64(&self, key: ConfigKey) -> f64 {
        self.get(key)
            .as_f64()
            .or_else(|| key.default_value().as_f64())
            .unwrap_or_default()
    }

    /// Flips a boolean parameter and returns the new state
    fn toggle(&self, key: ConfigKey) -> bool {
        let toggled = self.update(key, &mut |value| ConfigValue::Bool(!value.as_bool().unwrap_or(false)));
        toggled.as_bool().unwrap_or(false)
    }
}

/// In-memory store
#[derive(Debug)]
pub struct SharedConfigStore {
    values: RwLock<HashMap<ConfigKey, ConfigValue>>,
}

impl Default for SharedConfigStore {
    fn default() -> Self {
        let values = ConfigKey::ALL
            .iter()
            .map(|key| (*key, key.default_value()))
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }
}

impl SharedConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style override of a default value
    pub fn with(self, key: ConfigKey, value: ConfigValue) -> Self {
        self.values.write().insert(key, value);
        self
    }
}

impl ConfigStore for SharedConfigStore {
    fn get(&self, key: ConfigKey) -> ConfigValue {
        self.values
            .read()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| key.default_value())
    }

    fn set(&self, key: ConfigKey, value: ConfigValue) {
        debug!("Config {:?} = {}", key, value);
        self.values.write().insert(key, value);
    }

    fn update(&self, key: ConfigKey, f: &mut dyn FnMut(&ConfigValue) -> ConfigValue) -> ConfigValue {
        let mut values = self.values.write();
        let current = values.entry(key).or_insert_with(|| key.default_value());
        let next = f(current);
        debug!("Config {:?}: {} -> {}", key, current, next);
        *current = next.clone();
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_store_holds_defaults() {
        let store = SharedConfigStore::new();
        for key in ConfigKey::ALL {
            assert_eq!(store.get(key), key.default_value(), "{key:?}");
        }
        assert_eq!(store.get_f64(ConfigKey::EmulationSpeed), 1.0);
    }

    #[test]
    fn toggle_flips_flag() {
        let store = SharedConfigStore::new();
        assert!(store.toggle(ConfigKey::DisableFog));
        assert!(store.get_bool(ConfigKey::DisableFog));
        assert!(!store.toggle(ConfigKey::DisableFog));
    }

    #[test]
    fn update_returns_new_value() {
        let store = SharedConfigStore::new().with(ConfigKey::Volume, ConfigValue::Int(40));
        let next = store.update(ConfigKey::Volume, &mut |value| value.with_number(43.0));
        assert_eq!(next, ConfigValue::Int(43));
        assert_eq!(store.get(ConfigKey::Volume), ConfigValue::Int(43));
    }

    #[test]
    fn aspect_cycle_wraps() {
        let mut mode = AspectMode::Auto;
        for _ in 0..4 {
            mode = mode.next();
        }
        assert_eq!(mode, AspectMode::Auto);
        assert_eq!(AspectMode::Auto.next(), AspectMode::ForceWide);
    }

    #[test]
    fn with_number_keeps_representation() {
        assert_eq!(ConfigValue::Int(5).with_number(6.4), ConfigValue::Int(6));
        assert_eq!(ConfigValue::Float(1.0).with_number(0.9), ConfigValue::Float(0.9));
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let store = std::sync::Arc::new(SharedConfigStore::new().with(ConfigKey::StereoDepth, ConfigValue::Int(0)));
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        store.update(ConfigKey::StereoDepth, &mut |value| {
                            value.with_number(value.as_f64().unwrap_or_default() + 1.0)
                        });
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(store.get(ConfigKey::StereoDepth), ConfigValue::Int(1000));
    }
}
