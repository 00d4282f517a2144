//! Mutually exclusive toggle groups
//!
//! A group owns one configuration key. Its members are sets of values for
//! that key; at any time the key holds the group's `off` value or a value of
//! exactly one member. Members may carry a side effect on another key which
//! is applied on entry and undone on exit.

use tracing::{debug, info, warn};

use crate::store::{ConfigKey, ConfigStore, ConfigValue, StereoMode};

/// Post-processing shader anaglyph stereo relies on
pub const DUBOIS_SHADER: &str = "dubois";

/// Write to a secondary key tied to a member
#[derive(Clone, Debug, PartialEq)]
pub struct SideEffect {
    pub key: ConfigKey,
    pub value: ConfigValue,
    pub cleared: ConfigValue,
}

impl SideEffect {
    pub fn apply(&self, store: &dyn ConfigStore) {
        store.set(self.key, self.value.clone());
    }

    /// Clears the key, but only while it still holds our value
    pub fn undo(&self, store: &dyn ConfigStore) {
        let cleared = &self.cleared;
        let ours = &self.value;
        store.update(self.key, &mut |current| {
            if current == ours {
                cleared.clone()
            } else {
                current.clone()
            }
        });
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ToggleMember {
    pub name: &'static str,
    /// Variants that count as this member being active
    pub values: Vec<ConfigValue>,
    pub side_effect: Option<SideEffect>,
}

impl ToggleMember {
    pub fn contains(&self, value: &ConfigValue) -> bool {
        self.values.contains(value)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ToggleOutcome {
    Entered(ConfigValue),
    TurnedOff,
}

#[derive(Clone, Debug)]
pub struct ToggleGroup {
    pub name: &'static str,
    pub key: ConfigKey,
    pub off: ConfigValue,
    pub members: Vec<ToggleMember>,
}

impl ToggleGroup {
    /// Stereo rendering modes. Side-by-side and top-and-bottom are two
    /// layouts of one member.
    pub fn stereo() -> Self {
        let dubois = SideEffect {
            key: ConfigKey::PostShader,
            value: ConfigValue::Text(DUBOIS_SHADER.to_string()),
            cleared: ConfigValue::Text(String::new()),
        };

        Self {
            name: "stereo",
            key: ConfigKey::StereoMode,
            off: ConfigValue::Stereo(StereoMode::Off),
            members: vec![
                ToggleMember {
                    name: "split-screen",
                    values: vec![
                        ConfigValue::Stereo(StereoMode::SideBySide),
                        ConfigValue::Stereo(StereoMode::TopAndBottom),
                    ],
                    side_effect: None,
                },
                ToggleMember {
                    name: "anaglyph",
                    values: vec![ConfigValue::Stereo(StereoMode::Anaglyph)],
                    side_effect: Some(dubois),
                },
                ToggleMember {
                    name: "3d-vision",
                    values: vec![ConfigValue::Stereo(StereoMode::Nvidia3DVision)],
                    side_effect: None,
                },
            ],
        }
    }

    /// Member whose values include the store's current value
    pub fn active_member(&self, store: &dyn ConfigStore) -> Option<&ToggleMember> {
        let current = store.get(self.key);
        self.members.iter().find(|member| member.contains(&current))
    }

    /// Fires the action that targets `target`
    ///
    /// If the member owning `target` is already active (in any of its
    /// variants) the group turns off and the member's side effect is undone.
    /// Otherwise the group switches to `target`, the side effects of every
    /// other member are undone and then the member's own is applied.
    /// Returns `None` when `target` belongs to no member.
    pub fn fire(&self, store: &dyn ConfigStore, target: &ConfigValue) -> Option<ToggleOutcome> {
        let Some(index) = self.members.iter().position(|member| member.contains(target)) else {
            warn!("{} is not a member of the {} group", target, self.name);
            return None;
        };
        let member = &self.members[index];

        let mut turned_off = false;
        store.update(self.key, &mut |current| {
            turned_off = member.contains(current);
            if turned_off {
                self.off.clone()
            } else {
                target.clone()
            }
        });

        if turned_off {
            if let Some(effect) = &member.side_effect {
                effect.undo(store);
            }
            info!("{} group off (was {})", self.name, member.name);
            return Some(ToggleOutcome::TurnedOff);
        }

        for (_, other) in self.members.iter().enumerate().filter(|(i, _)| *i != index) {
            if let Some(effect) = &other.side_effect {
                debug!("Undoing side effect of {}", other.name);
                effect.undo(store);
            }
        }
        if let Some(effect) = &member.side_effect {
            effect.apply(store);
        }

        info!("{} group -> {}", self.name, target);
        Some(ToggleOutcome::Entered(target.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SharedConfigStore;
    use parking_lot::Mutex;

    // Logs every write that changed a value
    #[derive(Default)]
    struct RecordingStore {
        inner: SharedConfigStore,
        writes: Mutex<Vec<(ConfigKey, ConfigValue)>>,
    }

    impl RecordingStore {
        fn writes(&self) -> Vec<(ConfigKey, ConfigValue)> {
            self.writes.lock().clone()
        }
    }

    impl ConfigStore for RecordingStore {
        fn get(&self, key: ConfigKey) -> ConfigValue {
            self.inner.get(key)
        }

        fn set(&self, key: ConfigKey, value: ConfigValue) {
            if self.inner.get(key) != value {
                self.writes.lock().push((key, value.clone()));
            }
            self.inner.set(key, value);
        }

        fn update(&self, key: ConfigKey, f: &mut dyn FnMut(&ConfigValue) -> ConfigValue) -> ConfigValue {
            let before = self.inner.get(key);
            let after = self.inner.update(key, f);
            if before != after {
                self.writes.lock().push((key, after.clone()));
            }
            after
        }
    }

    fn stereo(mode: StereoMode) -> ConfigValue {
        ConfigValue::Stereo(mode)
    }

    fn text(value: &str) -> ConfigValue {
        ConfigValue::Text(value.to_string())
    }

    #[test]
    fn firing_twice_returns_to_off_with_effect_undone_once() {
        let store = RecordingStore::default();
        let group = ToggleGroup::stereo();

        let anaglyph = stereo(StereoMode::Anaglyph);
        assert_eq!(group.fire(&store, &anaglyph), Some(ToggleOutcome::Entered(anaglyph.clone())));
        assert_eq!(store.get(ConfigKey::PostShader), text(DUBOIS_SHADER));

        assert_eq!(group.fire(&store, &anaglyph), Some(ToggleOutcome::TurnedOff));
        assert_eq!(store.get(ConfigKey::StereoMode), stereo(StereoMode::Off));
        assert_eq!(store.get(ConfigKey::PostShader), text(""));

        let shader_writes = store
            .writes()
            .into_iter()
            .filter(|(key, _)| *key == ConfigKey::PostShader)
            .count();
        assert_eq!(shader_writes, 2);
    }

    #[test]
    fn switching_undoes_previous_effect_before_applying() {
        let store = RecordingStore::default();
        let group = ToggleGroup::stereo();

        group.fire(&store, &stereo(StereoMode::Anaglyph));
        group.fire(&store, &stereo(StereoMode::SideBySide));

        assert_eq!(
            store.writes(),
            vec![
                (ConfigKey::StereoMode, stereo(StereoMode::Anaglyph)),
                (ConfigKey::PostShader, text(DUBOIS_SHADER)),
                (ConfigKey::StereoMode, stereo(StereoMode::SideBySide)),
                (ConfigKey::PostShader, text("")),
            ]
        );
        assert_eq!(group.active_member(&store).map(|m| m.name), Some("split-screen"));
    }

    #[test]
    fn layout_variants_share_the_active_check() {
        let store = SharedConfigStore::new();
        let group = ToggleGroup::stereo();

        group.fire(&store, &stereo(StereoMode::TopAndBottom));
        assert_eq!(store.get(ConfigKey::StereoMode), stereo(StereoMode::TopAndBottom));

        // Side-by-side while top-and-bottom is active turns the member off
        assert_eq!(
            group.fire(&store, &stereo(StereoMode::SideBySide)),
            Some(ToggleOutcome::TurnedOff)
        );
        assert_eq!(store.get(ConfigKey::StereoMode), stereo(StereoMode::Off));
    }

    #[test]
    fn undo_leaves_foreign_shader_alone() {
        let store = SharedConfigStore::new().with(ConfigKey::PostShader, text("bloom"));
        let group = ToggleGroup::stereo();

        group.fire(&store, &stereo(StereoMode::Nvidia3DVision));
        assert_eq!(store.get(ConfigKey::PostShader), text("bloom"));
    }

    #[test]
    fn unknown_target_is_ignored() {
        let store = SharedConfigStore::new();
        let group = ToggleGroup::stereo();
        assert_eq!(group.fire(&store, &stereo(StereoMode::Off)), None);
        assert!(group.active_member(&store).is_none());
    }
}
