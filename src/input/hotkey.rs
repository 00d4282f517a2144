use std::fmt;
use std::str::FromStr;

/// Upper bound for the number of save slots a registry can enumerate
pub const MAX_SLOTS: u8 = 10;

/// Index of the balance board among the Wii remote connect actions
pub const BALANCE_BOARD: u8 = 4;

// Logical action identifiers. Slot variants carry a 0-based slot index,
// `ConnectWiiRemote` carries 0..=3 for remotes and `BALANCE_BOARD`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Hotkey {
    Open,
    EjectDisc,
    ChangeDisc,
    Fullscreen,
    RefreshList,
    PlayPause,
    Stop,
    Reset,
    FrameAdvance,
    FrameAdvanceDecreaseSpeed,
    FrameAdvanceIncreaseSpeed,
    FrameAdvanceResetSpeed,
    Screenshot,
    Exit,
    StartRecording,
    ExportRecording,
    ReadOnlyMode,
    TriggerSyncButton,
    Step,
    StepOver,
    StepOut,
    Skip,
    ShowPc,
    SetPc,
    ToggleBreakpoint,
    AddBreakpoint,
    ConnectWiiRemote(u8),
    VolumeDown,
    VolumeUp,
    VolumeToggleMute,
    IncreaseIr,
    DecreaseIr,
    ToggleCrop,
    ToggleAspectRatio,
    ToggleEfbCopies,
    ToggleXfbCopies,
    ToggleImmediateXfb,
    ToggleFog,
    ToggleDumpTextures,
    ToggleTextures,
    ToggleThrottle,
    DecreaseEmulationSpeed,
    IncreaseEmulationSpeed,
    SaveStateSlotSelected,
    LoadStateSlotSelected,
    ToggleStereoSbs,
    ToggleStereoTab,
    ToggleStereoAnaglyph,
    ToggleStereo3dVision,
    DecreaseDepth,
    IncreaseDepth,
    DecreaseConvergence,
    IncreaseConvergence,
    FreelookDecreaseSpeed,
    FreelookIncreaseSpeed,
    FreelookResetSpeed,
    FreelookUp,
    FreelookDown,
    FreelookLeft,
    FreelookRight,
    FreelookZoomIn,
    FreelookZoomOut,
    FreelookReset,
    LoadStateSlot(u8),
    SaveStateSlot(u8),
    LoadLastState(u8),
    SelectStateSlot(u8),
    SaveFirstState,
    UndoLoadState,
    UndoSaveState,
}

/// How the detector turns raw samples into fired events
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// Fires once on the press transition
    Edge,
    /// Reports the raw sample every tick, repeat logic belongs to the caller
    Hold,
}

// Hotkeys without a parameter, in processing order.
const UNPARAMETERIZED: [Hotkey; 63] = [
    Hotkey::Open,
    Hotkey::EjectDisc,
    Hotkey::ChangeDisc,
    Hotkey::Fullscreen,
    Hotkey::RefreshList,
    Hotkey::PlayPause,
    Hotkey::Stop,
    Hotkey::Reset,
    Hotkey::FrameAdvance,
    Hotkey::FrameAdvanceDecreaseSpeed,
    Hotkey::FrameAdvanceIncreaseSpeed,
    Hotkey::FrameAdvanceResetSpeed,
    Hotkey::Screenshot,
    Hotkey::Exit,
    Hotkey::StartRecording,
    Hotkey::ExportRecording,
    Hotkey::ReadOnlyMode,
    Hotkey::TriggerSyncButton,
    Hotkey::Step,
    Hotkey::StepOver,
    Hotkey::StepOut,
    Hotkey::Skip,
    Hotkey::ShowPc,
    Hotkey::SetPc,
    Hotkey::ToggleBreakpoint,
    Hotkey::AddBreakpoint,
    Hotkey::VolumeDown,
    Hotkey::VolumeUp,
    Hotkey::VolumeToggleMute,
    Hotkey::IncreaseIr,
    Hotkey::DecreaseIr,
    Hotkey::ToggleCrop,
    Hotkey::ToggleAspectRatio,
    Hotkey::ToggleEfbCopies,
    Hotkey::ToggleXfbCopies,
    Hotkey::ToggleImmediateXfb,
    Hotkey::ToggleFog,
    Hotkey::ToggleDumpTextures,
    Hotkey::ToggleTextures,
    Hotkey::ToggleThrottle,
    Hotkey::DecreaseEmulationSpeed,
    Hotkey::IncreaseEmulationSpeed,
    Hotkey::SaveStateSlotSelected,
    Hotkey::LoadStateSlotSelected,
    Hotkey::ToggleStereoSbs,
    Hotkey::ToggleStereoTab,
    Hotkey::ToggleStereoAnaglyph,
    Hotkey::ToggleStereo3dVision,
    Hotkey::DecreaseDepth,
    Hotkey::IncreaseDepth,
    Hotkey::DecreaseConvergence,
    Hotkey::IncreaseConvergence,
    Hotkey::FreelookDecreaseSpeed,
    Hotkey::FreelookIncreaseSpeed,
    Hotkey::FreelookResetSpeed,
    Hotkey::FreelookUp,
    Hotkey::FreelookDown,
    Hotkey::FreelookLeft,
    Hotkey::FreelookRight,
    Hotkey::FreelookZoomIn,
    Hotkey::FreelookZoomOut,
    Hotkey::FreelookReset,
    Hotkey::SaveFirstState,
];

impl Hotkey {
    pub fn trigger(self) -> Trigger {
        match self {
            Hotkey::FrameAdvance
            | Hotkey::TriggerSyncButton
            | Hotkey::ToggleThrottle
            | Hotkey::DecreaseDepth
            | Hotkey::IncreaseDepth
            | Hotkey::DecreaseConvergence
            | Hotkey::IncreaseConvergence
            | Hotkey::FreelookDecreaseSpeed
            | Hotkey::FreelookIncreaseSpeed
            | Hotkey::FreelookResetSpeed
            | Hotkey::FreelookUp
            | Hotkey::FreelookDown
            | Hotkey::FreelookLeft
            | Hotkey::FreelookRight
            | Hotkey::FreelookZoomIn
            | Hotkey::FreelookZoomOut
            | Hotkey::FreelookReset => Trigger::Hold,
            _ => Trigger::Edge,
        }
    }

    // Name of the hotkeys that carry no parameter
    fn fixed_name(self) -> Option<&'static str> {
        let name = match self {
            Hotkey::Open => "open",
            Hotkey::EjectDisc => "eject-disc",
            Hotkey::ChangeDisc => "change-disc",
            Hotkey::Fullscreen => "fullscreen",
            Hotkey::RefreshList => "refresh-list",
            Hotkey::PlayPause => "play-pause",
            Hotkey::Stop => "stop",
            Hotkey::Reset => "reset",
            Hotkey::FrameAdvance => "frame-advance",
            Hotkey::FrameAdvanceDecreaseSpeed => "frame-advance-decrease-speed",
            Hotkey::FrameAdvanceIncreaseSpeed => "frame-advance-increase-speed",
            Hotkey::FrameAdvanceResetSpeed => "frame-advance-reset-speed",
            Hotkey::Screenshot => "screenshot",
            Hotkey::Exit => "exit",
            Hotkey::StartRecording => "start-recording",
            Hotkey::ExportRecording => "export-recording",
            Hotkey::ReadOnlyMode => "read-only-mode",
            Hotkey::TriggerSyncButton => "trigger-sync-button",
            Hotkey::Step => "step",
            Hotkey::StepOver => "step-over",
            Hotkey::StepOut => "step-out",
            Hotkey::Skip => "skip",
            Hotkey::ShowPc => "show-pc",
            Hotkey::SetPc => "set-pc",
            Hotkey::ToggleBreakpoint => "toggle-breakpoint",
            Hotkey::AddBreakpoint => "add-breakpoint",
            Hotkey::VolumeDown => "volume-down",
            Hotkey::VolumeUp => "volume-up",
            Hotkey::VolumeToggleMute => "volume-toggle-mute",
            Hotkey::IncreaseIr => "increase-ir",
            Hotkey::DecreaseIr => "decrease-ir",
            Hotkey::ToggleCrop => "toggle-crop",
            Hotkey::ToggleAspectRatio => "toggle-aspect-ratio",
            Hotkey::ToggleEfbCopies => "toggle-efb-copies",
            Hotkey::ToggleXfbCopies => "toggle-xfb-copies",
            Hotkey::ToggleImmediateXfb => "toggle-immediate-xfb",
            Hotkey::ToggleFog => "toggle-fog",
            Hotkey::ToggleDumpTextures => "toggle-dump-textures",
            Hotkey::ToggleTextures => "toggle-textures",
            Hotkey::ToggleThrottle => "toggle-throttle",
            Hotkey::DecreaseEmulationSpeed => "decrease-emulation-speed",
            Hotkey::IncreaseEmulationSpeed => "increase-emulation-speed",
            Hotkey::SaveStateSlotSelected => "save-selected-slot",
            Hotkey::LoadStateSlotSelected => "load-selected-slot",
            Hotkey::ToggleStereoSbs => "toggle-stereo-sbs",
            Hotkey::ToggleStereoTab => "toggle-stereo-tab",
            Hotkey::ToggleStereoAnaglyph => "toggle-stereo-anaglyph",
            Hotkey::ToggleStereo3dVision => "toggle-stereo-3d-vision",
            Hotkey::DecreaseDepth => "decrease-depth",
            Hotkey::IncreaseDepth => "increase-depth",
            Hotkey::DecreaseConvergence => "decrease-convergence",
            Hotkey::IncreaseConvergence => "increase-convergence",
            Hotkey::FreelookDecreaseSpeed => "freelook-decrease-speed",
            Hotkey::FreelookIncreaseSpeed => "freelook-increase-speed",
            Hotkey::FreelookResetSpeed => "freelook-reset-speed",
            Hotkey::FreelookUp => "freelook-up",
            Hotkey::FreelookDown => "freelook-down",
            Hotkey::FreelookLeft => "freelook-left",
            Hotkey::FreelookRight => "freelook-right",
            Hotkey::FreelookZoomIn => "freelook-zoom-in",
            Hotkey::FreelookZoomOut => "freelook-zoom-out",
            Hotkey::FreelookReset => "freelook-reset",
            Hotkey::SaveFirstState => "save-oldest-slot",
            Hotkey::UndoLoadState => "undo-load-state",
            Hotkey::UndoSaveState => "undo-save-state",
            Hotkey::ConnectWiiRemote(_)
            | Hotkey::LoadStateSlot(_)
            | Hotkey::SaveStateSlot(_)
            | Hotkey::LoadLastState(_)
            | Hotkey::SelectStateSlot(_) => return None,
        };
        Some(name)
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Slot numbers are shown 1-based
        match *self {
            Hotkey::ConnectWiiRemote(BALANCE_BOARD) => f.write_str("connect-balance-board"),
            Hotkey::ConnectWiiRemote(id) => write!(f, "connect-wii-remote-{}", id + 1),
            Hotkey::LoadStateSlot(i) => write!(f, "load-slot-{}", i + 1),
            Hotkey::SaveStateSlot(i) => write!(f, "save-slot-{}", i + 1),
            Hotkey::LoadLastState(i) => write!(f, "load-last-state-{}", i + 1),
            Hotkey::SelectStateSlot(i) => write!(f, "select-slot-{}", i + 1),
            other => f.write_str(other.fixed_name().unwrap_or("unknown")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown hotkey: {0}")]
pub struct ParseHotkeyError(pub String);

impl FromStr for Hotkey {
    type Err = ParseHotkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();

        if let Some(hotkey) = UNPARAMETERIZED
            .iter()
            .chain([Hotkey::UndoLoadState, Hotkey::UndoSaveState].iter())
            .find(|hotkey| hotkey.fixed_name() == Some(name.as_str()))
        {
            return Ok(*hotkey);
        }

        if name == "connect-balance-board" {
            return Ok(Hotkey::ConnectWiiRemote(BALANCE_BOARD));
        }

        let numbered: [(&str, u8, fn(u8) -> Hotkey); 5] = [
            ("connect-wii-remote-", BALANCE_BOARD, Hotkey::ConnectWiiRemote),
            ("load-last-state-", MAX_SLOTS, Hotkey::LoadLastState),
            ("load-slot-", MAX_SLOTS, Hotkey::LoadStateSlot),
            ("save-slot-", MAX_SLOTS, Hotkey::SaveStateSlot),
            ("select-slot-", MAX_SLOTS, Hotkey::SelectStateSlot),
        ];
        for (prefix, limit, build) in numbered {
            if let Some(number) = name.strip_prefix(prefix) {
                return match number.parse::<u8>() {
                    Ok(n) if (1..=limit).contains(&n) => Ok(build(n - 1)),
                    _ => Err(ParseHotkeyError(s.to_string())),
                };
            }
        }

        Err(ParseHotkeyError(s.to_string()))
    }
}

/// A registered action: identifier plus its trigger semantics
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogicalAction {
    pub hotkey: Hotkey,
    pub trigger: Trigger,
}

impl LogicalAction {
    pub fn new(hotkey: Hotkey) -> Self {
        Self {
            hotkey,
            trigger: hotkey.trigger(),
        }
    }
}

/// Fixed, ordered set of actions sampled every tick
///
/// Built once at startup and never mutated afterwards. The order is the
/// order the detector samples in, which keeps per-tick resolution
/// deterministic.
#[derive(Clone, Debug)]
pub struct ActionRegistry {
    actions: Vec<LogicalAction>,
    slot_count: u8,
}

impl ActionRegistry {
    /// Every hotkey the scheduler handles, with `slot_count` save slots
    pub fn standard(slot_count: u8) -> Self {
        let slot_count = slot_count.min(MAX_SLOTS);
        let mut actions: Vec<LogicalAction> =
            UNPARAMETERIZED.iter().copied().map(LogicalAction::new).collect();

        actions.extend((0..=BALANCE_BOARD).map(|id| LogicalAction::new(Hotkey::ConnectWiiRemote(id))));

        for slot in 0..slot_count {
            actions.push(LogicalAction::new(Hotkey::LoadStateSlot(slot)));
            actions.push(LogicalAction::new(Hotkey::SaveStateSlot(slot)));
            actions.push(LogicalAction::new(Hotkey::LoadLastState(slot)));
            actions.push(LogicalAction::new(Hotkey::SelectStateSlot(slot)));
        }

        actions.push(LogicalAction::new(Hotkey::UndoLoadState));
        actions.push(LogicalAction::new(Hotkey::UndoSaveState));

        Self {
            actions,
            slot_count,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogicalAction> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn contains(&self, hotkey: Hotkey) -> bool {
        self.actions.iter().any(|action| action.hotkey == hotkey)
    }

    pub fn slot_count(&self) -> u8 {
        self.slot_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_round_trip_for_every_registered_action() {
        let registry = ActionRegistry::standard(MAX_SLOTS);
        for action in registry.iter() {
            let name = action.hotkey.to_string();
            assert_eq!(name.parse::<Hotkey>(), Ok(action.hotkey), "{name}");
        }
    }

    #[test]
    fn slot_names_are_one_based() {
        assert_eq!(Hotkey::LoadStateSlot(3).to_string(), "load-slot-4");
        assert_eq!("load-slot-4".parse::<Hotkey>(), Ok(Hotkey::LoadStateSlot(3)));
        assert!("load-slot-0".parse::<Hotkey>().is_err());
        assert!("load-slot-11".parse::<Hotkey>().is_err());
        assert_eq!(
            "connect-balance-board".parse::<Hotkey>(),
            Ok(Hotkey::ConnectWiiRemote(BALANCE_BOARD))
        );
    }

    #[test]
    fn registry_is_unique_and_sized_by_slot_count() {
        let registry = ActionRegistry::standard(3);
        let unique: HashSet<Hotkey> = registry.iter().map(|a| a.hotkey).collect();
        assert_eq!(unique.len(), registry.len());
        assert!(registry.contains(Hotkey::SelectStateSlot(2)));
        assert!(!registry.contains(Hotkey::SelectStateSlot(3)));
        assert_eq!(registry.len(), UNPARAMETERIZED.len() + 5 + 3 * 4 + 2);
    }

    #[test]
    fn slot_count_is_capped() {
        assert_eq!(ActionRegistry::standard(200).slot_count(), MAX_SLOTS);
    }

    #[test]
    fn continuous_actions_are_hold_triggered() {
        assert_eq!(Hotkey::FrameAdvance.trigger(), Trigger::Hold);
        assert_eq!(Hotkey::IncreaseDepth.trigger(), Trigger::Hold);
        assert_eq!(Hotkey::FreelookUp.trigger(), Trigger::Hold);
        assert_eq!(Hotkey::Fullscreen.trigger(), Trigger::Edge);
        assert_eq!(Hotkey::LoadStateSlot(0).trigger(), Trigger::Edge);
    }
}
