use chrono::{DateTime, Local};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{error, info, warn};

/// Commands the host executes
///
/// Slot numbers are 1-based. `ConnectWiiRemote` carries the 0-based remote
/// id, with 4 standing for the balance board.
#[derive(Clone, Debug, PartialEq)]
pub enum HotkeyCommand {
    Open,
    EjectDisc,
    ChangeDisc,
    ToggleFullscreen,
    RefreshGameList,
    TogglePause,
    Stop,
    Reset,
    FrameStep,
    Screenshot,
    Exit,
    StartRecording,
    ExportRecording,
    ToggleReadOnlyMode,
    ConnectWiiRemote(u8),
    LoadSlot(u8),
    SaveSlot(u8),
    LoadLastSaved(u8),
    SelectSlot(u8),
    SaveSelectedSlot,
    LoadSelectedSlot,
    SaveOldestSlot,
    UndoLoadState,
    UndoSaveState,
    Step,
    StepOver,
    StepOut,
    Skip,
    ShowPc,
    SetPc,
    ToggleBreakpoint,
    AddBreakpoint,
    FreelookTranslate { x: f64, y: f64, z: f64 },
    FreelookReset,
}

#[derive(Clone, Debug)]
pub struct EmittedCommand {
    pub command: HotkeyCommand,
    pub tick: u64,
    pub issued_at: DateTime<Local>,
}

/// Producer half of the command channel
///
/// Emission never blocks the tick loop. A full or closed channel drops the
/// command with a warning.
#[derive(Debug)]
pub struct CommandEmitter {
    sender: mpsc::Sender<EmittedCommand>,
    emitted: u64,
    dropped: u64,
}

impl CommandEmitter {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<EmittedCommand>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let emitter = Self {
            sender,
            emitted: 0,
            dropped: 0,
        };
        (emitter, receiver)
    }

    /// Returns true when the command was handed to the channel
    pub fn emit(&mut self, tick: u64, command: HotkeyCommand) -> bool {
        let emitted = EmittedCommand {
            command,
            tick,
            issued_at: Local::now(),
        };

        match self.sender.try_send(emitted) {
            Ok(()) => {
                self.emitted += 1;
                true
            }
            Err(TrySendError::Full(dropped)) => {
                self.dropped += 1;
                warn!("Command channel is full, {:?} dropped", dropped.command);
                false
            }
            Err(TrySendError::Closed(dropped)) => {
                self.dropped += 1;
                warn!("Command channel closed, {:?} dropped", dropped.command);
                false
            }
        }
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl Drop for CommandEmitter {
    fn drop(&mut self) {
        if self.dropped > 0 {
            error!("Command emitter closed with {} dropped commands", self.dropped);
        } else {
            info!("Command emitter closed after {} commands", self.emitted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emitted_command_reaches_receiver() {
        let (mut emitter, mut rx) = CommandEmitter::channel(4);
        assert!(emitter.emit(7, HotkeyCommand::LoadSlot(4)));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.command, HotkeyCommand::LoadSlot(4));
        assert_eq!(received.tick, 7);
        assert_eq!(emitter.emitted(), 1);
    }

    #[test]
    fn full_channel_drops_without_blocking() {
        let (mut emitter, _rx) = CommandEmitter::channel(1);
        assert!(emitter.emit(1, HotkeyCommand::Screenshot));
        assert!(!emitter.emit(1, HotkeyCommand::Screenshot));
        assert_eq!(emitter.dropped(), 1);
    }

    #[test]
    fn closed_channel_drops() {
        let (mut emitter, rx) = CommandEmitter::channel(4);
        drop(rx);
        assert!(emitter.is_closed());
        assert!(!emitter.emit(1, HotkeyCommand::Exit));
        assert_eq!(emitter.dropped(), 1);
    }
}
