// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Checkpoint triggers and command outcomes

/// Why a checkpoint is being requested
///
/// Input-originated triggers are ignored while an undo/redo restore is in
/// flight; structural ones (commands, gestures, note load) are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointTrigger {
    /// Baseline when a note is opened
    Load,

    /// Quiet period after a burst of typing
    Typing,

    /// Focus entered the surface
    Focus,

    /// Shortly after pointer-up on the surface
    PointerUp,

    /// Shortly after Enter, Delete or Backspace
    StructuralKey,

    /// Before a formatting command mutates the surface
    Command,

    /// Before and after an image resize, drag or preset change
    ImageGesture,
}

impl CheckpointTrigger {
    pub fn is_input(self) -> bool {
        matches!(
            self,
            Self::Typing | Self::Focus | Self::PointerUp | Self::StructuralKey
        )
    }
}

/// How a formatting intent was carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The platform's rich-text primitive applied it
    Native,

    /// Applied by manual tree manipulation
    Fallback,

    /// Neither path could apply it; the surface is unchanged
    Abandoned,

    /// The intent needs selected text and there was none
    NeedsSelection,
}

impl CommandOutcome {
    /// True if the surface was changed
    pub fn applied(self) -> bool {
        matches!(self, Self::Native | Self::Fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_input_triggers_are_guarded() {
        assert!(CheckpointTrigger::Typing.is_input());
        assert!(CheckpointTrigger::Focus.is_input());
        assert!(!CheckpointTrigger::Command.is_input());
        assert!(!CheckpointTrigger::Load.is_input());
    }

    #[test]
    fn applied_outcomes() {
        assert!(CommandOutcome::Native.applied());
        assert!(CommandOutcome::Fallback.applied());
        assert!(!CommandOutcome::Abandoned.applied());
        assert!(!CommandOutcome::NeedsSelection.applied());
    }
}
