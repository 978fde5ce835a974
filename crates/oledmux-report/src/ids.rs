//! Protocol identifiers.
//!
//! The byte values are the firmware ABI and must not change. The firmware
//! echoes command and screen identifiers back in responses, so both
//! directions share these definitions.

use crate::error::ReportError;

/// Leading byte of an outbound command report.
pub const COMMAND_MSG: u8 = 0xC0;

/// Leading byte of an inbound event report.
pub const EVENT_MSG: u8 = 0xC1;

/// Leading byte of a successful command response.
pub const RESULT_SUCCESS: u8 = 0x00;

/// Leading byte of a failed command response.
pub const RESULT_FAILURE: u8 = 0x01;

/// Commands understood by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandId {
    /// Set up the controller and query the screen geometry.
    SetUp = 0x00,
    /// Clear a screen.
    Clear = 0x01,
    /// Set the content of one row.
    SetLine = 0x02,
    /// Set the content of a span of characters.
    SetChars = 0x03,
    /// Show the changed rows.
    Present = 0x04,
}

impl TryFrom<u8> for CommandId {
    type Error = ReportError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(CommandId::SetUp),
            0x01 => Ok(CommandId::Clear),
            0x02 => Ok(CommandId::SetLine),
            0x03 => Ok(CommandId::SetChars),
            0x04 => Ok(CommandId::Present),
            other => Err(ReportError::UnknownCommand(other)),
        }
    }
}

/// Events emitted by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventId {
    /// Show the tag carried in the first payload byte.
    ChangeTag = 0x00,
    /// Advance to the next tag.
    IncrementTag = 0x01,
    /// Go back to the previous tag.
    DecrementTag = 0x02,
}

impl TryFrom<u8> for EventId {
    type Error = ReportError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(EventId::ChangeTag),
            0x01 => Ok(EventId::IncrementTag),
            0x02 => Ok(EventId::DecrementTag),
            other => Err(ReportError::UnknownEvent(other)),
        }
    }
}

/// The two physical screens of the split board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ScreenId {
    /// Screen on the half the host is plugged into.
    Primary = 0x00,
    /// Screen on the other half.
    Secondary = 0x01,
}

impl ScreenId {
    /// All screens, in protocol order.
    pub const ALL: [ScreenId; 2] = [ScreenId::Primary, ScreenId::Secondary];
}

impl TryFrom<u8> for ScreenId {
    type Error = ReportError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(ScreenId::Primary),
            0x01 => Ok(ScreenId::Secondary),
            other => Err(ReportError::UnknownScreen(other)),
        }
    }
}

impl std::fmt::Display for ScreenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScreenId::Primary => write!(f, "primary"),
            ScreenId::Secondary => write!(f, "secondary"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_ids_roundtrip() {
        for cmd in [
            CommandId::SetUp,
            CommandId::Clear,
            CommandId::SetLine,
            CommandId::SetChars,
            CommandId::Present,
        ] {
            assert_eq!(CommandId::try_from(cmd as u8).unwrap(), cmd);
        }
    }

    #[test]
    fn unknown_command_rejected() {
        assert!(matches!(
            CommandId::try_from(0x05),
            Err(ReportError::UnknownCommand(0x05))
        ));
    }

    #[test]
    fn unknown_screen_rejected() {
        assert!(matches!(
            ScreenId::try_from(0x02),
            Err(ReportError::UnknownScreen(0x02))
        ));
    }
}
