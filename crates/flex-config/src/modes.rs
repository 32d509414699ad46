//! Enumerated configuration values selected by name.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Transport used to receive tasks from the platform.
///
/// Parsed case-insensitively, so `SDK_RECEIVER=TCP` selects [`Self::Tcp`].
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ReceiverKind {
    /// HTTP router with one route per registered handler.
    #[default]
    Http,
    /// Newline-delimited JSON over persistent TCP connections.
    Tcp,
    /// In-process entry point invoked by a host runtime.
    Embedded,
}

impl ReceiverKind {
    /// Returns true when the receiver listens on a network port.
    #[must_use]
    pub const fn is_networked(self) -> bool {
        matches!(self, Self::Http | Self::Tcp)
    }
}

/// Output format for service diagnostics.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Single-line human-readable output.
    Compact,
}

/// Error returned when a mode name is not recognised.
pub type ModeParseError = strum::ParseError;
