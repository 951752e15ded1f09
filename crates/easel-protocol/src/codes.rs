//! Numeric code tables carried on the wire.

use std::fmt;

/// Identifies the operation a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageType(pub i32);

impl MessageType {
    /// Fetch the backend configuration (`U_CONF`).
    pub const GET_CONFIG: Self = Self(0x00);

    /// Raw wire value.
    #[must_use]
    pub const fn code(self) -> i32 {
        self.0
    }

    /// Groups the code into its operation family.
    #[must_use]
    pub const fn family(self) -> MessageFamily {
        match self.0 {
            0x00 => MessageFamily::Config,
            0x10..=0x1F => MessageFamily::FileSystem,
            0x20..=0x22 => MessageFamily::Terminal,
            0x50..=0x53 => MessageFamily::Chat,
            0xA0..=0xA4 => MessageFamily::SaveState,
            _ => MessageFamily::Unassigned,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:#04x}", self.0)
    }
}

impl From<i32> for MessageType {
    fn from(code: i32) -> Self {
        Self(code)
    }
}

/// Operation families of the message-type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageFamily {
    /// `0x00`.
    Config,
    /// `0x10..=0x1F`.
    FileSystem,
    /// `0x20..=0x22`.
    Terminal,
    /// `0x50..=0x53`.
    Chat,
    /// `0xA0..=0xA4`.
    SaveState,
    /// Outside every assigned range.
    Unassigned,
}

/// Outcome reported in a response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultCode(pub i32);

impl ResultCode {
    /// The request succeeded.
    pub const SUCCESS: Self = Self(0);
    /// The request failed.
    pub const GENERIC_ERROR: Self = Self(1);
    /// The request needs a valid, unexpired session.
    pub const LOGIN_REQUIRED: Self = Self(0x10);
    /// The caller is banned.
    pub const BANNED: Self = Self(0x11);

    /// Raw wire value.
    #[must_use]
    pub const fn code(self) -> i32 {
        self.0
    }

    /// Returns `true` for [`ResultCode::SUCCESS`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 == Self::SUCCESS.0
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match *self {
            Self::SUCCESS => "success",
            Self::GENERIC_ERROR => "error",
            Self::LOGIN_REQUIRED => "login-required",
            Self::BANNED => "banned",
            Self(other) => return write!(formatter, "{other:#04x}"),
        };
        formatter.write_str(label)
    }
}

/// Kind of an unsolicited broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BroadcastType(pub i32);

impl BroadcastType {
    /// The backend is shutting down.
    pub const SHUTDOWN: Self = Self(0x00);
    /// A chat message was posted.
    pub const CHAT_MESSAGE: Self = Self(0x10);
    /// A system connected.
    pub const SYSTEM_CONNECTED: Self = Self(0x20);
    /// Government alert.
    pub const GOVERNMENT_ALERT: Self = Self(0x30);

    /// Raw wire value.
    #[must_use]
    pub const fn code(self) -> i32 {
        self.0
    }
}

impl fmt::Display for BroadcastType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:#04x}", self.0)
    }
}
