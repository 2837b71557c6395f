use crate::domain::utility::UtilityValue;
use serde::Serialize;
use std::fmt::Display;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
    Toggle,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
            Action::Toggle => "toggle",
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A command sent to the device.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum OutboundCommand {
    Read { utilities: Vec<String> },
    Write { utility: String, value: UtilityValue },
    Toggle { utility: String },
}

impl OutboundCommand {
    pub fn read<S: AsRef<str>>(utilities: &[S]) -> Self {
        OutboundCommand::Read {
            utilities: utilities.iter().map(|u| u.as_ref().to_string()).collect(),
        }
    }

    pub fn write(utility: impl Into<String>, value: impl Into<UtilityValue>) -> Self {
        OutboundCommand::Write {
            utility: utility.into(),
            value: value.into(),
        }
    }

    pub fn toggle(utility: impl Into<String>) -> Self {
        OutboundCommand::Toggle { utility: utility.into() }
    }

    pub fn action(&self) -> Action {
        match self {
            OutboundCommand::Read { .. } => Action::Read,
            OutboundCommand::Write { .. } => Action::Write,
            OutboundCommand::Toggle { .. } => Action::Toggle,
        }
    }
}

/// The frame put on the wire, optionally carrying a request id the device echoes back.
#[derive(Debug, Serialize)]
pub struct CommandEnvelope<'a> {
    #[serde(flatten)]
    command: &'a OutboundCommand,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
}

impl<'a> CommandEnvelope<'a> {
    pub fn new(command: &'a OutboundCommand, id: Option<u64>) -> Self {
        CommandEnvelope { command, id }
    }

    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
