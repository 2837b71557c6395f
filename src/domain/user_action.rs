use std::str::FromStr;
use thiserror::Error;

/// Something the user asked the dashboard to do.
#[derive(Clone, Debug, PartialEq)]
pub enum UserAction {
    Toggle(String),
    Set { utility: String, value: u8 },
    Nudge { utility: String, delta: i8 },
    Read(Vec<String>),
    ReadAll,
    Quit,
}

impl FromStr for UserAction {
    type Err = UserActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(UserActionParseError::Empty);
        };

        let action = match verb.to_lowercase().as_str() {
            "toggle" => UserAction::Toggle(next_utility(&mut words, verb)?),
            "set" => {
                let utility = next_utility(&mut words, verb)?;
                let raw = words.next().ok_or(UserActionParseError::MissingValue)?;
                let value = raw.parse::<u8>().map_err(|_| UserActionParseError::InvalidValue(raw.to_string()))?;
                UserAction::Set { utility, value }
            }
            "up" | "+" => UserAction::Nudge { utility: next_utility(&mut words, verb)?, delta: 1 },
            "down" | "-" => UserAction::Nudge { utility: next_utility(&mut words, verb)?, delta: -1 },
            "read" => {
                let utilities = words.map(str::to_string).collect::<Vec<_>>();
                if utilities.is_empty() { UserAction::ReadAll } else { UserAction::Read(utilities) }
            }
            "quit" | "exit" => UserAction::Quit,
            _ => return Err(UserActionParseError::UnknownCommand(verb.to_string())),
        };

        Ok(action)
    }
}

fn next_utility<'a>(words: &mut impl Iterator<Item = &'a str>, verb: &str) -> Result<String, UserActionParseError> {
    words.next().map(str::to_string).ok_or_else(|| UserActionParseError::MissingUtility(verb.to_string()))
}

#[derive(Error, Debug, PartialEq)]
pub enum UserActionParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("'{0}' needs a utility")]
    MissingUtility(String),
    #[error("'set' needs a value")]
    MissingValue,
    #[error("invalid value '{0}', expected a number between 0 and 255")]
    InvalidValue(String),
}
