use serde::Deserialize;

/// What happens to an optimistic update when the device rejects the command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Restore the value the utility had before the command.
    #[default]
    Rollback,
    /// Leave the optimistic value until the next read reconciles it.
    Keep,
}
