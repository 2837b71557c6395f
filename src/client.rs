use crate::domain::utility::kind_of;
use crate::domain::{UserAction, UtilityKind};
use crate::store::StoreSnapshot;
use crate::ws::CommandDispatcher;
use thiserror::Error;
use tokio::sync::watch::Receiver;
use tracing::{info, instrument};

/// What the dashboard's buttons and sliders talk to.
#[derive(Clone, Debug)]
pub struct UtilitySyncClient {
    dispatcher: CommandDispatcher,
    snapshot: Receiver<StoreSnapshot>,
}

impl UtilitySyncClient {
    pub fn new(dispatcher: CommandDispatcher, snapshot: Receiver<StoreSnapshot>) -> Self {
        UtilitySyncClient { dispatcher, snapshot }
    }

    pub async fn toggle(&self, utility: &str) -> Result<bool, ClientError> {
        match kind_of(utility) {
            Some(UtilityKind::Binary) => Ok(self.dispatcher.toggle(utility).await),
            Some(kind) => Err(ClientError::Unsupported {
                utility: utility.to_string(),
                kind,
                operation: "toggle",
            }),
            None => Err(ClientError::UnknownUtility(utility.to_string())),
        }
    }

    pub async fn set_value(&self, utility: &str, value: u8) -> Result<bool, ClientError> {
        match kind_of(utility) {
            Some(UtilityKind::Reading) => Err(ClientError::Unsupported {
                utility: utility.to_string(),
                kind: UtilityKind::Reading,
                operation: "set",
            }),
            Some(_) if value > 100 => Err(ClientError::ValueOutOfRange(value)),
            Some(_) => Ok(self.dispatcher.set_value(utility, value).await),
            None => Err(ClientError::UnknownUtility(utility.to_string())),
        }
    }

    /// Moves a level by `delta` from its last known value, like the dashboard's +/- buttons.
    pub async fn nudge(&self, utility: &str, delta: i8) -> Result<bool, ClientError> {
        let current = self.snapshot.borrow().value(utility).map_or(0.0, |value| value.as_f64());
        let next = (current.round() + delta as f64).clamp(0.0, 100.0) as u8;
        self.set_value(utility, next).await
    }

    pub async fn read_utilities<S: AsRef<str>>(&self, utilities: &[S]) -> bool {
        self.dispatcher.read_utilities(utilities).await
    }

    #[instrument(skip(self))]
    pub async fn handle(&self, action: UserAction) -> Result<bool, ClientError> {
        info!("👆 {:?}", action);
        match action {
            UserAction::Toggle(utility) => self.toggle(&utility).await,
            UserAction::Set { utility, value } => self.set_value(&utility, value).await,
            UserAction::Nudge { utility, delta } => self.nudge(&utility, delta).await,
            UserAction::Read(utilities) => Ok(self.read_utilities(&utilities).await),
            UserAction::ReadAll => Ok(self.dispatcher.read_all().await),
            UserAction::Quit => Ok(self.dispatcher.close().await),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ClientError {
    #[error("unknown utility '{0}'")]
    UnknownUtility(String),
    #[error("cannot {operation} '{utility}', it is a {kind:?} utility")]
    Unsupported {
        utility: String,
        kind: UtilityKind,
        operation: &'static str,
    },
    #[error("value {0} is out of range, expected 0 to 100")]
    ValueOutOfRange(u8),
}
