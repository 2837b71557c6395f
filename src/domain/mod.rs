pub mod commands;
mod error_policy;
pub mod events;
mod geo_location;
pub mod messages;
mod user_action;
pub mod utility;

pub use error_policy::ErrorPolicy;
pub use geo_location::GeoLocation;
pub use user_action::UserAction;
pub use utility::{UtilityKind, UtilityValue};
