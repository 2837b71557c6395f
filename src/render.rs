use crate::domain::events::ConnectionState;
use crate::domain::utility::{ALL_UTILITIES, TEMPERATURE, kind_of};
use crate::domain::{UtilityKind, UtilityValue};
use crate::store::StoreSnapshot;
use std::collections::BTreeMap;
use std::fmt::Display;

pub const TOGGLED_CLASS: &str = "button-toggled";
pub const TEMPERATURE_PLACEHOLDER: &str = "-- °C";

#[derive(Clone, Debug, PartialEq)]
pub enum Widget {
    ToggleButton { toggled: bool },
    Slider { value: u8 },
    Readout(String),
}

impl Widget {
    /// The CSS classes a toggle button carries on the dashboard.
    pub fn classes(&self) -> Vec<&'static str> {
        match self {
            Widget::ToggleButton { toggled: true } => vec![TOGGLED_CLASS],
            _ => Vec::new(),
        }
    }
}

impl Display for Widget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Widget::ToggleButton { toggled: true } => write!(f, "[on]"),
            Widget::ToggleButton { toggled: false } => write!(f, "[off]"),
            Widget::Slider { value } => write!(f, "({}%)", value),
            Widget::Readout(text) => write!(f, "{}", text),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DashboardView {
    pub status: &'static str,
    pub widgets: BTreeMap<String, Widget>,
}

impl Display for DashboardView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.status)?;
        for (utility, widget) in &self.widgets {
            write!(f, " | {} {}", utility, widget)?;
        }
        Ok(())
    }
}

pub fn render(snapshot: &StoreSnapshot) -> DashboardView {
    let widgets = ALL_UTILITIES
        .iter()
        .filter_map(|utility| render_utility(utility, snapshot.value(utility)).map(|widget| (utility.to_string(), widget)))
        .collect();

    DashboardView {
        status: render_status(snapshot.connection()),
        widgets,
    }
}

pub fn render_utility(utility: &str, value: Option<&UtilityValue>) -> Option<Widget> {
    let widget = match kind_of(utility)? {
        UtilityKind::Binary => Widget::ToggleButton {
            toggled: value.is_some_and(UtilityValue::is_on),
        },
        UtilityKind::Level => Widget::Slider {
            value: value.map_or(0, |value| value.as_f64().round().clamp(0.0, 100.0) as u8),
        },
        UtilityKind::Reading if utility == TEMPERATURE => Widget::Readout(render_temperature(value)),
        UtilityKind::Reading => Widget::Readout(value.map_or_else(|| "--".to_string(), UtilityValue::to_string)),
    };
    Some(widget)
}

pub fn render_temperature(value: Option<&UtilityValue>) -> String {
    match value {
        Some(value) => format!("{:.2} °C", value.as_f64()),
        None => TEMPERATURE_PLACEHOLDER.to_string(),
    }
}

pub fn render_status(connection: ConnectionState) -> &'static str {
    match connection {
        ConnectionState::Open => "connected",
        ConnectionState::Connecting => "connecting…",
        ConnectionState::Disconnected | ConnectionState::Closed | ConnectionState::Errored => "disconnected",
    }
}
