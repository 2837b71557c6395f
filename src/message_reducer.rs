use crate::domain::ErrorPolicy;
use crate::domain::UtilityValue;
use crate::domain::commands::{Action, OutboundCommand};
use crate::domain::messages::{CommandResponse, CommandStatus, DataResponse, InboundMessage};
use crate::pending_updates::{PendingUpdate, PendingUpdates};
use crate::store::UtilityState;
use tracing::{debug, info, warn};

/// Interprets a text frame received from the device and returns the utilities whose value changed.
pub(crate) fn reduce_frame(state: &mut UtilityState, pending: &mut PendingUpdates, policy: ErrorPolicy, text: &str) -> Vec<String> {
    let message = match InboundMessage::from_text(text) {
        Ok(message) => message,
        Err(e) => {
            warn!(frame = text, "⚠️ Discarding malformed frame: {}", e);
            return Vec::new();
        }
    };

    match message {
        InboundMessage::CommandResponse(response) => reduce_command_response(state, pending, policy, response),
        InboundMessage::DataResponse(response) => reduce_data_response(state, pending, response),
        InboundMessage::Unknown(unknown) => {
            warn!(frame = text, "⚠️ Ignoring message of unknown type {:?}", unknown.message_type);
            Vec::new()
        }
    }
}

/// Applies the optimistic update for a command that was just handed to the socket.
pub(crate) fn reduce_command_sent(state: &mut UtilityState, pending: &mut PendingUpdates, id: u64, command: &OutboundCommand) -> Vec<String> {
    let (utility, applied) = match command {
        OutboundCommand::Toggle { utility } => (utility, state.get(utility).map_or(UtilityValue::Integer(1), |value| value.toggled())),
        OutboundCommand::Write { utility, value } => (utility, *value),
        OutboundCommand::Read { .. } => return Vec::new(),
    };

    let previous = state.insert(utility.clone(), applied);
    debug!(utility, request_id = id, "🟡 Optimistically set '{}' to '{}', was {:?}", utility, applied, previous);

    pending.push(PendingUpdate {
        id,
        action: command.action(),
        utility: utility.clone(),
        previous,
        applied,
    });

    if previous == Some(applied) { Vec::new() } else { vec![utility.clone()] }
}

/// Undoes the optimistic update of a command that never reached the socket.
pub(crate) fn reduce_command_dropped(state: &mut UtilityState, pending: &mut PendingUpdates, id: u64) -> Vec<String> {
    match pending.take_matching(Some(id), "") {
        Some(update) => {
            debug!(utility = update.utility, request_id = id, "🟡 Command was not sent, undoing its optimistic update");
            rollback(state, update)
        }
        None => Vec::new(),
    }
}

fn reduce_command_response(state: &mut UtilityState, pending: &mut PendingUpdates, policy: ErrorPolicy, response: CommandResponse) -> Vec<String> {
    let update = pending.take_matching(response.id, &response.action);

    match response.status {
        CommandStatus::Success => {
            info!(action = response.action, "✅ Command '{}' confirmed: {}", response.action, response.message);
            Vec::new()
        }
        CommandStatus::Error => {
            warn!(action = response.action, "❌ Command '{}' failed: {}", response.action, response.message);
            match (policy, update) {
                (ErrorPolicy::Rollback, Some(update)) => rollback(state, update),
                (ErrorPolicy::Rollback, None) => {
                    debug!(action = response.action, "No optimistic update to roll back");
                    Vec::new()
                }
                (ErrorPolicy::Keep, _) => Vec::new(),
            }
        }
        CommandStatus::Other(status) => {
            #[rustfmt::skip]
            warn!(action = response.action, "⚠️ Unexpected status '{}' for command '{}': {}", status, response.action, response.message);
            Vec::new()
        }
    }
}

fn rollback(state: &mut UtilityState, update: PendingUpdate) -> Vec<String> {
    if state.get(&update.utility) != Some(&update.applied) {
        debug!(utility = update.utility, "↩️ Not rolling back '{}', a newer value has arrived", update.utility);
        return Vec::new();
    }

    match update.previous {
        Some(previous) => {
            state.insert(update.utility.clone(), previous);
            info!(utility = update.utility, "↩️ Rolled back '{}' to '{}'", update.utility, previous);
        }
        None => {
            state.remove(&update.utility);
            info!(utility = update.utility, "↩️ Rolled back '{}' to unknown", update.utility);
        }
    }

    vec![update.utility]
}

fn reduce_data_response(state: &mut UtilityState, pending: &mut PendingUpdates, response: DataResponse) -> Vec<String> {
    if response.action != Action::Read.as_str() {
        warn!(action = response.action, "⚠️ Ignoring data response for action '{}'", response.action);
        return Vec::new();
    }

    let mut changed = Vec::with_capacity(response.data.len());
    for (utility, raw) in response.data {
        let next = match UtilityValue::from_json(&raw) {
            Some(value) => Some(value),
            None if raw.is_null() => None,
            None => {
                warn!(utility, "⚠️ Ignoring non-numeric value {} for '{}'", raw, utility);
                continue;
            }
        };
        reconcile(pending, &utility);

        let previous = match next {
            Some(value) => state.insert(utility.clone(), value),
            None => state.remove(&utility),
        };
        if previous != next {
            debug!(utility, "🟢 Updated '{}' to {:?}, was {:?}", utility, next, previous);
            changed.push(utility);
        }
    }

    changed
}

/// The device reported the actual value of `utility`, so its pending updates no longer need an answer.
fn reconcile(pending: &mut PendingUpdates, utility: &str) {
    let discarded = pending.discard_utility(utility);
    if discarded > 0 {
        debug!(utility, "🟢 Reconciled {} pending update(s) of '{}'", discarded, utility);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const TV_TOGGLE_ERROR: &str = r#"{"type":"CommandResponse","action":"toggle","status":"Error","message":"Invalid utility: tv"}"#;
    const TV_TOGGLE_SUCCESS: &str = r#"{"type":"CommandResponse","action":"toggle","status":"Success","message":"tv toggled successfully"}"#;

    fn state_of(values: &[(&str, UtilityValue)]) -> UtilityState {
        values.iter().map(|(utility, value)| (utility.to_string(), *value)).collect()
    }

    #[test]
    fn data_response_merges_only_the_present_keys() {
        let mut state = state_of(&[("tv", UtilityValue::Integer(1)), ("heater", UtilityValue::Integer(0)), ("led_pwm", UtilityValue::Integer(40))]);
        let mut pending = PendingUpdates::default();

        let changed = reduce_frame(
            &mut state,
            &mut pending,
            ErrorPolicy::Rollback,
            r#"{"type":"DataResponse","action":"read","data":{"alarm":1,"temperature":21.456}}"#,
        );

        assert_eq!(changed, vec!["alarm".to_string(), "temperature".to_string()]);
        assert_eq!(
            state,
            state_of(&[
                ("tv", UtilityValue::Integer(1)),
                ("heater", UtilityValue::Integer(0)),
                ("led_pwm", UtilityValue::Integer(40)),
                ("alarm", UtilityValue::Integer(1)),
                ("temperature", UtilityValue::Float(21.456)),
            ])
        );
    }

    #[test]
    fn data_response_keeps_the_readable_values_of_a_mixed_payload() {
        let mut state = state_of(&[("tv", UtilityValue::Integer(1)), ("temperature", UtilityValue::Float(19.5)), ("led_pwm", UtilityValue::Integer(40))]);
        let mut pending = PendingUpdates::default();

        let changed = reduce_frame(
            &mut state,
            &mut pending,
            ErrorPolicy::Rollback,
            r#"{"type":"DataResponse","action":"read","data":{"alarm":1,"temperature":null,"led_pwm":"high"}}"#,
        );

        assert_eq!(changed, vec!["alarm".to_string(), "temperature".to_string()]);
        assert_eq!(
            state,
            state_of(&[("tv", UtilityValue::Integer(1)), ("led_pwm", UtilityValue::Integer(40)), ("alarm", UtilityValue::Integer(1))])
        );
    }

    #[test]
    fn data_response_reports_only_changed_values() {
        let mut state = state_of(&[("tv", UtilityValue::Integer(1)), ("alarm", UtilityValue::Integer(0))]);
        let mut pending = PendingUpdates::default();

        let changed = reduce_frame(&mut state, &mut pending, ErrorPolicy::Rollback, r#"{"type":"DataResponse","action":"read","data":{"tv":1,"alarm":1}}"#);

        assert_eq!(changed, vec!["alarm".to_string()]);
    }

    #[test]
    fn data_response_for_another_action_is_ignored() {
        let mut state = state_of(&[("tv", UtilityValue::Integer(0))]);
        let mut pending = PendingUpdates::default();

        let changed = reduce_frame(&mut state, &mut pending, ErrorPolicy::Rollback, r#"{"type":"DataResponse","action":"write","data":{"tv":1}}"#);

        assert!(changed.is_empty());
        assert_eq!(state, state_of(&[("tv", UtilityValue::Integer(0))]));
    }

    #[rstest]
    #[case("not json")]
    #[case("")]
    #[case(r#"{"type":"DataResponse","action":"read","data":"#)]
    #[case(r#"{"type":"Heartbeat","uptime":12}"#)]
    #[case(r#"{"action":"read","data":{"tv":0}}"#)]
    fn malformed_or_unknown_frames_leave_the_state_unchanged(#[case] frame: &str) {
        let mut state = state_of(&[("tv", UtilityValue::Integer(1)), ("temperature", UtilityValue::Float(19.5))]);
        let mut pending = PendingUpdates::default();

        let changed = reduce_frame(&mut state, &mut pending, ErrorPolicy::Rollback, frame);

        assert!(changed.is_empty());
        assert_eq!(state, state_of(&[("tv", UtilityValue::Integer(1)), ("temperature", UtilityValue::Float(19.5))]));
    }

    #[test]
    fn toggle_is_applied_optimistically() {
        let mut state = state_of(&[("tv", UtilityValue::Integer(0))]);
        let mut pending = PendingUpdates::default();

        let changed = reduce_command_sent(&mut state, &mut pending, 1, &OutboundCommand::toggle("tv"));

        assert_eq!(changed, vec!["tv".to_string()]);
        assert_eq!(state["tv"], UtilityValue::Integer(1));
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn toggle_of_an_unknown_value_switches_it_on() {
        let mut state = UtilityState::new();
        let mut pending = PendingUpdates::default();

        reduce_command_sent(&mut state, &mut pending, 1, &OutboundCommand::toggle("lamp_ceil"));

        assert_eq!(state["lamp_ceil"], UtilityValue::Integer(1));
    }

    #[test]
    fn read_is_not_tracked_as_an_optimistic_update() {
        let mut state = UtilityState::new();
        let mut pending = PendingUpdates::default();

        let changed = reduce_command_sent(&mut state, &mut pending, 1, &OutboundCommand::read(&["tv"]));

        assert!(changed.is_empty());
        assert_eq!(pending.len(), 0);
    }

    #[test]
    fn rejected_toggle_is_kept_with_the_keep_policy() {
        let mut state = state_of(&[("tv", UtilityValue::Integer(0))]);
        let mut pending = PendingUpdates::default();
        reduce_command_sent(&mut state, &mut pending, 1, &OutboundCommand::toggle("tv"));

        let changed = reduce_frame(&mut state, &mut pending, ErrorPolicy::Keep, TV_TOGGLE_ERROR);

        assert!(changed.is_empty());
        assert_eq!(state["tv"], UtilityValue::Integer(1));
        assert_eq!(pending.len(), 0);
    }

    #[test]
    fn rejected_toggle_is_rolled_back_with_the_rollback_policy() {
        let mut state = state_of(&[("tv", UtilityValue::Integer(0))]);
        let mut pending = PendingUpdates::default();
        reduce_command_sent(&mut state, &mut pending, 1, &OutboundCommand::toggle("tv"));

        let changed = reduce_frame(&mut state, &mut pending, ErrorPolicy::Rollback, TV_TOGGLE_ERROR);

        assert_eq!(changed, vec!["tv".to_string()]);
        assert_eq!(state["tv"], UtilityValue::Integer(0));
        assert_eq!(pending.len(), 0);
    }

    #[test]
    fn rollback_of_a_previously_unknown_value_forgets_it() {
        let mut state = UtilityState::new();
        let mut pending = PendingUpdates::default();
        reduce_command_sent(&mut state, &mut pending, 1, &OutboundCommand::toggle("tv"));

        reduce_frame(&mut state, &mut pending, ErrorPolicy::Rollback, TV_TOGGLE_ERROR);

        assert!(!state.contains_key("tv"));
    }

    #[test]
    fn rollback_does_not_overwrite_newer_device_data() {
        let mut state = state_of(&[("tv", UtilityValue::Integer(0))]);
        let mut pending = PendingUpdates::default();
        reduce_command_sent(&mut state, &mut pending, 1, &OutboundCommand::toggle("tv"));
        reduce_frame(&mut state, &mut pending, ErrorPolicy::Rollback, r#"{"type":"DataResponse","action":"read","data":{"tv":2}}"#);

        let changed = reduce_frame(&mut state, &mut pending, ErrorPolicy::Rollback, TV_TOGGLE_ERROR);

        assert!(changed.is_empty());
        assert_eq!(state["tv"], UtilityValue::Integer(2));
    }

    #[test]
    fn rejected_write_is_rolled_back_by_echoed_id() {
        let mut state = state_of(&[("led_pwm", UtilityValue::Integer(20)), ("tv", UtilityValue::Integer(0))]);
        let mut pending = PendingUpdates::default();
        reduce_command_sent(&mut state, &mut pending, 4, &OutboundCommand::toggle("tv"));
        reduce_command_sent(&mut state, &mut pending, 5, &OutboundCommand::write("led_pwm", 80u8));

        let changed = reduce_frame(
            &mut state,
            &mut pending,
            ErrorPolicy::Rollback,
            r#"{"type":"CommandResponse","action":"write","status":"Error","message":"Invalid value","id":5}"#,
        );

        assert_eq!(changed, vec!["led_pwm".to_string()]);
        assert_eq!(state["led_pwm"], UtilityValue::Integer(20));
        assert_eq!(state["tv"], UtilityValue::Integer(1));
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn read_settles_a_toggle_whose_answer_was_lost() {
        let mut state = state_of(&[("tv", UtilityValue::Integer(0))]);
        let mut pending = PendingUpdates::default();
        reduce_command_sent(&mut state, &mut pending, 1, &OutboundCommand::toggle("tv"));
        reduce_frame(&mut state, &mut pending, ErrorPolicy::Rollback, r#"{"type":"DataResponse","action":"read","data":{"tv":1}}"#);
        assert!(pending.is_empty());

        reduce_command_sent(&mut state, &mut pending, 2, &OutboundCommand::toggle("tv"));
        let changed = reduce_frame(&mut state, &mut pending, ErrorPolicy::Rollback, TV_TOGGLE_ERROR);

        assert_eq!(changed, vec!["tv".to_string()]);
        assert_eq!(state["tv"], UtilityValue::Integer(1));
        assert!(pending.is_empty());
    }

    #[test]
    fn dropped_command_undoes_its_optimistic_update() {
        let mut state = state_of(&[("tv", UtilityValue::Integer(0))]);
        let mut pending = PendingUpdates::default();
        reduce_command_sent(&mut state, &mut pending, 7, &OutboundCommand::toggle("tv"));

        let changed = reduce_command_dropped(&mut state, &mut pending, 7);

        assert_eq!(changed, vec!["tv".to_string()]);
        assert_eq!(state["tv"], UtilityValue::Integer(0));
        assert!(pending.is_empty());
    }

    #[test]
    fn dropped_read_changes_nothing() {
        let mut state = state_of(&[("tv", UtilityValue::Integer(0))]);
        let mut pending = PendingUpdates::default();

        assert!(reduce_command_dropped(&mut state, &mut pending, 3).is_empty());
        assert_eq!(state, state_of(&[("tv", UtilityValue::Integer(0))]));
    }

    #[test]
    fn confirmed_toggle_settles_the_pending_update() {
        let mut state = state_of(&[("tv", UtilityValue::Integer(0))]);
        let mut pending = PendingUpdates::default();
        reduce_command_sent(&mut state, &mut pending, 1, &OutboundCommand::toggle("tv"));

        let changed = reduce_frame(&mut state, &mut pending, ErrorPolicy::Rollback, TV_TOGGLE_SUCCESS);

        assert!(changed.is_empty());
        assert_eq!(state["tv"], UtilityValue::Integer(1));
        assert_eq!(pending.len(), 0);
    }

    #[test]
    fn unexpected_status_changes_nothing() {
        let mut state = state_of(&[("tv", UtilityValue::Integer(0))]);
        let mut pending = PendingUpdates::default();
        reduce_command_sent(&mut state, &mut pending, 1, &OutboundCommand::toggle("tv"));

        let changed = reduce_frame(
            &mut state,
            &mut pending,
            ErrorPolicy::Rollback,
            r#"{"type":"CommandResponse","action":"toggle","status":"Pending","message":""}"#,
        );

        assert!(changed.is_empty());
        assert_eq!(state["tv"], UtilityValue::Integer(1));
    }
}
