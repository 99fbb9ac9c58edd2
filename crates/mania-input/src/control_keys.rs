/// Global (non-column) key commands.
///
/// Key names are lowercase, matching what `InputCapture` receives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlAction {
    Restart,
    PauseToggle,
    /// Calibration offset change in ms
    OffsetAdjust(f64),
    /// Scroll-speed multiplier change
    ScrollSpeedAdjust(f64),
}

/// Offset step per key press, ms.
const OFFSET_STEP: f64 = 5.0;
/// Scroll-speed step per key press.
const SPEED_STEP: f64 = 0.05;

/// Map a lowercase key name to its control action, if any.
pub fn control_action_for(key: &str) -> Option<ControlAction> {
    match key {
        "`" | "backquote" => Some(ControlAction::Restart),
        "escape" | "esc" => Some(ControlAction::PauseToggle),
        "-" | "minus" => Some(ControlAction::OffsetAdjust(-OFFSET_STEP)),
        "=" | "equal" => Some(ControlAction::OffsetAdjust(OFFSET_STEP)),
        "f3" => Some(ControlAction::ScrollSpeedAdjust(-SPEED_STEP)),
        "f4" => Some(ControlAction::ScrollSpeedAdjust(SPEED_STEP)),
        _ => None,
    }
}
