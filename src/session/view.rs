//! View transition rules and the loading gate.

use crate::types::ViewState;

/// What the front end should render right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Loading,
    View(ViewState),
}

/// The loading gate: while the initial load is pending every view except the
/// ones that survive loading is replaced by a spinner.
pub fn visible_screen(view: ViewState, loading: bool) -> Screen {
    if loading && !view.survives_loading() {
        Screen::Loading
    } else {
        Screen::View(view)
    }
}

/// Tabs reachable by plain navigation.
///
/// Auth and onboarding are driven by the session, recovery only through the
/// SOS overlay, and recovery can only be left through its exit delay.
pub fn can_navigate(from: ViewState, to: ViewState) -> bool {
    use ViewState::*;
    match (from, to) {
        (Dashboard | Regulation | History, Dashboard | Regulation | History | SensoryScan) => true,
        (SensoryScan, Dashboard) => true,
        _ => false,
    }
}

/// Views that show the shared header with the SOS button.
pub fn shows_sos_button(view: ViewState) -> bool {
    matches!(
        view,
        ViewState::Dashboard | ViewState::Regulation | ViewState::History
    )
}
