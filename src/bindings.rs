//! Gesture-to-action bindings
//!
//! The host addon maps each gesture key to an action name and invokes it.
//! This module gives that table a typed shape: one field per gesture key,
//! each holding an `Action`. Unknown action names deserialize to
//! `Action::None` (with a warning) so a stale entry disables a gesture
//! instead of failing the whole config file.

use serde::{Deserialize, Serialize};

use crate::analysis::{GestureEvent, GestureKind, GesturePhase};

/// Application action a gesture can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum Action {
    AnswerGood,
    AnswerAgain,
    AnswerHard,
    AnswerEasy,
    ScrollDown,
    ScrollUp,
    ToggleReview,
    Undo,
    Bury,
    Suspend,
    Recalibrate,
    None,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::AnswerGood => "action_answer_good",
            Action::AnswerAgain => "action_answer_again",
            Action::AnswerHard => "action_answer_hard",
            Action::AnswerEasy => "action_answer_easy",
            Action::ScrollDown => "action_scroll_down",
            Action::ScrollUp => "action_scroll_up",
            Action::ToggleReview => "action_toggle_review",
            Action::Undo => "action_undo",
            Action::Bury => "action_bury",
            Action::Suspend => "action_suspend",
            Action::Recalibrate => "action_recalibrate",
            Action::None => "action_none",
        }
    }

    /// Parse an action name; `None` for names this crate does not know
    pub fn parse(name: &str) -> Option<Self> {
        let action = match name {
            "action_answer_good" => Action::AnswerGood,
            "action_answer_again" => Action::AnswerAgain,
            // Older default tables used the short names.
            "action_answer_hard" | "action_hard" => Action::AnswerHard,
            "action_answer_easy" | "action_easy" => Action::AnswerEasy,
            "action_scroll_down" => Action::ScrollDown,
            "action_scroll_up" => Action::ScrollUp,
            "action_toggle_review" => Action::ToggleReview,
            "action_undo" => Action::Undo,
            "action_bury" => Action::Bury,
            "action_suspend" => Action::Suspend,
            "action_recalibrate" => Action::Recalibrate,
            "action_none" => Action::None,
            _ => return None,
        };
        Some(action)
    }

    /// Signed scroll distance for scroll actions (positive = down)
    pub fn scroll_delta(&self, scroll_amount: u32) -> Option<i64> {
        match self {
            Action::ScrollDown => Some(i64::from(scroll_amount)),
            Action::ScrollUp => Some(-i64::from(scroll_amount)),
            _ => None,
        }
    }
}

impl From<String> for Action {
    fn from(name: String) -> Self {
        Action::parse(&name).unwrap_or_else(|| {
            log::warn!("[Bindings] Unknown action {:?}, treating as action_none", name);
            Action::None
        })
    }
}

impl From<Action> for &'static str {
    fn from(action: Action) -> Self {
        action.as_str()
    }
}

/// Immutable gesture -> action table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureBindings {
    pub nod_right: Action,
    pub nod_left: Action,
    pub nod_up: Action,
    pub nod_down: Action,
    pub hold_down: Action,
    pub hold_up: Action,
    pub hold_left: Action,
    pub hold_right: Action,
    pub fist: Action,
    pub swipe_left: Action,
}

impl Default for GestureBindings {
    fn default() -> Self {
        Self {
            nod_right: Action::AnswerGood,
            nod_left: Action::AnswerAgain,
            nod_up: Action::AnswerHard,
            nod_down: Action::AnswerEasy,
            hold_down: Action::ScrollDown,
            hold_up: Action::ScrollUp,
            hold_left: Action::Bury,
            hold_right: Action::Suspend,
            fist: Action::ToggleReview,
            swipe_left: Action::Undo,
        }
    }
}

impl GestureBindings {
    /// Action bound to a gesture key
    pub fn action_for(&self, kind: GestureKind) -> Action {
        match kind {
            GestureKind::NodRight => self.nod_right,
            GestureKind::NodLeft => self.nod_left,
            GestureKind::NodUp => self.nod_up,
            GestureKind::NodDown => self.nod_down,
            GestureKind::HoldDown => self.hold_down,
            GestureKind::HoldUp => self.hold_up,
            GestureKind::HoldLeft => self.hold_left,
            GestureKind::HoldRight => self.hold_right,
            GestureKind::Fist => self.fist,
            GestureKind::SwipeLeft => self.swipe_left,
        }
    }

    /// Action to invoke for an emitted event, if any
    ///
    /// `hold_end` only closes a hold and never triggers anything; unbound
    /// gestures resolve to `None` and are dropped by the dispatcher.
    pub fn resolve(&self, event: &GestureEvent) -> Option<Action> {
        if event.phase == GesturePhase::HoldEnd {
            return None;
        }
        match self.action_for(event.kind) {
            Action::None => None,
            action => Some(action),
        }
    }
}
