//! Logging state machine
//!
//! Two states, edge-triggered by the debounced button. Session start is
//! fallible (storage init, config read): the controller attempts it and
//! reports back with `SessionStarted` or `StartFailed`, so a failed
//! attempt leaves the machine in `Idle` ready for a retry on the next
//! press.

/// Machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Not logging; button press attempts to start a session.
    Idle,
    /// Session active; rows are being produced and written.
    Logging,
}

/// State machine events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Rising edge of the debounced button.
    ButtonPressed,
    /// Storage and config came up; log file is open with its header.
    SessionStarted,
    /// Storage init or config read failed; stay idle.
    StartFailed,
}

impl State {
    /// Whether rows should be produced in this state.
    pub fn is_logging(&self) -> bool {
        matches!(self, State::Logging)
    }

    /// Process an event and return the next state.
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use State::*;

        match (self, event) {
            // A press while idle starts the session attempt; the state
            // only advances once the attempt succeeds.
            (Idle, SessionStarted) => Logging,
            (Idle, StartFailed) => Idle,

            // A press while logging stops the session. The final flush
            // is forced by the controller on this transition.
            (Logging, ButtonPressed) => Idle,

            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_start() {
        let state = State::Idle.transition(Event::SessionStarted);
        assert_eq!(state, State::Logging);
        assert!(state.is_logging());
    }

    #[test]
    fn failed_start_stays_idle() {
        let state = State::Idle.transition(Event::StartFailed);
        assert_eq!(state, State::Idle);
    }

    #[test]
    fn press_while_logging_stops() {
        let state = State::Logging.transition(Event::ButtonPressed);
        assert_eq!(state, State::Idle);
    }

    #[test]
    fn press_while_idle_does_not_advance() {
        // The press only triggers the attempt; Idle -> Logging requires
        // SessionStarted.
        let state = State::Idle.transition(Event::ButtonPressed);
        assert_eq!(state, State::Idle);
    }

    #[test]
    fn start_events_ignored_while_logging() {
        assert_eq!(State::Logging.transition(Event::SessionStarted), State::Logging);
        assert_eq!(State::Logging.transition(Event::StartFailed), State::Logging);
    }
}
