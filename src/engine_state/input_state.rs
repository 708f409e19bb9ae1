//! # Input State
//!
//! The per-tick input snapshot the engine consumes. Windowing code owns the devices
//! and builds one `InputBundle` per tick; the engine never sees raw events.

/// Represents the state of a key or button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RawInputState {
    /// Key/button is not pressed
    #[default]
    NotPressed,
    /// Key/button was just pressed this tick
    Pressed,
    /// Key/button has been held down for multiple ticks
    Held,
    /// Key/button was just released this tick
    Released,
}

impl RawInputState {
    /// Determines if the input is actively down (either pressed or held)
    pub fn is_active(&self) -> bool {
        matches!(self, RawInputState::Pressed | RawInputState::Held)
    }

    /// Determines if the input was just pressed this tick
    pub fn is_just_pressed(&self) -> bool {
        matches!(self, RawInputState::Pressed)
    }

    /// Derives the state from whether the input was down last tick and is down now
    pub fn from_raw_states(previous: bool, current: bool) -> Self {
        match (previous, current) {
            (false, true) => RawInputState::Pressed,
            (true, true) => RawInputState::Held,
            (true, false) => RawInputState::Released,
            (false, false) => RawInputState::NotPressed,
        }
    }
}

/// Immutable snapshot of everything the player controls for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputBundle {
    pub move_forward: RawInputState,
    pub move_backward: RawInputState,
    pub move_left: RawInputState,
    pub move_right: RawInputState,
    pub jump: RawInputState,
    /// Removes the targeted block
    pub break_block: RawInputState,
    /// Places the selected block in front of the targeted one
    pub place_block: RawInputState,
    /// Selects the next placeable block
    pub next_block: RawInputState,
    /// Selects the previous placeable block
    pub prev_block: RawInputState,
    /// Mouse movement since the last tick (x, y)
    pub mouse_delta: (f32, f32),
}

impl InputBundle {
    /// Forward/backward and right/left movement axes, each in `[-1, 1]`.
    pub fn movement_axes(&self) -> (f32, f32) {
        let axis = |positive: RawInputState, negative: RawInputState| {
            positive.is_active() as i32 as f32 - negative.is_active() as i32 as f32
        };
        (
            axis(self.move_forward, self.move_backward),
            axis(self.move_right, self.move_left),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_from_raw_states() {
        assert_eq!(RawInputState::from_raw_states(false, true), RawInputState::Pressed);
        assert_eq!(RawInputState::from_raw_states(true, true), RawInputState::Held);
        assert_eq!(RawInputState::from_raw_states(true, false), RawInputState::Released);
        assert!(!RawInputState::from_raw_states(false, false).is_active());
    }

    #[test]
    fn opposite_keys_cancel() {
        let input = InputBundle {
            move_forward: RawInputState::Held,
            move_backward: RawInputState::Pressed,
            move_left: RawInputState::Held,
            ..InputBundle::default()
        };
        assert_eq!(input.movement_axes(), (0.0, -1.0));
    }
}
