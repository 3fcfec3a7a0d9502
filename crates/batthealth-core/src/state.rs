use std::fmt;

use serde::{Deserialize, Serialize};

/// Battery operating mode carried in the payload's 4-bit state code.
///
/// Only codes 0..=8 are defined; `TryFrom<u8>` rejects the rest.
///
/// # Examples
/// ```
/// use batthealth_core::State;
///
/// assert_eq!(State::try_from(7), Ok(State::Error));
/// assert_eq!(State::try_from(9), Err(9));
/// assert_eq!(State::ChargeComplete.to_string(), "charge_complete");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    PowerOff,
    PowerOn,
    Discharge,
    Charge,
    ChargeComplete,
    HostMode,
    Shutdown,
    Error,
    Undefined,
}

impl State {
    pub const ALL: [State; 9] = [
        State::PowerOff,
        State::PowerOn,
        State::Discharge,
        State::Charge,
        State::ChargeComplete,
        State::HostMode,
        State::Shutdown,
        State::Error,
        State::Undefined,
    ];

    pub fn code(self) -> u8 {
        match self {
            State::PowerOff => 0,
            State::PowerOn => 1,
            State::Discharge => 2,
            State::Charge => 3,
            State::ChargeComplete => 4,
            State::HostMode => 5,
            State::Shutdown => 6,
            State::Error => 7,
            State::Undefined => 8,
        }
    }

    pub fn from_code(code: u8) -> Option<State> {
        State::ALL.get(usize::from(code)).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            State::PowerOff => "power_off",
            State::PowerOn => "power_on",
            State::Discharge => "discharge",
            State::Charge => "charge",
            State::ChargeComplete => "charge_complete",
            State::HostMode => "host_mode",
            State::Shutdown => "shutdown",
            State::Error => "error",
            State::Undefined => "undefined",
        }
    }
}

impl TryFrom<u8> for State {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, u8> {
        State::from_code(code).ok_or(code)
    }
}

impl From<State> for u8 {
    fn from(state: State) -> u8 {
        state.code()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
