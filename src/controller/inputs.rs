//! Wire-level controller state
//!
//! A [`ControllerInputs`] value is always a *complete* description of one
//! controller: every update replaces the whole structure, never a single field.
//! Field names on the wire follow the emulator's GameCube pad layout (`A`,
//! `StickX`, `TriggerLeft`, ...), digital buttons travel as `0`/`1`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of controller ports tracked per instance
pub const CONTROLLER_SLOTS: usize = 4;

/// Neutral position of a stick axis on the 0-255 range
pub const STICK_CENTER: u8 = 128;

/// Resting value of an analog trigger
pub const TRIGGER_REST: u8 = 255;

/// Index of one of the four controller ports (0-3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControllerSlot(u8);

impl ControllerSlot {
    pub const ALL: [ControllerSlot; CONTROLLER_SLOTS] = [
        ControllerSlot(0),
        ControllerSlot(1),
        ControllerSlot(2),
        ControllerSlot(3),
    ];

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<u8> for ControllerSlot {
    type Error = InvalidSlot;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (value as usize) < CONTROLLER_SLOTS {
            Ok(Self(value))
        } else {
            Err(InvalidSlot(value))
        }
    }
}

impl fmt::Display for ControllerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("controller index {0} is out of range (expected 0-3)")]
pub struct InvalidSlot(pub u8);

/// Full state of one GameCube-style controller
///
/// Missing fields deserialize to their neutral value, unknown fields sent by
/// older clients (`Left`, `AnalogA`, ...) are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerInputs {
    #[serde(rename = "A", with = "flag")]
    pub a: bool,
    #[serde(rename = "B", with = "flag")]
    pub b: bool,
    #[serde(rename = "X", with = "flag")]
    pub x: bool,
    #[serde(rename = "Y", with = "flag")]
    pub y: bool,
    #[serde(rename = "Z", with = "flag")]
    pub z: bool,
    #[serde(rename = "L", with = "flag")]
    pub l: bool,
    #[serde(rename = "R", with = "flag")]
    pub r: bool,
    #[serde(rename = "Start", with = "flag")]
    pub start: bool,

    #[serde(rename = "StickX")]
    pub stick_x: u8,
    #[serde(rename = "StickY")]
    pub stick_y: u8,
    #[serde(rename = "CStickX")]
    pub c_stick_x: u8,
    #[serde(rename = "CStickY")]
    pub c_stick_y: u8,
    #[serde(rename = "TriggerLeft")]
    pub trigger_left: u8,
    #[serde(rename = "TriggerRight")]
    pub trigger_right: u8,

    /// Controller port this state is meant for
    #[serde(rename = "ID")]
    pub id: u8,
    #[serde(rename = "Connected", with = "flag")]
    pub connected: bool,
}

impl Default for ControllerInputs {
    fn default() -> Self {
        Self {
            a: false,
            b: false,
            x: false,
            y: false,
            z: false,
            l: false,
            r: false,
            start: false,
            stick_x: STICK_CENTER,
            stick_y: STICK_CENTER,
            c_stick_x: STICK_CENTER,
            c_stick_y: STICK_CENTER,
            trigger_left: TRIGGER_REST,
            trigger_right: TRIGGER_REST,
            id: 0,
            connected: false,
        }
    }
}

impl ControllerInputs {
    /// Neutral state addressed to the given port
    pub fn neutral(slot: ControllerSlot) -> Self {
        Self {
            id: slot.0,
            ..Self::default()
        }
    }

    /// Validated controller port of this update
    pub fn slot(&self) -> Result<ControllerSlot, InvalidSlot> {
        ControllerSlot::try_from(self.id)
    }
}

/// Serializes a digital button as `0`/`1`, accepts integers or booleans
mod flag {
    use serde::de::{self, Unexpected, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        deserializer.deserialize_any(FlagVisitor)
    }

    struct FlagVisitor;

    impl<'de> Visitor<'de> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("0, 1 or a boolean")
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> Result<bool, E> {
            Ok(value)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<bool, E> {
            match value {
                0 => Ok(false),
                1 => Ok(true),
                other => Err(E::invalid_value(Unexpected::Unsigned(other), &self)),
            }
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<bool, E> {
            match value {
                0 => Ok(false),
                1 => Ok(true),
                other => Err(E::invalid_value(Unexpected::Signed(other), &self)),
            }
        }
    }
}
