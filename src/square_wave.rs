//! Square-wave output modes and the per-chip control register updates.
//!
//! The DS1307 drives SQW/OUT from its control register at 0x07:
//! OUT (bit 7), SQWE (bit 4) and RS1:RS0 (bits 1-0). The DS3231/DS3232 share
//! the INT/SQW pin between the alarms and the oscillator: INTCN (bit 2)
//! selects alarm interrupts, RS2:RS1 (bits 4-3) pick the rate.
//!
//! | mode    | DS1307 | DS3231/DS3232 |
//! |---------|--------|---------------|
//! | OffLow  | yes    | no            |
//! | OffHigh | yes    | yes           |
//! | 1 Hz    | yes    | yes           |
//! | 1024 Hz | no     | yes           |
//! | 4096 Hz | yes    | yes           |
//! | 8192 Hz | yes    | yes           |
//! | 32768 Hz| yes    | no            |

use crate::registers::{InvalidCode, RegisterUpdate};
use crate::Model;

/// Output mode of the SQW pin.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SquareWave {
    /// Output off, pin driven low
    OffLow,
    /// Output off, pin high
    OffHigh,
    /// 1 Hz
    Hz1,
    /// 1.024 kHz
    Hz1024,
    /// 4.096 kHz
    Hz4096,
    /// 8.192 kHz
    Hz8192,
    /// 32.768 kHz
    Hz32768,
}

impl SquareWave {
    /// The mode's code byte.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            SquareWave::OffLow => 0xFF,
            SquareWave::OffHigh => 0xFE,
            SquareWave::Hz1 => 0x00,
            SquareWave::Hz1024 => 0x08,
            SquareWave::Hz4096 => 0x10,
            SquareWave::Hz8192 => 0x18,
            SquareWave::Hz32768 => 0x03,
        }
    }

    /// True for the two `Off` modes.
    #[must_use]
    pub const fn is_off(self) -> bool {
        matches!(self, SquareWave::OffLow | SquareWave::OffHigh)
    }

    /// The control register update that selects this mode on `model`, or
    /// [`RegisterUpdate::NONE`] if the model cannot produce it.
    ///
    /// On the DS3231/DS3232 every update also clears A1IE and A2IE.
    #[must_use]
    pub const fn update(self, model: Model) -> RegisterUpdate {
        match model {
            Model::Ds1307 => ds1307_update(self),
            Model::Ds3231 | Model::Ds3232 => ds323x_update(self),
        }
    }
}

impl TryFrom<u8> for SquareWave {
    type Error = InvalidCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0xFF => Ok(SquareWave::OffLow),
            0xFE => Ok(SquareWave::OffHigh),
            0x00 => Ok(SquareWave::Hz1),
            0x08 => Ok(SquareWave::Hz1024),
            0x10 => Ok(SquareWave::Hz4096),
            0x18 => Ok(SquareWave::Hz8192),
            0x03 => Ok(SquareWave::Hz32768),
            _ => Err(InvalidCode(code)),
        }
    }
}

// OUT, SQWE and RS1:RS0 are replaced, bits 6, 5, 3 and 2 kept.
const DS1307_KEEP: u8 = 0b0110_1100;

const fn ds1307_update(mode: SquareWave) -> RegisterUpdate {
    let or = match mode {
        SquareWave::OffLow => 0x00,
        SquareWave::OffHigh => 0x80,
        SquareWave::Hz1 => 0x10,
        SquareWave::Hz4096 => 0x11,
        SquareWave::Hz8192 => 0x12,
        SquareWave::Hz32768 => 0x13,
        SquareWave::Hz1024 => return RegisterUpdate::NONE,
    };
    RegisterUpdate {
        and: DS1307_KEEP,
        or,
    }
}

// RS2:RS1, INTCN, A2IE and A1IE are replaced; EOSC, BBSQW and CONV kept.
const DS323X_KEEP: u8 = 0b1110_0000;

const fn ds323x_update(mode: SquareWave) -> RegisterUpdate {
    match mode {
        // INTCN set with both alarms off leaves the pin released (high)
        SquareWave::OffHigh => RegisterUpdate {
            and: 0b1111_1100,
            or: 0x04,
        },
        SquareWave::Hz1 => RegisterUpdate {
            and: DS323X_KEEP,
            or: 0x00,
        },
        SquareWave::Hz1024 => RegisterUpdate {
            and: DS323X_KEEP,
            or: 0x08,
        },
        SquareWave::Hz4096 => RegisterUpdate {
            and: DS323X_KEEP,
            or: 0x10,
        },
        SquareWave::Hz8192 => RegisterUpdate {
            and: DS323X_KEEP,
            or: 0x18,
        },
        SquareWave::OffLow | SquareWave::Hz32768 => RegisterUpdate::NONE,
    }
}

/// What the DS3231/DS3232 rate-select bits (RS2:RS1) produce.
pub(crate) const fn from_rate_select(rate: u8) -> SquareWave {
    match rate & 0b11 {
        0b00 => SquareWave::Hz1,
        0b01 => SquareWave::Hz1024,
        0b10 => SquareWave::Hz4096,
        _ => SquareWave::Hz8192,
    }
}

/// What the DS1307 rate-select bits (RS1:RS0) produce.
pub(crate) const fn from_ds1307_rate_select(rate: u8) -> SquareWave {
    match rate & 0b11 {
        0b00 => SquareWave::Hz1,
        0b01 => SquareWave::Hz4096,
        0b10 => SquareWave::Hz8192,
        _ => SquareWave::Hz32768,
    }
}

/// What the shared INT/SQW (or SQW/OUT) pin is currently doing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinState {
    /// Oscillating at the given rate
    SquareWave(SquareWave),
    /// Driven by the alarm interrupt logic
    AlarmInterrupt,
    /// Idle, high
    DisabledHigh,
    /// Idle, low (DS1307 only)
    DisabledLow,
}

impl PinState {
    /// The square-wave mode this state corresponds to. Alarm interrupt mode
    /// reports [`SquareWave::OffHigh`]; the pin idles high between alarms.
    #[must_use]
    pub const fn square_wave(self) -> SquareWave {
        match self {
            PinState::SquareWave(mode) => mode,
            PinState::AlarmInterrupt | PinState::DisabledHigh => SquareWave::OffHigh,
            PinState::DisabledLow => SquareWave::OffLow,
        }
    }
}

impl From<SquareWave> for PinState {
    fn from(mode: SquareWave) -> Self {
        match mode {
            SquareWave::OffLow => PinState::DisabledLow,
            SquareWave::OffHigh => PinState::DisabledHigh,
            rate => PinState::SquareWave(rate),
        }
    }
}
