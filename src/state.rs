//! The driver's view of the chip.
//!
//! Both sessions keep a [`Mirror`] of what they last read from, or
//! successfully wrote to, the device. The transitions here are pure; the
//! sessions only call them after the bus traffic for an operation succeeded.

use crate::alarm::{Alarm, Alarm1, Alarm1Mode, Alarm2, Alarm2Mode, AlarmMode};
use crate::datetime::DateTime;
use crate::registers::{Control, Ds1307Control, InterruptControl};
use crate::square_wave::{self, PinState, SquareWave};
use crate::{Config, Model};

/// Temperature value before the first successful read.
pub const TEMPERATURE_UNREAD: i16 = 32767;

/// Cached device state owned by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mirror {
    pub(crate) address: u8,
    pub(crate) model: Model,
    pub(crate) clear_lost_power_on_set: bool,
    pub(crate) datetime: DateTime,
    pub(crate) temperature: i16,
    pub(crate) alarm1: Alarm1,
    pub(crate) alarm2: Alarm2,
    pub(crate) pin: PinState,
}

impl Mirror {
    pub(crate) fn new(config: &Config) -> Self {
        Mirror {
            address: config.address,
            model: config.model,
            clear_lost_power_on_set: config.clear_lost_power_on_set,
            datetime: DateTime::default(),
            temperature: TEMPERATURE_UNREAD,
            alarm1: Alarm1::default(),
            alarm2: Alarm2::default(),
            pin: PinState::DisabledHigh,
        }
    }

    /// Last-read or last-written calendar value.
    #[must_use]
    pub fn datetime(&self) -> DateTime {
        self.datetime
    }

    /// Last-read temperature in hundredths of a degree Celsius, or
    /// [`TEMPERATURE_UNREAD`].
    #[must_use]
    pub fn temperature(&self) -> i16 {
        self.temperature
    }

    /// Alarm 1 as last written or synced.
    #[must_use]
    pub fn alarm1(&self) -> Alarm1 {
        self.alarm1
    }

    /// Alarm 2 as last written or synced.
    #[must_use]
    pub fn alarm2(&self) -> Alarm2 {
        self.alarm2
    }

    /// Mode of either slot.
    #[must_use]
    pub fn alarm_mode(&self, slot: Alarm) -> AlarmMode {
        match slot {
            Alarm::One => AlarmMode::One(self.alarm1.mode),
            Alarm::Two => AlarmMode::Two(self.alarm2.mode),
        }
    }

    /// Alarm second; alarm 2 has none and always reports 0.
    #[must_use]
    pub fn alarm_second(&self, slot: Alarm) -> u8 {
        match slot {
            Alarm::One => self.alarm1.second,
            Alarm::Two => 0,
        }
    }

    #[must_use]
    pub fn alarm_minute(&self, slot: Alarm) -> u8 {
        match slot {
            Alarm::One => self.alarm1.minute,
            Alarm::Two => self.alarm2.minute,
        }
    }

    #[must_use]
    pub fn alarm_hour(&self, slot: Alarm) -> u8 {
        match slot {
            Alarm::One => self.alarm1.hour,
            Alarm::Two => self.alarm2.hour,
        }
    }

    #[must_use]
    pub fn alarm_day(&self, slot: Alarm) -> u8 {
        match slot {
            Alarm::One => self.alarm1.day,
            Alarm::Two => self.alarm2.day,
        }
    }

    /// What the output pin is doing.
    #[must_use]
    pub fn pin_state(&self) -> PinState {
        self.pin
    }

    /// The square-wave mode implied by [`Mirror::pin_state`].
    #[must_use]
    pub fn square_wave(&self) -> SquareWave {
        self.pin.square_wave()
    }

    fn any_alarm_armed(&self) -> bool {
        self.alarm1.mode.is_enabled() || self.alarm2.mode.is_enabled()
    }

    pub(crate) fn alarm1_set(&mut self, alarm: Alarm1) {
        self.alarm1 = alarm;
        self.pin = PinState::AlarmInterrupt;
    }

    pub(crate) fn alarm2_set(&mut self, alarm: Alarm2) {
        self.alarm2 = alarm;
        self.pin = PinState::AlarmInterrupt;
    }

    pub(crate) fn alarm_disabled(&mut self, slot: Alarm) {
        match slot {
            Alarm::One => self.alarm1.mode = Alarm1Mode::Disabled,
            Alarm::Two => self.alarm2.mode = Alarm2Mode::Disabled,
        }
        if self.pin == PinState::AlarmInterrupt && !self.any_alarm_armed() {
            self.pin = PinState::DisabledHigh;
        }
    }

    pub(crate) fn square_wave_set(&mut self, mode: SquareWave) {
        self.alarm1.mode = Alarm1Mode::Disabled;
        self.alarm2.mode = Alarm2Mode::Disabled;
        self.pin = PinState::from(mode);
    }

    /// Rebuilds the alarm mirrors and pin state from a register dump.
    pub(crate) fn alarms_synced(&mut self, alarm1: Alarm1, alarm2: Alarm2, control: Control) {
        self.alarm1 = alarm1;
        self.alarm2 = alarm2;
        self.pin = match control.interrupt_control() {
            InterruptControl::SquareWave => {
                PinState::SquareWave(square_wave::from_rate_select(control.rate_select()))
            }
            InterruptControl::Interrupt if self.any_alarm_armed() => PinState::AlarmInterrupt,
            InterruptControl::Interrupt => PinState::DisabledHigh,
        };
    }

    /// Rebuilds the pin state from the DS1307 control register.
    pub(crate) fn ds1307_control_synced(&mut self, control: Ds1307Control) {
        self.pin = if control.square_wave_enable() {
            PinState::SquareWave(square_wave::from_ds1307_rate_select(control.rate_select()))
        } else if control.out() {
            PinState::DisabledHigh
        } else {
            PinState::DisabledLow
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mirror() -> Mirror {
        Mirror::new(&Config::default())
    }

    fn armed_alarm1() -> Alarm1 {
        Alarm1 {
            mode: Alarm1Mode::FixedHourMinuteSecond,
            second: 0,
            minute: 30,
            hour: 7,
            day: 0,
        }
    }

    fn armed_alarm2() -> Alarm2 {
        Alarm2 {
            mode: Alarm2Mode::FixedMinute,
            minute: 15,
            hour: 0,
            day: 0,
        }
    }

    #[test]
    fn test_initial_state() {
        let state = mirror();
        assert_eq!(state.address, 0x68);
        assert_eq!(state.temperature(), TEMPERATURE_UNREAD);
        assert_eq!(state.datetime(), DateTime::default());
        assert_eq!(state.alarm_mode(Alarm::One), AlarmMode::One(Alarm1Mode::Disabled));
        assert_eq!(state.alarm_mode(Alarm::Two), AlarmMode::Two(Alarm2Mode::Disabled));
        assert_eq!(state.pin_state(), PinState::DisabledHigh);
    }

    #[test]
    fn test_alarm_set_and_disable() {
        let mut state = mirror();
        state.alarm1_set(armed_alarm1());
        state.alarm2_set(armed_alarm2());
        assert_eq!(state.pin_state(), PinState::AlarmInterrupt);
        assert_eq!(state.square_wave(), SquareWave::OffHigh);
        assert_eq!(state.alarm_hour(Alarm::One), 7);
        assert_eq!(state.alarm_minute(Alarm::Two), 15);
        assert_eq!(state.alarm_second(Alarm::Two), 0);

        state.alarm_disabled(Alarm::One);
        assert_eq!(state.alarm1().mode, Alarm1Mode::Disabled);
        assert_eq!(state.alarm1().minute, 30);
        assert_eq!(state.pin_state(), PinState::AlarmInterrupt);

        state.alarm_disabled(Alarm::Two);
        assert_eq!(state.pin_state(), PinState::DisabledHigh);
    }

    #[test]
    fn test_square_wave_clears_alarms() {
        let mut state = mirror();
        state.alarm1_set(armed_alarm1());
        state.alarm2_set(armed_alarm2());
        state.square_wave_set(SquareWave::Hz1);
        assert_eq!(state.alarm1().mode, Alarm1Mode::Disabled);
        assert_eq!(state.alarm2().mode, Alarm2Mode::Disabled);
        assert_eq!(state.pin_state(), PinState::SquareWave(SquareWave::Hz1));

        // disabling an alarm does not touch a running square wave
        state.alarm_disabled(Alarm::One);
        assert_eq!(state.square_wave(), SquareWave::Hz1);
    }

    #[test]
    fn test_alarms_synced() {
        let mut state = mirror();
        state.alarms_synced(armed_alarm1(), Alarm2::default(), Control::from(0x05));
        assert_eq!(state.pin_state(), PinState::AlarmInterrupt);
        assert_eq!(state.alarm1(), armed_alarm1());

        state.alarms_synced(Alarm1::default(), Alarm2::default(), Control::from(0x04));
        assert_eq!(state.pin_state(), PinState::DisabledHigh);

        state.alarms_synced(Alarm1::default(), Alarm2::default(), Control::from(0x10));
        assert_eq!(state.pin_state(), PinState::SquareWave(SquareWave::Hz4096));
    }

    #[test]
    fn test_ds1307_control_synced() {
        let mut state = mirror();
        state.ds1307_control_synced(Ds1307Control::from(0x13));
        assert_eq!(state.pin_state(), PinState::SquareWave(SquareWave::Hz32768));
        state.ds1307_control_synced(Ds1307Control::from(0x80));
        assert_eq!(state.pin_state(), PinState::DisabledHigh);
        state.ds1307_control_synced(Ds1307Control::from(0x00));
        assert_eq!(state.square_wave(), SquareWave::OffLow);
    }
}
