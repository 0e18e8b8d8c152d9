//! Platform-agnostic driver for the DS1307, DS3231 and DS3232 I2C real-time
//! clocks, built on `embedded-hal` 1.0.
//!
//! One [`Rtc`] session owns the bus handle and a [`state::Mirror`] of the
//! chip: the last time read, the alarms, the square-wave pin and the last
//! temperature reading. Every control and status change is a single
//! read-modify-write so bits owned by other features survive it.
//!
//! ```rust,ignore
//! use dsrtc::{Config, DateTime, Model, Rtc};
//! use dsrtc::alarm::{Alarm1, Alarm1Mode};
//!
//! let mut rtc = Rtc::new(i2c, Config { model: Model::Ds3231, ..Default::default() });
//! if rtc.lost_power()? {
//!     rtc.set_datetime(&DateTime::from_compiler_strings("Dec 26 2009", "12:34:56")?)?;
//! }
//! rtc.set_alarm1(&Alarm1 {
//!     mode: Alarm1Mode::FixedHourMinuteSecond,
//!     hour: 7,
//!     minute: 30,
//!     ..Default::default()
//! })?;
//! let now = rtc.now()?;
//! ```
//!
//! # Features
//!
//! - `async`: adds [`asynch::Rtc`] over `embedded-hal-async`
//! - `log` / `defmt`: debug logging through either backend
//! - `temperature_f32`: temperature in degrees as `f32`

#![no_std]

#[macro_use]
mod fmt;

use core::fmt as core_fmt;

use embedded_hal::i2c::I2c;

pub mod alarm;
pub mod bcd;
pub mod datetime;
pub mod registers;
pub mod square_wave;
pub mod state;

pub use alarm::{Alarm, Alarm1, Alarm1Mode, Alarm2, Alarm2Mode, AlarmError, AlarmMode};
pub use datetime::{DateTime, DateTimeError, TimeSpan, TimestampFormat};
pub use square_wave::{PinState, SquareWave};

use crate::datetime::RawDateTime;
use crate::registers::{
    interrupt_bits, Control, Ds1307Control, RegAddr, RegisterUpdate, Status, Temperature,
    TemperatureFraction, DS1307_CONTROL,
};
use crate::state::Mirror;

/// Bus address all three chips answer on.
pub const DEFAULT_ADDRESS: u8 = 0x68;

/// Largest RAM window of the supported chips (DS3232).
const MAX_RAM_LEN: usize = 0xEC;

const OSCILLATOR_STOP_FLAG: u8 = 0x80;

/// Driver errors, generic over the bus error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Bus transfer failed
    I2c(E),
    /// The chip model has no such feature
    UnsupportedOperation,
    /// A mode or field the chip cannot represent
    InvalidParameter,
    /// RAM access outside the chip's RAM window
    RegionOutOfBounds,
    /// The chip returned a time that is not a valid calendar value
    DateTime(DateTimeError),
}

impl<E> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::I2c(e)
    }
}

impl<E: core_fmt::Debug> core_fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core_fmt::Formatter<'_>) -> core_fmt::Result {
        match self {
            Error::I2c(e) => write!(f, "I2C error: {e:?}"),
            Error::UnsupportedOperation => f.write_str("operation not supported by this chip"),
            Error::InvalidParameter => f.write_str("invalid parameter"),
            Error::RegionOutOfBounds => f.write_str("RAM access out of bounds"),
            Error::DateTime(e) => write!(f, "invalid time from device: {e}"),
        }
    }
}

fn invalid_alarm<E>(e: AlarmError) -> Error<E> {
    warn!("rejected alarm: {}", e);
    Error::InvalidParameter
}

/// Supported chips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Model {
    /// DS1307: calendar, square wave and 56 bytes of RAM
    Ds1307,
    /// DS3231: calendar, alarms, square wave, temperature
    #[default]
    Ds3231,
    /// DS3232: a DS3231 with 236 bytes of RAM
    Ds3232,
}

/// Battery-backed RAM window of a chip, in register addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RamWindow {
    /// Register address of RAM byte 0
    pub offset: u8,
    /// Number of bytes
    pub len: u8,
}

impl Model {
    /// True for chips with the two alarm slots.
    #[must_use]
    pub const fn has_alarms(self) -> bool {
        !matches!(self, Model::Ds1307)
    }

    /// True for chips with the temperature sensor.
    #[must_use]
    pub const fn has_temperature(self) -> bool {
        !matches!(self, Model::Ds1307)
    }

    /// True for chips with the status register at 0x0F (OSF, alarm flags).
    #[must_use]
    pub const fn has_status_register(self) -> bool {
        !matches!(self, Model::Ds1307)
    }

    /// The battery-backed RAM window, if the chip has one.
    #[must_use]
    pub const fn ram_window(self) -> Option<RamWindow> {
        match self {
            Model::Ds1307 => Some(RamWindow {
                offset: 0x08,
                len: 0x38,
            }),
            Model::Ds3231 => None,
            Model::Ds3232 => Some(RamWindow {
                offset: 0x14,
                len: 0xEC,
            }),
        }
    }

    /// Address of the register holding the square-wave bits.
    #[must_use]
    pub const fn square_wave_control(self) -> u8 {
        match self {
            Model::Ds1307 => DS1307_CONTROL,
            Model::Ds3231 | Model::Ds3232 => RegAddr::Control as u8,
        }
    }

    /// True if the chip can produce square-wave `mode`.
    #[must_use]
    pub const fn supports(self, mode: SquareWave) -> bool {
        !mode.update(self).is_none()
    }
}

/// Session configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Bus address, [`DEFAULT_ADDRESS`] unless strapped otherwise
    pub address: u8,
    /// Which chip is on the bus
    pub model: Model,
    /// Clear the oscillator-stop flag whenever the time is set. When false
    /// the status register is only addressed, leaving the flag as it was.
    pub clear_lost_power_on_set: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            address: DEFAULT_ADDRESS,
            model: Model::default(),
            clear_lost_power_on_set: false,
        }
    }
}

impl Config {
    /// Default configuration for `model`.
    #[must_use]
    pub fn for_model(model: Model) -> Self {
        Config {
            model,
            ..Default::default()
        }
    }
}

/// Centi-degrees from the two temperature registers.
fn decode_temperature(data: [u8; 2]) -> i16 {
    let degrees = Temperature::from(data[0]).temperature();
    let quarters = TemperatureFraction::from(data[1]).temperature_fraction();
    i16::from(degrees) * 100 + i16::from(quarters) * 25
}

/// Register address of RAM byte `address`, after checking that `len` bytes
/// starting there fit the window.
fn ram_register<E>(model: Model, address: u8, len: usize) -> Result<u8, Error<E>> {
    let Some(window) = model.ram_window() else {
        return Err(Error::UnsupportedOperation);
    };
    if address >= window.len || usize::from(address) + len > usize::from(window.len) {
        warn!("RAM access {} + {} outside window of {}", address, len, window.len);
        return Err(Error::RegionOutOfBounds);
    }
    Ok(window.offset + address)
}

fn require<E>(supported: bool) -> Result<(), Error<E>> {
    if supported {
        Ok(())
    } else {
        Err(Error::UnsupportedOperation)
    }
}

// Read-only views of the mirror, shared by the blocking and async sessions.
macro_rules! mirror_queries {
    () => {
        /// The cached device state.
        pub fn state(&self) -> &$crate::state::Mirror {
            &self.state
        }

        /// Bus address in use.
        pub fn address(&self) -> u8 {
            self.state.address
        }

        /// Changes the bus address used for all further transfers.
        pub fn set_address(&mut self, address: u8) {
            self.state.address = address;
        }

        /// Chip model this session drives.
        pub fn model(&self) -> $crate::Model {
            self.state.model
        }

        /// The calendar value from the last `refresh` or `set_datetime`.
        pub fn datetime(&self) -> $crate::datetime::DateTime {
            self.state.datetime()
        }

        /// Seconds of the cached time.
        pub fn second(&self) -> u8 {
            self.state.datetime().second()
        }

        /// Minutes of the cached time.
        pub fn minute(&self) -> u8 {
            self.state.datetime().minute()
        }

        /// Hours (0-23) of the cached time.
        pub fn hour(&self) -> u8 {
            self.state.datetime().hour()
        }

        /// Day of month of the cached time.
        pub fn day(&self) -> u8 {
            self.state.datetime().day()
        }

        /// Month (1-12) of the cached time.
        pub fn month(&self) -> u8 {
            self.state.datetime().month()
        }

        /// Full year of the cached time.
        pub fn year(&self) -> u16 {
            self.state.datetime().year()
        }

        /// 0 = Sunday.
        pub fn day_of_week(&self) -> u8 {
            self.state.datetime().day_of_week()
        }

        /// Last temperature read in centi-degrees Celsius, or
        /// `state::TEMPERATURE_UNREAD`.
        pub fn temperature(&self) -> i16 {
            self.state.temperature()
        }

        /// Last temperature read in degrees Celsius.
        #[cfg(feature = "temperature_f32")]
        pub fn temperature_celsius(&self) -> Option<f32> {
            match self.state.temperature() {
                $crate::state::TEMPERATURE_UNREAD => None,
                centi => Some(f32::from(centi) / 100.0),
            }
        }

        /// Alarm 1 as last set or synced.
        pub fn alarm1(&self) -> $crate::alarm::Alarm1 {
            self.state.alarm1()
        }

        /// Alarm 2 as last set or synced.
        pub fn alarm2(&self) -> $crate::alarm::Alarm2 {
            self.state.alarm2()
        }

        /// Trigger mode of `slot`.
        pub fn alarm_mode(&self, slot: $crate::alarm::Alarm) -> $crate::alarm::AlarmMode {
            self.state.alarm_mode(slot)
        }

        /// Alarm second of `slot`; always 0 for alarm 2.
        pub fn alarm_second(&self, slot: $crate::alarm::Alarm) -> u8 {
            self.state.alarm_second(slot)
        }

        /// Alarm minute of `slot`.
        pub fn alarm_minute(&self, slot: $crate::alarm::Alarm) -> u8 {
            self.state.alarm_minute(slot)
        }

        /// Alarm hour of `slot`.
        pub fn alarm_hour(&self, slot: $crate::alarm::Alarm) -> u8 {
            self.state.alarm_hour(slot)
        }

        /// Alarm date or weekday of `slot`.
        pub fn alarm_day(&self, slot: $crate::alarm::Alarm) -> u8 {
            self.state.alarm_day(slot)
        }

        /// What the shared output pin is doing.
        pub fn pin_state(&self) -> $crate::square_wave::PinState {
            self.state.pin_state()
        }

        /// Current square-wave mode; alarm interrupt mode reports `OffHigh`.
        pub fn square_wave(&self) -> $crate::square_wave::SquareWave {
            self.state.square_wave()
        }
    };
}

#[cfg(feature = "async")]
pub mod asynch;

/// Blocking driver session.
///
/// Nothing is retried; a failed operation leaves the mirror as it was and
/// [`Rtc::refresh`] / [`Rtc::sync_alarms`] bring it back in line with the chip.
pub struct Rtc<I2C> {
    i2c: I2C,
    state: Mirror,
}

impl<I2C: I2c> Rtc<I2C> {
    /// Starts a session on `i2c`. Nothing is read from the chip until the first operation.
    pub fn new(i2c: I2C, config: Config) -> Self {
        Self {
            i2c,
            state: Mirror::new(&config),
        }
    }

    /// Ends the session and hands back the bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    mirror_queries!();

    fn read_registers(&mut self, register: u8, data: &mut [u8]) -> Result<(), Error<I2C::Error>> {
        self.i2c.write_read(self.state.address, &[register], data)?;
        Ok(())
    }

    fn write_registers(&mut self, data: &[u8]) -> Result<(), Error<I2C::Error>> {
        self.i2c.write(self.state.address, data)?;
        Ok(())
    }

    /// Reads `register`, applies `update` and writes the result back.
    fn update_register(
        &mut self,
        register: u8,
        update: RegisterUpdate,
    ) -> Result<u8, Error<I2C::Error>> {
        let mut data = [0];
        self.read_registers(register, &mut data)?;
        let value = update.apply(data[0]);
        debug!("register {:#x}: {:#x} -> {:#x}", register, data[0], value);
        self.write_registers(&[register, value])?;
        Ok(value)
    }

    /// Reads the time registers into the mirror.
    pub fn refresh(&mut self) -> Result<(), Error<I2C::Error>> {
        let mut data = [0; 7];
        self.read_registers(RegAddr::Seconds as u8, &mut data)?;
        let datetime = RawDateTime::from(data)
            .into_datetime()
            .map_err(Error::<I2C::Error>::DateTime)?;
        self.state.datetime = datetime;
        Ok(())
    }

    /// Reads and returns the current time.
    pub fn now(&mut self) -> Result<DateTime, Error<I2C::Error>> {
        self.refresh()?;
        Ok(self.state.datetime)
    }

    /// Writes the time registers in one transfer (24-hour format, which also
    /// starts a halted DS1307 oscillator). On chips with a status register
    /// the oscillator-stop flag is then cleared or left alone according to
    /// [`Config::clear_lost_power_on_set`].
    pub fn set_datetime(&mut self, datetime: &DateTime) -> Result<(), Error<I2C::Error>> {
        let raw: [u8; 7] = (&RawDateTime::from_datetime(datetime)).into();
        let mut data = [0; 8];
        data[0] = RegAddr::Seconds as u8;
        data[1..].copy_from_slice(&raw);
        self.write_registers(&data)?;

        if self.state.model.has_status_register() {
            if self.state.clear_lost_power_on_set {
                self.clear_lost_power()?;
            } else {
                self.write_registers(&[RegAddr::ControlStatus as u8])?;
            }
        }
        self.state.datetime = *datetime;
        Ok(())
    }

    /// Reads the temperature sensor, in hundredths of a degree Celsius.
    pub fn read_temperature(&mut self) -> Result<i16, Error<I2C::Error>> {
        require::<I2C::Error>(self.state.model.has_temperature())?;
        let mut data = [0; 2];
        self.read_registers(RegAddr::MSBTemp as u8, &mut data)?;
        let temperature = decode_temperature(data);
        debug!("temperature: {} centi-degrees", temperature);
        self.state.temperature = temperature;
        Ok(temperature)
    }

    /// Programs and arms alarm 1. A `Disabled` mode disables the alarm.
    pub fn set_alarm1(&mut self, alarm: &Alarm1) -> Result<(), Error<I2C::Error>> {
        require::<I2C::Error>(self.state.model.has_alarms())?;
        if !alarm.mode.is_enabled() {
            return self.disable_alarm(Alarm::One);
        }
        alarm.validate().map_err(invalid_alarm::<I2C::Error>)?;
        let registers = alarm.registers();
        let mut data = [0; 5];
        data[0] = RegAddr::Alarm1Seconds as u8;
        data[1..].copy_from_slice(&registers);
        self.write_registers(&data)?;
        self.update_register(
            RegAddr::Control as u8,
            RegisterUpdate::set(interrupt_bits(true, false)),
        )?;
        self.state.alarm1_set(*alarm);
        Ok(())
    }

    /// Programs and arms alarm 2. A `Disabled` mode disables the alarm.
    pub fn set_alarm2(&mut self, alarm: &Alarm2) -> Result<(), Error<I2C::Error>> {
        require::<I2C::Error>(self.state.model.has_alarms())?;
        if !alarm.mode.is_enabled() {
            return self.disable_alarm(Alarm::Two);
        }
        alarm.validate().map_err(invalid_alarm::<I2C::Error>)?;
        let registers = alarm.registers();
        let mut data = [0; 4];
        data[0] = RegAddr::Alarm2Minutes as u8;
        data[1..].copy_from_slice(&registers);
        self.write_registers(&data)?;
        self.update_register(
            RegAddr::Control as u8,
            RegisterUpdate::set(interrupt_bits(false, true)),
        )?;
        self.state.alarm2_set(*alarm);
        Ok(())
    }

    /// Clears the slot's interrupt enable; INTCN and the other alarm are
    /// left as they are.
    pub fn disable_alarm(&mut self, slot: Alarm) -> Result<(), Error<I2C::Error>> {
        require::<I2C::Error>(self.state.model.has_alarms())?;
        self.update_register(RegAddr::Control as u8, RegisterUpdate::clear(slot.bit()))?;
        self.state.alarm_disabled(slot);
        Ok(())
    }

    /// Clears the slot's triggered flag, releasing the INT pin.
    pub fn clear_alarm_flag(&mut self, slot: Alarm) -> Result<(), Error<I2C::Error>> {
        require::<I2C::Error>(self.state.model.has_alarms())?;
        self.update_register(
            RegAddr::ControlStatus as u8,
            RegisterUpdate::clear(slot.bit()),
        )?;
        Ok(())
    }

    /// True if the slot's alarm has fired since its flag was last cleared.
    pub fn alarm_triggered(&mut self, slot: Alarm) -> Result<bool, Error<I2C::Error>> {
        require::<I2C::Error>(self.state.model.has_alarms())?;
        let mut data = [0];
        self.read_registers(RegAddr::ControlStatus as u8, &mut data)?;
        let status = Status::from(data[0]);
        Ok(match slot {
            Alarm::One => status.alarm1_flag(),
            Alarm::Two => status.alarm2_flag(),
        })
    }

    /// Rebuilds the alarm mirrors and pin state from the chip. On the DS1307
    /// only the pin state is read back.
    pub fn sync_alarms(&mut self) -> Result<(), Error<I2C::Error>> {
        if !self.state.model.has_alarms() {
            let mut data = [0];
            self.read_registers(DS1307_CONTROL, &mut data)?;
            self.state.ds1307_control_synced(Ds1307Control::from(data[0]));
            return Ok(());
        }
        let mut data = [0; 8];
        self.read_registers(RegAddr::Alarm1Seconds as u8, &mut data)?;
        let control = Control::from(data[7]);
        let alarm1 = Alarm1::from_registers(
            [data[0], data[1], data[2], data[3]],
            control.alarm1_interrupt_enable(),
        )
        .map_err(invalid_alarm::<I2C::Error>)?;
        let alarm2 = Alarm2::from_registers(
            [data[4], data[5], data[6]],
            control.alarm2_interrupt_enable(),
        )
        .map_err(invalid_alarm::<I2C::Error>)?;
        self.state.alarms_synced(alarm1, alarm2, control);
        Ok(())
    }

    /// Switches the output pin to `mode`, disabling both alarms.
    pub fn set_square_wave(&mut self, mode: SquareWave) -> Result<(), Error<I2C::Error>> {
        let model = self.state.model;
        let update = mode.update(model);
        if update.is_none() {
            warn!("{:?} not available on {:?}", mode, model);
            return Err(Error::InvalidParameter);
        }
        self.update_register(model.square_wave_control(), update)?;
        self.state.square_wave_set(mode);
        Ok(())
    }

    /// True if the oscillator stopped since the flag was last cleared.
    pub fn lost_power(&mut self) -> Result<bool, Error<I2C::Error>> {
        require::<I2C::Error>(self.state.model.has_status_register())?;
        let mut data = [0];
        self.read_registers(RegAddr::ControlStatus as u8, &mut data)?;
        Ok(Status::from(data[0]).oscillator_stop_flag())
    }

    /// Clears the oscillator-stop flag, keeping the alarm flags.
    pub fn clear_lost_power(&mut self) -> Result<(), Error<I2C::Error>> {
        require::<I2C::Error>(self.state.model.has_status_register())?;
        self.update_register(
            RegAddr::ControlStatus as u8,
            RegisterUpdate::clear(OSCILLATOR_STOP_FLAG),
        )?;
        Ok(())
    }

    /// Reads RAM byte `address` (0 is the first byte of the RAM window).
    pub fn read_ram(&mut self, address: u8) -> Result<u8, Error<I2C::Error>> {
        let mut data = [0];
        self.read_ram_slice(address, &mut data)?;
        Ok(data[0])
    }

    /// Writes RAM byte `address` (0 is the first byte of the RAM window).
    pub fn write_ram(&mut self, address: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        self.write_ram_slice(address, &[value])
    }

    /// Reads `data.len()` RAM bytes starting at `address` in one transfer.
    pub fn read_ram_slice(&mut self, address: u8, data: &mut [u8]) -> Result<(), Error<I2C::Error>> {
        let register = ram_register::<I2C::Error>(self.state.model, address, data.len())?;
        if data.is_empty() {
            return Ok(());
        }
        self.read_registers(register, data)
    }

    /// Writes `data` to RAM starting at `address` in one transfer.
    pub fn write_ram_slice(&mut self, address: u8, data: &[u8]) -> Result<(), Error<I2C::Error>> {
        let register = ram_register::<I2C::Error>(self.state.model, address, data.len())?;
        if data.is_empty() {
            return Ok(());
        }
        let mut frame = [0; 1 + MAX_RAM_LEN];
        frame[0] = register;
        frame[1..=data.len()].copy_from_slice(data);
        self.write_registers(&frame[..=data.len()])
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;
    use super::*;
    use crate::alarm::{Alarm1Mode, Alarm2Mode};
    use alloc::vec;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};

    const ADDR: u8 = DEFAULT_ADDRESS;

    fn setup(model: Model, expectations: &[I2cTrans]) -> Rtc<I2cMock> {
        Rtc::new(I2cMock::new(expectations), Config::for_model(model))
    }

    fn finish(rtc: Rtc<I2cMock>) {
        let mut i2c = rtc.release();
        i2c.done();
    }

    fn morning_alarm() -> Alarm1 {
        Alarm1 {
            mode: Alarm1Mode::FixedHourMinuteSecond,
            second: 0,
            minute: 30,
            hour: 7,
            day: 0,
        }
    }

    fn morning_alarm_transactions(control_before: u8) -> [I2cTrans; 3] {
        [
            I2cTrans::write(ADDR, vec![0x07, 0x00, 0x30, 0x07, 0x80]),
            I2cTrans::write_read(ADDR, vec![0x0E], vec![control_before]),
            I2cTrans::write(ADDR, vec![0x0E, control_before | 0x05]),
        ]
    }

    #[test]
    fn test_refresh_and_accessors() {
        let mut rtc = setup(
            Model::Ds3231,
            &[I2cTrans::write_read(
                ADDR,
                vec![0x00],
                vec![0x30, 0x45, 0x13, 0x05, 0x15, 0x03, 0x24],
            )],
        );
        let now = rtc.now().unwrap();
        assert_eq!(now.unix_timestamp(), 1_710_510_330);
        assert_eq!(rtc.year(), 2024);
        assert_eq!(rtc.month(), 3);
        assert_eq!(rtc.day(), 15);
        assert_eq!(rtc.hour(), 13);
        assert_eq!(rtc.minute(), 45);
        assert_eq!(rtc.second(), 30);
        assert_eq!(rtc.day_of_week(), 5);
        finish(rtc);
    }

    #[test]
    fn test_refresh_invalid_time_leaves_mirror() {
        let mut rtc = setup(
            Model::Ds3231,
            &[I2cTrans::write_read(
                ADDR,
                vec![0x00],
                vec![0x00, 0x00, 0x00, 0x00, 0x31, 0x02, 0x24],
            )],
        );
        assert_eq!(
            rtc.refresh(),
            Err(Error::DateTime(DateTimeError::InvalidDateTime))
        );
        assert_eq!(rtc.datetime(), DateTime::default());
        finish(rtc);
    }

    #[test]
    fn test_set_datetime_touches_status() {
        let datetime = DateTime::new(2024, 3, 15, 13, 45, 30).unwrap();
        let mut rtc = setup(
            Model::Ds3231,
            &[
                I2cTrans::write(ADDR, vec![0x00, 0x30, 0x45, 0x13, 0x00, 0x15, 0x03, 0x24]),
                I2cTrans::write(ADDR, vec![0x0F]),
            ],
        );
        rtc.set_datetime(&datetime).unwrap();
        assert_eq!(rtc.datetime(), datetime);
        finish(rtc);
    }

    #[test]
    fn test_set_datetime_clears_lost_power_when_configured() {
        let datetime = DateTime::new(2024, 3, 15, 13, 45, 30).unwrap();
        let config = Config {
            clear_lost_power_on_set: true,
            ..Config::for_model(Model::Ds3232)
        };
        let mut rtc = Rtc::new(
            I2cMock::new(&[
                I2cTrans::write(ADDR, vec![0x00, 0x30, 0x45, 0x13, 0x00, 0x15, 0x03, 0x24]),
                I2cTrans::write_read(ADDR, vec![0x0F], vec![0x88]),
                I2cTrans::write(ADDR, vec![0x0F, 0x08]),
            ]),
            config,
        );
        rtc.set_datetime(&datetime).unwrap();
        finish(rtc);
    }

    #[test]
    fn test_set_datetime_ds1307() {
        let datetime = DateTime::new(2009, 12, 26, 12, 34, 56).unwrap();
        let mut rtc = setup(
            Model::Ds1307,
            &[I2cTrans::write(
                ADDR,
                vec![0x00, 0x56, 0x34, 0x12, 0x00, 0x26, 0x12, 0x09],
            )],
        );
        rtc.set_datetime(&datetime).unwrap();
        finish(rtc);
    }

    #[test]
    fn test_set_datetime_status_failure_leaves_mirror() {
        let datetime = DateTime::new(2024, 3, 15, 13, 45, 30).unwrap();
        let mut rtc = setup(
            Model::Ds3231,
            &[
                I2cTrans::write(ADDR, vec![0x00, 0x30, 0x45, 0x13, 0x00, 0x15, 0x03, 0x24]),
                I2cTrans::write(ADDR, vec![0x0F]).with_error(ErrorKind::Other),
            ],
        );
        assert_eq!(
            rtc.set_datetime(&datetime),
            Err(Error::I2c(ErrorKind::Other))
        );
        assert_eq!(rtc.datetime(), DateTime::default());
        finish(rtc);
    }

    #[test]
    fn test_set_alarm1_fixed_time() {
        let mut rtc = setup(Model::Ds3231, &morning_alarm_transactions(0x02));
        rtc.set_alarm1(&morning_alarm()).unwrap();
        assert_eq!(
            rtc.alarm_mode(Alarm::One),
            AlarmMode::One(Alarm1Mode::FixedHourMinuteSecond)
        );
        assert_eq!(rtc.alarm_hour(Alarm::One), 7);
        assert_eq!(rtc.alarm_minute(Alarm::One), 30);
        assert_eq!(rtc.pin_state(), PinState::AlarmInterrupt);
        assert_eq!(rtc.square_wave(), SquareWave::OffHigh);
        finish(rtc);
    }

    #[test]
    fn test_set_alarm2() {
        let alarm = Alarm2 {
            mode: Alarm2Mode::FixedWeekdayHourMinute,
            minute: 0,
            hour: 18,
            day: 6,
        };
        let mut rtc = setup(
            Model::Ds3232,
            &[
                I2cTrans::write(ADDR, vec![0x0B, 0x00, 0x18, 0x46]),
                I2cTrans::write_read(ADDR, vec![0x0E], vec![0x1C]),
                I2cTrans::write(ADDR, vec![0x0E, 0x1E]),
            ],
        );
        rtc.set_alarm2(&alarm).unwrap();
        assert_eq!(rtc.alarm2(), alarm);
        assert_eq!(rtc.alarm_second(Alarm::Two), 0);
        assert_eq!(rtc.alarm_day(Alarm::Two), 6);
        finish(rtc);
    }

    #[test]
    fn test_set_alarm_disabled_mode_disables() {
        let mut rtc = setup(
            Model::Ds3231,
            &[
                I2cTrans::write_read(ADDR, vec![0x0E], vec![0x07]),
                I2cTrans::write(ADDR, vec![0x0E, 0x06]),
            ],
        );
        rtc.set_alarm1(&Alarm1::default()).unwrap();
        finish(rtc);
    }

    #[test]
    fn test_disabled_alarm_skips_field_validation() {
        let mut rtc = setup(
            Model::Ds3231,
            &[
                I2cTrans::write_read(ADDR, vec![0x0E], vec![0x07]),
                I2cTrans::write(ADDR, vec![0x0E, 0x05]),
            ],
        );
        let leftover = Alarm2 {
            mode: Alarm2Mode::Disabled,
            minute: 75,
            hour: 30,
            day: 0,
        };
        rtc.set_alarm2(&leftover).unwrap();
        assert_eq!(rtc.alarm_mode(Alarm::Two), AlarmMode::Two(Alarm2Mode::Disabled));
        finish(rtc);
    }

    #[test]
    fn test_invalid_alarm_rejected_without_traffic() {
        let mut rtc = setup(Model::Ds3231, &[]);
        let alarm = Alarm1 {
            hour: 24,
            ..morning_alarm()
        };
        assert_eq!(rtc.set_alarm1(&alarm), Err(Error::InvalidParameter));
        assert_eq!(rtc.alarm1(), Alarm1::default());
        finish(rtc);
    }

    #[test]
    fn test_disable_alarm1_preserves_alarm2_and_intcn() {
        let mut rtc = setup(
            Model::Ds3231,
            &[
                I2cTrans::write_read(ADDR, vec![0x0E], vec![0x07]),
                I2cTrans::write(ADDR, vec![0x0E, 0x06]),
            ],
        );
        rtc.disable_alarm(Alarm::One).unwrap();
        assert_eq!(rtc.alarm_mode(Alarm::One), AlarmMode::One(Alarm1Mode::Disabled));
        finish(rtc);
    }

    #[test]
    fn test_disable_alarm2() {
        let mut rtc = setup(
            Model::Ds3231,
            &[
                I2cTrans::write_read(ADDR, vec![0x0E], vec![0x07]),
                I2cTrans::write(ADDR, vec![0x0E, 0x05]),
            ],
        );
        rtc.disable_alarm(Alarm::Two).unwrap();
        finish(rtc);
    }

    #[test]
    fn test_disable_last_alarm_releases_pin() {
        let mut expectations = vec![];
        expectations.extend_from_slice(&morning_alarm_transactions(0x00));
        expectations.push(I2cTrans::write_read(ADDR, vec![0x0E], vec![0x05]));
        expectations.push(I2cTrans::write(ADDR, vec![0x0E, 0x04]));
        let mut rtc = setup(Model::Ds3231, &expectations);
        rtc.set_alarm1(&morning_alarm()).unwrap();
        rtc.disable_alarm(Alarm::One).unwrap();
        assert_eq!(rtc.pin_state(), PinState::DisabledHigh);
        finish(rtc);
    }

    #[test]
    fn test_square_wave_after_alarm_disables_alarms() {
        let mut expectations = vec![];
        expectations.extend_from_slice(&morning_alarm_transactions(0x02));
        expectations.push(I2cTrans::write_read(ADDR, vec![0x0E], vec![0x07]));
        expectations.push(I2cTrans::write(ADDR, vec![0x0E, 0x00]));
        let mut rtc = setup(Model::Ds3231, &expectations);
        rtc.set_alarm1(&morning_alarm()).unwrap();
        rtc.set_square_wave(SquareWave::Hz1).unwrap();
        assert_eq!(rtc.alarm_mode(Alarm::One), AlarmMode::One(Alarm1Mode::Disabled));
        assert_eq!(rtc.alarm_mode(Alarm::Two), AlarmMode::Two(Alarm2Mode::Disabled));
        assert_eq!(rtc.square_wave(), SquareWave::Hz1);
        finish(rtc);
    }

    #[test]
    fn test_square_wave_ds1307() {
        let mut rtc = setup(
            Model::Ds1307,
            &[
                I2cTrans::write_read(ADDR, vec![0x07], vec![0x80]),
                I2cTrans::write(ADDR, vec![0x07, 0x13]),
            ],
        );
        rtc.set_square_wave(SquareWave::Hz32768).unwrap();
        assert_eq!(rtc.pin_state(), PinState::SquareWave(SquareWave::Hz32768));
        finish(rtc);
    }

    #[test]
    fn test_unsupported_square_wave_no_traffic() {
        let mut rtc = setup(Model::Ds3231, &[]);
        assert_eq!(
            rtc.set_square_wave(SquareWave::Hz32768),
            Err(Error::InvalidParameter)
        );
        assert_eq!(rtc.set_square_wave(SquareWave::OffLow), Err(Error::InvalidParameter));
        assert_eq!(rtc.square_wave(), SquareWave::OffHigh);
        finish(rtc);

        let mut rtc = setup(Model::Ds1307, &[]);
        assert_eq!(rtc.set_square_wave(SquareWave::Hz1024), Err(Error::InvalidParameter));
        finish(rtc);
    }

    #[test]
    fn test_lost_power() {
        let mut rtc = setup(
            Model::Ds3231,
            &[
                I2cTrans::write_read(ADDR, vec![0x0F], vec![0x80]),
                I2cTrans::write_read(ADDR, vec![0x0F], vec![0x88]),
                I2cTrans::write(ADDR, vec![0x0F, 0x08]),
                I2cTrans::write_read(ADDR, vec![0x0F], vec![0x08]),
            ],
        );
        assert!(rtc.lost_power().unwrap());
        rtc.clear_lost_power().unwrap();
        assert!(!rtc.lost_power().unwrap());
        finish(rtc);
    }

    #[test]
    fn test_alarm_flags() {
        let mut rtc = setup(
            Model::Ds3231,
            &[
                I2cTrans::write_read(ADDR, vec![0x0F], vec![0x01]),
                I2cTrans::write_read(ADDR, vec![0x0F], vec![0x01]),
                I2cTrans::write_read(ADDR, vec![0x0F], vec![0x83]),
                I2cTrans::write(ADDR, vec![0x0F, 0x81]),
            ],
        );
        assert!(rtc.alarm_triggered(Alarm::One).unwrap());
        assert!(!rtc.alarm_triggered(Alarm::Two).unwrap());
        rtc.clear_alarm_flag(Alarm::Two).unwrap();
        finish(rtc);
    }

    #[test]
    fn test_ds1307_unsupported_operations() {
        let mut rtc = setup(Model::Ds1307, &[]);
        assert_eq!(rtc.lost_power(), Err(Error::UnsupportedOperation));
        assert_eq!(rtc.clear_lost_power(), Err(Error::UnsupportedOperation));
        assert_eq!(rtc.read_temperature(), Err(Error::UnsupportedOperation));
        assert_eq!(rtc.set_alarm1(&morning_alarm()), Err(Error::UnsupportedOperation));
        assert_eq!(
            rtc.disable_alarm(Alarm::Two),
            Err(Error::UnsupportedOperation)
        );
        assert_eq!(
            rtc.alarm_triggered(Alarm::One),
            Err(Error::UnsupportedOperation)
        );
        finish(rtc);
    }

    #[test]
    fn test_read_temperature() {
        let mut rtc = setup(
            Model::Ds3231,
            &[
                I2cTrans::write_read(ADDR, vec![0x11], vec![0x19, 0x40]),
                I2cTrans::write_read(ADDR, vec![0x11], vec![0xFF, 0xC0]),
            ],
        );
        assert_eq!(rtc.temperature(), state::TEMPERATURE_UNREAD);
        assert_eq!(rtc.read_temperature().unwrap(), 2525);
        assert_eq!(rtc.temperature(), 2525);
        assert_eq!(rtc.read_temperature().unwrap(), -25);
        finish(rtc);
    }

    #[cfg(feature = "temperature_f32")]
    #[test]
    fn test_temperature_celsius() {
        let mut rtc = setup(
            Model::Ds3231,
            &[I2cTrans::write_read(ADDR, vec![0x11], vec![0x19, 0x40])],
        );
        assert_eq!(rtc.temperature_celsius(), None);
        rtc.read_temperature().unwrap();
        assert_eq!(rtc.temperature_celsius(), Some(25.25));
        finish(rtc);
    }

    #[test]
    fn test_sync_alarms() {
        let mut rtc = setup(
            Model::Ds3231,
            &[I2cTrans::write_read(
                ADDR,
                vec![0x07],
                vec![0x00, 0x30, 0x07, 0x80, 0x80, 0x80, 0x80, 0x05],
            )],
        );
        rtc.sync_alarms().unwrap();
        assert_eq!(rtc.alarm1(), morning_alarm());
        assert_eq!(rtc.alarm2().mode, Alarm2Mode::Disabled);
        assert_eq!(rtc.pin_state(), PinState::AlarmInterrupt);
        finish(rtc);
    }

    #[test]
    fn test_sync_alarms_invalid_masks() {
        let mut rtc = setup(
            Model::Ds3231,
            &[I2cTrans::write_read(
                ADDR,
                vec![0x07],
                vec![0x80, 0x00, 0x80, 0x80, 0x00, 0x00, 0x00, 0x05],
            )],
        );
        assert_eq!(rtc.sync_alarms(), Err(Error::InvalidParameter));
        assert_eq!(rtc.pin_state(), PinState::DisabledHigh);
        finish(rtc);
    }

    #[test]
    fn test_sync_alarms_ds1307_reads_control() {
        let mut rtc = setup(
            Model::Ds1307,
            &[I2cTrans::write_read(ADDR, vec![0x07], vec![0x00])],
        );
        rtc.sync_alarms().unwrap();
        assert_eq!(rtc.pin_state(), PinState::DisabledLow);
        finish(rtc);
    }

    #[test]
    fn test_ram_ds1307() {
        let mut rtc = setup(
            Model::Ds1307,
            &[
                I2cTrans::write_read(ADDR, vec![0x3F], vec![0xAB]),
                I2cTrans::write(ADDR, vec![0x08, 0x42]),
                I2cTrans::write_read(ADDR, vec![0x10], vec![1, 2, 3]),
            ],
        );
        assert_eq!(rtc.read_ram(0x37).unwrap(), 0xAB);
        rtc.write_ram(0x00, 0x42).unwrap();
        let mut buffer = [0; 3];
        rtc.read_ram_slice(0x08, &mut buffer).unwrap();
        assert_eq!(buffer, [1, 2, 3]);

        assert_eq!(rtc.read_ram(0x38), Err(Error::RegionOutOfBounds));
        assert_eq!(
            rtc.write_ram_slice(0x36, &[0, 0, 0]),
            Err(Error::RegionOutOfBounds)
        );
        finish(rtc);
    }

    #[test]
    fn test_ram_ds3232() {
        let mut rtc = setup(
            Model::Ds3232,
            &[I2cTrans::write(ADDR, vec![0xFE, 0x01, 0x02])],
        );
        rtc.write_ram_slice(0xEA, &[0x01, 0x02]).unwrap();
        assert_eq!(
            rtc.write_ram_slice(0xEB, &[0x01, 0x02]),
            Err(Error::RegionOutOfBounds)
        );
        assert_eq!(rtc.read_ram(0xEC), Err(Error::RegionOutOfBounds));
        // empty access inside the window is a no-op
        rtc.write_ram_slice(0x00, &[]).unwrap();
        finish(rtc);
    }

    #[test]
    fn test_ram_full_window_write() {
        let data = [0x5A; 0xEC];
        let mut frame = vec![0x14];
        frame.extend_from_slice(&data);
        let mut rtc = setup(Model::Ds3232, &[I2cTrans::write(ADDR, frame)]);
        rtc.write_ram_slice(0, &data).unwrap();
        finish(rtc);
    }

    #[test]
    fn test_ram_unsupported_on_ds3231() {
        let mut rtc = setup(Model::Ds3231, &[]);
        assert_eq!(rtc.read_ram(0), Err(Error::UnsupportedOperation));
        finish(rtc);
    }

    #[test]
    fn test_transport_error_propagates() {
        let mut rtc = setup(
            Model::Ds3231,
            &[
                I2cTrans::write(ADDR, vec![0x07, 0x00, 0x30, 0x07, 0x80]),
                I2cTrans::write_read(ADDR, vec![0x0E], vec![0x00]).with_error(ErrorKind::Other),
            ],
        );
        assert_eq!(
            rtc.set_alarm1(&morning_alarm()),
            Err(Error::I2c(ErrorKind::Other))
        );
        // mirror untouched
        assert_eq!(rtc.alarm1(), Alarm1::default());
        assert_eq!(rtc.pin_state(), PinState::DisabledHigh);
        finish(rtc);
    }

    #[test]
    fn test_set_address() {
        let mut rtc = setup(
            Model::Ds3231,
            &[I2cTrans::write_read(0x69, vec![0x0F], vec![0x00])],
        );
        rtc.set_address(0x69);
        assert_eq!(rtc.address(), 0x69);
        assert!(!rtc.lost_power().unwrap());
        finish(rtc);
    }

    #[test]
    fn test_model_capabilities() {
        assert!(!Model::Ds1307.has_alarms());
        assert!(Model::Ds3232.has_temperature());
        assert_eq!(Model::Ds3231.ram_window(), None);
        assert_eq!(
            Model::Ds1307.ram_window(),
            Some(RamWindow {
                offset: 0x08,
                len: 0x38
            })
        );
        assert!(Model::Ds1307.supports(SquareWave::OffLow));
        assert!(!Model::Ds3231.supports(SquareWave::OffLow));
        assert_eq!(Model::Ds1307.square_wave_control(), 0x07);
        assert_eq!(Model::Ds3232.square_wave_control(), 0x0E);
        assert_eq!(Config::default().address, 0x68);
        assert_eq!(Config::default().model, Model::Ds3231);
    }

    #[test]
    fn test_error_display() {
        use alloc::format;
        let e: Error<ErrorKind> = Error::RegionOutOfBounds;
        assert_eq!(format!("{e}"), "RAM access out of bounds");
        let e: Error<ErrorKind> = Error::DateTime(DateTimeError::YearOutOfRange);
        assert_eq!(format!("{e}"), "invalid time from device: year outside 2000-2099");
    }
}
