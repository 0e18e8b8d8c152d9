//! Async driver session.
//!
//! Same operations and bus sequences as the blocking [`crate::Rtc`], over
//! `embedded-hal-async` traits. Only available with the `async` feature.
//!
//! # Example
//!
//! ```rust,ignore
//! use dsrtc::asynch::Rtc;
//! use dsrtc::{Config, SquareWave};
//!
//! let mut rtc = Rtc::new(i2c, Config::default());
//! rtc.set_square_wave(SquareWave::Hz1).await?;
//! let now = rtc.now().await?;
//! ```

use embedded_hal_async::i2c::I2c;

use crate::alarm::{Alarm, Alarm1, Alarm2};
use crate::datetime::{DateTime, RawDateTime};
use crate::registers::{
    interrupt_bits, Control, Ds1307Control, RegAddr, RegisterUpdate, Status, DS1307_CONTROL,
};
use crate::square_wave::SquareWave;
use crate::state::Mirror;
use crate::{
    decode_temperature, invalid_alarm, ram_register, require, Config, Error, MAX_RAM_LEN,
    OSCILLATOR_STOP_FLAG,
};

/// Async driver session.
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

    async fn read_registers(
        &mut self,
        register: u8,
        data: &mut [u8],
    ) -> Result<(), Error<I2C::Error>> {
        self.i2c
            .write_read(self.state.address, &[register], data)
            .await?;
        Ok(())
    }

    async fn write_registers(&mut self, data: &[u8]) -> Result<(), Error<I2C::Error>> {
        self.i2c.write(self.state.address, data).await?;
        Ok(())
    }

    async fn update_register(
        &mut self,
        register: u8,
        update: RegisterUpdate,
    ) -> Result<u8, Error<I2C::Error>> {
        let mut data = [0];
        self.read_registers(register, &mut data).await?;
        let value = update.apply(data[0]);
        debug!("register {:#x}: {:#x} -> {:#x}", register, data[0], value);
        self.write_registers(&[register, value]).await?;
        Ok(value)
    }

    /// Reads the time registers into the mirror.
    pub async fn refresh(&mut self) -> Result<(), Error<I2C::Error>> {
        let mut data = [0; 7];
        self.read_registers(RegAddr::Seconds as u8, &mut data)
            .await?;
        let datetime = RawDateTime::from(data)
            .into_datetime()
            .map_err(Error::<I2C::Error>::DateTime)?;
        self.state.datetime = datetime;
        Ok(())
    }

    /// Reads and returns the current time.
    pub async fn now(&mut self) -> Result<DateTime, Error<I2C::Error>> {
        self.refresh().await?;
        Ok(self.state.datetime)
    }

    /// See [`crate::Rtc::set_datetime`].
    pub async fn set_datetime(&mut self, datetime: &DateTime) -> Result<(), Error<I2C::Error>> {
        let raw: [u8; 7] = (&RawDateTime::from_datetime(datetime)).into();
        let mut data = [0; 8];
        data[0] = RegAddr::Seconds as u8;
        data[1..].copy_from_slice(&raw);
        self.write_registers(&data).await?;

        if self.state.model.has_status_register() {
            if self.state.clear_lost_power_on_set {
                self.clear_lost_power().await?;
            } else {
                self.write_registers(&[RegAddr::ControlStatus as u8])
                    .await?;
            }
        }
        self.state.datetime = *datetime;
        Ok(())
    }

    /// Reads the temperature sensor, in hundredths of a degree Celsius.
    pub async fn read_temperature(&mut self) -> Result<i16, Error<I2C::Error>> {
        require::<I2C::Error>(self.state.model.has_temperature())?;
        let mut data = [0; 2];
        self.read_registers(RegAddr::MSBTemp as u8, &mut data)
            .await?;
        let temperature = decode_temperature(data);
        self.state.temperature = temperature;
        Ok(temperature)
    }

    /// Programs and arms alarm 1. A `Disabled` mode disables the alarm.
    pub async fn set_alarm1(&mut self, alarm: &Alarm1) -> Result<(), Error<I2C::Error>> {
        require::<I2C::Error>(self.state.model.has_alarms())?;
        if !alarm.mode.is_enabled() {
            return self.disable_alarm(Alarm::One).await;
        }
        alarm.validate().map_err(invalid_alarm::<I2C::Error>)?;
        let mut data = [0; 5];
        data[0] = RegAddr::Alarm1Seconds as u8;
        data[1..].copy_from_slice(&alarm.registers());
        self.write_registers(&data).await?;
        self.update_register(
            RegAddr::Control as u8,
            RegisterUpdate::set(interrupt_bits(true, false)),
        )
        .await?;
        self.state.alarm1_set(*alarm);
        Ok(())
    }

    /// Programs and arms alarm 2. A `Disabled` mode disables the alarm.
    pub async fn set_alarm2(&mut self, alarm: &Alarm2) -> Result<(), Error<I2C::Error>> {
        require::<I2C::Error>(self.state.model.has_alarms())?;
        if !alarm.mode.is_enabled() {
            return self.disable_alarm(Alarm::Two).await;
        }
        alarm.validate().map_err(invalid_alarm::<I2C::Error>)?;
        let mut data = [0; 4];
        data[0] = RegAddr::Alarm2Minutes as u8;
        data[1..].copy_from_slice(&alarm.registers());
        self.write_registers(&data).await?;
        self.update_register(
            RegAddr::Control as u8,
            RegisterUpdate::set(interrupt_bits(false, true)),
        )
        .await?;
        self.state.alarm2_set(*alarm);
        Ok(())
    }

    /// Clears the slot's interrupt enable; INTCN and the other alarm are left as they are.
    pub async fn disable_alarm(&mut self, slot: Alarm) -> Result<(), Error<I2C::Error>> {
        require::<I2C::Error>(self.state.model.has_alarms())?;
        self.update_register(RegAddr::Control as u8, RegisterUpdate::clear(slot.bit()))
            .await?;
        self.state.alarm_disabled(slot);
        Ok(())
    }

    /// Clears the slot's triggered flag, releasing the INT pin.
    pub async fn clear_alarm_flag(&mut self, slot: Alarm) -> Result<(), Error<I2C::Error>> {
        require::<I2C::Error>(self.state.model.has_alarms())?;
        self.update_register(
            RegAddr::ControlStatus as u8,
            RegisterUpdate::clear(slot.bit()),
        )
        .await?;
        Ok(())
    }

    /// True if the slot's alarm has fired since its flag was last cleared.
    pub async fn alarm_triggered(&mut self, slot: Alarm) -> Result<bool, Error<I2C::Error>> {
        require::<I2C::Error>(self.state.model.has_alarms())?;
        let mut data = [0];
        self.read_registers(RegAddr::ControlStatus as u8, &mut data)
            .await?;
        let status = Status::from(data[0]);
        Ok(match slot {
            Alarm::One => status.alarm1_flag(),
            Alarm::Two => status.alarm2_flag(),
        })
    }

    /// See [`crate::Rtc::sync_alarms`].
    pub async fn sync_alarms(&mut self) -> Result<(), Error<I2C::Error>> {
        if !self.state.model.has_alarms() {
            let mut data = [0];
            self.read_registers(DS1307_CONTROL, &mut data).await?;
            self.state
                .ds1307_control_synced(Ds1307Control::from(data[0]));
            return Ok(());
        }
        let mut data = [0; 8];
        self.read_registers(RegAddr::Alarm1Seconds as u8, &mut data)
            .await?;
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
    pub async fn set_square_wave(&mut self, mode: SquareWave) -> Result<(), Error<I2C::Error>> {
        let model = self.state.model;
        let update = mode.update(model);
        if update.is_none() {
            warn!("{:?} not available on {:?}", mode, model);
            return Err(Error::InvalidParameter);
        }
        self.update_register(model.square_wave_control(), update)
            .await?;
        self.state.square_wave_set(mode);
        Ok(())
    }

    /// True if the oscillator stopped since the flag was last cleared.
    pub async fn lost_power(&mut self) -> Result<bool, Error<I2C::Error>> {
        require::<I2C::Error>(self.state.model.has_status_register())?;
        let mut data = [0];
        self.read_registers(RegAddr::ControlStatus as u8, &mut data)
            .await?;
        Ok(Status::from(data[0]).oscillator_stop_flag())
    }

    /// Clears the oscillator-stop flag, keeping the alarm flags.
    pub async fn clear_lost_power(&mut self) -> Result<(), Error<I2C::Error>> {
        require::<I2C::Error>(self.state.model.has_status_register())?;
        self.update_register(
            RegAddr::ControlStatus as u8,
            RegisterUpdate::clear(OSCILLATOR_STOP_FLAG),
        )
        .await?;
        Ok(())
    }

    /// Reads RAM byte `address` (0 is the first byte of the RAM window).
    pub async fn read_ram(&mut self, address: u8) -> Result<u8, Error<I2C::Error>> {
        let mut data = [0];
        self.read_ram_slice(address, &mut data).await?;
        Ok(data[0])
    }

    /// Writes RAM byte `address` (0 is the first byte of the RAM window).
    pub async fn write_ram(&mut self, address: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        self.write_ram_slice(address, &[value]).await
    }

    /// Reads `data.len()` RAM bytes starting at `address` in one transfer.
    pub async fn read_ram_slice(
        &mut self,
        address: u8,
        data: &mut [u8],
    ) -> Result<(), Error<I2C::Error>> {
        let register = ram_register::<I2C::Error>(self.state.model, address, data.len())?;
        if data.is_empty() {
            return Ok(());
        }
        self.read_registers(register, data).await
    }

    /// Writes `data` to RAM starting at `address` in one transfer.
    pub async fn write_ram_slice(
        &mut self,
        address: u8,
        data: &[u8],
    ) -> Result<(), Error<I2C::Error>> {
        let register = ram_register::<I2C::Error>(self.state.model, address, data.len())?;
        if data.is_empty() {
            return Ok(());
        }
        let mut frame = [0; 1 + MAX_RAM_LEN];
        frame[0] = register;
        frame[1..=data.len()].copy_from_slice(data);
        self.write_registers(&frame[..=data.len()]).await
    }
}
