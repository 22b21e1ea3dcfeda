//! Sensor collaborator.
//!
//! Route handlers read live values through [`Sensors`] at the moment a reply
//! is built. [`Board`] maps the panel wiring (two active-low buttons and a
//! two-axis analog joystick) onto raw GPIO and ADC reads.

use std::time::Instant;

/// Joystick axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Panel push button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    A,
    B,
}

/// Live input readings. Calls are synchronous and must not block.
pub trait Sensors {
    /// Joystick position on `axis`, scaled to `0..=100`.
    fn read_axis(&self, axis: Axis) -> u8;

    fn is_pressed(&self, button: Button) -> bool;
}

pub const BUTTON_A_PIN: u8 = 5;
pub const BUTTON_B_PIN: u8 = 6;
pub const JOYSTICK_X_INPUT: u8 = 1;
pub const JOYSTICK_Y_INPUT: u8 = 0;

/// Full-scale reading of the 12-bit ADC.
pub const ADC_MAX: u16 = 4095;

/// Raw peripheral access.
pub trait Hardware {
    /// 12-bit conversion of ADC `input`.
    fn adc_read(&self, input: u8) -> u16;

    /// Logic level of GPIO `pin`.
    fn gpio_get(&self, pin: u8) -> bool;
}

/// Scales a raw ADC reading to `0..=100`. Readings above full scale clamp.
pub fn scale_adc(raw: u16) -> u8 {
    let raw = u32::from(raw.min(ADC_MAX));
    (raw * 100 / u32::from(ADC_MAX)) as u8
}

/// Panel wiring on top of raw hardware access.
#[derive(Debug, Clone)]
pub struct Board<H> {
    hardware: H,
}

impl<H: Hardware> Board<H> {
    pub fn new(hardware: H) -> Self {
        Self { hardware }
    }
}

impl<H: Hardware> Sensors for Board<H> {
    fn read_axis(&self, axis: Axis) -> u8 {
        let input = match axis {
            Axis::X => JOYSTICK_X_INPUT,
            Axis::Y => JOYSTICK_Y_INPUT,
        };
        scale_adc(self.hardware.adc_read(input))
    }

    fn is_pressed(&self, button: Button) -> bool {
        let pin = match button {
            Button::A => BUTTON_A_PIN,
            Button::B => BUTTON_B_PIN,
        };
        // pulled up, pressing shorts to ground
        !self.hardware.gpio_get(pin)
    }
}

/// Deterministic stand-in for the panel when running on a host.
///
/// The joystick sweeps both axes over a few seconds, out of phase; button A
/// reads pressed one second in four, button B one second in five.
#[derive(Debug, Clone)]
pub struct SimulatedHardware {
    started: Instant,
}

impl SimulatedHardware {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

impl Default for SimulatedHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl Hardware for SimulatedHardware {
    fn adc_read(&self, input: u8) -> u16 {
        const PERIOD_MS: u64 = 4000;
        let phase = (self.elapsed_ms() + u64::from(input) * PERIOD_MS / 4) % PERIOD_MS;
        // triangle wave over the full ADC range
        let half = PERIOD_MS / 2;
        let level = if phase < half { phase } else { PERIOD_MS - phase };
        (level * u64::from(ADC_MAX) / half) as u16
    }

    fn gpio_get(&self, pin: u8) -> bool {
        let seconds = self.elapsed_ms() / 1000;
        let pressed = match pin {
            BUTTON_A_PIN => seconds % 4 == 3,
            BUTTON_B_PIN => seconds % 5 == 4,
            _ => false,
        };
        !pressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct Pins {
        adc: [Cell<u16>; 2],
        low: Cell<Option<u8>>,
    }

    impl Hardware for Pins {
        fn adc_read(&self, input: u8) -> u16 {
            self.adc[input as usize].get()
        }

        fn gpio_get(&self, pin: u8) -> bool {
            self.low.get() != Some(pin)
        }
    }

    #[test]
    fn scale_adc_covers_full_range() {
        assert_eq!(scale_adc(0), 0);
        assert_eq!(scale_adc(ADC_MAX), 100);
        assert_eq!(scale_adc(2048), 50);
        assert_eq!(scale_adc(u16::MAX), 100);
    }

    #[test]
    fn board_maps_axes_to_adc_inputs() {
        let pins = Pins::default();
        pins.adc[JOYSTICK_X_INPUT as usize].set(ADC_MAX);
        pins.adc[JOYSTICK_Y_INPUT as usize].set(0);
        let board = Board::new(pins);

        assert_eq!(board.read_axis(Axis::X), 100);
        assert_eq!(board.read_axis(Axis::Y), 0);
    }

    #[test]
    fn buttons_are_active_low() {
        let pins = Pins::default();
        pins.low.set(Some(BUTTON_B_PIN));
        let board = Board::new(pins);

        assert!(!board.is_pressed(Button::A));
        assert!(board.is_pressed(Button::B));
    }

    #[test]
    fn simulated_readings_stay_in_range() {
        let board = Board::new(SimulatedHardware::new());
        assert!(board.read_axis(Axis::X) <= 100);
        assert!(board.read_axis(Axis::Y) <= 100);
    }
}
