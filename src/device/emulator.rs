//! On-screen stand-in for the LED matrix.
//!
//! Each pixel is a pre-computed circle on an SDL window. The geometry lives
//! here unconditionally; the window itself needs the `emulator` feature.

use embedded_graphics::{pixelcolor::Rgb888, prelude::*, primitives::Circle};

pub const WINDOW_TITLE: &str = "LED Matrix Emulator - NTP Clock";
/// Border between the outermost LEDs and the window edge.
pub const PADDING: u32 = 4;

pub const OFF_COLOR: Rgb888 = Rgb888::new(0x2a, 0x2a, 0x2a);
pub const OUTLINE_COLOR: Rgb888 = Rgb888::new(0x1a, 0x1a, 0x1a);
pub const BACKGROUND_COLOR: Rgb888 = Rgb888::new(0x1a, 0x1a, 0x1a);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmulatorSettings {
    pub size: Size,
    /// Window pixels per LED.
    pub scale: u32,
    pub led_color: Rgb888,
}

impl Default for EmulatorSettings {
    fn default() -> Self {
        Self {
            size: Size::new(32, 8),
            scale: 15,
            led_color: Rgb888::RED,
        }
    }
}

impl EmulatorSettings {
    pub fn canvas_size(&self) -> Size {
        Size::new(
            self.size.width * self.scale + PADDING * 2,
            self.size.height * self.scale + PADDING * 2,
        )
    }
}

/// One circle per LED in row-major order.
pub fn led_grid(settings: &EmulatorSettings) -> Vec<Circle> {
    let scale = settings.scale as i32;
    let radius = (settings.scale / 2).saturating_sub(2);
    let padding = PADDING as i32;

    (0..settings.size.height as i32)
        .flat_map(|y| (0..settings.size.width as i32).map(move |x| (x, y)))
        .map(|(x, y)| {
            let center = Point::new(
                padding + x * scale + scale / 2,
                padding + y * scale + scale / 2,
            );
            Circle::with_center(center, radius * 2 + 1)
        })
        .collect()
}

/// Approximates brightness by scaling the red channel of the "on" color.
pub fn brightness_color(level: u8) -> Rgb888 {
    Rgb888::new(level, 0, 0)
}

#[cfg(feature = "emulator")]
pub use self::window::LedEmulator;

#[cfg(feature = "emulator")]
mod window {
    use embedded_graphics::{
        pixelcolor::Rgb888,
        prelude::*,
        primitives::{Circle, PrimitiveStyleBuilder},
    };
    use embedded_graphics_simulator::{
        OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window,
    };
    use log::{debug, info};

    use super::*;
    use crate::device::MatrixDevice;
    use crate::error::{Error, Result};
    use crate::frame::Frame;

    pub struct LedEmulator {
        size: Size,
        canvas: SimulatorDisplay<Rgb888>,
        window: Option<Window>,
        leds: Vec<Circle>,
        led_color: Rgb888,
    }

    impl LedEmulator {
        pub fn new(settings: &EmulatorSettings) -> Result<Self> {
            let mut canvas = SimulatorDisplay::new(settings.canvas_size());
            canvas.clear(BACKGROUND_COLOR)?;

            let output = OutputSettingsBuilder::new().scale(1).build();
            let mut window = Window::new(WINDOW_TITLE, &output);
            window.update(&canvas);
            debug!(
                "Emulator window {}x{} for a {}x{} matrix",
                settings.canvas_size().width,
                settings.canvas_size().height,
                settings.size.width,
                settings.size.height
            );

            Ok(Self {
                size: settings.size,
                canvas,
                window: Some(window),
                leds: led_grid(settings),
                led_color: settings.led_color,
            })
        }
    }

    impl MatrixDevice for LedEmulator {
        fn size(&self) -> Size {
            self.size
        }

        fn render(&mut self, frame: &Frame) -> Result<()> {
            let Some(window) = self.window.as_mut() else {
                return Err(Error::DeviceClosed);
            };

            let width = self.size.width;
            for (index, led) in self.leds.iter().enumerate() {
                let index = index as u32;
                let fill = if frame.is_lit(index % width, index / width) {
                    self.led_color
                } else {
                    OFF_COLOR
                };
                let style = PrimitiveStyleBuilder::new()
                    .fill_color(fill)
                    .stroke_color(OUTLINE_COLOR)
                    .stroke_width(1)
                    .build();
                led.into_styled(style).draw(&mut self.canvas)?;
            }
            window.update(&self.canvas);

            if window.events().any(|event| matches!(event, SimulatorEvent::Quit)) {
                info!("Emulator window closed");
                self.window = None;
            }
            Ok(())
        }

        fn set_brightness(&mut self, level: u8) -> Result<()> {
            self.led_color = brightness_color(level);
            Ok(())
        }

        fn release(&mut self) -> Result<()> {
            self.window = None;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use embedded_graphics::primitives::{ContainsPoint, Rectangle};

    use super::*;

    #[test]
    fn canvas_fits_grid_and_padding() {
        let settings = EmulatorSettings::default();
        assert_eq!(settings.canvas_size(), Size::new(32 * 15 + 8, 8 * 15 + 8));
    }

    #[test]
    fn one_led_per_pixel() {
        let settings = EmulatorSettings::default();
        let leds = led_grid(&settings);
        assert_eq!(leds.len(), 32 * 8);
        // radius 5 for scale 15, centered on the 15 px cell
        assert_eq!(leds[0].center(), Point::new(4 + 7, 4 + 7));
        assert_eq!(leds[0].diameter, 11);
        assert_eq!(leds[33].center(), Point::new(4 + 15 + 7, 4 + 15 + 7));
    }

    #[test]
    fn leds_stay_inside_the_canvas() {
        let settings = EmulatorSettings::default();
        let canvas = Rectangle::new(Point::zero(), settings.canvas_size());
        for led in led_grid(&settings) {
            let bounds = led.bounding_box();
            assert!(canvas.contains(bounds.top_left));
            assert!(bounds.bottom_right().is_some_and(|p| canvas.contains(p)));
        }
    }

    #[test]
    fn brightness_scales_red_channel() {
        assert_eq!(brightness_color(255), Rgb888::RED);
        assert_eq!(brightness_color(64), Rgb888::new(64, 0, 0));
        assert_eq!(brightness_color(0), Rgb888::BLACK);
    }
}
