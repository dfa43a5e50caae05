use core::convert::Infallible;

use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};

use crate::device::MatrixDevice;
use crate::error::{Error, Result};

/// Widest frame a bit-row can hold.
pub const MAX_WIDTH: u32 = u32::BITS;
/// Tallest frame supported (one MAX7219 module).
pub const MAX_HEIGHT: u32 = 8;

/// Monochrome frame buffer. Each row is a `u32` whose bit 31 is column 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    size: Size,
    rows: [u32; MAX_HEIGHT as usize],
}

impl Frame {
    /// Allocates a blank frame. Fails for sizes beyond 32x8.
    pub fn new(size: Size) -> Result<Self> {
        if size.width > MAX_WIDTH || size.height > MAX_HEIGHT {
            return Err(Error::FrameTooLarge {
                width: size.width,
                height: size.height,
            });
        }
        Ok(Self {
            size,
            rows: [0; MAX_HEIGHT as usize],
        })
    }

    pub fn is_lit(&self, x: u32, y: u32) -> bool {
        if x >= self.size.width || y >= self.size.height {
            return false;
        }
        self.rows[y as usize] & Self::mask(x) != 0
    }

    pub fn set(&mut self, x: u32, y: u32, lit: bool) {
        if x >= self.size.width || y >= self.size.height {
            return;
        }
        let row = &mut self.rows[y as usize];
        if lit {
            *row |= Self::mask(x);
        } else {
            *row &= !Self::mask(x);
        }
    }

    /// Bit-rows for the visible height, column 0 in the most significant bit.
    pub fn rows(&self) -> &[u32] {
        &self.rows[..self.size.height as usize]
    }

    pub fn lit_count(&self) -> u32 {
        self.rows().iter().map(|row| row.count_ones()).sum()
    }

    fn mask(x: u32) -> u32 {
        1 << (MAX_WIDTH - 1 - x)
    }
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        self.size
    }
}

impl DrawTarget for Frame {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> core::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            // negative coordinates fall off the left/top edge
            if let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) {
                self.set(x, y, color.is_on());
            }
        }
        Ok(())
    }
}

/// Runs `draw` against a blank frame sized to `device`, then pushes the frame.
///
/// The push happens only when `draw` returns `Ok`; a failed draw is propagated
/// and nothing reaches the device.
pub fn with_frame<D, F, R>(device: &mut D, draw: F) -> Result<R>
where
    D: MatrixDevice + ?Sized,
    F: FnOnce(&mut Frame) -> Result<R>,
{
    let mut frame = Frame::new(device.size())?;
    let out = draw(&mut frame)?;
    device.render(&frame)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingDevice {
        rendered: Vec<Frame>,
    }

    impl MatrixDevice for CountingDevice {
        fn size(&self) -> Size {
            Size::new(32, 8)
        }

        fn render(&mut self, frame: &Frame) -> Result<()> {
            self.rendered.push(frame.clone());
            Ok(())
        }

        fn set_brightness(&mut self, _level: u8) -> Result<()> {
            Ok(())
        }

        fn release(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn new_frame_is_blank() {
        let frame = Frame::new(Size::new(32, 8)).unwrap();
        assert_eq!(frame.lit_count(), 0);
        assert_eq!(frame.rows().len(), 8);
    }

    #[test]
    fn oversized_frames_are_rejected() {
        assert_eq!(
            Frame::new(Size::new(40, 8)),
            Err(Error::FrameTooLarge { width: 40, height: 8 })
        );
        assert!(Frame::new(Size::new(32, 9)).is_err());
    }

    #[test]
    fn column_zero_is_most_significant_bit() {
        let mut frame = Frame::new(Size::new(32, 8)).unwrap();
        frame.set(0, 3, true);
        frame.set(31, 3, true);
        assert_eq!(frame.rows()[3], 0x8000_0001);
        frame.set(0, 3, false);
        assert_eq!(frame.rows()[3], 0x0000_0001);
    }

    #[test]
    fn drawing_clips_outside_pixels() {
        let mut frame = Frame::new(Size::new(32, 8)).unwrap();
        let pixels = [
            Pixel(Point::new(-1, 0), BinaryColor::On),
            Pixel(Point::new(32, 0), BinaryColor::On),
            Pixel(Point::new(0, 8), BinaryColor::On),
            Pixel(Point::new(5, 5), BinaryColor::On),
        ];
        frame.draw_iter(pixels).unwrap();
        assert_eq!(frame.lit_count(), 1);
        assert!(frame.is_lit(5, 5));
    }

    #[test]
    fn with_frame_pushes_once_on_success() {
        let mut device = CountingDevice::default();
        with_frame(&mut device, |frame| {
            frame.set(1, 1, true);
            Ok(())
        })
        .unwrap();
        assert_eq!(device.rendered.len(), 1);
        assert!(device.rendered[0].is_lit(1, 1));
    }

    #[test]
    fn with_frame_skips_push_when_draw_fails() {
        let mut device = CountingDevice::default();
        let result: Result<()> =
            with_frame(&mut device, |_| Err(Error::InvalidTime("xx".into())));
        assert!(result.is_err());
        assert!(device.rendered.is_empty());
    }
}
