//! A wrapper around the 64x32 1-bit display buffer
use fixedbitset::FixedBitSet;
use std::ops::Index;

pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;

/// Pixel colors handed to a renderer by `Graphics::to_rgb`
pub const PIXEL_ON: u32 = 0x00FF_FFFF;
pub const PIXEL_OFF: u32 = 0x0000_0000;

pub struct Graphics {
    buffer: FixedBitSet,
    changed: bool, // set whenever a draw or clear touches the buffer
}

impl Graphics {
    pub fn new() -> Self {
        Graphics {
            buffer: FixedBitSet::with_capacity(WIDTH * HEIGHT),
            changed: false,
        }
    }

    /// Given x and y coordinate for a pixel in the buffer, return the corresponding
    /// index of that pixel in the buffer
    pub fn get_graphics_idx(x: usize, y: usize) -> usize {
        y * WIDTH + x
    }

    /// Turn every pixel off
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.changed = true;
    }

    /// XOR a single pixel. Returns true if the pixel was on and got turned off
    pub fn xor_set(&mut self, x: usize, y: usize, enabled: bool) -> bool {
        let idx = Graphics::get_graphics_idx(x, y);
        let was_set = self.buffer.contains(idx);
        self.buffer.set(idx, was_set ^ enabled);

        was_set && enabled
    }

    /// Draw an 8-pixel wide sprite, one byte per row, with its top left corner at (x, y).
    /// The starting position wraps around the screen but the sprite itself is clipped at
    /// the right and bottom edges. Returns true if any pixel collided with one that was
    /// already set.
    pub fn draw_sprite(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let x0 = x as usize % WIDTH;
        let y0 = y as usize % HEIGHT;
        let mut collision = false;

        for (row, byte) in sprite.iter().enumerate() {
            let y_coord = y0 + row;
            if y_coord >= HEIGHT {
                break;
            }

            for col in 0..8 {
                let x_coord = x0 + col;
                if x_coord >= WIDTH {
                    continue;
                }

                if (byte >> (7 - col)) & 1 == 1 {
                    collision |= self.xor_set(x_coord, y_coord, true);
                }
            }
        }

        self.changed = true;
        collision
    }

    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Return whether the display changed since the last call, and reset the flag
    pub fn take_changed(&mut self) -> bool {
        std::mem::replace(&mut self.changed, false)
    }

    /// The buffer as one `u32` color per pixel, row-major
    pub fn to_rgb(&self) -> Vec<u32> {
        (0..WIDTH * HEIGHT)
            .map(|idx| if self.buffer[idx] { PIXEL_ON } else { PIXEL_OFF })
            .collect()
    }

    /// Render the buffer as text, one line per row
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((WIDTH + 1) * HEIGHT);
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let on = self.buffer[Graphics::get_graphics_idx(x, y)];
                out.push(if on { '#' } else { '.' });
            }
            out.push('\n');
        }
        out
    }
}

impl Default for Graphics {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<usize> for Graphics {
    type Output = bool;

    #[inline]
    fn index(&self, idx: usize) -> &Self::Output {
        &self.buffer[idx]
    }
}
