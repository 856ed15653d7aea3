use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::interpreter::config::{SCREEN_HEIGHT, SCREEN_WIDTH};

pub type Rows = [u64; SCREEN_HEIGHT];

/// Column 0 is the most significant bit of each row.
pub fn row_pixel(row: u64, x: usize) -> bool {
    x < SCREEN_WIDTH && (row >> (SCREEN_WIDTH - 1 - x)) & 1 == 1
}

/// Published copy of the screen, read by the renderer.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    rows: Mutex<Rows>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Rows> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, rows: &Rows) {
        *self.lock() = *rows;
    }

    pub fn snapshot(&self) -> Rows {
        *self.lock()
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        y < SCREEN_HEIGHT && row_pixel(self.lock()[y], x)
    }

    pub fn lit_pixels(&self) -> usize {
        self.lock().iter().map(|row| row.count_ones() as usize).sum()
    }
}

/// The CPU-side screen. Every completed clear or draw is copied to the
/// shared `FrameBuffer` so a reader never sees a half-drawn sprite.
#[derive(Debug, Clone)]
pub struct Display {
    rows: Rows,
    published: Arc<FrameBuffer>,
}

impl Display {
    pub fn new(published: Arc<FrameBuffer>) -> Self {
        let display = Self {
            rows: [0; SCREEN_HEIGHT],
            published,
        };
        display.sync();
        display
    }

    pub fn rows(&self) -> &Rows {
        &self.rows
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        y < SCREEN_HEIGHT && row_pixel(self.rows[y], x)
    }

    pub fn frame_buffer(&self) -> &Arc<FrameBuffer> {
        &self.published
    }

    pub fn clear(&mut self) {
        self.rows = [0; SCREEN_HEIGHT];
        self.sync();
    }

    /// XORs `sprite` (one byte per row, `height` rows) onto the screen with
    /// its top-left corner at `(x, y)`. Rows wrap at the bottom edge; columns
    /// past the right edge are clipped. Returns true if any lit pixel was
    /// turned off.
    pub fn draw_sprite(&mut self, x: u8, y: u8, height: usize, sprite: &[u8]) -> bool {
        let mut collision = false;

        for (offset, &sprite_row) in sprite.iter().take(height).enumerate() {
            let lane = align_sprite_row(sprite_row, u32::from(x));
            let row = (usize::from(y) + offset) % SCREEN_HEIGHT;

            collision |= lane & self.rows[row] != 0;
            self.rows[row] ^= lane;
        }

        self.sync();
        collision
    }

    fn sync(&self) {
        self.published.publish(&self.rows);
    }
}

fn align_sprite_row(sprite_row: u8, x: u32) -> u64 {
    let padded = u64::from(sprite_row);
    let byte_slot = (SCREEN_WIDTH - 8) as u32;
    if x < byte_slot {
        padded << (byte_slot - x)
    } else {
        padded.checked_shr(x - byte_slot).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display() -> Display {
        Display::new(Arc::new(FrameBuffer::new()))
    }

    #[test]
    fn drawing_twice_restores_screen_and_collides() {
        let mut display = display();
        let glyph = [0xF0, 0x90, 0x90, 0x90, 0xF0];

        assert!(!display.draw_sprite(10, 4, glyph.len(), &glyph));
        let drawn = *display.rows();
        assert!(display.draw_sprite(10, 4, glyph.len(), &glyph));

        assert_ne!(drawn, [0; SCREEN_HEIGHT]);
        assert_eq!(*display.rows(), [0; SCREEN_HEIGHT]);
    }

    #[test]
    fn sprite_bits_land_at_column() {
        let mut display = display();
        display.draw_sprite(0, 0, 1, &[0x80]);
        display.draw_sprite(63, 1, 1, &[0x80]);
        assert!(display.pixel(0, 0));
        assert!(display.pixel(63, 1));
        assert_eq!(display.rows()[0], 1 << 63);
        assert_eq!(display.rows()[1], 1);
    }

    #[test]
    fn rows_wrap_to_top() {
        let mut display = display();
        display.draw_sprite(0, 30, 4, &[0x80, 0x80, 0x80, 0x80]);
        for y in [30, 31, 0, 1] {
            assert!(display.pixel(0, y), "row {y}");
        }
        assert!(!display.pixel(0, 2));
    }

    #[test]
    fn columns_clip_at_right_edge() {
        let mut display = display();
        display.draw_sprite(60, 0, 1, &[0xFF]);
        assert_eq!(display.rows()[0], 0x0F);
        assert!(!display.pixel(0, 0));

        display.draw_sprite(200, 1, 1, &[0xFF]);
        assert_eq!(display.rows()[1], 0);
    }

    #[test]
    fn overlap_without_erasure_is_not_collision() {
        let mut display = display();
        display.draw_sprite(0, 0, 1, &[0xF0]);
        assert!(!display.draw_sprite(0, 0, 1, &[0x0F]));
        assert!(display.draw_sprite(0, 0, 1, &[0x01]));
    }

    #[test]
    fn clear_and_draw_publish_snapshots() {
        let mut display = display();
        let frame = Arc::clone(display.frame_buffer());
        display.draw_sprite(8, 2, 2, &[0xFF, 0x81]);
        assert_eq!(frame.snapshot(), *display.rows());
        assert_eq!(frame.lit_pixels(), 10);
        assert!(frame.pixel(8, 3));

        display.clear();
        assert_eq!(frame.snapshot(), [0; SCREEN_HEIGHT]);
    }
}
