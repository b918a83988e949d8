// Core pixel types shared by the canvas, the window and the solver.

/// Top byte of a canvas pixel: 0xFF marks ink, 0x00 marks blank (camera shows through).
/// minifb ignores this byte, so camera frames simply leave it at zero.
pub const INK: u32 = 0xFF00_0000;
pub const RGB_MASK: u32 = 0x00FF_FFFF;

#[derive(Clone, Debug, PartialEq)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the frame is on screen (pixels)
    pub height: usize,     // how tall the frame is on screen (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    /// A frame filled with a single color.
    pub fn filled(width: usize, height: usize, color: u32) -> Self {
        Self { width, height, pixels: vec![color; width * height] }
    }

    /// A fully blank (transparent, black) frame.
    pub fn blank(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0)
    }

    #[inline]
    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Flip left/right in place so the preview behaves like a mirror.
    pub fn mirror_horizontal(&mut self) {
        for row in self.pixels.chunks_exact_mut(self.width.max(1)) {
            row.reverse();
        }
    }

    /// Same pixels as tightly packed RGB bytes (what the detector bridge and PNG encoder want).
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 3);
        for &px in &self.pixels {
            let (r, g, b) = unpack_rgb(px);
            out.extend_from_slice(&[r, g, b]);
        }
        out
    }
}

#[inline]
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

#[inline]
pub fn unpack_rgb(px: u32) -> (u8, u8, u8) {
    (((px >> 16) & 0xFF) as u8, ((px >> 8) & 0xFF) as u8, (px & 0xFF) as u8)
}

#[inline]
pub fn is_ink(px: u32) -> bool {
    px & INK != 0
}

/// Integer pixel position on the canvas surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PixelPos {
    pub x: i32,
    pub y: i32,
}

impl PixelPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Precomputed solid disc we stamp along a stroke to give it thickness.
/// Visual: a round pen tip instead of a 1-pixel hairline.
#[derive(Clone, Debug)]
pub struct Stamp {
    pub radius: i32,
    pub offsets: Vec<(i32, i32)>, // every (dx, dy) inside the disc, centre included
}

impl Stamp {
    pub fn disc(radius: i32) -> Self {
        let radius = radius.max(0);
        let r2 = radius * radius;
        let mut offsets = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= r2 {
                    offsets.push((dx, dy));
                }
            }
        }
        Self { radius, offsets }
    }
}
