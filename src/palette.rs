//! Fixed colour palette for the particle classes.

/// Convert a packed `0xRRGGBB` value into normalized RGB.
pub const fn rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

pub const EMERALD: [f32; 3] = rgb(0x059669);
pub const EMERALD_LIGHT: [f32; 3] = rgb(0x34d399);
pub const GOLD: [f32; 3] = rgb(0xfbbf24);
pub const GOLD_BRIGHT: [f32; 3] = rgb(0xfffbeb);
/// Scene clear colour.
pub const BG_DARK: [f32; 3] = rgb(0x022c22);
