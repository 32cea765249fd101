// sRGB <-> linear tables for compositing overlay layers in linear light.
// Built once per process; every surface and the presenter share the same tables.

use std::sync::OnceLock;

use crate::color::Color;

pub struct GammaLut {
    // sRGB(0..255) -> linear (0..1) as f32
    srgb_to_linear: [f32; 256],
    // linear(0..1) -> sRGB(0..255) via 4096-step quantization
    // (index = (linear * 4095).round())
    linear_to_srgb: [u8; 4096],
}

impl Default for GammaLut {
    fn default() -> Self {
        Self::new()
    }
}

impl GammaLut {
    /// Build both tables.
    pub fn new() -> Self {
        let mut s2l = [0.0f32; 256];
        for (v, slot) in s2l.iter_mut().enumerate() {
            let c = v as f32 / 255.0;
            *slot = if c <= 0.04045 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) };
        }

        let mut l2s = [0u8; 4096];
        for (i, slot) in l2s.iter_mut().enumerate() {
            let l = (i as f32) / 4095.0;
            let s = if l <= 0.003_130_8 { 12.92 * l } else { 1.055 * l.powf(1.0 / 2.4) - 0.055 };
            *slot = (s * 255.0).round().clamp(0.0, 255.0) as u8;
        }

        Self { srgb_to_linear: s2l, linear_to_srgb: l2s }
    }

    /// Process-wide tables.
    pub fn shared() -> &'static GammaLut {
        static LUT: OnceLock<GammaLut> = OnceLock::new();
        LUT.get_or_init(GammaLut::new)
    }

    #[inline]
    pub fn srgb_u8_to_linear(&self, v: u8) -> f32 {
        self.srgb_to_linear[v as usize]
    }

    #[inline]
    pub fn linear_to_srgb_u8(&self, l: f32) -> u8 {
        let idx = (l.clamp(0.0, 1.0) * 4095.0).round() as usize;
        self.linear_to_srgb[idx]
    }

    /// Linear RGB of `c`, alpha ignored.
    #[inline]
    pub fn color_to_linear(&self, c: Color) -> [f32; 3] {
        [
            self.srgb_u8_to_linear(c.r),
            self.srgb_u8_to_linear(c.g),
            self.srgb_u8_to_linear(c.b),
        ]
    }

    /// Unpack a 0x00RRGGBB pixel to linear RGB.
    #[inline]
    pub fn unpack_linear(&self, px: u32) -> [f32; 3] {
        [
            self.srgb_u8_to_linear(((px >> 16) & 0xFF) as u8),
            self.srgb_u8_to_linear(((px >> 8) & 0xFF) as u8),
            self.srgb_u8_to_linear((px & 0xFF) as u8),
        ]
    }

    /// Pack linear RGB back to 0x00RRGGBB.
    #[inline]
    pub fn pack_linear(&self, rgb: [f32; 3]) -> u32 {
        let r = self.linear_to_srgb_u8(rgb[0]) as u32;
        let g = self.linear_to_srgb_u8(rgb[1]) as u32;
        let b = self.linear_to_srgb_u8(rgb[2]) as u32;
        (r << 16) | (g << 8) | b
    }
}
