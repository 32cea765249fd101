// PNG snapshots of what the window currently shows.

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};

use crate::error::Error;
use crate::types::FrameBuffer;

/// Convert a presented frame (0x00RRGGBB) to an RGB image.
pub fn to_image(fb: &FrameBuffer) -> Result<RgbImage, Error> {
    let (w, h) = (
        u32::try_from(fb.width).map_err(|_| Error::Snapshot("frame too wide".into()))?,
        u32::try_from(fb.height).map_err(|_| Error::Snapshot("frame too tall".into()))?,
    );
    if fb.pixels.len() != fb.width * fb.height {
        return Err(Error::Snapshot("pixel count does not match frame size".into()));
    }
    Ok(RgbImage::from_fn(w, h, |x, y| {
        let px = fb.pixels[y as usize * fb.width + x as usize];
        Rgb([(px >> 16) as u8, (px >> 8) as u8, px as u8])
    }))
}

/// Write `fb` as `trail-NNNN.png` inside `dir`, creating the directory if needed.
pub fn save_png(fb: &FrameBuffer, dir: &Path, index: u32) -> Result<PathBuf, Error> {
    std::fs::create_dir_all(dir)
        .map_err(|e| Error::Snapshot(format!("create {}: {e}", dir.display())))?;
    let path = dir.join(format!("trail-{index:04}.png"));
    to_image(fb)?
        .save(&path)
        .map_err(|e| Error::Snapshot(format!("write {}: {e}", path.display())))?;
    Ok(path)
}
