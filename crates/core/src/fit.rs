//! Placement of a bitmap on a sheet of paper.

use serde::{Deserialize, Serialize};

/// Destination rectangle in device coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitRect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl FitRect {
    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }
}

/// Largest rectangle with the bitmap's aspect ratio that fits on the paper,
/// centered on it.
///
/// All four dimensions must be positive; the result is unspecified otherwise.
pub fn fit_to_paper(bitmap: (u32, u32), paper: (u32, u32)) -> FitRect {
    let (w, h) = (bitmap.0 as f64, bitmap.1 as f64);
    let (pw, ph) = (paper.0 as f64, paper.1 as f64);

    let scale = (pw / w).min(ph / h);
    let width = (w * scale).round();
    let height = (h * scale).round();

    let x1 = ((pw - width) / 2.0).round() as i32;
    let y1 = ((ph - height) / 2.0).round() as i32;

    FitRect {
        x1,
        y1,
        x2: x1 + width as i32,
        y2: y1 + height as i32,
    }
}
