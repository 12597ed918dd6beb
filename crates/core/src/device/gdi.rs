//! Win32 GDI printer device contexts.

use super::PrintDevice;
use crate::bitmap::Bitmap;
use crate::error::{PrintError, Result};
use crate::fit::FitRect;
use std::ffi::c_void;
use tracing::{debug, warn};
use windows::core::{w, PCWSTR};
use windows::Win32::Graphics::Gdi::{
    CreateDCW, DeleteDC, GetDeviceCaps, StretchDIBits, BITMAPINFO, BITMAPINFOHEADER, BI_RGB,
    DIB_RGB_COLORS, HDC, PHYSICALHEIGHT, PHYSICALWIDTH, SRCCOPY,
};
use windows::Win32::Storage::Xps::DOCINFOW;

#[link(name = "gdi32")]
extern "system" {
    fn EndDoc(hdc: HDC) -> i32;
    fn EndPage(hdc: HDC) -> i32;
    fn StartDocW(hdc: HDC, lpdi: *const DOCINFOW) -> i32;
    fn StartPage(hdc: HDC) -> i32;
}

/// Null-terminated UTF-16 copy of `s`.
fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// A printer device context opened through the WINSPOOL driver.
pub struct GdiDevice {
    name: String,
    hdc: Option<HDC>,
    paper: (u32, u32),
}

impl GdiDevice {
    /// Create a printer DC and read the physical paper size.
    pub fn open(name: &str) -> Result<Self> {
        let device_name = wide(name);
        // SAFETY: both strings are null-terminated and outlive the call.
        let hdc = unsafe {
            CreateDCW(
                w!("WINSPOOL"),
                PCWSTR::from_raw(device_name.as_ptr()),
                PCWSTR::null(),
                None,
            )
        };
        if hdc.is_invalid() {
            return Err(PrintError::device(name, "CreateDC failed"));
        }

        // SAFETY: hdc was just checked to be valid.
        let (width, height) = unsafe {
            (
                GetDeviceCaps(Some(hdc), PHYSICALWIDTH),
                GetDeviceCaps(Some(hdc), PHYSICALHEIGHT),
            )
        };
        if width <= 0 || height <= 0 {
            // SAFETY: valid and not yet shared.
            unsafe {
                let _ = DeleteDC(hdc);
            }
            return Err(PrintError::device(
                name,
                format!("device reported paper size {}x{}", width, height),
            ));
        }

        debug!("Opened DC for {:?}, paper {}x{}", name, width, height);
        Ok(Self {
            name: name.to_string(),
            hdc: Some(hdc),
            paper: (width as u32, height as u32),
        })
    }

    fn hdc(&self) -> Result<HDC> {
        self.hdc
            .ok_or_else(|| PrintError::device(&self.name, "device context is closed"))
    }

    fn check(&self, call: &str, status: i32) -> Result<()> {
        if status <= 0 {
            Err(PrintError::device(
                &self.name,
                format!("{} failed ({})", call, status),
            ))
        } else {
            Ok(())
        }
    }
}

impl PrintDevice for GdiDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn paper_size(&self) -> (u32, u32) {
        self.paper
    }

    fn start_document(&mut self, name: &str) -> Result<()> {
        let hdc = self.hdc()?;
        let doc_name = wide(name);
        let info = DOCINFOW {
            cbSize: std::mem::size_of::<DOCINFOW>() as i32,
            lpszDocName: PCWSTR::from_raw(doc_name.as_ptr()),
            ..Default::default()
        };
        // SAFETY: info and the name it points to outlive the call.
        let status = unsafe { StartDocW(hdc, &info) };
        self.check("StartDoc", status)
    }

    fn start_page(&mut self) -> Result<()> {
        let hdc = self.hdc()?;
        // SAFETY: hdc is a live printer DC.
        let status = unsafe { StartPage(hdc) };
        self.check("StartPage", status)
    }

    fn draw_bitmap(&mut self, bitmap: &Bitmap, rect: FitRect) -> Result<()> {
        let hdc = self.hdc()?;
        let (width, height) = bitmap.size();
        let bits = bitmap.dib_rows();

        let info = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width as i32,
                // Negative height: rows are stored top-down.
                biHeight: -(height as i32),
                biPlanes: 1,
                biBitCount: 24,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };

        // SAFETY: bits holds `height` padded rows matching the header.
        let lines = unsafe {
            StretchDIBits(
                hdc,
                rect.x1,
                rect.y1,
                rect.width(),
                rect.height(),
                0,
                0,
                width as i32,
                height as i32,
                Some(bits.as_ptr() as *const c_void),
                &info,
                DIB_RGB_COLORS,
                SRCCOPY,
            )
        };
        self.check("StretchDIBits", lines)
    }

    fn end_page(&mut self) -> Result<()> {
        let hdc = self.hdc()?;
        // SAFETY: hdc is a live printer DC.
        let status = unsafe { EndPage(hdc) };
        self.check("EndPage", status)
    }

    fn end_document(&mut self) -> Result<()> {
        let hdc = self.hdc()?;
        // SAFETY: hdc is a live printer DC.
        let status = unsafe { EndDoc(hdc) };
        self.check("EndDoc", status)
    }

    fn close(&mut self) -> Result<()> {
        let Some(hdc) = self.hdc.take() else {
            return Ok(());
        };
        // SAFETY: taken out of self, so it is deleted exactly once.
        let deleted = unsafe { DeleteDC(hdc) };
        if deleted.as_bool() {
            debug!("Closed DC for {:?}", self.name);
            Ok(())
        } else {
            Err(PrintError::device(&self.name, "DeleteDC failed"))
        }
    }
}

impl Drop for GdiDevice {
    fn drop(&mut self) {
        if self.hdc.is_some() {
            warn!("DC for {:?} dropped without close", self.name);
            let _ = self.close();
        }
    }
}
