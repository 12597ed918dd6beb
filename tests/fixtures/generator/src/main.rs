//! Test fixture generator for batch-print.
//!
//! This binary writes sample images and PDFs for manual runs of the driver
//! (`batch-print tests/fixtures/output --ext .pdf --ext .png --output-dir out`).

use anyhow::Result;
use fixture_generator::{pdf_with_pages, LETTER};
use image::{Rgb, RgbImage};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

fn main() -> Result<()> {
    let output_dir = Path::new("tests/fixtures/output");
    fs::create_dir_all(output_dir.join("nested"))?;

    println!("Generating test fixtures...\n");

    // Images
    generate_image(&output_dir.join("portrait.png"), 400, 600)?;
    generate_image(&output_dir.join("landscape.png"), 600, 400)?;
    generate_image(&output_dir.join("nested/square.jpg"), 300, 300)?;

    // PDFs
    generate_pdf(&output_dir.join("single.pdf"), &[LETTER])?;
    generate_pdf(&output_dir.join("multipage.pdf"), &[LETTER; 3])?;
    generate_pdf(&output_dir.join("landscape.pdf"), &[(LETTER.1, LETTER.0)])?;
    generate_pdf(
        &output_dir.join("nested/mixed.pdf"),
        &[LETTER, (LETTER.1, LETTER.0), LETTER],
    )?;

    // Error cases
    generate_corrupt(&output_dir.join("corrupt.pdf"))?;
    generate_corrupt(&output_dir.join("corrupt.png"))?;

    println!("\nAll fixtures generated successfully!");
    Ok(())
}

/// A gradient with a dark band along the top edge, so orientation is visible
/// on the printed page.
fn generate_image(path: &Path, width: u32, height: u32) -> Result<()> {
    println!("  Creating: {}", path.display());

    let band = height / 10;
    let image = RgbImage::from_fn(width, height, |x, y| {
        if y < band {
            Rgb([20, 20, 20])
        } else {
            let r = (x * 255 / width.max(1)) as u8;
            let b = (y * 255 / height.max(1)) as u8;
            Rgb([r, 128, b])
        }
    });
    image.save(path)?;
    Ok(())
}

fn generate_pdf(path: &Path, pages: &[(f32, f32)]) -> Result<()> {
    println!("  Creating: {}", path.display());
    fs::write(path, pdf_with_pages(pages))?;
    Ok(())
}

/// Write garbage under a printable name.
fn generate_corrupt(path: &Path) -> Result<()> {
    println!("  Creating: {}", path.display());

    let mut file = File::create(path)?;
    file.write_all(b"This is not a valid document. It's just garbage data.")?;
    Ok(())
}
