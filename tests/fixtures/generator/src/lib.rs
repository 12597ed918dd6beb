//! Sample documents shared by the fixture binary and the core integration
//! tests.

use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, TextItem,
};

/// US Letter in PDF points.
pub const LETTER: (f32, f32) = (612.0, 792.0);

/// A PDF with one page per entry of `pages` (width, height in points), each
/// showing its page number near the top edge.
pub fn pdf_with_pages(pages: &[(f32, f32)]) -> Vec<u8> {
    let mut doc = PdfDocument::new("batch-print fixture");

    let pages = pages
        .iter()
        .enumerate()
        .map(|(i, &(width, height))| {
            let ops = vec![
                Op::StartTextSection,
                Op::SetTextCursor {
                    pos: Point {
                        x: Pt(72.0),
                        y: Pt((height - 144.0).max(0.0)),
                    },
                },
                Op::SetFontSizeBuiltinFont {
                    size: Pt(48.0),
                    font: BuiltinFont::Helvetica,
                },
                Op::WriteTextBuiltinFont {
                    items: vec![TextItem::Text(format!("Page {}", i + 1))],
                    font: BuiltinFont::Helvetica,
                },
                Op::EndTextSection,
            ];
            PdfPage::new(points_to_mm(width), points_to_mm(height), ops)
        })
        .collect();
    doc.with_pages(pages);

    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    doc.save(&PdfSaveOptions::default(), &mut warnings)
}

fn points_to_mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_with_pages_is_a_pdf() {
        let bytes = pdf_with_pages(&[LETTER, (LETTER.1, LETTER.0)]);
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_letter_converts_to_millimeters() {
        assert!((points_to_mm(LETTER.0).0 - 215.9).abs() < 0.01);
    }
}
