//! Minimal single-page PDF writer for print-ready output.
//!
//! The page is one full-bleed image placed over the media box. Trim and
//! bleed boxes are recorded so imposition software can position the sheet.

use crate::options::{ColorSpace, PageLayout};
use crate::svg::num;
use kurbo::Rect;

/// Samples already converted to the target colour space.
pub struct PageImage<'a> {
    pub samples: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
}

impl PageImage<'_> {
    fn components(&self) -> usize {
        match self.color_space {
            ColorSpace::Rgb => 3,
            ColorSpace::Cmyk => 4,
        }
    }

    fn device_space(&self) -> &'static str {
        match self.color_space {
            ColorSpace::Rgb => "/DeviceRGB",
            ColorSpace::Cmyk => "/DeviceCMYK",
        }
    }
}

struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self { buf, offsets: Vec::new() }
    }

    /// Append the next object; ids are assigned in call order starting at 1.
    fn object(&mut self, dict: &str) {
        self.offsets.push(self.buf.len());
        let id = self.offsets.len();
        self.buf.extend_from_slice(format!("{id} 0 obj\n{dict}\nendobj\n").as_bytes());
    }

    fn stream(&mut self, dict: &str, data: &[u8]) {
        self.offsets.push(self.buf.len());
        let id = self.offsets.len();
        self.buf.extend_from_slice(
            format!("{id} 0 obj\n<< {dict} /Length {} >>\nstream\n", data.len()).as_bytes(),
        );
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\nendstream\nendobj\n");
    }

    fn finish(mut self) -> Vec<u8> {
        let xref = self.buf.len();
        let count = self.offsets.len() + 1;
        let mut table = format!("xref\n0 {count}\n0000000000 65535 f \n");
        for offset in &self.offsets {
            table.push_str(&format!("{offset:010} 00000 n \n"));
        }
        table.push_str(&format!("trailer\n<< /Size {count} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n"));
        self.buf.extend_from_slice(table.as_bytes());
        self.buf
    }
}

/// Page boxes in PDF user space, which has its origin at the media corner.
fn pdf_box(rect: Rect, media: Rect) -> String {
    // The slug is symmetric, so flipping the y axis leaves the boxes unchanged.
    format!(
        "[{} {} {} {}]",
        num(rect.x0 - media.x0),
        num(rect.y0 - media.y0),
        num(rect.x1 - media.x0),
        num(rect.y1 - media.y0)
    )
}

/// Write a one-page PDF whose media box matches the layout.
pub fn write_pdf(image: &PageImage<'_>, layout: &PageLayout) -> Vec<u8> {
    debug_assert_eq!(
        image.samples.len(),
        image.width as usize * image.height as usize * image.components()
    );

    let media = layout.media;
    let (w, h) = (num(media.width()), num(media.height()));
    let mut pdf = PdfWriter::new();

    pdf.object("<< /Type /Catalog /Pages 2 0 R >>");
    pdf.object("<< /Type /Pages /Kids [3 0 R] /Count 1 >>");
    pdf.object(&format!(
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {w} {h}] /BleedBox {} /TrimBox {} \
         /Resources << /XObject << /Im0 5 0 R >> >> /Contents 4 0 R >>",
        pdf_box(layout.bleed_box, media),
        pdf_box(layout.trim, media)
    ));
    pdf.stream("", format!("q\n{w} 0 0 {h} 0 0 cm\n/Im0 Do\nQ").as_bytes());
    pdf.stream(
        &format!(
            "/Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace {} /BitsPerComponent 8",
            image.width,
            image.height,
            image.device_space()
        ),
        image.samples,
    );
    pdf.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{ExportFormat, ExportRequest};

    fn text(pdf: &[u8]) -> String {
        String::from_utf8_lossy(pdf).into_owned()
    }

    #[test]
    fn test_pdf_structure() {
        let layout = ExportRequest::new(ExportFormat::PrintReady)
            .with_bleed(9.0)
            .with_marks(true)
            .layout(100.0, 50.0)
            .unwrap();
        let samples = vec![255u8; (layout.pixel_width * layout.pixel_height * 3) as usize];
        let image = PageImage {
            samples: &samples,
            width: layout.pixel_width,
            height: layout.pixel_height,
            color_space: ColorSpace::Rgb,
        };
        let pdf = text(&write_pdf(&image, &layout));

        assert!(pdf.starts_with("%PDF-1.4"));
        assert!(pdf.trim_end().ends_with("%%EOF"));
        assert!(pdf.contains("/MediaBox [0 0 154 104]"));
        assert!(pdf.contains("/BleedBox [18 18 136 86]"));
        assert!(pdf.contains("/TrimBox [27 27 127 77]"));
        assert!(pdf.contains("/ColorSpace /DeviceRGB"));
        assert!(pdf.contains("xref\n0 6\n"));
    }

    #[test]
    fn test_pdf_xref_offsets_point_at_objects() {
        let layout = ExportRequest::new(ExportFormat::PrintReady).layout(10.0, 10.0).unwrap();
        let samples = vec![0u8; (layout.pixel_width * layout.pixel_height * 4) as usize];
        let image = PageImage {
            samples: &samples,
            width: layout.pixel_width,
            height: layout.pixel_height,
            color_space: ColorSpace::Cmyk,
        };
        let bytes = write_pdf(&image, &layout);
        assert!(text(&bytes).contains("/ColorSpace /DeviceCMYK"));

        let xref = bytes.windows(5).rposition(|w| w == b"xref\n").unwrap();
        let tail = std::str::from_utf8(&bytes[xref..]).unwrap();
        let entries: Vec<usize> = tail
            .lines()
            .skip(3)
            .take(5)
            .map(|line| line[..10].parse().unwrap())
            .collect();
        for (i, offset) in entries.iter().enumerate() {
            let header = format!("{} 0 obj", i + 1);
            assert_eq!(&bytes[*offset..*offset + header.len()], header.as_bytes());
        }

        let startxref: usize = tail.lines().rev().nth(1).unwrap().parse().unwrap();
        assert_eq!(startxref, xref);
    }
}
