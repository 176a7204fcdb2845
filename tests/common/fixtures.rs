//! Test fixtures and PDF builders.
//!
//! Two builders are provided: a lopdf-based one that writes exact content
//! streams (so extraction coordinates are known precisely), and a
//! printpdf-based builder for documents produced by a real generator.

use anyhow::Result;
use lopdf::{dictionary, Document, Object, Stream};
use std::fs;
use std::io::BufWriter;
use std::path::Path;

/// A positioned line of text: x, baseline y, font size, content.
pub type Line<'a> = (f32, f32, f32, &'a str);

/// Builds a PDF with one content stream per page, each line shown as a
/// separate text object with the shared `/F1` Helvetica resource.
pub fn build_pdf(pages: &[Vec<Line<'_>>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    let mut page_ids = Vec::new();
    for lines in pages {
        let mut content = String::new();
        for (x, y, size, text) in lines {
            content.push_str(&format!(
                "BT\n/F1 {} Tf\n{} {} Td\n({}) Tj\nET\n",
                size, x, y, text
            ));
        }
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        });
        kids.push(Object::Reference(page_id));
        page_ids.push(page_id);
    }

    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => pages.len() as i64,
    });
    for page_id in page_ids {
        if let Ok(page) = doc.get_object_mut(page_id) {
            if let Ok(dict) = page.as_dict_mut() {
                dict.set("Parent", Object::Reference(pages_id));
            }
        }
    }
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("fixture PDF saves");
    buffer
}

/// Two-page report fixture used across the integration tests.
///
/// Page 1 carries the "Q3 Results" heading, a revenue line, a "summary"
/// line and a "foo" line; page 2 carries the "Conclusion" heading and a
/// second "summary" line. Body text is 12pt, headings 18pt.
pub fn report_pdf() -> Vec<u8> {
    build_pdf(&[
        vec![
            (72.0, 720.0, 18.0, "Q3 Results"),
            (72.0, 690.0, 12.0, "Revenue increased by 5% over the quarter."),
            (72.0, 670.0, 12.0, "The summary is shown below."),
            (72.0, 650.0, 12.0, "foo appears in this line."),
        ],
        vec![
            (72.0, 720.0, 18.0, "Conclusion"),
            (72.0, 690.0, 12.0, "The summary of findings follows."),
            (72.0, 670.0, 12.0, "Overall the budget grew."),
        ],
    ])
}

/// Writes a PDF through printpdf, the way a document generator would.
#[derive(Debug, Clone)]
pub struct TestPdfBuilder {
    title: String,
    paragraphs: Vec<String>,
}

impl TestPdfBuilder {
    pub fn new() -> Self {
        Self {
            title: "Test Document".to_string(),
            paragraphs: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_paragraph(mut self, text: &str) -> Self {
        self.paragraphs.push(text.to_string());
        self
    }

    /// Renders the document to `path`.
    pub fn build(&self, path: &Path) -> Result<()> {
        use printpdf::*;

        let (doc, page1, layer1) =
            PdfDocument::new(&self.title, Mm(210.0), Mm(297.0), "Layer 1");
        let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let layer = doc.get_page(page1).get_layer(layer1);

        layer.use_text(&self.title, 18.0, Mm(20.0), Mm(270.0), &font);
        let mut y = 250.0;
        for paragraph in &self.paragraphs {
            layer.use_text(paragraph, 12.0, Mm(20.0), Mm(y), &font);
            y -= 10.0;
        }

        let file = fs::File::create(path)?;
        doc.save(&mut BufWriter::new(file))?;
        Ok(())
    }
}

impl Default for TestPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}
