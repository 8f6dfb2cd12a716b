//! Minimal OOXML (.docx) writer.
//!
//! Emits the four parts a word processor needs: content types, package
//! relationships, the document part with its image relationships, and
//! the embedded PNG media. Tables are borderless 2x2 grids with
//! centered cells; a page break separates date groups.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::{DocWriterError, DocumentWriter};
use crate::models::{Cell, PageBlock, CELLS_PER_ROW, ROWS_PER_GRID};

/// EMUs per pixel at the fixed 150 dpi cell resolution.
const EMU_PER_PX: u64 = 914_400 / 150;

/// Page margins in twips: 0.8in top/bottom, 0.7in left/right.
const MARGIN_TOP_BOTTOM: u32 = 1152;
const MARGIN_LEFT_RIGHT: u32 = 1008;

/// Table cell width in twips (half the usable 6.1in page width).
const CELL_WIDTH_DXA: u32 = 4392;

/// Writes page blocks as a Word document.
pub struct DocxWriter {
    cell_width_px: u32,
    cell_height_px: u32,
}

impl DocxWriter {
    pub fn new(cell_width_px: u32, cell_height_px: u32) -> Self {
        Self {
            cell_width_px,
            cell_height_px,
        }
    }

    fn extent_emu(&self) -> (u64, u64) {
        (
            self.cell_width_px as u64 * EMU_PER_PX,
            self.cell_height_px as u64 * EMU_PER_PX,
        )
    }
}

impl Default for DocxWriter {
    fn default() -> Self {
        Self::new(
            crate::config::DEFAULT_CELL_WIDTH_PX,
            crate::config::DEFAULT_CELL_HEIGHT_PX,
        )
    }
}

impl DocumentWriter for DocxWriter {
    fn write(&self, blocks: &[PageBlock], output: &Path) -> Result<(), DocWriterError> {
        let mut media: Vec<&[u8]> = Vec::new();
        let body = self.render_document(blocks, &mut media);

        let file = File::create(output)?;
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(CONTENT_TYPES.as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(PACKAGE_RELS.as_bytes())?;

        zip.start_file("word/_rels/document.xml.rels", options)?;
        zip.write_all(document_rels(media.len()).as_bytes())?;

        zip.start_file("word/styles.xml", options)?;
        zip.write_all(STYLES.as_bytes())?;

        zip.start_file("word/document.xml", options)?;
        zip.write_all(body.as_bytes())?;

        for (idx, png) in media.iter().enumerate() {
            zip.start_file(format!("word/media/image{}.png", idx + 1), options)?;
            zip.write_all(png)?;
        }

        zip.finish()?;
        Ok(())
    }
}

impl DocxWriter {
    /// Render the document part, collecting embedded media in order.
    /// Media index n (1-based) pairs with relationship `rIdn` and part
    /// `word/media/imagen.png`.
    fn render_document<'a>(&self, blocks: &'a [PageBlock], media: &mut Vec<&'a [u8]>) -> String {
        let mut xml = String::from(DOCUMENT_HEADER);

        for (block_idx, block) in blocks.iter().enumerate() {
            if block_idx > 0 {
                xml.push_str(PAGE_BREAK);
            }

            xml.push_str(&heading_paragraph(&block.heading));
            xml.push_str(EMPTY_PARAGRAPH);

            for (grid_idx, grid) in block.grids.iter().enumerate() {
                if grid_idx > 0 {
                    // Spacer between grids of the same group; no page break.
                    xml.push_str(EMPTY_PARAGRAPH);
                }
                xml.push_str(&self.render_grid(&grid.cells, media));
            }

            xml.push_str(EMPTY_PARAGRAPH);
        }

        xml.push_str(&section_properties());
        xml.push_str("</w:body></w:document>\n");
        xml
    }

    /// One borderless table with 2 rows x 2 columns; trailing slots of
    /// a partial grid render as empty cells.
    fn render_grid<'a>(&self, cells: &'a [Cell], media: &mut Vec<&'a [u8]>) -> String {
        let mut xml = String::from(TABLE_HEADER);

        for row in 0..ROWS_PER_GRID {
            xml.push_str("<w:tr>");
            for col in 0..CELLS_PER_ROW {
                xml.push_str(&format!(
                    r#"<w:tc><w:tcPr><w:tcW w:w="{CELL_WIDTH_DXA}" w:type="dxa"/></w:tcPr>"#
                ));
                match cells.get(row * CELLS_PER_ROW + col) {
                    Some(Cell::Image { name, png }) => {
                        media.push(png.as_slice());
                        xml.push_str(&self.image_paragraph(media.len(), name));
                    }
                    Some(Cell::Error { name }) => {
                        xml.push_str(&error_paragraph(name));
                    }
                    None => xml.push_str(EMPTY_PARAGRAPH),
                }
                xml.push_str("</w:tc>");
            }
            xml.push_str("</w:tr>");
        }

        xml.push_str("</w:tbl>");
        xml
    }

    /// Centered paragraph holding one inline picture.
    fn image_paragraph(&self, rel_idx: usize, name: &str) -> String {
        let (cx, cy) = self.extent_emu();
        let name = xml_escape(name);
        format!(
            r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0"><wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{rel_idx}" name="{name}"/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic><pic:nvPicPr><pic:cNvPr id="{rel_idx}" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip r:embed="rId{rel_idx}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#
        )
    }
}

const DOCUMENT_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><w:body>"#;

const EMPTY_PARAGRAPH: &str = "<w:p/>";

const PAGE_BREAK: &str = r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#;

/// Borderless, fixed-layout table header.
const TABLE_HEADER: &str = r#"<w:tbl><w:tblPr><w:tblLayout w:type="fixed"/><w:tblBorders><w:top w:val="nil"/><w:left w:val="nil"/><w:bottom w:val="nil"/><w:right w:val="nil"/><w:insideH w:val="nil"/><w:insideV w:val="nil"/></w:tblBorders></w:tblPr><w:tblGrid><w:gridCol w:w="4392"/><w:gridCol w:w="4392"/></w:tblGrid>"#;

fn heading_paragraph(text: &str) -> String {
    format!(
        r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/><w:jc w:val="center"/></w:pPr><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        xml_escape(text)
    )
}

fn error_paragraph(name: &str) -> String {
    format!(
        r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:t xml:space="preserve">Error loading {}</w:t></w:r></w:p>"#,
        xml_escape(name)
    )
}

fn section_properties() -> String {
    format!(
        r#"<w:sectPr><w:pgMar w:top="{MARGIN_TOP_BOTTOM}" w:bottom="{MARGIN_TOP_BOTTOM}" w:left="{MARGIN_LEFT_RIGHT}" w:right="{MARGIN_LEFT_RIGHT}"/></w:sectPr>"#
    )
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>
"#;

/// Group headings carry a real level-1 heading style so they show up
/// in Word's navigation pane.
const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:pPr><w:jc w:val="center"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style></w:styles>
"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>
"#;

fn document_rels(image_count: usize) -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rIdStyles" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
    );
    for idx in 1..=image_count {
        out.push_str(&format!(
            r#"<Relationship Id="rId{idx}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image{idx}.png"/>"#
        ));
    }
    out.push_str("</Relationships>\n");
    out
}

/// Escape text for XML content.
fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
