//! Page layout: date groups into heading + 2x2 grid blocks.
//!
//! Every cell image is normalized to one fixed bounding box - resized
//! preserving aspect ratio, then centered on a solid-color canvas of
//! exactly the box size - so all cells render at identical dimensions
//! regardless of source aspect ratio.

use std::collections::BTreeMap;
use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::config::Settings;
use crate::models::{Cell, GridBlock, PageBlock, ReceiptImage, GRID_CAPACITY};

/// Fixed cell bounding box and padding color.
#[derive(Debug, Clone, Copy)]
pub struct CellBox {
    pub width: u32,
    pub height: u32,
    pub padding: [u8; 3],
}

impl CellBox {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            width: settings.cell_width_px,
            height: settings.cell_height_px,
            padding: settings.padding_color,
        }
    }
}

impl Default for CellBox {
    fn default() -> Self {
        Self {
            width: crate::config::DEFAULT_CELL_WIDTH_PX,
            height: crate::config::DEFAULT_CELL_HEIGHT_PX,
            padding: [255, 255, 255],
        }
    }
}

/// Build page blocks from grouped images, in the map's (lexicographic)
/// label order: one block per group, images chunked into 2x2 grids in
/// their original order.
pub fn build_page_blocks(
    groups: &BTreeMap<String, Vec<ReceiptImage>>,
    cell_box: CellBox,
) -> Vec<PageBlock> {
    groups
        .iter()
        .map(|(label, images)| PageBlock {
            heading: label.clone(),
            grids: images
                .chunks(GRID_CAPACITY)
                .map(|chunk| GridBlock {
                    cells: chunk.iter().map(|img| load_cell(img, cell_box)).collect(),
                })
                .collect(),
        })
        .collect()
}

/// Load and normalize one image into a cell; an unreadable image
/// becomes an error cell so the slot is still rendered.
fn load_cell(receipt: &ReceiptImage, cell_box: CellBox) -> Cell {
    let decoded = match image::open(&receipt.path) {
        Ok(img) => img,
        Err(e) => {
            tracing::error!(image = %receipt.name, "cannot decode for layout: {}", e);
            return Cell::Error {
                name: receipt.name.clone(),
            };
        }
    };

    let normalized = normalize_cell(&decoded, cell_box);
    match encode_png(&normalized) {
        Ok(png) => Cell::Image {
            name: receipt.name.clone(),
            png,
        },
        Err(e) => {
            tracing::error!(image = %receipt.name, "cannot encode cell: {}", e);
            Cell::Error {
                name: receipt.name.clone(),
            }
        }
    }
}

/// Fit an image into the cell box preserving aspect ratio and center
/// it on a padding-color canvas of exactly the box dimensions.
pub fn normalize_cell(source: &DynamicImage, cell_box: CellBox) -> RgbImage {
    let rgb = source.to_rgb8();
    let (src_w, src_h) = (rgb.width().max(1), rgb.height().max(1));

    let img_ratio = src_w as f32 / src_h as f32;
    let target_ratio = cell_box.width as f32 / cell_box.height as f32;

    let (new_w, new_h) = if img_ratio > target_ratio {
        let w = cell_box.width;
        (w, ((w as f32 / img_ratio).round() as u32).max(1))
    } else {
        let h = cell_box.height;
        (((h as f32 * img_ratio).round() as u32).max(1), h)
    };

    let resized = image::imageops::resize(&rgb, new_w, new_h, FilterType::Lanczos3);

    let mut canvas = RgbImage::from_pixel(cell_box.width, cell_box.height, Rgb(cell_box.padding));
    let x = (cell_box.width - new_w) / 2;
    let y = (cell_box.height - new_h) / 2;
    image::imageops::overlay(&mut canvas, &resized, x as i64, y as i64);
    canvas
}

fn encode_png(img: &RgbImage) -> Result<Vec<u8>, image::ImageError> {
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img.clone()).write_to(&mut cursor, ImageFormat::Png)?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receipt(name: &str, path: &std::path::Path) -> ReceiptImage {
        ReceiptImage::new(name, path.join(name))
    }

    fn write_image(path: &std::path::Path, w: u32, h: u32) {
        RgbImage::from_pixel(w, h, Rgb([80, 80, 80])).save(path).unwrap();
    }

    #[test]
    fn normalize_tall_image_pillarboxes() {
        let source = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 400, Rgb([0, 0, 0])));
        let cell = normalize_cell(&source, CellBox::default());

        assert_eq!(cell.width(), 420);
        assert_eq!(cell.height(), 525);
        // Content fills the height; sides are padding.
        assert_eq!(cell.get_pixel(0, 262).0, [255, 255, 255]);
        assert_eq!(cell.get_pixel(210, 262).0, [0, 0, 0]);
    }

    #[test]
    fn normalize_wide_image_letterboxes() {
        let source = DynamicImage::ImageRgb8(RgbImage::from_pixel(800, 200, Rgb([0, 0, 0])));
        let cell = normalize_cell(&source, CellBox::default());

        assert_eq!(cell.width(), 420);
        assert_eq!(cell.height(), 525);
        assert_eq!(cell.get_pixel(210, 0).0, [255, 255, 255]);
        assert_eq!(cell.get_pixel(210, 262).0, [0, 0, 0]);
    }

    #[test]
    fn nine_images_split_into_grids_of_four_four_one() {
        let dir = tempfile::tempdir().unwrap();
        let mut images = Vec::new();
        for i in 0..9 {
            let name = format!("r{i}.png");
            write_image(&dir.path().join(&name), 20, 30);
            images.push(receipt(&name, dir.path()));
        }

        let mut groups = BTreeMap::new();
        groups.insert("January 05, 2024".to_string(), images);

        let blocks = build_page_blocks(&groups, CellBox::default());
        assert_eq!(blocks.len(), 1);
        let sizes: Vec<_> = blocks[0].grids.iter().map(|g| g.cells.len()).collect();
        assert_eq!(sizes, [4, 4, 1]);
    }

    #[test]
    fn blocks_follow_lexicographic_group_order() {
        let dir = tempfile::tempdir().unwrap();
        write_image(&dir.path().join("a.png"), 20, 30);

        let mut groups = BTreeMap::new();
        groups.insert(
            "January 05, 2024".to_string(),
            vec![receipt("a.png", dir.path())],
        );
        groups.insert("Unknown Date".to_string(), vec![receipt("a.png", dir.path())]);
        groups.insert(
            "April 01, 2024".to_string(),
            vec![receipt("a.png", dir.path())],
        );

        let blocks = build_page_blocks(&groups, CellBox::default());
        let headings: Vec<_> = blocks.iter().map(|b| b.heading.as_str()).collect();
        assert_eq!(
            headings,
            ["April 01, 2024", "January 05, 2024", "Unknown Date"]
        );
    }

    #[test]
    fn unreadable_image_becomes_error_cell() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.png"), b"not an image").unwrap();

        let mut groups = BTreeMap::new();
        groups.insert(
            "Unknown Date".to_string(),
            vec![receipt("bad.png", dir.path())],
        );

        let blocks = build_page_blocks(&groups, CellBox::default());
        assert!(matches!(
            blocks[0].grids[0].cells[0],
            Cell::Error { ref name } if name == "bad.png"
        ));
    }
}
