//! Test fixtures: generated images and reference tables.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

pub const RED: [u8; 3] = [255, 0, 0];
pub const BLUE: [u8; 3] = [0, 0, 255];

/// Two-entry reference table
pub const BLACK_WHITE_CSV: &str = "# test table\nblack,#000000\nwhite,#ffffff\n";

/// Encode an RGB image as PNG
pub fn png_bytes(img: RgbImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .expect("Failed to encode fixture");
    buf.into_inner()
}

/// Red/blue checkerboard
pub fn checkerboard(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        if (x + y) % 2 == 0 {
            Rgb(RED)
        } else {
            Rgb(BLUE)
        }
    })
}

/// Smooth two-axis gradient with many distinct colors
pub fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / (width - 1).max(1)) as u8,
            (y * 255 / (height - 1).max(1)) as u8,
            128,
        ])
    })
}

pub fn checkerboard_png(width: u32, height: u32) -> Vec<u8> {
    png_bytes(checkerboard(width, height))
}

pub fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    png_bytes(gradient(width, height))
}
