//! Test fixtures: small encoded images and multipart forms.

use axum_test::multipart::{MultipartForm, Part};
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

pub fn create_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([40, 120, 200]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .expect("Failed to encode PNG");
    buf.into_inner()
}

pub fn file_part(name: &str, content_type: &str, data: Vec<u8>) -> Part {
    Part::bytes(data).file_name(name).mime_type(content_type)
}

/// Form with one `file` field per entry.
pub fn form(files: Vec<(&str, &str, Vec<u8>)>) -> MultipartForm {
    files
        .into_iter()
        .fold(MultipartForm::new(), |form, (name, content_type, data)| {
            form.add_part("file", file_part(name, content_type, data))
        })
}
