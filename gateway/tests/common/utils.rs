use std::collections::HashMap;
use std::io::Cursor;

use axum::response::Response;
use gateway::types::GatewayConfig;
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

pub const BOUNDARY: &str = "gateway-test-boundary-7MA4YWxkTrZu0gW";

/// Regex-free check for `^[0-9a-f]{64}-<suffix>$`
pub fn is_generated_key(key: &str, suffix: &str) -> bool {
    key.len() == 65 + suffix.len()
        && key[..64]
            .chars()
            .all(|c| matches!(c, '0'..='9' | 'a'..='f'))
        && key[64..] == format!("-{suffix}")
}

/// Gateway configuration for tests, with optional overrides
pub fn test_config(overrides: &[(&str, &str)]) -> GatewayConfig {
    let mut vars: HashMap<String, String> = [
        ("APP_ENV", "development"),
        ("AWS_ACCESS_KEY", "test-access-key"),
        ("AWS_SECRET_ACCESS_KEY", "test-secret-key"),
        ("BUCKET_REGION", "us-east-1"),
        ("BUCKET_NAME", "gateway-test-images"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    for (k, v) in overrides {
        vars.insert((*k).to_string(), (*v).to_string());
    }

    GatewayConfig::from_lookup(|name| vars.get(name).cloned()).unwrap()
}

/// Parse response body to JSON
pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Solid-color image of the given size, encoded as `format`
pub fn create_test_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([30, 144, 255, 255]));
    let img = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(img).into_rgb8()),
        _ => DynamicImage::ImageRgba8(img),
    };

    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

/// A 500x500 PNG
pub fn create_test_png() -> Vec<u8> {
    create_test_image(500, 500, ImageFormat::Png)
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

/// One part of a multipart/form-data body
pub struct FormPart<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub data: &'a [u8],
}

/// Encodes `parts` as a multipart/form-data body using [`BOUNDARY`]
pub fn multipart_body(parts: &[FormPart<'_>]) -> Vec<u8> {
    let mut body = Vec::new();

    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());

        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
        if let Some(file_name) = part.file_name {
            disposition.push_str(&format!("; filename=\"{file_name}\""));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");

        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }

        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Form with a single `image` file field
pub fn image_form(file_name: &str, content_type: Option<&str>, data: &[u8]) -> Vec<u8> {
    multipart_body(&[FormPart {
        name: "image",
        file_name: Some(file_name),
        content_type,
        data,
    }])
}
