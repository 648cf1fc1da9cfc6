//! Shared fixtures for the HTTP tests

#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};
use tempfile::TempDir;
use tower::ServiceExt;

use media_shelf::config::{ServerConfig, UserConfig};
use media_shelf::router;

pub const SUPERUSER: (&str, &str) = ("test_user_1", "test");
pub const USER: (&str, &str) = ("test_user_2", "test");

pub struct TestApp {
    pub data: TempDir,
    pub cache: TempDir,
    pub app: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        assert_eq!(
            self.headers[header::CONTENT_TYPE],
            "application/json",
            "unexpected content type"
        );
        serde_json::from_slice(&self.body).unwrap()
    }
}

impl TestApp {
    pub fn new() -> Self {
        let data = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        let config = ServerConfig {
            data_root: data.path().to_string_lossy().into_owned(),
            cache_root: cache.path().to_string_lossy().into_owned(),
            render_sizes: vec![128, 1024],
            users: vec![
                UserConfig {
                    username: SUPERUSER.0.into(),
                    password: SUPERUSER.1.into(),
                    superuser: true,
                },
                UserConfig {
                    username: USER.0.into(),
                    password: USER.1.into(),
                    superuser: false,
                },
            ],
            ..ServerConfig::default()
        };
        config.validate().unwrap();

        Self {
            app: router(&config),
            data,
            cache,
        }
    }

    pub fn data_path(&self, relative: &str) -> std::path::PathBuf {
        self.data.path().join(relative)
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            headers,
            body: body.to_vec(),
        }
    }

    pub async fn get(&self, uri: &str, user: Option<(&str, &str)>) -> TestResponse {
        self.send(request("GET", uri, user).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post(&self, uri: &str, user: Option<(&str, &str)>) -> TestResponse {
        self.send(request("POST", uri, user).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_form(
        &self,
        uri: &str,
        user: Option<(&str, &str)>,
        form: &str,
    ) -> TestResponse {
        self.send(
            request("POST", uri, user)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_upload(
        &self,
        uri: &str,
        user: Option<(&str, &str)>,
        parent: Option<&str>,
        filename: &str,
        content: &[u8],
    ) -> TestResponse {
        let boundary = "media-shelf-test-boundary";
        let mut body = Vec::new();
        if let Some(parent) = parent {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"parent\"\r\n\r\n{parent}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"upload\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        self.send(
            request("POST", uri, user)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }
}

/// `Authorization` header value for `user`
pub fn basic_auth((name, password): (&str, &str)) -> String {
    format!("Basic {}", STANDARD.encode(format!("{name}:{password}")))
}

fn request(method: &str, uri: &str, user: Option<(&str, &str)>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match user {
        Some(user) => builder.header(header::AUTHORIZATION, basic_auth(user)),
        None => builder,
    }
}

/// A JPEG of the given size carrying Canon EOS 450D EXIF tags
/// (f/10, 1/125 s, 48 mm).
pub fn canon_jpeg(width: u32, height: u32) -> Vec<u8> {
    let pixels = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut encoded = Vec::new();
    DynamicImage::ImageRgb8(pixels)
        .write_with_encoder(JpegEncoder::new_with_quality(&mut encoded, 80))
        .unwrap();

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&canon_tiff());

    let mut jpeg = encoded[..2].to_vec();
    jpeg.extend_from_slice(&[0xFF, 0xE1]);
    jpeg.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    jpeg.extend_from_slice(&payload);
    jpeg.extend_from_slice(&encoded[2..]);
    jpeg
}

/// Big-endian TIFF block, as written by Canon bodies.
fn canon_tiff() -> Vec<u8> {
    let make = b"Canon\0";
    let model = b"Canon EOS 450D\0";

    let ifd0: u32 = 8;
    let exif_ifd = ifd0 + 2 + 3 * 12 + 4;
    let data = exif_ifd + 2 + 3 * 12 + 4;
    let make_at = data;
    let model_at = make_at + make.len() as u32;
    let rationals_at = model_at + model.len() as u32;

    let mut out = b"MM".to_vec();
    out.extend_from_slice(&42u16.to_be_bytes());
    out.extend_from_slice(&ifd0.to_be_bytes());

    let entry = |out: &mut Vec<u8>, tag: u16, kind: u16, count: u32, value: u32| {
        out.extend_from_slice(&tag.to_be_bytes());
        out.extend_from_slice(&kind.to_be_bytes());
        out.extend_from_slice(&count.to_be_bytes());
        out.extend_from_slice(&value.to_be_bytes());
    };

    out.extend_from_slice(&3u16.to_be_bytes());
    entry(&mut out, 0x010F, 2, make.len() as u32, make_at);
    entry(&mut out, 0x0110, 2, model.len() as u32, model_at);
    entry(&mut out, 0x8769, 4, 1, exif_ifd);
    out.extend_from_slice(&0u32.to_be_bytes());

    out.extend_from_slice(&3u16.to_be_bytes());
    entry(&mut out, 0x829A, 5, 1, rationals_at);
    entry(&mut out, 0x829D, 5, 1, rationals_at + 8);
    entry(&mut out, 0x920A, 5, 1, rationals_at + 16);
    out.extend_from_slice(&0u32.to_be_bytes());

    out.extend_from_slice(make);
    out.extend_from_slice(model);
    for (num, den) in [(1u32, 125u32), (100, 10), (48, 1)] {
        out.extend_from_slice(&num.to_be_bytes());
        out.extend_from_slice(&den.to_be_bytes());
    }
    out
}
