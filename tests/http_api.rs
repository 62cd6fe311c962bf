use image::{ImageFormat, Rgb};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use tokio::net::TcpListener;

use markora::common::config::ServerSettings;
use markora::processing::raster::encode_image;
use markora::processing::{MarkerPolicy, PixelGrid};
use markora::server::{router, ServerCore};

async fn spawn_app(settings: ServerSettings) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(ServerCore::new(MarkerPolicy::default()), &settings);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let grid = PixelGrid::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 90]));
    encode_image(&grid, ImageFormat::Png).unwrap().bytes
}

fn image_part(data: &[u8]) -> Part {
    Part::bytes(data.to_vec())
        .file_name("photo.png")
        .mime_str("image/png")
        .unwrap()
}

fn upload_form(image: &[u8], text: &str) -> Form {
    Form::new()
        .part("file", image_part(image))
        .text("text", text.to_string())
        .text("user_email", "alice@example.com")
}

fn detect_form(image: &[u8]) -> Form {
    Form::new().part("file", image_part(image))
}

#[tokio::test]
async fn test_upload_detect_and_refuse_duplicate() {
    let base = spawn_app(ServerSettings::default()).await;
    let client = Client::new();

    let upload = client
        .post(format!("{}/api/upload", base))
        .multipart(upload_form(&png_bytes(16, 16), "hello"))
        .send()
        .await
        .unwrap();
    assert_eq!(upload.status(), StatusCode::OK);
    assert_eq!(upload.headers()["content-type"], "image/png");
    assert_eq!(
        upload.headers()["content-disposition"],
        "attachment; filename=\"watermarked_photo.png\""
    );
    let marked = upload.bytes().await.unwrap();

    let detect: serde_json::Value = client
        .post(format!("{}/api/detect", base))
        .multipart(detect_form(&marked))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        detect["detection_result"],
        "Watermark detected: hello - Embedded with Markora"
    );

    let again = client
        .post(format!("{}/api/upload", base))
        .multipart(upload_form(&marked, "again"))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = again.json().await.unwrap();
    assert_eq!(
        body["error"],
        "This image already has a watermark. Cannot add another."
    );
}

#[tokio::test]
async fn test_detect_unmarked_image() {
    let base = spawn_app(ServerSettings::default()).await;
    let blank = encode_image(&PixelGrid::new(8, 8), ImageFormat::Png).unwrap().bytes;

    let response = Client::new()
        .post(format!("{}/api/detect", base))
        .multipart(detect_form(&blank))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["detection_result"], "No watermark detected");
}

#[tokio::test]
async fn test_rejects_non_image_upload() {
    let base = spawn_app(ServerSettings::default()).await;
    let form = Form::new()
        .part(
            "file",
            Part::bytes(b"just text".to_vec())
                .file_name("notes.txt")
                .mime_str("text/plain")
                .unwrap(),
        )
        .text("text", "hello");

    let response = Client::new()
        .post(format!("{}/api/upload", base))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "File must be an image");
}

#[tokio::test]
async fn test_image_must_be_sent_as_file_field() {
    let base = spawn_app(ServerSettings::default()).await;
    let form = Form::new()
        .part("image", image_part(&png_bytes(8, 8)))
        .text("text", "hello");

    let response = Client::new()
        .post(format!("{}/api/upload", base))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "No image provided");
}

#[tokio::test]
async fn test_rejects_oversized_upload() {
    let base = spawn_app(ServerSettings {
        max_upload_bytes: 64,
        ..ServerSettings::default()
    })
    .await;

    let image = png_bytes(32, 32);
    assert!(image.len() > 64);

    let response = Client::new()
        .post(format!("{}/api/detect", base))
        .multipart(detect_form(&image))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "File too large");
}

#[tokio::test]
async fn test_text_too_long_for_image() {
    let base = spawn_app(ServerSettings::default()).await;

    let response = Client::new()
        .post(format!("{}/api/upload", base))
        .multipart(upload_form(&png_bytes(3, 3), "hello"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("The watermark text is too long"), "{}", message);
}

#[tokio::test]
async fn test_health_reports_counters() {
    let base = spawn_app(ServerSettings::default()).await;
    let client = Client::new();

    client
        .post(format!("{}/api/detect", base))
        .multipart(detect_form(&png_bytes(4, 4)))
        .send()
        .await
        .unwrap();

    let health = client
        .get(format!("{}/api/health", base))
        .send()
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    let json: serde_json::Value = health.json().await.unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["marker"], "Embedded with Markora");
    assert_eq!(json["metrics"]["detections"], 1);
}
