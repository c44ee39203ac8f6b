use super::*;

fn request(url: &str) -> CaptureRequest {
    CaptureRequest {
        url: url.to_string(),
        viewport_width: 1440,
        wait_until: WaitUntil::Load,
        delay_ms: 0,
        timeout_ms: 30_000,
    }
}

#[test]
fn test_http_and_https_accepted() {
    assert!(request("http://example.com").validate().is_ok());
    assert!(request("https://example.com/deep/path?q=1").validate().is_ok());
}

#[test]
fn test_ftp_scheme_rejected() {
    let err = request("ftp://example.com/file").validate().unwrap_err();
    match err {
        CaptureError::UnsupportedScheme { scheme } => assert_eq!(scheme, "ftp"),
        other => panic!("expected UnsupportedScheme, got {other:?}"),
    }
}

#[test]
fn test_file_and_javascript_schemes_rejected() {
    assert!(matches!(
        request("file:///etc/passwd").validate(),
        Err(CaptureError::UnsupportedScheme { .. })
    ));
    assert!(matches!(
        request("javascript:alert(1)").validate(),
        Err(CaptureError::UnsupportedScheme { .. })
    ));
}

#[test]
fn test_unparseable_url_rejected() {
    assert!(matches!(
        request("not a url at all").validate(),
        Err(CaptureError::InvalidUrl { .. })
    ));
}

#[test]
fn test_wait_until_from_str() {
    assert_eq!("load".parse::<WaitUntil>().unwrap(), WaitUntil::Load);
    assert_eq!(
        "domcontentloaded".parse::<WaitUntil>().unwrap(),
        WaitUntil::DomContentLoaded
    );
    assert_eq!(
        "networkidle".parse::<WaitUntil>().unwrap(),
        WaitUntil::NetworkIdle
    );
    assert!("network-idle".parse::<WaitUntil>().is_err());
}

#[test]
fn test_wait_until_display_roundtrip() {
    for strategy in [
        WaitUntil::Load,
        WaitUntil::DomContentLoaded,
        WaitUntil::NetworkIdle,
    ] {
        assert_eq!(strategy.to_string().parse::<WaitUntil>().unwrap(), strategy);
    }
}

#[test]
fn test_request_deserialization_defaults() {
    let request: CaptureRequest =
        serde_json::from_value(serde_json::json!({"url": "https://example.com"})).unwrap();
    assert_eq!(request.viewport_width, 1440);
    assert_eq!(request.wait_until, WaitUntil::Load);
    assert_eq!(request.delay_ms, 0);
    assert_eq!(request.timeout_ms, 30_000);
}

#[test]
fn test_request_deserialization_explicit() {
    let request: CaptureRequest = serde_json::from_value(serde_json::json!({
        "url": "https://example.com",
        "viewport_width": 1024,
        "wait_until": "networkidle",
        "delay_ms": 250,
        "timeout_ms": 60_000,
    }))
    .unwrap();
    assert_eq!(request.viewport_width, 1024);
    assert_eq!(request.wait_until, WaitUntil::NetworkIdle);
    assert_eq!(request.delay_ms, 250);
}

#[test]
fn test_result_debug_elides_image_bytes() {
    let result = CaptureResult {
        image: vec![0; 4096],
        page_width: 1440,
        page_height: 900,
        url: "https://example.com".to_string(),
        segments_stitched: None,
    };
    let debug = format!("{result:?}");
    assert!(debug.contains("image_bytes: 4096"));
    assert!(!debug.contains("[0, 0"));
}
