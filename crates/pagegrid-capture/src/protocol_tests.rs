use serde_json::{Value, json};

use super::*;

#[test]
fn test_request_serialization() {
    let request = CdpRequest {
        id: 7,
        method: "Page.navigate".to_string(),
        params: Some(json!({"url": "https://example.com"})),
    };
    let value = serde_json::to_value(&request).unwrap();
    assert_eq!(value["id"], 7);
    assert_eq!(value["method"], "Page.navigate");
    assert_eq!(value["params"]["url"], "https://example.com");
}

#[test]
fn test_request_serialization_omits_missing_params() {
    let request = CdpRequest {
        id: 1,
        method: "Page.enable".to_string(),
        params: None,
    };
    let value = serde_json::to_value(&request).unwrap();
    assert!(value.get("params").is_none());
}

#[test]
fn test_reply_with_result() {
    let message: CdpMessage = serde_json::from_value(json!({
        "id": 3,
        "result": {"frameId": "abc"},
    }))
    .unwrap();
    assert_eq!(message.id, Some(3));
    assert_eq!(message.result.unwrap()["frameId"], "abc");
    assert!(message.error.is_none());
}

#[test]
fn test_reply_with_error() {
    let message: CdpMessage = serde_json::from_value(json!({
        "id": 4,
        "error": {"code": -32601, "message": "Method not found"},
    }))
    .unwrap();
    let error = message.error.unwrap();
    assert_eq!(error.code, -32601);
    assert_eq!(error.message, "Method not found");
}

#[test]
fn test_event_extraction() {
    let message: CdpMessage = serde_json::from_value(json!({
        "method": "Page.loadEventFired",
        "params": {"timestamp": 12345.6},
    }))
    .unwrap();
    let event = message.into_event().unwrap();
    assert_eq!(event.method, "Page.loadEventFired");
    assert_eq!(event.params["timestamp"], 12345.6);
}

#[test]
fn test_event_without_params_defaults_to_null() {
    let message: CdpMessage =
        serde_json::from_value(json!({"method": "Page.domContentEventFired"})).unwrap();
    assert_eq!(message.into_event().unwrap().params, Value::Null);
}

#[test]
fn test_reply_is_not_an_event() {
    // A message carrying an id is a command reply even if it also names
    // a method.
    let message: CdpMessage = serde_json::from_value(json!({
        "id": 9,
        "method": "Page.navigate",
        "result": {},
    }))
    .unwrap();
    assert!(message.into_event().is_none());
}

#[test]
fn test_target_entry_deserialization() {
    let targets: Vec<TargetEntry> = serde_json::from_value(json!([
        {
            "type": "background_page",
            "url": "chrome-extension://something",
            "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/page/bg"
        },
        {
            "type": "page",
            "url": "about:blank",
            "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/page/abc"
        }
    ]))
    .unwrap();
    let page = targets.iter().find(|t| t.target_type == "page").unwrap();
    assert_eq!(
        page.web_socket_debugger_url.as_deref(),
        Some("ws://127.0.0.1:9222/devtools/page/abc")
    );
}

#[test]
fn test_viewport_serialization() {
    let clip = Viewport {
        x: 0.0,
        y: 16_384.0,
        width: 1440.0,
        height: 120.0,
        scale: 1.0,
    };
    let value = serde_json::to_value(&clip).unwrap();
    assert_eq!(value["y"], 16_384.0);
    assert_eq!(value["scale"], 1.0);
}
