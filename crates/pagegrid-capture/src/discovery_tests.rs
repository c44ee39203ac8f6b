use super::*;

#[test]
fn test_json_list_url_from_browser_socket() {
    let url =
        json_list_url("ws://127.0.0.1:33445/devtools/browser/11fe3c-aa91").unwrap();
    assert_eq!(url, "http://127.0.0.1:33445/json");
}

#[test]
fn test_json_list_url_rejects_garbage() {
    assert!(matches!(
        json_list_url("not a socket url"),
        Err(CaptureError::InvalidUrl { .. })
    ));
}

#[test]
fn test_endpoint_line_pattern() {
    let captures = ENDPOINT_LINE
        .captures("DevTools listening on ws://127.0.0.1:41573/devtools/browser/f0a2")
        .unwrap();
    assert_eq!(&captures[1], "ws://127.0.0.1:41573/devtools/browser/f0a2");
    assert!(ENDPOINT_LINE.captures("some unrelated stderr noise").is_none());
}

#[cfg(unix)]
mod stderr_scan {
    use std::process::Stdio;
    use std::time::Duration;

    use tokio::process::Command;

    use super::super::*;

    fn spawn_sh(script: &str) -> tokio::process::Child {
        Command::new("sh")
            .arg("-c")
            .arg(script)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .expect("sh is available")
    }

    #[tokio::test]
    async fn test_endpoint_found_in_stderr() {
        let mut child = spawn_sh(
            "echo noise 1>&2; \
             echo 'DevTools listening on ws://127.0.0.1:9222/devtools/browser/abc' 1>&2",
        );
        let stderr = child.stderr.take().unwrap();
        let endpoint = wait_for_endpoint(stderr, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(endpoint, "ws://127.0.0.1:9222/devtools/browser/abc");
        let _ = child.wait().await;
    }

    #[tokio::test]
    async fn test_stderr_eof_without_endpoint() {
        let mut child = spawn_sh("echo 'no endpoint here' 1>&2");
        let stderr = child.stderr.take().unwrap();
        let err = wait_for_endpoint(stderr, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::LaunchFailed(_)));
        let _ = child.wait().await;
    }

    #[tokio::test]
    async fn test_scan_times_out_on_silent_process() {
        let mut child = spawn_sh("sleep 5");
        let stderr = child.stderr.take().unwrap();
        let err = wait_for_endpoint(stderr, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::StartupTimeout { .. }));
        let _ = child.kill().await;
    }
}
