//! Screenshot capture and scroll-stitching.
//!
//! Pages within the browser's single-capture ceiling are shot once.
//! Taller pages are captured as vertically-offset segments, strictly
//! sequentially because each capture depends on the scroll position set
//! just before it, then composited onto one canvas.

use std::io::Cursor;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{DynamicImage, ImageFormat, RgbaImage, imageops};
use serde_json::{Value, json};
use tracing::debug;

use crate::client::CdpClient;
use crate::error::CaptureError;
use crate::protocol::Viewport;

/// Tallest image the browser will produce in one capture.
pub(crate) const CAPTURE_HEIGHT_CEILING: u32 = 16_384;

/// Absolute page-height ceiling; bounds the composite canvas.
pub(crate) const MAX_PAGE_HEIGHT: u32 = 50_000;

/// Pause after each scroll so rendering catches up before the capture.
const SCROLL_SETTLE: Duration = Duration::from_millis(200);

/// One planned slice of a tall page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SegmentPlan {
    pub offset: u32,
    pub height: u32,
}

/// One captured slice, discarded after compositing.
struct Segment {
    bytes: Vec<u8>,
    offset: u32,
}

/// Measured page content size.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PageSize {
    pub width: u32,
    pub height: u32,
}

/// Engine output handed back to the lifecycle controller.
pub(crate) struct CapturedPage {
    pub image: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub segments_stitched: Option<u32>,
}

/// Slice a page into ceiling-sized segments plus a shorter remainder.
/// An exact multiple of the ceiling yields no remainder segment.
pub(crate) fn plan_segments(page_height: u32, ceiling: u32) -> Vec<SegmentPlan> {
    let mut segments = Vec::new();
    let mut offset = 0;
    while offset < page_height {
        let height = ceiling.min(page_height - offset);
        segments.push(SegmentPlan { offset, height });
        offset += height;
    }
    segments
}

/// Fail before any screenshot command when the page is beyond stitching.
pub(crate) fn check_page_height(height: u32) -> Result<(), CaptureError> {
    if height > MAX_PAGE_HEIGHT {
        return Err(CaptureError::PageTooTall {
            height,
            limit: MAX_PAGE_HEIGHT,
        });
    }
    Ok(())
}

/// Read the page's content size from layout metrics.
pub(crate) async fn content_size(client: &CdpClient) -> Result<PageSize, CaptureError> {
    let metrics = client.call("Page.getLayoutMetrics", None).await?;
    let size = metrics
        .get("cssContentSize")
        .or_else(|| metrics.get("contentSize"))
        .ok_or_else(|| {
            CaptureError::InvalidResponse("layout metrics carried no content size".to_string())
        })?;
    let width = dimension(size, "width")?;
    let height = dimension(size, "height")?;
    Ok(PageSize { width, height })
}

fn dimension(size: &Value, field: &str) -> Result<u32, CaptureError> {
    size.get(field)
        .and_then(Value::as_f64)
        .map(|v| v.ceil() as u32)
        .ok_or_else(|| {
            CaptureError::InvalidResponse(format!("content size missing '{field}'"))
        })
}

/// Capture the full page, single-shot or stitched.
pub(crate) async fn capture_page(
    client: &CdpClient,
    viewport_width: u32,
) -> Result<CapturedPage, CaptureError> {
    let size = content_size(client).await?;
    debug!(width = size.width, height = size.height, "measured page");
    check_page_height(size.height)?;

    if size.height <= CAPTURE_HEIGHT_CEILING {
        let image = screenshot_full(client).await?;
        return Ok(CapturedPage {
            image,
            width: size.width,
            height: size.height,
            segments_stitched: None,
        });
    }

    let plan = plan_segments(size.height, CAPTURE_HEIGHT_CEILING);
    debug!(segments = plan.len(), "stitching tall page");

    let mut segments = Vec::with_capacity(plan.len());
    for slice in &plan {
        client
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": format!("window.scrollTo(0, {})", slice.offset),
                })),
            )
            .await?;
        tokio::time::sleep(SCROLL_SETTLE).await;
        let bytes = screenshot_clip(client, slice.offset, viewport_width, slice.height).await?;
        segments.push(Segment {
            bytes,
            offset: slice.offset,
        });
    }

    let image = composite(&segments, viewport_width, size.height)?;
    // Segments are clipped to the viewport width, but the reported width
    // is always the measured content width, same as the single-shot path.
    Ok(CapturedPage {
        image,
        width: size.width,
        height: size.height,
        segments_stitched: Some(plan.len() as u32),
    })
}

async fn screenshot_full(client: &CdpClient) -> Result<Vec<u8>, CaptureError> {
    let result = client
        .call(
            "Page.captureScreenshot",
            Some(json!({
                "format": "png",
                "captureBeyondViewport": true,
            })),
        )
        .await?;
    decode_screenshot(&result)
}

async fn screenshot_clip(
    client: &CdpClient,
    offset: u32,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, CaptureError> {
    let clip = Viewport {
        x: 0.0,
        y: f64::from(offset),
        width: f64::from(width),
        height: f64::from(height),
        scale: 1.0,
    };
    let result = client
        .call(
            "Page.captureScreenshot",
            Some(json!({
                "format": "png",
                "captureBeyondViewport": true,
                "clip": clip,
            })),
        )
        .await?;
    decode_screenshot(&result)
}

fn decode_screenshot(result: &Value) -> Result<Vec<u8>, CaptureError> {
    let data = result
        .get("data")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            CaptureError::InvalidResponse("screenshot reply carried no data".to_string())
        })?;
    BASE64.decode(data).map_err(|e| {
        CaptureError::InvalidResponse(format!("screenshot payload was not valid base64: {e}"))
    })
}

/// Composite segments onto a blank canvas at their recorded offsets and
/// re-encode as one PNG.
fn composite(segments: &[Segment], width: u32, height: u32) -> Result<Vec<u8>, CaptureError> {
    let mut canvas = RgbaImage::new(width, height);
    for segment in segments {
        let tile = image::load_from_memory(&segment.bytes)?.to_rgba8();
        imageops::replace(&mut canvas, &tile, 0, i64::from(segment.offset));
    }

    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(canvas).write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

#[cfg(test)]
#[path = "screenshot_tests.rs"]
mod tests;
