// Draws the status strip under a camera frame

use crate::error::{KioskError, Result};
use crate::models::Frame;
use crate::presentation::StatusStrip;
use opencv::core::{self, Mat, Point, Scalar, Vector, CV_8UC3};
use opencv::imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8};
use opencv::prelude::*;

/// Height of the strip appended below the image
pub const STRIP_HEIGHT: u32 = 40;

/// Room reserved for the products label at the right edge
const PRODUCTS_TEXT_WIDTH: i32 = 300;

/// Returns a copy of `frame` with the status strip stacked underneath
pub fn annotate(frame: &Frame, strip: &StatusStrip) -> Result<Frame> {
    let image = Mat::from_slice(&frame.data)
        .map_err(|e| KioskError::FrameProcessing(format!("Failed to create Mat: {e}")))?;
    let image = image
        .reshape(3, frame.height as i32)
        .map_err(|e| KioskError::FrameProcessing(format!("Failed to reshape Mat: {e}")))?;

    let bar = Mat::new_rows_cols_with_default(
        STRIP_HEIGHT as i32,
        frame.width as i32,
        CV_8UC3,
        Scalar::all(240.0),
    )?;

    let mut parts = Vector::<Mat>::new();
    parts.push(image.try_clone()?);
    parts.push(bar);
    let mut combined = Mat::default();
    core::vconcat(&parts, &mut combined)?;

    let baseline = frame.height as i32 + 25;
    let ink = Scalar::new(33.0, 33.0, 33.0, 0.0);
    imgproc::put_text(
        &mut combined,
        &strip.emotion,
        Point::new(10, baseline),
        FONT_HERSHEY_SIMPLEX,
        0.7,
        ink,
        2,
        LINE_8,
        false,
    )?;
    imgproc::put_text(
        &mut combined,
        &strip.products,
        Point::new((frame.width as i32 - PRODUCTS_TEXT_WIDTH).max(10), baseline),
        FONT_HERSHEY_SIMPLEX,
        0.6,
        ink,
        2,
        LINE_8,
        false,
    )?;

    let data = combined.data_bytes()?.to_vec();
    Ok(Frame::new(data, frame.width, frame.height + STRIP_HEIGHT))
}
