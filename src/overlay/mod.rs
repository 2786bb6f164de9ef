//! Overlay composition.
//!
//! Layers are drawn in a fixed order: header band, confidence bar, probability
//! breakdown, FPS, watermark. Each semi-transparent band is blended before the opaque
//! content that sits on top of it.

mod draw;
mod text;

use crate::frame::{Color, Frame};
use crate::labels::{DisplayTable, LabelSet};
use crate::result::ClassificationResult;

pub use draw::{blend_rect, fill_rect, outline_rect};
pub use text::{draw_text, text_height, text_width};

const MARGIN: i32 = 10;
const HEADER_SCALE: u32 = 2;
const HEADER_LINE_GAP: i32 = 12;
const HEADER_LINES: i32 = 3;
const BAR_HEIGHT: i32 = 20;
const BAR_BOTTOM_GAP: i32 = 10;
const BAR_OUTLINE: i32 = 2;
const ROW_HEIGHT: i32 = 30;
const ROW_BAR_HEIGHT: i32 = 20;
const ROW_TRACK: f32 = 300.0;
const ROW_TEXT_X: i32 = 320;
const ROW_SCALE: u32 = 1;
const FPS_SCALE: u32 = 2;
const WATERMARK_SCALE: u32 = 1;

/// Opacity and optional extras for the overlay.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayStyle {
    pub header_opacity: f32,
    pub breakdown_opacity: f32,
    pub watermark: Option<String>,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            header_opacity: 0.6,
            breakdown_opacity: 0.4,
            watermark: None,
        }
    }
}

/// Draws classification results onto frames.
#[derive(Clone, Debug)]
pub struct OverlayRenderer {
    labels: LabelSet,
    table: DisplayTable,
    style: OverlayStyle,
}

impl OverlayRenderer {
    pub fn new(labels: LabelSet, table: DisplayTable, style: OverlayStyle) -> Self {
        Self {
            labels,
            table,
            style,
        }
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    /// Full composition for one iteration.
    pub fn render(
        &self,
        frame: &mut Frame,
        result: &ClassificationResult,
        show_probabilities: bool,
        fps: f64,
    ) {
        self.render_prediction(frame, result);
        if show_probabilities {
            self.render_probabilities(frame, result);
        }
        self.render_fps(frame, fps);
        self.render_watermark(frame);
    }

    /// Height of the header band holding label, confidence and status lines.
    pub fn header_height() -> i32 {
        let line = text_height(HEADER_SCALE) as i32;
        MARGIN * 2 + line * HEADER_LINES + HEADER_LINE_GAP * (HEADER_LINES - 1)
    }

    /// Header band plus bottom confidence bar.
    pub fn render_prediction(&self, frame: &mut Frame, result: &ClassificationResult) {
        let entry = self.table.lookup(&result.label);
        let width = frame.width() as i32;
        let height = frame.height() as i32;
        let black = frame.paint(Color::BLACK);
        let label_color = frame.paint(entry.color);
        let white = frame.paint(Color::WHITE);
        let status_color = frame.paint(entry.status.status_color());
        let line = text_height(HEADER_SCALE) as i32 + HEADER_LINE_GAP;

        let img = frame.pixels_mut();
        blend_rect(
            img,
            0,
            0,
            width,
            Self::header_height(),
            black,
            self.style.header_opacity,
        );
        draw_text(img, MARGIN, MARGIN, HEADER_SCALE, label_color, &entry.text);
        draw_text(
            img,
            MARGIN,
            MARGIN + line,
            HEADER_SCALE,
            white,
            &format!("Confidence: {:.1}%", result.confidence),
        );
        draw_text(
            img,
            MARGIN,
            MARGIN + 2 * line,
            HEADER_SCALE,
            status_color,
            entry.status.status_text(),
        );

        let track = width - 2 * MARGIN;
        if track <= 0 {
            return;
        }
        let bar_y = height - BAR_BOTTOM_GAP - BAR_HEIGHT;
        let fill = confidence_fill(result.confidence, track);
        fill_rect(img, MARGIN, bar_y, fill, BAR_HEIGHT, label_color);
        outline_rect(img, MARGIN, bar_y, track, BAR_HEIGHT, BAR_OUTLINE, white);
    }

    /// Per-label bars in label-set order. Every label gets a row, including near-zero ones.
    pub fn render_probabilities(&self, frame: &mut Frame, result: &ClassificationResult) {
        let width = frame.width() as i32;
        let top = Self::header_height() + MARGIN;
        let rows = self.labels.len() as i32;
        let black = frame.paint(Color::BLACK);
        let white = frame.paint(Color::WHITE);
        let rows_painted: Vec<_> = self
            .labels
            .iter()
            .enumerate()
            .map(|(idx, label)| {
                let entry = self.table.lookup(label);
                let prob = result.probabilities.get(idx).copied().unwrap_or(0.0);
                (entry.text, frame.paint(entry.color), prob)
            })
            .collect();

        let img = frame.pixels_mut();
        blend_rect(
            img,
            0,
            top,
            width,
            rows * ROW_HEIGHT + MARGIN,
            black,
            self.style.breakdown_opacity,
        );

        let text_offset = (ROW_BAR_HEIGHT - text_height(ROW_SCALE) as i32) / 2;
        for (row, (text, color, prob)) in rows_painted.into_iter().enumerate() {
            let y = top + MARGIN + row as i32 * ROW_HEIGHT;
            let prob = if prob.is_finite() {
                prob.clamp(0.0, 1.0)
            } else {
                0.0
            };
            let bar = (prob * ROW_TRACK).round() as i32;
            fill_rect(img, MARGIN, y, bar, ROW_BAR_HEIGHT, color);
            draw_text(
                img,
                ROW_TEXT_X,
                y + text_offset,
                ROW_SCALE,
                white,
                &format!("{}: {:.1}%", text, prob * 100.0),
            );
        }
    }

    /// FPS readout in the top-right corner.
    pub fn render_fps(&self, frame: &mut Frame, fps: f64) {
        let fps = if fps.is_finite() { fps.max(0.0) } else { 0.0 };
        let text = format!("FPS: {:.1}", fps);
        let x = frame.width() as i32 - text_width(&text, FPS_SCALE) as i32 - MARGIN;
        let color = frame.paint(Color::YELLOW);
        draw_text(frame.pixels_mut(), x, MARGIN, FPS_SCALE, color, &text);
    }

    /// Optional watermark above the confidence bar, bottom-right.
    pub fn render_watermark(&self, frame: &mut Frame) {
        let Some(text) = self.style.watermark.as_deref() else {
            return;
        };
        if text.is_empty() {
            return;
        }
        let tw = text_width(text, WATERMARK_SCALE) as i32;
        let th = text_height(WATERMARK_SCALE) as i32;
        let x = frame.width() as i32 - tw - MARGIN;
        let y = frame.height() as i32 - BAR_BOTTOM_GAP - BAR_HEIGHT - MARGIN - th;
        let black = frame.paint(Color::BLACK);
        let white = frame.paint(Color::WHITE);
        let img = frame.pixels_mut();
        blend_rect(img, x - 5, y - 5, tw + 10, th + 10, black, 0.3);
        draw_text(img, x, y, WATERMARK_SCALE, white, text);
    }
}

/// Filled width of a `track`-pixel bar for a confidence percentage.
pub fn confidence_fill(confidence: f32, track: i32) -> i32 {
    if track <= 0 || !confidence.is_finite() {
        return 0;
    }
    let ratio = (confidence / 100.0).clamp(0.0, 1.0);
    (ratio * track as f32).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ChannelOrder;
    use crate::labels::{default_display_entries, StatusCategory, DEFAULT_LABELS};

    fn renderer(style: OverlayStyle) -> OverlayRenderer {
        let labels = LabelSet::new(DEFAULT_LABELS).unwrap();
        let table =
            DisplayTable::new(&labels, default_display_entries(), "", Color::WHITE).unwrap();
        OverlayRenderer::new(labels, table, style)
    }

    fn gray_frame(width: u32, height: u32) -> Frame {
        Frame::from_raw(
            width,
            height,
            vec![120; (width * height * 3) as usize],
            ChannelOrder::Bgr,
        )
        .unwrap()
    }

    fn result(probabilities: Vec<f32>, index: usize) -> ClassificationResult {
        ClassificationResult {
            index,
            label: DEFAULT_LABELS[index].to_string(),
            confidence: probabilities[index] * 100.0,
            status: StatusCategory::from_label(DEFAULT_LABELS[index]),
            probabilities,
        }
    }

    #[test]
    fn fill_scales_linearly() {
        assert_eq!(confidence_fill(0.0, 200), 0);
        assert_eq!(confidence_fill(50.0, 200), 100);
        assert_eq!(confidence_fill(100.0, 200), 200);
        assert_eq!(confidence_fill(150.0, 200), 200);
        assert_eq!(confidence_fill(f32::NAN, 200), 0);
        assert_eq!(confidence_fill(40.0, 0), 0);
    }

    #[test]
    fn header_is_darkened_not_replaced() {
        let renderer = renderer(OverlayStyle::default());
        let mut frame = gray_frame(640, 480);
        renderer.render_prediction(&mut frame, &result(vec![0.0, 0.0, 1.0, 0.0, 0.0, 0.0], 2));
        // Far right of the header row, away from any text: 120 * 0.4 = 48.
        let px = frame.pixels().get_pixel(600, OverlayRenderer::header_height() as u32 - 2);
        assert_eq!(px.0, [48, 48, 48]);
    }

    #[test]
    fn degenerate_distributions_render() {
        let renderer = renderer(OverlayStyle::default());
        for probs in [vec![0.0; 6], vec![1.0 / 6.0; 6]] {
            let mut frame = gray_frame(320, 240);
            renderer.render(&mut frame, &result(probs, 0), true, 0.0);
        }
    }

    #[test]
    fn tiny_frames_do_not_panic() {
        let renderer = renderer(OverlayStyle {
            watermark: Some("Fruit Ripeness".to_string()),
            ..OverlayStyle::default()
        });
        for (w, h) in [(1, 1), (8, 8), (19, 29), (40, 12)] {
            let mut frame = gray_frame(w, h);
            renderer.render(
                &mut frame,
                &result(vec![0.1, 0.1, 0.5, 0.1, 0.1, 0.1], 2),
                true,
                f64::NAN,
            );
        }
    }

    #[test]
    fn full_confidence_fills_track() {
        let renderer = renderer(OverlayStyle::default());
        let mut frame = gray_frame(200, 200);
        renderer.render_prediction(&mut frame, &result(vec![0.0, 0.0, 1.0, 0.0, 0.0, 0.0], 2));
        // Ripe apple is green; the frame is BGR so green stays in the middle channel.
        let inside = frame.pixels().get_pixel(185, 200 - 20);
        assert_eq!(inside.0, [0, 255, 0]);
    }

    #[test]
    fn breakdown_toggle_changes_output() {
        let renderer = renderer(OverlayStyle::default());
        let r = result(vec![0.05, 0.05, 0.7, 0.1, 0.05, 0.05], 2);
        let mut with = gray_frame(640, 480);
        let mut without = gray_frame(640, 480);
        renderer.render(&mut with, &r, true, 12.0);
        renderer.render(&mut without, &r, false, 12.0);
        assert_ne!(with, without);
    }
}
