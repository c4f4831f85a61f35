//! Timing text burned into frames with a small built-in bitmap font.

use video_ingest::Frame;

use crate::bench::config::OverlayStyle;

/// Each glyph pixel becomes a `SCALE`x`SCALE` block.
const SCALE: i32 = 3;
const GLYPH_ROWS: i32 = 7;
const GLYPH_COLS: i32 = 5;
const ADVANCE: i32 = (GLYPH_COLS + 1) * SCALE;

/// Baseline-left origin of each overlay line.
const LINE_ORIGINS: [(i32, i32); 2] = [(10, 30), (10, 70)];

/// Text lines drawn for one frame.
pub fn overlay_lines(style: &OverlayStyle, fps: f64, inference_ms: f64) -> Vec<String> {
    let mut lines = vec![format!("{}: {fps:.2}", style.fps_label)];
    if let Some(label) = style.inference_label {
        lines.push(format!("{label}: {inference_ms:.2} ms"));
    }
    lines
}

/// Draw the FPS (and optionally inference time) lines onto a BGR frame.
pub fn draw_overlay(frame: &mut Frame, style: &OverlayStyle, fps: f64, inference_ms: f64) {
    for (line, (x, baseline)) in overlay_lines(style, fps, inference_ms)
        .iter()
        .zip(LINE_ORIGINS)
    {
        draw_text(frame, x, baseline, line, style.color);
    }
}

fn draw_text(frame: &mut Frame, mut x: i32, baseline: i32, text: &str, color: [u8; 3]) {
    let top = baseline - GLYPH_ROWS * SCALE;
    for ch in text.chars().flat_map(|c| c.to_uppercase()) {
        if let Some(glyph) = glyph_bits(ch) {
            for (row, pattern) in glyph.iter().enumerate() {
                for col in 0..GLYPH_COLS {
                    if (pattern >> (GLYPH_COLS - 1 - col)) & 1 == 1 {
                        fill_block(frame, x + col * SCALE, top + row as i32 * SCALE, color);
                    }
                }
            }
        }
        x += ADVANCE;
    }
}

fn fill_block(frame: &mut Frame, left: i32, top: i32, color: [u8; 3]) {
    for y in top.max(0)..(top + SCALE).min(frame.height) {
        for x in left.max(0)..(left + SCALE).min(frame.width) {
            let offset = ((y * frame.width + x) * 3) as usize;
            if let Some(px) = frame.data.get_mut(offset..offset + 3) {
                px.copy_from_slice(&color);
            }
        }
    }
}

/// 5x7 glyphs, one row per byte, most significant of the low five bits on
/// the left. Lookups are upper-cased first.
const FONT: [(char, [u8; 7]); 28] = [
    ('A', [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11]),
    ('C', [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E]),
    ('E', [0x1F, 0x10, 0x1E, 0x10, 0x10, 0x10, 0x1F]),
    ('F', [0x1F, 0x10, 0x1E, 0x10, 0x10, 0x10, 0x10]),
    ('H', [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11]),
    ('I', [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E]),
    ('L', [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F]),
    ('M', [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11]),
    ('N', [0x11, 0x19, 0x15, 0x15, 0x13, 0x11, 0x11]),
    ('O', [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E]),
    ('P', [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10]),
    ('R', [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11]),
    ('S', [0x0F, 0x10, 0x0E, 0x01, 0x01, 0x11, 0x0E]),
    ('T', [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04]),
    ('0', [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E]),
    ('1', [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E]),
    ('2', [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F]),
    ('3', [0x1E, 0x01, 0x01, 0x0E, 0x01, 0x01, 0x1E]),
    ('4', [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02]),
    ('5', [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E]),
    ('6', [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E]),
    ('7', [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08]),
    ('8', [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E]),
    ('9', [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C]),
    (':', [0x00, 0x06, 0x06, 0x00, 0x06, 0x06, 0x00]),
    ('.', [0x00, 0x00, 0x00, 0x00, 0x00, 0x06, 0x06]),
    (' ', [0x00; 7]),
    ('-', [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00]),
];

fn glyph_bits(ch: char) -> Option<[u8; 7]> {
    FONT.iter()
        .find(|(key, _)| *key == ch)
        .map(|(_, rows)| *rows)
}
