/// Character-cell presentation of rendered frames
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use sr3d_core::FrameBuffer;
use std::io::Write;

/// Character luminosity ramp (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Glyph for a packed RGBA pixel, picked by perceptual luma.
fn glyph(rgba: u32) -> char {
    let r = (rgba >> 24) as u8 as f32;
    let g = (rgba >> 16) as u8 as f32;
    let b = (rgba >> 8) as u8 as f32;
    let luma = (0.2126 * r + 0.7152 * g + 0.0722 * b) / 255.0;

    let index = (luma * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
    LUMINOSITY_RAMP[index.min(LUMINOSITY_RAMP.len() - 1)]
}

/// Draw the frame buffer as one colored character per pixel, row by row
/// from the top-left origin.
pub fn present<W: Write>(frame_buffer: &FrameBuffer, writer: &mut W) -> std::io::Result<()> {
    for y in 0..frame_buffer.height {
        for x in 0..frame_buffer.width {
            let rgba = frame_buffer.color_buffer[frame_buffer.index(x, y)];
            let color = Color::Rgb {
                r: (rgba >> 24) as u8,
                g: (rgba >> 16) as u8,
                b: (rgba >> 8) as u8,
            };
            writer.queue(SetForegroundColor(color))?;
            writer.queue(Print(glyph(rgba)))?;
        }
        writer.queue(Print('\n'))?;
    }
    writer.queue(ResetColor)?;
    Ok(())
}
