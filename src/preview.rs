//! Chart preview: chips drawn as lane/time rectangles, pages side by side

use crate::compiler::chip::Chip;
use crate::compiler::Compilation;
use crate::error::Result;
use image::{DynamicImage, ImageFormat, Rgb, Rgba, RgbaImage};
use std::io::Cursor;

pub const MEASURES_PER_PAGE: u32 = 10;
pub const PAGE_WIDTH: u32 = 128;
pub const PAGE_HEIGHT: u32 = 1024;
/// Horizontal extent in lane units: lanes 1..=10 centred in 0..11
pub const LANE_SPAN: f64 = 11.0;

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);
const MEASURE_LINE: Rgba<u8> = Rgba([128, 128, 128, 255]);
const OUTLINE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const DASH: u32 = 4;

fn lane_color(lane: u32) -> Rgb<u8> {
    match lane {
        1 | 7 => Rgb([255, 0, 0]),
        2 | 9 | 10 => Rgb([135, 206, 235]),
        3 => Rgb([255, 192, 203]),
        4 => Rgb([255, 255, 0]),
        5 => Rgb([144, 238, 144]),
        6 => Rgb([238, 130, 238]),
        8 => Rgb([255, 165, 0]),
        _ => Rgb([255, 255, 255]),
    }
}

/// Blend `color` at `velocity / 127` opacity over the black background
fn chip_fill(lane: u32, velocity: u8) -> Rgba<u8> {
    let alpha = f64::from(velocity.min(127)) / 127.0;
    let Rgb([r, g, b]) = lane_color(lane);
    let blend = |c: u8| (f64::from(c) * alpha).round() as u8;
    Rgba([blend(r), blend(g), blend(b), 255])
}

fn page_count(chips: &[Chip]) -> u32 {
    chips
        .iter()
        .map(|c| c.measure.saturating_sub(1) / MEASURES_PER_PAGE + 1)
        .max()
        .unwrap_or(1)
}

fn lane_x(lane: f64) -> u32 {
    (lane * f64::from(PAGE_WIDTH) / LANE_SPAN).round() as u32
}

/// Pixel row of a measure position within a page; time runs upward
fn page_y(position: f64) -> f64 {
    f64::from(PAGE_HEIGHT) * (1.0 - position / f64::from(MEASURES_PER_PAGE))
}

fn draw_measure_lines(img: &mut RgbaImage, page: u32) {
    let x0 = page * PAGE_WIDTH;
    for m in 0..=MEASURES_PER_PAGE {
        let y = (page_y(f64::from(m)).round() as u32).min(PAGE_HEIGHT - 1);
        for x in (0..PAGE_WIDTH).filter(|x| (x / DASH) % 2 == 0) {
            img.put_pixel(x0 + x, y, MEASURE_LINE);
        }
    }
}

fn draw_chip(img: &mut RgbaImage, chip: &Chip, lane: u32) {
    let page = (chip.measure.saturating_sub(1)) / MEASURES_PER_PAGE;
    let position = f64::from(chip.measure.saturating_sub(1) - page * MEASURES_PER_PAGE)
        + f64::from(chip.slot) / f64::from(chip.resolution.max(1));
    let slot_height = 1.0 / f64::from(chip.resolution.max(1));

    let x0 = page * PAGE_WIDTH + lane_x(f64::from(lane) - 0.5);
    let x1 = (page * PAGE_WIDTH + lane_x(f64::from(lane) + 0.5)).min(img.width());
    let y1 = (page_y(position).round() as u32).min(PAGE_HEIGHT);
    let y0 = (page_y(position + slot_height).round() as u32).min(y1.saturating_sub(1));
    if x1 <= x0 {
        return;
    }

    let fill = chip_fill(lane, chip.velocity);
    for y in y0..y1 {
        for x in x0..x1 {
            let edge = x == x0 || x + 1 == x1 || y == y0 || y + 1 == y1;
            img.put_pixel(x, y, if edge { OUTLINE } else { fill });
        }
    }
}

/// Rasterize chips; chips on control channels have no lane and are skipped
pub fn render(chips: &[Chip]) -> RgbaImage {
    let pages = page_count(chips);
    let mut img = RgbaImage::from_pixel(pages * PAGE_WIDTH, PAGE_HEIGHT, BACKGROUND);

    for page in 0..pages {
        draw_measure_lines(&mut img, page);
    }
    for chip in chips {
        if let Some(lane) = chip.channel.lane() {
            draw_chip(&mut img, chip, lane);
        }
    }
    img
}

/// Render a compilation's chips and encode them as PNG
pub fn render_png(compilation: &Compilation) -> Result<Vec<u8>> {
    let img = render(&compilation.chips);
    let mut data = Vec::new();
    DynamicImage::ImageRgba8(img).write_to(&mut Cursor::new(&mut data), ImageFormat::Png)?;
    Ok(data)
}
