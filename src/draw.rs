use std::fmt;

use image::{buffer::ConvertBuffer, Rgb, RgbImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};

use crate::boxes::BoxProposal;
use crate::pipeline::{edges_to_gray, EdgeMap};

const RED: Rgb<u8> = Rgb([255, 0, 0]);
const GREEN: Rgb<u8> = Rgb([0, 255, 0]);

/// Min, mean and max of a set of box scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreStats {
    pub min: f32,
    pub average: f32,
    pub max: f32,
}

impl ScoreStats {
    /// `None` when there is nothing to summarise.
    pub fn from_scores(scores: &[f32]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }
        let min = scores.iter().copied().fold(f32::INFINITY, f32::min);
        let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let average = scores.iter().sum::<f32>() / scores.len() as f32;
        Some(Self { min, average, max })
    }

    /// Boxes scoring at or above this are highlighted.
    pub fn highlight_threshold(&self) -> f32 {
        self.max - self.average / 2.0
    }
}

impl fmt::Display for ScoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stats: min={}, average={}, max={}.",
            self.min, self.average, self.max
        )
    }
}

/// Renders an edge map as an RGB canvas for [`draw_boxes`].
pub fn edge_canvas(edges: &EdgeMap) -> RgbImage {
    edges_to_gray(edges).convert()
}

/// Draws every box onto `canvas`: thin red below the highlight threshold,
/// thick green otherwise. Returns the score statistics, or `None` (and draws
/// nothing) when `boxes` is empty.
pub fn draw_boxes(canvas: &mut RgbImage, boxes: &[BoxProposal]) -> Option<ScoreStats> {
    let scores: Vec<f32> = boxes.iter().map(|b| b.score).collect();
    let stats = ScoreStats::from_scores(&scores)?;
    let threshold = stats.highlight_threshold();

    for b in boxes {
        let (color, thickness) = if b.score < threshold {
            (RED, 1)
        } else {
            (GREEN, 3)
        };
        draw_thick_rect(canvas, b, color, thickness);
    }

    Some(stats)
}

// Thickness grows inwards so the outer edge stays on the box bounds.
fn draw_thick_rect(canvas: &mut RgbImage, b: &BoxProposal, color: Rgb<u8>, thickness: u32) {
    for inset in 0..thickness {
        let width = b.width.saturating_sub(2 * inset);
        let height = b.height.saturating_sub(2 * inset);
        if width == 0 || height == 0 {
            break;
        }
        let rect = Rect::at((b.x + inset) as i32, (b.y + inset) as i32).of_size(width, height);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn proposal(x: u32, y: u32, score: f32) -> BoxProposal {
        BoxProposal {
            x,
            y,
            width: 20,
            height: 20,
            score,
        }
    }

    #[test]
    fn test_stats() {
        let stats = ScoreStats::from_scores(&[0.2, 1.0, 0.6]).unwrap();
        assert_eq!(stats.min, 0.2);
        assert_eq!(stats.max, 1.0);
        assert!((stats.average - 0.6).abs() < 1e-6);
        assert!((stats.highlight_threshold() - 0.7).abs() < 1e-6);
        assert!(ScoreStats::from_scores(&[]).is_none());
    }

    #[test]
    fn test_stats_display() {
        let stats = ScoreStats {
            min: 0.5,
            average: 1.0,
            max: 2.0,
        };
        assert_eq!(stats.to_string(), "stats: min=0.5, average=1, max=2.");
    }

    #[test]
    fn test_boxes_colored_by_threshold() {
        let mut canvas = RgbImage::new(80, 40);
        let boxes = [proposal(5, 5, 1.0), proposal(50, 5, 0.2)];

        let stats = draw_boxes(&mut canvas, &boxes).unwrap();
        assert!((stats.highlight_threshold() - 0.7).abs() < 1e-6);

        // Strong box: green, three pixels thick.
        assert_eq!(*canvas.get_pixel(5, 5), GREEN);
        assert_eq!(*canvas.get_pixel(7, 7), GREEN);
        assert_eq!(*canvas.get_pixel(8, 8), Rgb([0, 0, 0]));

        // Weak box: red, one pixel thick.
        assert_eq!(*canvas.get_pixel(50, 5), RED);
        assert_eq!(*canvas.get_pixel(69, 24), RED);
        assert_eq!(*canvas.get_pixel(51, 6), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_no_boxes_draws_nothing() {
        let mut canvas = RgbImage::new(10, 10);
        assert!(draw_boxes(&mut canvas, &[]).is_none());
        assert!(canvas.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_edge_canvas_is_gray() {
        let mut edges = EdgeMap::new(2, 1);
        edges.put_pixel(0, 0, Luma([40]));

        let canvas = edge_canvas(&edges);
        assert_eq!(*canvas.get_pixel(0, 0), Rgb([255, 255, 255]));
        assert_eq!(*canvas.get_pixel(1, 0), Rgb([0, 0, 0]));
    }
}
