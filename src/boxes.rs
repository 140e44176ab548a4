//! Bounding-box proposals from a suppressed edge map.
//!
//! Strong edge pixels are grouped into 8-connected clusters with
//! `imageproc`'s connected-component labelling. Touching clusters of similar
//! orientation are merged, and every surviving group becomes one scored box.

use std::f32::consts::PI;

use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};
use rayon::prelude::*;

use crate::pipeline::{fold_half_turn, EdgeMap, OrientationMap};
use crate::timeit::timeit;

/// Proposal settings. Defaults follow the usual edge-box values, except
/// `max_boxes`, which is kept small for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeBoxParams {
    /// Maximum number of boxes returned, best first.
    pub max_boxes: usize,
    /// Boxes with a smaller area (in pixels) are dropped.
    pub min_box_area: f32,
    /// Minimum magnitude, relative to the map peak, for a pixel to join a cluster.
    pub edge_min_mag: f32,
    /// Touching clusters merge when their orientations differ by less than
    /// this many radians.
    pub edge_merge_thr: f32,
    /// Clusters whose summed relative magnitude is below this are dropped.
    pub cluster_min_mag: f32,
    /// Upper bound on long side / short side.
    pub max_aspect_ratio: f32,
}

impl Default for EdgeBoxParams {
    fn default() -> Self {
        Self {
            max_boxes: 10,
            min_box_area: 1000.0,
            edge_min_mag: 0.1,
            edge_merge_thr: 0.5,
            cluster_min_mag: 0.5,
            max_aspect_ratio: 3.0,
        }
    }
}

/// Axis-aligned box in pixel coordinates with its proposal score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxProposal {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub score: f32,
}

impl BoxProposal {
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn aspect_ratio(&self) -> f32 {
        let long = self.width.max(self.height) as f32;
        let short = self.width.min(self.height).max(1) as f32;
        long / short
    }
}

/// Box proposer configured once and reused across frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeBoxDetector {
    params: EdgeBoxParams,
}

impl EdgeBoxDetector {
    pub fn new(params: EdgeBoxParams) -> Self {
        timeit("edgebox detector load", || Self { params }).trace()
    }

    pub fn params(&self) -> &EdgeBoxParams {
        &self.params
    }

    /// Proposes boxes from a suppressed edge map and its orientation map,
    /// sorted by descending score. Traced as `find boxes`.
    pub fn find_boxes(&self, nms: &EdgeMap, orientation: &OrientationMap) -> Vec<BoxProposal> {
        timeit("find boxes", || propose(nms, orientation, &self.params)).trace()
    }
}

#[derive(Debug, Clone, Copy)]
struct Cluster {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    magnitude: f32,
    // Doubled-angle sums, so that θ and θ + π average together.
    cos2: f32,
    sin2: f32,
}

impl Cluster {
    fn seed(x: u32, y: u32, magnitude: f32, theta: f32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            magnitude,
            cos2: (2.0 * theta).cos(),
            sin2: (2.0 * theta).sin(),
        }
    }

    fn with_pixel(self, x: u32, y: u32, magnitude: f32, theta: f32) -> Self {
        self.absorbed(&Self::seed(x, y, magnitude, theta))
    }

    fn absorbed(self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
            magnitude: self.magnitude + other.magnitude,
            cos2: self.cos2 + other.cos2,
            sin2: self.sin2 + other.sin2,
        }
    }

    fn orientation(&self) -> f32 {
        fold_half_turn(0.5 * self.sin2.atan2(self.cos2))
    }

    /// Bounding boxes overlap or are edge-adjacent.
    fn touches(&self, other: &Self) -> bool {
        self.min_x <= other.max_x + 1
            && other.min_x <= self.max_x + 1
            && self.min_y <= other.max_y + 1
            && other.min_y <= self.max_y + 1
    }

    fn bounding_box(&self) -> BoxProposal {
        let width = self.max_x - self.min_x + 1;
        let height = self.max_y - self.min_y + 1;
        BoxProposal {
            x: self.min_x,
            y: self.min_y,
            width,
            height,
            score: self.magnitude / (2 * (width + height)) as f32,
        }
    }
}

fn orientation_gap(a: f32, b: f32) -> f32 {
    let d = (a - b).abs() % PI;
    d.min(PI - d)
}

fn propose(
    nms: &EdgeMap,
    orientation: &OrientationMap,
    params: &EdgeBoxParams,
) -> Vec<BoxProposal> {
    let peak = nms.iter().copied().max().unwrap_or(0);
    if peak == 0 {
        debug!("empty edge map, no boxes");
        return Vec::new();
    }
    let peak = f32::from(peak);

    let mask = GrayImage::from_fn(nms.width(), nms.height(), |x, y| {
        if f32::from(nms.get_pixel(x, y)[0]) / peak >= params.edge_min_mag {
            Luma([255])
        } else {
            Luma([0])
        }
    });
    let labels = connected_components(&mask, Connectivity::Eight, Luma([0u8]));
    let label_count = labels.iter().copied().max().unwrap_or(0) as usize;

    let mut clusters: Vec<Option<Cluster>> = vec![None; label_count + 1];
    for (x, y, label) in labels.enumerate_pixels() {
        let label = label[0] as usize;
        if label == 0 {
            continue;
        }
        let magnitude = f32::from(nms.get_pixel(x, y)[0]) / peak;
        let theta = orientation.get_pixel_checked(x, y).map_or(0.0, |p| p[0]);
        clusters[label] = Some(match clusters[label] {
            Some(cluster) => cluster.with_pixel(x, y, magnitude, theta),
            None => Cluster::seed(x, y, magnitude, theta),
        });
    }

    let clusters: Vec<Cluster> = clusters
        .into_iter()
        .flatten()
        .filter(|c| c.magnitude >= params.cluster_min_mag)
        .collect();
    debug!("clusters: {}", clusters.len());

    let groups = merge_clusters(&clusters, params.edge_merge_thr);
    debug!("groups after merge: {}", groups.len());

    let mut boxes: Vec<BoxProposal> = groups
        .par_iter()
        .map(Cluster::bounding_box)
        .filter(|b| {
            b.area() as f32 >= params.min_box_area && b.aspect_ratio() <= params.max_aspect_ratio
        })
        .collect();

    // Stable: equal scores keep their scan order.
    boxes.sort_by(|a, b| b.score.total_cmp(&a.score));
    boxes.truncate(params.max_boxes);
    boxes
}

/// Union-find over the pairwise merge rule. Pairs are judged on the original
/// clusters, not on partially merged groups.
fn merge_clusters(clusters: &[Cluster], merge_thr: f32) -> Vec<Cluster> {
    let mut parent: Vec<usize> = (0..clusters.len()).collect();

    for i in 0..clusters.len() {
        for j in (i + 1)..clusters.len() {
            let (a, b) = (&clusters[i], &clusters[j]);
            if a.touches(b) && orientation_gap(a.orientation(), b.orientation()) < merge_thr {
                let (ri, rj) = (find_root(&mut parent, i), find_root(&mut parent, j));
                if ri != rj {
                    parent[rj] = ri;
                }
            }
        }
    }

    let mut groups: Vec<Option<Cluster>> = vec![None; clusters.len()];
    for (i, cluster) in clusters.iter().enumerate() {
        let root = find_root(&mut parent, i);
        groups[root] = Some(match groups[root] {
            Some(group) => group.absorbed(cluster),
            None => *cluster,
        });
    }
    groups.into_iter().flatten().collect()
}

fn find_root(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}
