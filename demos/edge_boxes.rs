use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use env_logger::Builder;
use log::{debug, info};

use edge_timeit::pipeline::list_frames;
use edge_timeit::{
    draw_boxes, edge_canvas, load_image, timeit, EdgeBoxDetector, EdgeBoxParams, EdgeModel,
    NmsParams,
};

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// image to process, or a directory of frames with --video
    input: PathBuf,

    /// treat the input as a directory of image frames, processed in file-name order
    #[clap(long)]
    video: bool,

    /// maximum number of boxes to propose
    #[clap(long, default_value_t = 10)]
    max_boxes: usize,

    /// minimum box area in pixels
    #[clap(long, default_value_t = 1000.0)]
    min_box_area: f32,

    /// orientation difference (radians) below which touching edge groups merge
    #[clap(long, default_value_t = 0.5)]
    edge_merge_thr: f32,

    /// minimum summed magnitude for an edge group to be kept
    #[clap(long, default_value_t = 0.5)]
    cluster_min_mag: f32,

    /// non-maximum suppression radius
    #[clap(long, default_value_t = 2)]
    nms_radius: u32,

    /// annotated output image, or output directory with --video
    #[clap(short = 'o', long, default_value = "boxes.png")]
    output: PathBuf,
}

impl Args {
    fn box_params(&self) -> EdgeBoxParams {
        EdgeBoxParams {
            max_boxes: self.max_boxes,
            min_box_area: self.min_box_area,
            edge_merge_thr: self.edge_merge_thr,
            cluster_min_mag: self.cluster_min_mag,
            ..Default::default()
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    Builder::from_default_env().format_timestamp_nanos().init();

    let args = Args::parse();
    debug!("args: {args:?}");

    let model = EdgeModel::load(NmsParams {
        radius: args.nms_radius,
    });
    let detector = EdgeBoxDetector::new(args.box_params());

    if args.video {
        let frames = list_frames(&args.input)?;
        if frames.is_empty() {
            return Err(format!("no frames found in {}", args.input.display()).into());
        }
        info!("{} frames in {}", frames.len(), args.input.display());
        fs::create_dir_all(&args.output)?;

        for frame in &frames {
            let name = frame.file_name().map(PathBuf::from).unwrap_or_default();
            let out = args.output.join(name).with_extension("png");
            process(&model, &detector, frame, &out)?;
        }
    } else {
        process(&model, &detector, &args.input, &args.output)?;
    }

    Ok(())
}

fn process(
    model: &EdgeModel,
    detector: &EdgeBoxDetector,
    input: &Path,
    output: &Path,
) -> Result<(), Box<dyn Error>> {
    let image = load_image(input)?;
    println!("\nimage {}x{}", image.height(), image.width());

    let edges = model.detect_edges(&image);
    let orientation = model.compute_orientation(&image);
    let thinned = model.suppress(&edges, &orientation);
    let boxes = detector.find_boxes(&thinned, &orientation);

    let mut canvas = edge_canvas(&edges);
    match timeit("draw boxes", || draw_boxes(&mut canvas, &boxes)).trace() {
        Some(stats) => println!("{stats}"),
        None => println!("no boxes found."),
    }

    canvas.save(output)?;
    info!("saved {} boxes to {}", boxes.len(), output.display());
    Ok(())
}
