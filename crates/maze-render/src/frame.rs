//! Frame driver: fans segments out to the worker pool and assembles the
//! frame from the scanlines they send back.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::{Duration, Instant};

use log::{debug, error};
use maze_raytrace::Octree;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::camera::{Pose, ViewAngles};
use crate::error::{RenderError, Result};
use crate::frontier::RenderContext;
use crate::segment::{partition, Segment};
use crate::settings::RenderSettings;

/// Destination for rendered scanlines.
///
/// Only the driver thread writes to a sink, so implementations need no
/// synchronization.
pub trait FrameSink {
    /// Copy `data` into the frame at byte `offset`.
    fn write_scanline(&mut self, offset: usize, data: &[u8]) -> Result<()>;

    /// Called once per frame after every segment has finished.
    fn present(&mut self) -> Result<()>;
}

/// Message from a worker to the frame driver.
#[derive(Debug)]
pub enum SegmentMessage {
    /// One finished row of a segment.
    Scanline {
        /// Byte offset of the row in the frame.
        offset: usize,
        /// BGRA pixel bytes.
        data: Vec<u8>,
    },
    /// The segment with this id sent all of its rows.
    Done(usize),
}

/// Timing and volume of one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    /// Frame number, starting at 0.
    pub frame: u64,
    /// Wall time from dispatch to present.
    pub elapsed: Duration,
    /// Scanlines written to the sink.
    pub scanlines: usize,
}

/// In-memory BGRA frame.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
    presented: u64,
}

impl FrameBuffer {
    /// Black frame of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height * 4],
            presented: 0,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw BGRA bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// BGRA bytes of one pixel, or `None` outside the frame.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        let px = &self.data[i..i + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Number of frames presented into this buffer.
    pub fn presented(&self) -> u64 {
        self.presented
    }

    /// Convert to opaque RGBA bytes for image encoders.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len());
        for px in self.data.chunks_exact(4) {
            out.extend_from_slice(&[px[2], px[1], px[0], 255]);
        }
        out
    }
}

impl FrameSink for FrameBuffer {
    fn write_scanline(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        let size = self.data.len();
        let dest = offset
            .checked_add(data.len())
            .and_then(|end| self.data.get_mut(offset..end))
            .ok_or(RenderError::ScanlineOutOfBounds {
                offset,
                len: data.len(),
                size,
            })?;
        dest.copy_from_slice(data);
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.presented += 1;
        Ok(())
    }
}

/// Render one segment and send its scanlines, then its done signal.
///
/// Returns early without the done signal if the driver has hung up.
pub fn render_segment(
    octree: &Octree,
    pose: &Pose,
    segment: Segment,
    angles: &ViewAngles,
    settings: &RenderSettings,
    tx: &Sender<SegmentMessage>,
) {
    let mut ctx = RenderContext::new(octree, pose, segment, angles, settings);
    ctx.sparse_pass();
    ctx.flood_fill();

    for (offset, data) in ctx.scanlines(settings.width, &settings.shading) {
        if tx.send(SegmentMessage::Scanline { offset, data }).is_err() {
            return;
        }
    }
    if tx.send(SegmentMessage::Done(segment.id)).is_ok() {
        debug!(
            "segment {} done: {} traces for {} pixels",
            segment.id,
            ctx.traced(),
            segment.len()
        );
    }
}

/// Renders frames with a fixed pool of workers, one per segment.
pub struct FrameRenderer {
    settings: RenderSettings,
    angles: ViewAngles,
    segments: Vec<Segment>,
    pool: ThreadPool,
    frames: u64,
}

impl FrameRenderer {
    /// Validate `settings` and set up the view tables, segments and pool.
    pub fn new(settings: RenderSettings) -> Result<Self> {
        settings.validate()?;
        let segments = partition(
            settings.width,
            settings.height,
            settings.workers,
            settings.layout,
        )?;
        let angles = ViewAngles::new(settings.width, settings.height, settings.focal_depth);
        let pool = ThreadPoolBuilder::new()
            .num_threads(settings.workers)
            .thread_name(|i| format!("maze-worker-{}", i))
            .build()?;

        Ok(Self {
            settings,
            angles,
            segments,
            pool,
            frames: 0,
        })
    }

    /// Settings this renderer was built with.
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Screen segments, one per worker.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Render one frame of `octree` seen from `pose` into `sink`.
    ///
    /// The sink is presented only after every segment has reported done and
    /// all of its scanlines were written.
    pub fn render_frame<S: FrameSink>(
        &mut self,
        octree: &Octree,
        pose: &Pose,
        sink: &mut S,
    ) -> Result<FrameStats> {
        let started = Instant::now();
        let Self {
            settings,
            angles,
            segments,
            pool,
            ..
        } = &*self;
        let expected = segments.len();
        let (tx, rx) = channel();

        let scanlines = pool.in_place_scope(|scope| {
            for &segment in segments.iter() {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    let outcome = catch_unwind(AssertUnwindSafe(|| {
                        render_segment(octree, pose, segment, angles, settings, &tx)
                    }));
                    if outcome.is_err() {
                        error!("worker for segment {} panicked", segment.id);
                    }
                });
            }
            drop(tx);
            collect_segments(&rx, expected, sink)
        })?;

        sink.present()?;

        let stats = FrameStats {
            frame: self.frames,
            elapsed: started.elapsed(),
            scanlines,
        };
        self.frames += 1;
        debug!(
            "frame {} rendered in {:.2?} ({} scanlines)",
            stats.frame, stats.elapsed, stats.scanlines
        );
        Ok(stats)
    }
}

/// Drain worker messages into `sink` until `expected` segments are done.
fn collect_segments<S: FrameSink>(
    rx: &Receiver<SegmentMessage>,
    expected: usize,
    sink: &mut S,
) -> Result<usize> {
    let mut completed = 0;
    let mut scanlines = 0;
    while completed < expected {
        match rx.recv() {
            Ok(SegmentMessage::Scanline { offset, data }) => {
                sink.write_scanline(offset, &data)?;
                scanlines += 1;
            }
            Ok(SegmentMessage::Done(_)) => completed += 1,
            Err(_) => return Err(RenderError::WorkerLost { completed, expected }),
        }
    }
    Ok(scanlines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_math::Point3;
    use maze_raytrace::{Color, OctreeSettings, Quad, Surface};

    use crate::segment::SegmentLayout;

    fn wall(x0: f64, y0: f64, x1: f64, y1: f64) -> Surface {
        Surface::Quad(Quad::new(
            Point3::new(x0, y0, -2.5),
            Point3::new(x1, y1, -2.5),
            Point3::new(x0, y0, 2.5),
            Color::WHITE,
        ))
    }

    fn scene() -> Octree {
        let surfaces = vec![
            wall(-4.0, -10.0, -4.0, 60.0),
            wall(4.0, -10.0, 4.0, 60.0),
            wall(-4.0, 60.0, 4.0, 60.0),
            wall(-1.0, 20.0, 1.0, 20.0),
        ];
        Octree::build(surfaces, OctreeSettings::default()).unwrap()
    }

    /// Counts writes per byte and checks completeness at present time.
    struct CountingSink {
        writes: Vec<u32>,
        presented: bool,
    }

    impl FrameSink for CountingSink {
        fn write_scanline(&mut self, offset: usize, data: &[u8]) -> Result<()> {
            assert!(!self.presented);
            for n in &mut self.writes[offset..offset + data.len()] {
                *n += 1;
            }
            Ok(())
        }

        fn present(&mut self) -> Result<()> {
            assert!(self.writes.iter().all(|&n| n == 1));
            self.presented = true;
            Ok(())
        }
    }

    #[test]
    fn test_every_byte_written_once_before_present() {
        let settings = RenderSettings {
            width: 400,
            height: 100,
            workers: 4,
            ..RenderSettings::default()
        };
        let mut renderer = FrameRenderer::new(settings).unwrap();
        assert!(renderer
            .segments()
            .iter()
            .all(|s| s.width == 100 && s.height == 100));

        let octree = scene();
        let pose = Pose::level(Point3::new(0.3, 0.1, 0.2));
        let mut sink = CountingSink {
            writes: vec![0; 400 * 100 * 4],
            presented: false,
        };
        let stats = renderer.render_frame(&octree, &pose, &mut sink).unwrap();
        assert!(sink.presented);
        assert_eq!(stats.scanlines, 4 * 100);
        assert_eq!(stats.frame, 0);
        assert_eq!(renderer.frames(), 1);
    }

    #[test]
    fn test_row_layout_renders_same_frame() {
        let octree = scene();
        let pose = Pose::level(Point3::new(0.3, 0.1, 0.2));
        let base = RenderSettings {
            width: 96,
            height: 64,
            workers: 4,
            cache_capacity: 0,
            sparse_stride: 1,
            ..RenderSettings::default()
        };

        let mut columns = FrameBuffer::new(96, 64);
        FrameRenderer::new(base.clone())
            .unwrap()
            .render_frame(&octree, &pose, &mut columns)
            .unwrap();

        let mut rows = FrameBuffer::new(96, 64);
        FrameRenderer::new(RenderSettings {
            layout: SegmentLayout::Rows,
            ..base
        })
        .unwrap()
        .render_frame(&octree, &pose, &mut rows)
        .unwrap();

        assert_eq!(columns.as_bytes(), rows.as_bytes());
        assert!(columns.as_bytes().iter().any(|&b| b != 0));
        assert_eq!(columns.presented(), 1);
    }

    fn lit_pixels(frame: &FrameBuffer, xs: std::ops::Range<usize>) -> usize {
        (0..frame.height())
            .flat_map(|y| xs.clone().map(move |x| (x, y)))
            .filter(|&(x, y)| frame.pixel(x, y).is_some_and(|px| px[..3] != [0, 0, 0]))
            .count()
    }

    fn render_with(workers: usize, layout: SegmentLayout) -> (FrameRenderer, FrameBuffer) {
        let settings = RenderSettings {
            workers,
            layout,
            ..RenderSettings::default()
        };
        let mut renderer = FrameRenderer::new(settings).unwrap();
        let mut frame = FrameBuffer::new(320, 240);
        let pose = Pose::level(Point3::new(0.3, 0.1, 0.2));
        renderer.render_frame(&scene(), &pose, &mut frame).unwrap();
        (renderer, frame)
    }

    #[test]
    fn test_segments_narrower_than_stride_are_sampled() {
        let (_, reference) = render_with(8, SegmentLayout::Columns);
        let expected = lit_pixels(&reference, 0..320);
        assert!(expected > 0);

        let (renderer, columns) = render_with(80, SegmentLayout::Columns);
        for segment in renderer.segments() {
            assert_eq!(segment.width, 4);
            assert!(lit_pixels(&columns, segment.x..segment.x + segment.width) > 0);
        }
        let lit = lit_pixels(&columns, 0..320);
        assert!(lit * 10 >= expected * 9, "{} lit, expected about {}", lit, expected);

        let (_, rows) = render_with(60, SegmentLayout::Rows);
        let lit = lit_pixels(&rows, 0..320);
        assert!(lit * 10 >= expected * 9, "{} lit, expected about {}", lit, expected);
    }

    #[test]
    fn test_indivisible_workers_rejected() {
        let settings = RenderSettings {
            width: 321,
            ..RenderSettings::default()
        };
        assert!(matches!(
            FrameRenderer::new(settings),
            Err(RenderError::IndivisibleSegments { .. })
        ));
    }

    #[test]
    fn test_lost_worker_reported() {
        let (tx, rx) = channel();
        tx.send(SegmentMessage::Scanline {
            offset: 0,
            data: vec![1, 2, 3, 0],
        })
        .unwrap();
        tx.send(SegmentMessage::Done(0)).unwrap();
        drop(tx);

        let mut sink = FrameBuffer::new(1, 1);
        let err = collect_segments(&rx, 2, &mut sink).unwrap_err();
        assert!(matches!(err, RenderError::WorkerLost { completed: 1, expected: 2 }));
        assert_eq!(sink.presented(), 0);
        assert_eq!(sink.pixel(0, 0), Some([1, 2, 3, 0]));
        assert_eq!(sink.pixel(1, 0), None);
        assert_eq!(sink.pixel(0, 1), None);
    }

    #[test]
    fn test_frame_buffer_bounds() {
        let mut fb = FrameBuffer::new(2, 2);
        assert!(fb.write_scanline(8, &[0; 8]).is_ok());
        assert!(matches!(
            fb.write_scanline(12, &[0; 8]),
            Err(RenderError::ScanlineOutOfBounds { offset: 12, len: 8, size: 16 })
        ));
        assert!(fb.write_scanline(usize::MAX, &[0; 4]).is_err());
    }

    #[test]
    fn test_to_rgba_swaps_channels() {
        let mut fb = FrameBuffer::new(1, 1);
        fb.write_scanline(0, &[10, 20, 30, 0]).unwrap();
        assert_eq!(fb.to_rgba(), vec![30, 20, 10, 255]);
    }
}
