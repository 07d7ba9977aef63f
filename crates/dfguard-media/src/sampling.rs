//! Frame index selection for video prediction.

use std::collections::BTreeSet;

/// Ordered, deduplicated set of frame indices chosen for face detection.
///
/// Indices are spread evenly over `[0, total_frames - 1]` by linear
/// interpolation and truncated toward zero, so a 100-frame video sampled
/// 5 times yields `[0, 24, 49, 74, 99]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSampleSet {
    indices: BTreeSet<usize>,
    total_frames: usize,
}

impl FrameSampleSet {
    /// Select `count` evenly spaced indices out of `total_frames`.
    ///
    /// `count == 0` selects every frame.
    pub fn evenly_spaced(total_frames: usize, count: usize) -> Self {
        if total_frames == 0 {
            return Self {
                indices: BTreeSet::new(),
                total_frames,
            };
        }
        if count == 0 {
            return Self {
                indices: (0..total_frames).collect(),
                total_frames,
            };
        }

        let last = (total_frames - 1) as f64;
        let indices = linspace(0.0, last, count)
            .map(|v| (v as usize).min(total_frames - 1))
            .collect();

        Self {
            indices,
            total_frames,
        }
    }

    pub fn contains(&self, frame: usize) -> bool {
        self.indices.contains(&frame)
    }

    /// Number of distinct frames selected.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    /// Highest selected index; scanning can stop after this frame.
    pub fn last(&self) -> Option<usize> {
        self.indices.iter().next_back().copied()
    }

    /// Selected indices in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }
}

/// `count` evenly spaced values over `[start, stop]`, endpoints included.
fn linspace(start: f64, stop: f64, count: usize) -> impl Iterator<Item = f64> {
    let step = if count > 1 {
        (stop - start) / (count - 1) as f64
    } else {
        0.0
    };
    (0..count).map(move |i| {
        if count > 1 && i == count - 1 {
            stop
        } else {
            start + step * i as f64
        }
    })
}
