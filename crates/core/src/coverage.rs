//! Point-evaluation traits shared by the dense and sparse drivers.
//!
//! [`InkSampler`] answers "how much ink does this channel want here" and
//! [`Coverage`] answers "how much of this pixel is inked". The pattern field
//! and the explicit dot shapes both implement [`Coverage`], so the
//! rasterizer and the grid sampler differ only in which points they visit.
//!
//! Both traits are object-safe and `Sync`, so `&dyn Coverage` can be shared
//! across worker threads.

use glam::DVec2;

use crate::raster::Raster;
use crate::separation::Separation;

/// Ink intensity in [0, 1] for one channel at an image-space position.
pub trait InkSampler: Sync {
    fn ink_at(&self, p: DVec2) -> f64;
}

impl<F> InkSampler for F
where
    F: Fn(DVec2) -> f64 + Sync,
{
    fn ink_at(&self, p: DVec2) -> f64 {
        self(p)
    }
}

/// Fractional ink coverage in [0, 1] at an image-space position.
pub trait Coverage: Sync {
    fn coverage_at(&self, p: DVec2) -> f64;
}

/// One channel of a source raster: nearest-neighbor sample, then separate.
#[derive(Debug, Clone, Copy)]
pub struct ChannelView<'a> {
    raster: &'a Raster,
    separation: Separation,
}

impl<'a> ChannelView<'a> {
    pub fn new(raster: &'a Raster, separation: Separation) -> Self {
        Self { raster, separation }
    }

    pub fn raster(&self) -> &'a Raster {
        self.raster
    }
}

impl InkSampler for ChannelView<'_> {
    fn ink_at(&self, p: DVec2) -> f64 {
        self.separation.intensity(self.raster.sample(p.x, p.y))
    }
}
