#![deny(unsafe_code)]
//! Render drivers and the render session for the halftone engine.
//!
//! This crate sits on top of `halftone-core` (which defines the pattern
//! field, dot shapes and compositing) and drives them over whole images:
//! the row-parallel [`rasterizer`], the sparse grid [`sampler`], and the SVG
//! [`vector`] exporter. [`Halftoner`] owns one source image and runs one
//! pass at a time against it. Both the CLI and any embedding application go
//! through the session so backend fallback and cancellation behave the same.

pub mod cancel;
pub mod pixel;
pub mod rasterizer;
pub mod sampler;
pub mod vector;

#[cfg(feature = "png")]
pub mod snapshot;

use std::fmt;
use std::sync::{Mutex, PoisonError};

use halftone_core::{Background, Compositor, Field, HalftoneError, Pattern, Raster, Settings, Srgb, PAPER};
use rayon::{ThreadPool, ThreadPoolBuilder};

pub use cancel::CancelToken;

/// Which driver screens the image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    /// Per-pixel pattern field on the parallel pool.
    #[default]
    Field,
    /// Explicit dot shapes at lattice centers.
    Grid,
}

impl Backend {
    pub fn name(self) -> &'static str {
        match self {
            Backend::Field => "field",
            Backend::Grid => "grid",
        }
    }

    /// Parses a backend name.
    pub fn from_name(name: &str) -> Result<Backend, HalftoneError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "field" => Ok(Backend::Field),
            "grid" => Ok(Backend::Grid),
            other => Err(HalftoneError::InvalidSettings(format!("unknown backend '{other}'"))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One screened ink channel, before compositing.
#[derive(Debug, Clone)]
pub struct Plate {
    pub label: &'static str,
    pub color: Srgb,
    pub coverage: Field,
}

/// A render session over one immutable source image.
///
/// Starting a pass cancels whichever pass is in flight and then waits for
/// the pass lock, so passes never interleave and a superseded pass returns
/// [`HalftoneError::Cancelled`] instead of a stale image.
pub struct Halftoner {
    source: Raster,
    backend: Backend,
    pool: Option<ThreadPool>,
    current: Mutex<CancelToken>,
    pass: Mutex<()>,
}

impl Halftoner {
    /// Creates a session, preparing the parallel pool for the field backend.
    ///
    /// If the pool cannot be built the failure is logged and the session
    /// uses the grid backend.
    pub fn new(source: Raster) -> Self {
        let pool = ThreadPoolBuilder::new()
            .thread_name(|i| format!("halftone-{i}"))
            .build();
        let (backend, pool) = match pool {
            Ok(pool) => (Backend::Field, Some(pool)),
            Err(e) => {
                log::warn!("parallel pool unavailable ({e}); falling back to grid sampler");
                (Backend::Grid, None)
            }
        };
        Self {
            source,
            backend,
            pool,
            current: Mutex::new(CancelToken::new()),
            pass: Mutex::new(()),
        }
    }

    /// Forces a backend regardless of what initialization chose.
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn source(&self) -> &Raster {
        &self.source
    }

    /// Cancels the in-flight pass, if any.
    pub fn cancel(&self) {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }

    /// Screens and composites the source image.
    ///
    /// Returns the finished raster at source resolution, or `Cancelled` if
    /// another pass superseded this one.
    pub fn render(&self, settings: &Settings) -> Result<Raster, HalftoneError> {
        let plates = self.render_plates(settings)?;
        self.composite(&plates, settings)
    }

    /// Multiply-composites already screened plates, in the order given, onto
    /// the page `settings` asks for.
    pub fn composite(&self, plates: &[Plate], settings: &Settings) -> Result<Raster, HalftoneError> {
        let background = if settings.transparent_bg {
            Background::Transparent
        } else {
            Background::Opaque(PAPER)
        };
        let mut compositor = Compositor::new(self.source.width(), self.source.height(), background)?;
        for plate in plates {
            compositor.apply(&plate.coverage, plate.color)?;
        }
        compositor.finish()
    }

    /// Screens every enabled ink channel without compositing them.
    ///
    /// Plates come back in canonical composite order.
    pub fn render_plates(&self, settings: &Settings) -> Result<Vec<Plate>, HalftoneError> {
        let token = self.begin_pass();
        let _pass = self.pass.lock().unwrap_or_else(PoisonError::into_inner);
        token.check()?;
        settings.validate()?;

        let inks = settings.inks();
        log::debug!(
            "pass start: {} {}x{}, {} mode, {} inks, {} backend",
            settings.pattern,
            self.source.width(),
            self.source.height(),
            settings.color_mode,
            inks.len(),
            self.backend
        );
        if self.backend == Backend::Grid && settings.pattern == Pattern::Gooey {
            log::warn!("gooey has no grid equivalent; drawing circles");
        }

        let plates = self.install(|| {
            inks.iter()
                .map(|ink| {
                    let coverage = match self.backend {
                        Backend::Field => rasterizer::rasterize_channel(&self.source, ink, settings.pattern, &token)?,
                        Backend::Grid => sampler::sample_channel(&self.source, ink, settings.pattern, &token)?,
                    };
                    Ok(Plate {
                        label: ink.label,
                        color: ink.color,
                        coverage,
                    })
                })
                .collect::<Result<Vec<_>, HalftoneError>>()
        });
        match &plates {
            Err(HalftoneError::Cancelled) => log::debug!("pass cancelled"),
            Ok(_) => log::debug!("pass finished"),
            Err(_) => {}
        }
        plates
    }

    /// Builds the SVG document for the source image.
    ///
    /// Shares the pass lock and cancellation with [`Halftoner::render`].
    pub fn export_svg(&self, settings: &Settings) -> Result<String, HalftoneError> {
        let token = self.begin_pass();
        let _pass = self.pass.lock().unwrap_or_else(PoisonError::into_inner);
        token.check()?;
        settings.validate()?;
        self.install(|| vector::export_svg(&self.source, settings, &token))
    }

    /// Cancels the previous pass and hands out the token for a new one.
    fn begin_pass(&self) -> CancelToken {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        current.cancel();
        *current = CancelToken::new();
        current.clone()
    }

    fn install<T: Send>(&self, op: impl FnOnce() -> T + Send) -> T {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use halftone_core::color::CYAN_INK;
    use halftone_core::{ColorMode, Process};

    fn solid(width: usize, height: usize, rgb: [u8; 3]) -> Raster {
        Raster::filled(width, height, Srgb::from_u8(rgb[0], rgb[1], rgb[2]), 1.0).unwrap()
    }

    fn cyan_only(settings: &mut Settings) {
        for p in [Process::Magenta, Process::Yellow, Process::Key] {
            settings.channels.get_mut(p).enabled = false;
        }
    }

    #[test]
    fn backend_names_round_trip() {
        for b in [Backend::Field, Backend::Grid] {
            assert_eq!(Backend::from_name(b.name()).unwrap(), b);
        }
        assert!(Backend::from_name("gpu").is_err());
    }

    #[test]
    fn new_session_prefers_field_backend() {
        let session = Halftoner::new(solid(4, 4, [255, 255, 255]));
        assert_eq!(session.backend(), Backend::Field);
        assert_eq!(session.with_backend(Backend::Grid).backend(), Backend::Grid);
    }

    #[test]
    fn output_matches_source_resolution() {
        let session = Halftoner::new(solid(13, 7, [120, 80, 200]));
        let out = session.render(&Settings::default()).unwrap();
        assert_eq!((out.width(), out.height()), (13, 7));
    }

    #[test]
    fn transparent_page_with_no_inks_is_fully_transparent() {
        let mut settings = Settings {
            transparent_bg: true,
            ..Settings::default()
        };
        cyan_only(&mut settings);
        settings.channels.cyan.enabled = false;
        for backend in [Backend::Field, Backend::Grid] {
            let session = Halftoner::new(solid(6, 5, [10, 20, 30])).with_backend(backend);
            let out = session.render(&settings).unwrap();
            assert!(out.pixels().chunks(4).all(|px| px[3] == 0), "{backend}");
        }
    }

    #[test]
    fn white_image_renders_plain_paper() {
        let session = Halftoner::new(solid(8, 8, [255, 255, 255]));
        let out = session.render(&Settings::default()).unwrap();
        assert!(out.pixels().chunks(4).all(|px| px == [0xf4, 0xf1, 0xea, 255]));
    }

    #[test]
    fn pure_cyan_only_uses_the_cyan_plate() {
        let image = solid(4, 4, [0, 255, 255]);
        let mut settings = Settings::default();
        settings.set_global_frequency(2.0);
        let session = Halftoner::new(image);
        let all = session.render(&settings).unwrap();
        cyan_only(&mut settings);
        let cyan = session.render(&settings).unwrap();
        assert_eq!(all, cyan);

        let paper = PAPER.to_u8();
        let darkest: Vec<u8> = (0..3)
            .map(|i| {
                let ink = [CYAN_INK.r, CYAN_INK.g, CYAN_INK.b][i];
                ((paper[i] as f64 / 255.0) * ink * 255.0).round() as u8
            })
            .collect();
        for px in cyan.pixels().chunks(4) {
            for i in 0..3 {
                assert!(px[i] <= paper[i] && px[i] >= darkest[i]);
            }
            assert_eq!(px[3], 255);
        }
        assert!(cyan.pixels().chunks(4).any(|px| px[0] < paper[0]));
    }

    #[test]
    fn pure_cyan_screens_a_rotated_two_by_two_lattice() {
        let image = solid(4, 4, [0, 255, 255]);
        let mut settings = Settings::default();
        settings.set_global_frequency(2.0);
        let cyan = settings.inks()[0];
        assert_eq!(cyan.angle, 15.0);
        let field = halftone_core::PatternField::for_ink(4, 4, &cyan, Pattern::Circle);
        let centers: Vec<_> = (0..2)
            .flat_map(|j| (0..2).map(move |i| (i, j)))
            .map(|(i, j)| field.transform().cell(i, j).image_center)
            .collect();
        for c in &centers {
            assert!(image.contains(c.x, c.y), "center {c} off the page");
            assert!(field.coverage(*c, 1.0, &|_: glam::DVec2| 1.0) > 0.99);
        }

        let dots = sampler::enumerate_dots(&image, &cyan, &CancelToken::new()).unwrap();
        assert_eq!(dots.len(), 4);
        assert!(dots.iter().all(|d| (d.radius - 1.0).abs() < 1e-9));

        for backend in [Backend::Field, Backend::Grid] {
            let session = Halftoner::new(image.clone()).with_backend(backend);
            let plates = session.render_plates(&settings).unwrap();
            assert_eq!(plates.len(), 4);
            for c in &centers {
                let v = plates[0].coverage.get(c.x as usize, c.y as usize).unwrap();
                assert!(v > 0.9, "{backend}: cyan {v} at {c}");
            }
            for plate in &plates[1..] {
                assert_eq!(plate.coverage.max_value(), 0.0, "{backend}: {}", plate.label);
            }
        }
    }

    #[test]
    fn composite_of_rendered_plates_matches_render() {
        let session = Halftoner::new(solid(12, 9, [200, 40, 90]));
        let settings = Settings::default();
        let plates = session.render_plates(&settings).unwrap();
        assert_eq!(session.composite(&plates, &settings).unwrap(), session.render(&settings).unwrap());
    }

    #[test]
    fn plates_come_back_in_canonical_order() {
        let session = Halftoner::new(solid(8, 8, [90, 60, 30]));
        let mut settings = Settings::default();
        settings.channels.yellow.enabled = false;
        let labels: Vec<_> = session
            .render_plates(&settings)
            .unwrap()
            .iter()
            .map(|p| p.label)
            .collect();
        assert_eq!(labels, ["cyan", "magenta", "key"]);
    }

    #[test]
    fn tritone_renders_three_plates() {
        let session = Halftoner::new(solid(8, 8, [128, 128, 128]));
        let settings = Settings {
            color_mode: ColorMode::Tritone,
            ..Settings::default()
        };
        let plates = session.render_plates(&settings).unwrap();
        assert_eq!(plates.len(), 3);
        assert_eq!(plates[0].color, settings.custom_colors[0]);
    }

    #[test]
    fn grid_and_field_backends_agree_on_blank_and_solid_cells() {
        let image = solid(32, 32, [0, 0, 0]);
        let mut settings = Settings {
            color_mode: ColorMode::Mono,
            ..Settings::default()
        };
        settings.set_global_frequency(2.0);
        settings.channels.key.angle = 0.0;
        let field = Halftoner::new(image.clone()).render_plates(&settings).unwrap();
        let grid = Halftoner::new(image)
            .with_backend(Backend::Grid)
            .render_plates(&settings)
            .unwrap();
        // Dot centers are inked by both; cell corners by neither.
        for (x, y) in [(8, 8), (24, 8)] {
            assert!(field[0].coverage.get(x, y).unwrap() > 0.99);
            assert!(grid[0].coverage.get(x, y).unwrap() > 0.99);
        }
        assert!(field[0].coverage.get(0, 0).unwrap() < 0.01);
        assert_eq!(grid[0].coverage.get(0, 0), Some(0.0));
    }

    #[test]
    fn invalid_settings_are_rejected_before_rendering() {
        let session = Halftoner::new(solid(4, 4, [0, 0, 0]));
        let mut settings = Settings::default();
        settings.channels.key.frequency = 0.0;
        assert!(matches!(session.render(&settings), Err(HalftoneError::InvalidSettings(_))));
    }

    #[test]
    fn starting_a_pass_cancels_the_previous_one() {
        let session = Halftoner::new(solid(4, 4, [0, 0, 0]));
        let first = session.begin_pass();
        let second = session.begin_pass();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        session.cancel();
        assert!(second.is_cancelled());
    }

    #[test]
    fn session_is_shareable_across_threads() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<Halftoner>();
    }

    #[test]
    fn svg_export_goes_through_the_session() {
        let session = Halftoner::new(solid(16, 16, [0, 0, 0]));
        let doc = session.export_svg(&Settings::default()).unwrap();
        assert!(doc.contains("<g"));
    }
}
