//! Tick-driven progressive rendering with runtime controls.
//!
//! [`ProgressiveRenderer`] owns the scene, its BVH, the camera and two
//! frame buffers. The host calls [`ProgressiveRenderer::update`] once per
//! frame and receives refreshed images through a [`DisplaySink`]. Every
//! control that changes what the image should look like clears the active
//! buffer so it converges again from scratch.

use std::path::{Path, PathBuf};

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::{
    bvh::BvhTree,
    camera::Camera,
    focus::FocusController,
    frame_buffer::ProgressiveFrameBuffer,
    hittable::Primitive,
    sampling::gen_f32,
    scene::{Scene, ScenePreset},
    settings::{RenderMode, RenderSettings},
    tracer::{BounceLimit, FocusProbe, PathTracer, TraceOptions},
    Color,
};
use lumen_math::Vec3;

/// Receives finished 8-bit frames for presentation.
pub trait DisplaySink {
    /// `rgba` holds `width * height` RGBA8 pixels, row 0 at the top.
    fn present(&mut self, width: u32, height: u32, rgba: &[u8]);
}

/// Progressive path tracing session.
pub struct ProgressiveRenderer<C: Camera> {
    settings: RenderSettings,
    camera: C,
    scene: Scene,
    model_path: Option<PathBuf>,
    bvh: BvhTree,
    /// Scene edits since `bvh` was built; rebuilt before the next trace.
    bvh_stale: bool,
    tracer: PathTracer,

    small_buffer: ProgressiveFrameBuffer,
    big_buffer: ProgressiveFrameBuffer,
    use_big_buffer: bool,

    fast_mode: bool,
    bounce_limit: BounceLimit,
    visualize_focus: bool,
    focus: FocusController,

    current_sample: u32,
    start_time: Option<f64>,
    total_time: Option<f64>,
    rng: SmallRng,
}

impl<C: Camera> ProgressiveRenderer<C> {
    /// Start a session with an empty scene.
    ///
    /// # Panics
    ///
    /// Panics if a resolution in `settings` has a zero dimension; run
    /// [`RenderSettings::validate`] first.
    pub fn new(settings: RenderSettings, mut camera: C) -> Self {
        let mut rng = match settings.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        let (small_width, small_height) = settings.small_resolution;
        let (big_width, big_height) = settings.big_resolution;
        camera.set_aspect_ratio(small_width as f32 / small_height as f32);

        let scene = Scene::new();
        let bvh = scene.build_bvh(&mut rng);

        Self {
            camera,
            bvh,
            bvh_stale: false,
            tracer: PathTracer::new(scene.sky()),
            scene,
            model_path: None,
            small_buffer: ProgressiveFrameBuffer::new(small_width, small_height),
            big_buffer: ProgressiveFrameBuffer::new(big_width, big_height),
            use_big_buffer: false,
            fast_mode: false,
            bounce_limit: settings.bounce_limit,
            visualize_focus: false,
            focus: FocusController::new(),
            current_sample: 0,
            start_time: None,
            total_time: None,
            rng,
            settings,
        }
    }

    /// OBJ model shown in place of the showcase box.
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    /// Replace the scene with a preset and move the camera to its setup.
    pub fn show_scene(&mut self, preset: ScenePreset) {
        self.scene.clear();
        let setup = preset.populate(&mut self.scene, self.model_path.as_deref(), &mut self.rng);
        self.camera.apply_setup(&setup);
        self.bvh_stale = true;
        self.clear();
    }

    /// Add a primitive to the current scene.
    ///
    /// The BVH is rebuilt once, on the next tick or autofocus, however many
    /// primitives were added in between.
    pub fn add(&mut self, primitive: impl Into<Primitive>) {
        self.scene.add(primitive);
        self.bvh_stale = true;
        self.clear();
    }

    /// Remove every primitive.
    pub fn clear_scene(&mut self) {
        self.scene.clear();
        self.bvh_stale = true;
        self.clear();
    }

    fn refresh_bvh(&mut self) {
        if !self.bvh_stale {
            return;
        }
        self.bvh_stale = false;
        self.bvh = self.scene.build_bvh(&mut self.rng);
        self.tracer = PathTracer::new(self.scene.sky());
        log::info!(
            "Rebuilt BVH over {} primitives (depth {})",
            self.bvh.len(),
            self.bvh.depth()
        );
    }

    /// Forget all samples and timings.
    pub fn clear(&mut self) {
        self.active_buffer_mut().clear();
        self.current_sample = 0;
        self.start_time = None;
        self.total_time = None;
    }

    pub fn toggle_fast_mode(&mut self) {
        self.fast_mode = !self.fast_mode;
        self.clear();
    }

    pub fn toggle_focus_visualization(&mut self) {
        self.visualize_focus = !self.visualize_focus;
        self.clear();
    }

    /// Shift the bounce limit, clamped to `[0, 5000]`.
    pub fn adjust_bounce_limit(&mut self, delta: i64) {
        self.bounce_limit.adjust(delta);
        self.clear();
    }

    /// Switch between the small and big buffer.
    pub fn toggle_buffer_quality(&mut self) {
        self.use_big_buffer = !self.use_big_buffer;

        let (width, height) = {
            let buffer = self.active_buffer();
            (buffer.width(), buffer.height())
        };
        self.camera.set_aspect_ratio(width as f32 / height as f32);
        log::info!("Switched to {width}x{height} buffer");

        self.clear();
    }

    /// Focus on whatever is at the center of the view.
    pub fn auto_focus(&mut self) -> Option<Vec3> {
        self.refresh_bvh();
        self.focus.auto_focus(&mut self.camera, &self.bvh)
    }

    /// Advance one simulation tick.
    ///
    /// `time` and `delta_time` are in seconds.
    pub fn update(&mut self, time: f64, delta_time: f64, sink: &mut dyn DisplaySink) {
        self.refresh_bvh();
        if self.camera.should_auto_focus() {
            self.auto_focus();
        }
        if self.camera.update(delta_time as f32) {
            self.clear();
        }

        let start_time = *self.start_time.get_or_insert(time);
        let samples_limit = self.settings.samples_limit;

        match self.settings.render_mode {
            RenderMode::Progressive => {
                if self.current_sample < samples_limit {
                    self.render_pass();
                    self.current_sample += 1;
                    self.total_time = Some(time - start_time);
                    self.present(sink);

                    if self.current_sample == samples_limit {
                        log::info!(
                            "Reached {} samples in {:.2} s",
                            samples_limit,
                            time - start_time
                        );
                    }
                }
            }
            RenderMode::AllAtOnce => {
                if self.current_sample < samples_limit {
                    self.start_time = Some(time);
                    self.render_all(samples_limit);
                    self.current_sample = samples_limit;
                } else if self.current_sample == samples_limit {
                    self.present(sink);

                    let total = time - start_time;
                    self.total_time = Some(total);
                    self.current_sample += 1;
                    log::info!("Rendered {samples_limit} samples at once in {total:.2} s");
                }
            }
        }
    }

    fn trace_options(&self) -> TraceOptions {
        TraceOptions {
            bounce_limit: self.bounce_limit,
            fast_mode: self.fast_mode,
            fast_ray_max_length: self.settings.fast_ray_max_length,
            focus_probe: self.visualize_focus.then(|| FocusProbe {
                camera_position: self.camera.position(),
                focus_distance: self.camera.focus_distance(),
            }),
        }
    }

    fn render_pass(&mut self) {
        let options = self.trace_options();
        let pass_start = std::time::Instant::now();

        let Self {
            camera,
            bvh,
            tracer,
            rng,
            small_buffer,
            big_buffer,
            use_big_buffer,
            ..
        } = self;
        let buffer = if *use_big_buffer { big_buffer } else { small_buffer };

        let sampler = pixel_sampler(camera, bvh, tracer, options, buffer);
        buffer.accumulate_pass(rng, sampler);

        log::debug!(
            "Sample pass {} took {:?}",
            buffer.sample_count(),
            pass_start.elapsed()
        );
    }

    fn render_all(&mut self, samples: u32) {
        let options = self.trace_options();

        let Self {
            camera,
            bvh,
            tracer,
            rng,
            small_buffer,
            big_buffer,
            use_big_buffer,
            ..
        } = self;
        let buffer = if *use_big_buffer { big_buffer } else { small_buffer };

        let sampler = pixel_sampler(camera, bvh, tracer, options, buffer);
        buffer.fill_pass(samples, rng, sampler);
    }

    fn present(&mut self, sink: &mut dyn DisplaySink) {
        let gamma = self.settings.gamma;
        let buffer = self.active_buffer_mut();
        buffer.update_display(gamma);
        sink.present(buffer.width(), buffer.height(), buffer.display());
    }

    fn active_buffer_mut(&mut self) -> &mut ProgressiveFrameBuffer {
        if self.use_big_buffer {
            &mut self.big_buffer
        } else {
            &mut self.small_buffer
        }
    }

    /// The frame buffer currently being refined.
    pub fn active_buffer(&self) -> &ProgressiveFrameBuffer {
        if self.use_big_buffer {
            &self.big_buffer
        } else {
            &self.small_buffer
        }
    }

    pub fn current_sample(&self) -> u32 {
        self.current_sample
    }

    pub fn samples_limit(&self) -> u32 {
        self.settings.samples_limit
    }

    /// Seconds spent converging, `None` until a tick has run since the last clear.
    pub fn total_time(&self) -> Option<f64> {
        self.total_time
    }

    /// Hit point of the last successful autofocus.
    pub fn last_focus_hit(&self) -> Option<Vec3> {
        self.focus.last_hit()
    }

    pub fn is_fast_mode(&self) -> bool {
        self.fast_mode
    }

    pub fn is_focus_visualization(&self) -> bool {
        self.visualize_focus
    }

    pub fn is_big_buffer(&self) -> bool {
        self.use_big_buffer
    }

    pub fn bounce_limit(&self) -> BounceLimit {
        self.bounce_limit
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn model_path(&self) -> Option<&Path> {
        self.model_path.as_deref()
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    /// Mutable camera access; view changes clear the buffer on the next tick.
    pub fn camera_mut(&mut self) -> &mut C {
        &mut self.camera
    }
}

/// One jittered camera sample for pixel `(x, y)` of `buffer`.
///
/// Row 0 is the top of the image while `v = 0` is the bottom of the view.
fn pixel_sampler<'a, C: Camera>(
    camera: &'a C,
    bvh: &'a BvhTree,
    tracer: &'a PathTracer,
    options: TraceOptions,
    buffer: &ProgressiveFrameBuffer,
) -> impl Fn(u32, u32, &mut SmallRng) -> Color + Sync + 'a {
    let (width, height) = (buffer.width() as f32, buffer.height() as f32);

    move |x, y, rng| {
        let u = (x as f32 + gen_f32(rng)) / width;
        let v = (height - 1.0 - y as f32 + gen_f32(rng)) / height;
        let ray = camera.get_ray(u, v, rng);
        tracer.trace(&ray, bvh, &options, rng)
    }
}
