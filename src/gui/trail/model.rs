use crate::config::Config;
use crate::gui::theme;
use crate::gui::trail::{MIN_MOVE_INTERVAL_MS, OPACITY_STEP};
use palette::Srgb;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Moves this point toward `target` by the given interpolation weight.
    pub fn lerp_toward(self, target: Point, factor: f64) -> Point {
        Point::new(
            self.x + (target.x - self.x) * factor,
            self.y + (target.y - self.y) * factor,
        )
    }
}

/// One rendered element of the chain. Markers are created once per
/// (re)initialization, in index order, and are never destroyed or reordered.
#[derive(Debug, Clone)]
pub struct Marker {
    pub center: Point,
    /// Current opacity in [0, 1]; starts at 0 so an idle trail is invisible.
    pub opacity: f64,
    /// Fixed taper scale `(count - index) / count`, largest at the head.
    pub scale: f64,
    pub color: Srgb<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct PointerState {
    /// Pointer position plus the configured offset; where the head chases.
    pub target: Point,
    prev: Point,
    pub speed: f64,
    last_move: Option<Instant>,
    pub moving: bool,
}

/// What the caller should do with the delayed fade-out after a movement
/// event. The timer itself lives with the host's event loop, not here.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerAction {
    pub cancel_fade_out: bool,
    pub schedule_fade_out: bool,
}

#[derive(Debug, Error)]
pub enum TrailError {
    #[error("a trail instance is already active in this process")]
    AlreadyActive,
}

static ACTIVE: AtomicBool = AtomicBool::new(false);

#[derive(Debug)]
struct ActiveGuard;

impl ActiveGuard {
    fn acquire() -> Result<Self, TrailError> {
        if ACTIVE.swap(true, Ordering::AcqRel) {
            return Err(TrailError::AlreadyActive);
        }
        Ok(Self)
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        ACTIVE.store(false, Ordering::Release);
    }
}

pub struct TrailState {
    pub config: Config,
    pub markers: Vec<Marker>,
    pub pointer: PointerState,
    prev_centers: Vec<Point>,
    _active: Option<ActiveGuard>,
}

impl TrailState {
    /// Builds the one live trail for this process. A second call while the
    /// returned instance is alive fails with [`TrailError::AlreadyActive`]
    /// and leaves the live instance untouched.
    pub fn activate(config: Config) -> Result<Self, TrailError> {
        let guard = ActiveGuard::acquire()?;
        Ok(Self::build(config, Some(guard)))
    }

    #[cfg(test)]
    fn detached(config: Config) -> Self {
        Self::build(config, None)
    }

    fn build(config: Config, active: Option<ActiveGuard>) -> Self {
        let markers = Self::make_markers(&config, Point::default());
        Self {
            config,
            markers,
            pointer: PointerState::default(),
            prev_centers: Vec::new(),
            _active: active,
        }
    }

    fn make_markers(config: &Config, at: Point) -> Vec<Marker> {
        let count = config.num_circles;
        let gradient = theme::generate_gradient(&config.effective_colors(), count);

        gradient
            .into_iter()
            .enumerate()
            .map(|(index, color)| Marker {
                center: at,
                opacity: 0.0,
                scale: (count - index) as f64 / count as f64,
                color,
            })
            .collect()
    }

    /// Seeds the trail at the actual pointer position so the first fade-in
    /// does not sweep in from the surface origin.
    pub fn set_initial_target(&mut self, raw: Point) {
        let target = self.offset_target(raw);
        self.pointer.target = target;
        self.pointer.prev = target;
        self.seed_markers(target);
    }

    fn seed_markers(&mut self, at: Point) {
        for marker in &mut self.markers {
            marker.center = at;
        }
    }

    fn offset_target(&self, raw: Point) -> Point {
        Point::new(
            raw.x + self.config.cursor_offset.x,
            raw.y + self.config.cursor_offset.y,
        )
    }

    /// Handles one pointer-movement event and classifies the pointer as
    /// moving or idle from its instantaneous speed.
    ///
    /// Events arriving within [`MIN_MOVE_INTERVAL_MS`] of the previous one
    /// (and the very first event) only move the target; the speed sample is
    /// skipped so a zero time delta never divides. The displacement is not
    /// lost: the next sampled event measures from the last sampled position.
    pub fn update_pointer(&mut self, raw: Point, now: Instant) -> PointerAction {
        let target = self.offset_target(raw);
        self.pointer.target = target;

        let Some(last_move) = self.pointer.last_move else {
            self.pointer.prev = target;
            self.pointer.last_move = Some(now);
            // first event ever: place the chain at the pointer so the first
            // fade-in does not sweep in from the surface origin
            self.seed_markers(target);
            return PointerAction::default();
        };

        let elapsed_ms = now.duration_since(last_move).as_secs_f64() * 1000.0;
        if elapsed_ms < MIN_MOVE_INTERVAL_MS {
            return PointerAction::default();
        }

        self.pointer.speed = self.pointer.prev.distance_to(target) / elapsed_ms;
        self.pointer.prev = target;
        self.pointer.last_move = Some(now);

        if self.pointer.speed > self.config.speed_threshold {
            self.pointer.moving = true;
            PointerAction {
                cancel_fade_out: true,
                schedule_fade_out: false,
            }
        } else {
            self.pointer.moving = false;
            PointerAction {
                cancel_fade_out: false,
                schedule_fade_out: true,
            }
        }
    }

    /// Fired by the delayed fade-out. Unconditionally forces idle, even if
    /// movement resumed after the delay was scheduled; see DESIGN.md.
    pub fn force_idle(&mut self) {
        self.pointer.moving = false;
    }

    /// Advances the chain by one frame.
    ///
    /// The head is placed at the pointer target; each subsequent placement
    /// eases toward the next marker's previous-frame center by
    /// `movement_factor`, which produces the elastic chasing effect. The last
    /// marker wraps around to the head's already-updated current-frame
    /// center. Opacity steps up while the pointer is moving and down while it
    /// is idle, clamped to [0, 1].
    pub fn advance_frame(&mut self) {
        self.prev_centers.clear();
        self.prev_centers.extend(self.markers.iter().map(|m| m.center));

        let step = if self.pointer.moving {
            OPACITY_STEP
        } else {
            -OPACITY_STEP
        };
        let factor = self.config.movement_factor;
        let count = self.markers.len();
        let mut pos = self.pointer.target;

        for index in 0..count {
            self.markers[index].center = pos;
            self.markers[index].opacity = (self.markers[index].opacity + step).clamp(0.0, 1.0);

            let chase = if index + 1 < count {
                self.prev_centers[index + 1]
            } else {
                self.markers[0].center
            };
            pos = pos.lerp_toward(chase, factor);
        }
    }

    /// Rebuilds the gradient and marker chain in place for a changed
    /// configuration. The singleton guard and pointer state survive.
    pub fn apply_config(&mut self, config: Config) {
        self.markers = Self::make_markers(&config, self.pointer.target);
        self.config = config;
    }
}
