use std::time::Instant;

use crate::core::Bitmap;

/// Crossfade state machine, driven by wall-clock time.
///
/// This is deliberately plain mutable state owned next to the render loop,
/// never routed through the serialized scene/config model: it changes every
/// frame and must not touch the settings path. The snapshot bitmap is owned
/// exclusively here and overwritten only when a new fade starts.
#[derive(Debug, Default)]
pub struct Transition {
    state: State,
    snapshot: Option<Bitmap>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum State {
    #[default]
    Idle,
    Running {
        started: Instant,
        progress: f32,
    },
}

/// Per-layer alpha and blur for one crossfade frame. Outgoing goes under
/// incoming; the two alphas always sum to 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FadeParams {
    pub out_alpha: f32,
    pub out_blur_px: f32,
    pub in_alpha: f32,
    pub in_blur_px: f32,
}

pub fn fade_params(progress: f32) -> FadeParams {
    let p = progress.clamp(0.0, 1.0);
    FadeParams {
        out_alpha: 1.0 - p,
        out_blur_px: p * 20.0,
        in_alpha: p,
        in_blur_px: (1.0 - p) * 20.0,
    }
}

impl Transition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) a fade. `snapshot` is whatever is currently on
    /// screen, which may itself be mid-fade; there is no queueing and never
    /// more than two generations in play.
    pub fn begin(&mut self, snapshot: Bitmap, now: Instant) {
        self.snapshot = Some(snapshot);
        self.state = State::Running {
            started: now,
            progress: 0.0,
        };
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running { .. })
    }

    pub fn snapshot(&self) -> Option<&Bitmap> {
        self.snapshot.as_ref()
    }

    /// Advance to `now` and return the current progress, or `None` once
    /// idle. Progress is monotone within one fade and hits exactly 1.0
    /// before the state returns to idle, so the final running frame is
    /// never skipped past.
    pub fn tick(&mut self, now: Instant, duration_ms: u64) -> Option<f32> {
        let State::Running { started, progress } = self.state else {
            return None;
        };

        let elapsed_ms = now.saturating_duration_since(started).as_secs_f64() * 1000.0;
        let raw = if duration_ms == 0 {
            1.0
        } else {
            (elapsed_ms / duration_ms as f64).clamp(0.0, 1.0) as f32
        };
        let p = raw.max(progress);

        if p >= 1.0 {
            self.state = State::Idle;
            return Some(1.0);
        }

        self.state = State::Running {
            started,
            progress: p,
        };
        Some(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn bitmap() -> Bitmap {
        Bitmap::filled(2, 2, [255, 0, 0, 255])
    }

    #[test]
    fn first_tick_at_start_is_zero() {
        let t0 = Instant::now();
        let mut tr = Transition::new();
        tr.begin(bitmap(), t0);
        assert_eq!(tr.tick(t0, 800), Some(0.0));
        let p = fade_params(0.0);
        assert_eq!(p.out_alpha, 1.0);
        assert_eq!(p.out_blur_px, 0.0);
        assert_eq!(p.in_alpha, 0.0);
        assert_eq!(p.in_blur_px, 20.0);
    }

    #[test]
    fn midpoint_splits_alpha_and_blur_evenly() {
        let t0 = Instant::now();
        let mut tr = Transition::new();
        tr.begin(bitmap(), t0);
        let p = tr.tick(t0 + Duration::from_millis(400), 800).unwrap();
        assert!((p - 0.5).abs() < 1e-3);
        let f = fade_params(0.5);
        assert_eq!(f.out_alpha, 0.5);
        assert_eq!(f.in_alpha, 0.5);
        assert_eq!(f.out_blur_px, 10.0);
        assert_eq!(f.in_blur_px, 10.0);
    }

    #[test]
    fn completes_with_exact_one_then_idles() {
        let t0 = Instant::now();
        let mut tr = Transition::new();
        tr.begin(bitmap(), t0);
        assert_eq!(tr.tick(t0 + Duration::from_millis(800), 800), Some(1.0));
        assert!(!tr.is_running());
        // Follow-up ticks stay idle.
        assert!(tr.tick(t0 + Duration::from_millis(900), 800).is_none());
    }

    #[test]
    fn progress_is_monotone_within_one_fade() {
        let t0 = Instant::now();
        let mut tr = Transition::new();
        tr.begin(bitmap(), t0);
        let mut last = -1.0f32;
        for ms in [0u64, 100, 250, 250, 400, 700, 799] {
            let p = tr.tick(t0 + Duration::from_millis(ms), 800).unwrap();
            assert!(p >= last, "progress regressed: {p} < {last}");
            last = p;
        }
    }

    #[test]
    fn alphas_sum_to_one_for_any_progress() {
        for i in 0..=100 {
            let f = fade_params(i as f32 / 100.0);
            assert!((f.out_alpha + f.in_alpha - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn retrigger_overwrites_snapshot_and_restarts() {
        let t0 = Instant::now();
        let mut tr = Transition::new();
        tr.begin(bitmap(), t0);
        tr.tick(t0 + Duration::from_millis(400), 800);

        let second = Bitmap::filled(2, 2, [0, 255, 0, 255]);
        tr.begin(second.clone(), t0 + Duration::from_millis(500));
        assert_eq!(tr.snapshot(), Some(&second));
        let p = tr.tick(t0 + Duration::from_millis(500), 800).unwrap();
        assert_eq!(p, 0.0);
    }

    #[test]
    fn zero_duration_goes_straight_to_idle() {
        let t0 = Instant::now();
        let mut tr = Transition::new();
        tr.begin(bitmap(), t0);
        assert_eq!(tr.tick(t0, 0), Some(1.0));
        assert!(!tr.is_running());
    }
}
