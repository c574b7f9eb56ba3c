// Redraw-on-demand frame scheduling keyed to the display refresh
use crate::domain::error::{ChartError, ChartResult};
use crate::domain::performance::{FrameStats, SampleWindow};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// Length of the trailing frame-rate window shown in the FPS overlay.
pub const FPS_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(pub u64);

/// Source of display-refresh callbacks.
pub trait FrameClock: Send {
    /// Ask for one callback on the next refresh.
    fn request_frame(&mut self) -> FrameToken;
    fn cancel_frame(&mut self, token: FrameToken);
}

/// Clock whose refreshes are delivered by whoever owns it: a timer tick in
/// the render loop, a single synchronous pass for headless renders, or a
/// test stepping frames by hand.
#[derive(Debug, Default)]
pub struct TickClock {
    next_token: u64,
    pending: Option<FrameToken>,
}

impl TickClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token due on this refresh, if a frame was requested since the last one.
    pub fn take_due(&mut self) -> Option<FrameToken> {
        self.pending.take()
    }
}

impl FrameClock for TickClock {
    fn request_frame(&mut self) -> FrameToken {
        self.next_token += 1;
        let token = FrameToken(self.next_token);
        self.pending = Some(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if self.pending == Some(token) {
            self.pending = None;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawReason {
    DataReplaced,
    Resized,
    HoverChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Scheduled(FrameToken),
}

/// Idle/Scheduled state machine. At most one frame is ever pending and each
/// firing performs exactly one draw pass.
pub struct FrameScheduler<C> {
    clock: C,
    state: SchedulerState,
    last_frame_ms: Option<f64>,
    fps_window: SampleWindow,
    frames_drawn: u64,
    frames_dropped: u64,
}

impl<C: FrameClock> FrameScheduler<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            state: SchedulerState::Idle,
            last_frame_ms: None,
            fps_window: SampleWindow::new(FPS_WINDOW),
            frames_drawn: 0,
            frames_dropped: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped
    }

    /// Rounded mean of the trailing frame-rate window.
    pub fn average_fps(&self) -> Option<f64> {
        self.fps_window.average().map(f64::round)
    }

    /// Request a redraw. Returns `false` when one is already pending and the
    /// request was coalesced into it.
    pub fn invalidate(&mut self, reason: RedrawReason) -> bool {
        match self.state {
            SchedulerState::Scheduled(token) => {
                tracing::trace!(?reason, token = token.0, "redraw coalesced");
                false
            }
            SchedulerState::Idle => {
                let token = self.clock.request_frame();
                tracing::trace!(?reason, token = token.0, "redraw scheduled");
                self.state = SchedulerState::Scheduled(token);
                true
            }
        }
    }

    /// Drop the pending frame, if any.
    pub fn cancel(&mut self) {
        if let SchedulerState::Scheduled(token) = self.state {
            self.clock.cancel_frame(token);
            self.state = SchedulerState::Idle;
        }
    }

    /// Run the frame for `token` at `now_ms`. Stale or cancelled tokens are
    /// ignored. The scheduler is back in Idle before `draw` runs, so a
    /// failing or panicking draw cannot wedge it; the failure is logged and
    /// the frame reported as dropped.
    ///
    /// `draw` receives the windowed average FPS for its overlay.
    pub fn fire<F>(&mut self, token: FrameToken, now_ms: f64, draw: F) -> Option<FrameStats>
    where
        F: FnOnce(Option<f64>) -> ChartResult<()>,
    {
        if self.state != SchedulerState::Scheduled(token) {
            tracing::trace!(token = token.0, "ignoring stale frame");
            return None;
        }
        self.state = SchedulerState::Idle;

        let frame_time_ms = self.last_frame_ms.map(|last| now_ms - last);
        self.last_frame_ms = Some(now_ms);
        let instant_fps = frame_time_ms.filter(|dt| *dt > 0.0).map(|dt| (1000.0 / dt).round());
        if let Some(fps) = instant_fps {
            self.fps_window.push(fps);
        }
        let average_fps = self.average_fps();

        let started = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| draw(average_fps)));
        let render_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        let dropped = match outcome {
            Ok(Ok(())) => false,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "frame dropped");
                true
            }
            Err(payload) => {
                let e = ChartError::Draw(panic_message(payload.as_ref()));
                tracing::error!(error = %e, "draw panicked, frame dropped");
                true
            }
        };
        if dropped {
            self.frames_dropped += 1;
        } else {
            self.frames_drawn += 1;
        }

        Some(FrameStats {
            frame_time_ms,
            instant_fps,
            average_fps,
            render_time_ms,
            dropped,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
