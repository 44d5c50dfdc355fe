/// Host facility that calls back once per display frame: a window's redraw
/// request, a browser animation frame, a test harness.
pub trait FrameScheduler {
    /// Ask for one more frame.
    fn request_frame(&mut self);

    /// Withdraw an outstanding request, if the host supports it.
    fn cancel(&mut self) {}
}

/// Frame requests collected for a caller that pumps frames by hand.
#[derive(Debug, Default)]
pub struct ManualFrames {
    pending: bool,
    requested: u64,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the outstanding request, if any.
    pub fn take_request(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn requested(&self) -> u64 {
        self.requested
    }
}

impl FrameScheduler for ManualFrames {
    fn request_frame(&mut self) {
        self.pending = true;
        self.requested += 1;
    }

    fn cancel(&mut self) {
        self.pending = false;
    }
}

/// Start/stop owner of the per-frame callback.
///
/// The loop never spins on its own. While running, each handled frame asks
/// the host scheduler for the next one; once stopped, late frames from the
/// host are ignored.
#[derive(Debug)]
pub struct RenderLoop<S> {
    scheduler: S,
    running: bool,
    frames: u64,
}

impl<S: FrameScheduler> RenderLoop<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            running: false,
            frames: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Frames handled since construction.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.scheduler.request_frame();
        tracing::debug!("render loop started");
    }

    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.scheduler.cancel();
        tracing::debug!(frames = self.frames, "render loop stopped");
    }

    /// Handle a frame delivered by the host. Runs `frame` and requests the
    /// next one only while the loop is running.
    pub fn on_frame<T>(&mut self, frame: impl FnOnce() -> T) -> Option<T> {
        if !self.running {
            return None;
        }
        let out = frame();
        self.frames += 1;
        if self.running {
            self.scheduler.request_frame();
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_requests_a_frame() {
        let mut lp = RenderLoop::new(ManualFrames::new());
        assert!(!lp.is_running());
        lp.start();
        assert!(lp.scheduler().is_pending());
        lp.start();
        assert_eq!(lp.scheduler().requested(), 1);
    }

    #[test]
    fn each_frame_requests_the_next() {
        let mut lp = RenderLoop::new(ManualFrames::new());
        lp.start();
        let mut drawn = 0;
        for _ in 0..3 {
            assert!(lp.scheduler_mut().take_request());
            lp.on_frame(|| drawn += 1);
        }
        assert_eq!(drawn, 3);
        assert_eq!(lp.frames(), 3);
        assert!(lp.scheduler().is_pending());
    }

    #[test]
    fn stopped_loop_ignores_frames() {
        let mut lp = RenderLoop::new(ManualFrames::new());
        lp.start();
        lp.stop();
        assert!(!lp.scheduler().is_pending());
        assert_eq!(lp.on_frame(|| 1), None);
        assert_eq!(lp.frames(), 0);
    }

    #[test]
    fn restart_resumes_requests() {
        let mut lp = RenderLoop::new(ManualFrames::new());
        lp.start();
        lp.stop();
        lp.start();
        assert!(lp.scheduler().is_pending());
        assert_eq!(lp.on_frame(|| "drawn"), Some("drawn"));
    }
}
