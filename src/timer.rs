/// One-second-resolution activity timer. Exactly one of these exists at a time,
/// owned by the open tracker session; the ticking task lives next to it and is
/// aborted on pause, reset and session close.
#[derive(Debug, Clone)]
pub struct ActivityTimer {
    elapsed_secs: u64,
    target_secs: u64,
    running: bool,
    cue_fired: bool,
}

impl ActivityTimer {
    pub fn new(target_secs: u64) -> Self {
        Self {
            elapsed_secs: 0,
            target_secs,
            running: false,
            cue_fired: false,
        }
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn target_secs(&self) -> u64 {
        self.target_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Flip run/pause; returns the new running state.
    pub fn toggle(&mut self) -> bool {
        self.running = !self.running;
        self.running
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Advance one second while running. Returns true on the single tick where
    /// the elapsed time reaches the target (the completion cue); the counter
    /// keeps going past the target.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.elapsed_secs += 1;
        if !self.cue_fired && self.target_secs > 0 && self.elapsed_secs == self.target_secs {
            self.cue_fired = true;
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.elapsed_secs = 0;
        self.running = false;
        self.cue_fired = false;
    }

    /// `MM:SS` display, matching the modal readout.
    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.elapsed_secs / 60, self.elapsed_secs % 60)
    }

    /// Elapsed time rounded up to whole minutes, for pre-filling the log form.
    pub fn logged_minutes(&self) -> u32 {
        self.elapsed_secs.div_ceil(60) as u32
    }
}
