/// Time between animation steps of the loading label.
pub const LOADING_STEP_SECONDS: f32 = 0.4;
const LOADING_TEXT: &str = "Загрузка";
const MAX_DOTS: usize = 3;

/// "Загрузка", "Загрузка.", "Загрузка..", "Загрузка...", then around again.
#[derive(Debug, Clone)]
pub struct LoadingIndicator {
    running: bool,
    accumulated: f32,
    dots: usize,
}

impl LoadingIndicator {
    pub fn start() -> Self {
        Self { running: true, accumulated: 0.0, dots: 0 }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn advance(&mut self, dt: f32) {
        if !self.running || !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.accumulated += dt;
        while self.accumulated >= LOADING_STEP_SECONDS {
            self.accumulated -= LOADING_STEP_SECONDS;
            self.dots = (self.dots + 1) % (MAX_DOTS + 1);
        }
    }

    /// `None` once stopped.
    pub fn label(&self) -> Option<String> {
        self.running.then(|| format!("{LOADING_TEXT}{}", ".".repeat(self.dots)))
    }

    pub fn stop(&mut self) {
        if self.running {
            log::debug!("[loading] Indicator stopped");
        }
        self.running = false;
        self.accumulated = 0.0;
        self.dots = 0;
    }
}
