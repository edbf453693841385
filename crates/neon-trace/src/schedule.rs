//! Deep-scan log schedule.
//!
//! The scan animation is a fixed list of `{offset, line, status}` steps,
//! timed from the moment a lookup starts. It is not coordinated with the
//! model call; [`Lookup::run`](crate::lookup::Lookup::run) fires due steps
//! while the call is in flight and drops whatever has not fired when the
//! result is revealed.

use std::time::Duration;

use crate::events::{EventHandler, TraceEvent};
use crate::ui::ScanStatus;

/// Replaced with the raw handle when a line is rendered.
pub const TARGET_PLACEHOLDER: &str = "{target}";

/// One timed log line, optionally moving the scan to a new status.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanStep {
    /// Offset from the start of the lookup.
    pub offset: Duration,
    /// Log line template. May contain [`TARGET_PLACEHOLDER`].
    pub line: String,
    pub status: Option<ScanStatus>,
}

impl ScanStep {
    pub fn new(offset_ms: u64, line: impl Into<String>) -> Self {
        Self {
            offset: Duration::from_millis(offset_ms),
            line: line.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: ScanStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn render(&self, target: &str) -> String {
        self.line.replace(TARGET_PLACEHOLDER, target)
    }

    /// Emit the log line, then the status change if there is one.
    pub fn fire(&self, target: &str, handler: &dyn EventHandler) {
        let line = self.render(target);
        handler.on_event(&TraceEvent::Log(&line));
        if let Some(status) = self.status {
            handler.on_event(&TraceEvent::Status(status));
        }
    }
}

/// Ordered scan steps. Offsets are non-decreasing.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSchedule {
    steps: Vec<ScanStep>,
}

impl ScanSchedule {
    /// Build a schedule, sorting steps by offset.
    pub fn new(mut steps: Vec<ScanStep>) -> Self {
        steps.sort_by_key(|s| s.offset);
        Self { steps }
    }

    /// The twelve-second deep scan shown for every lookup.
    pub fn deep_scan() -> Self {
        Self::new(vec![
            ScanStep::new(200, "INITIALIZING TARGET LOCK: {target}")
                .with_status(ScanStatus::Scanning),
            ScanStep::new(800, "ESTABLISHING SECURE PROXY CHAIN..."),
            ScanStep::new(1800, "BYPASSING SOCIAL MEDIA API RATE LIMITS..."),
            ScanStep::new(2800, "INJECTING SEARCH QUERIES [TIKTOK, INSTA, X]..."),
            ScanStep::new(3800, "HARVESTING PUBLIC METADATA..."),
            ScanStep::new(5000, "DEEP PACKET INSPECTION..."),
            ScanStep::new(6500, "CORRELATING USERNAME PATTERNS...")
                .with_status(ScanStatus::Analyzing),
            ScanStep::new(8000, "ANALYZING BIO LINKS & REFERRALS...")
                .with_status(ScanStatus::Analyzing),
            ScanStep::new(9500, "BRUTE-FORCING HIDDEN DIRECTORIES..."),
            ScanStep::new(11000, "DECRYPTING FINAL DATA PACKET...")
                .with_status(ScanStatus::Decrypting),
        ])
    }

    /// Same lines and statuses with every offset zeroed.
    pub fn instant(mut self) -> Self {
        for step in &mut self.steps {
            step.offset = Duration::ZERO;
        }
        self
    }

    pub fn steps(&self) -> &[ScanStep] {
        &self.steps
    }

}

impl Default for ScanSchedule {
    fn default() -> Self {
        Self::deep_scan()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::FnEventHandler;
    use std::sync::Mutex;

    #[test]
    fn deep_scan_offsets_increase_and_fit_the_floor() {
        let schedule = ScanSchedule::deep_scan();
        assert_eq!(schedule.steps().len(), 10);
        for pair in schedule.steps().windows(2) {
            assert!(pair[0].offset < pair[1].offset);
        }
        assert!(schedule.steps()[9].offset < Duration::from_secs(12));
    }

    #[test]
    fn deep_scan_walks_scan_statuses_in_order() {
        let statuses: Vec<ScanStatus> = ScanSchedule::deep_scan()
            .steps()
            .iter()
            .filter_map(|s| s.status)
            .collect();
        assert_eq!(
            statuses,
            [
                ScanStatus::Scanning,
                ScanStatus::Analyzing,
                ScanStatus::Analyzing,
                ScanStatus::Decrypting
            ]
        );
    }

    #[test]
    fn first_line_names_the_target() {
        let schedule = ScanSchedule::deep_scan();
        assert_eq!(
            schedule.steps()[0].render("@alice"),
            "INITIALIZING TARGET LOCK: @alice"
        );
        assert_eq!(
            schedule.steps()[1].render("@alice"),
            "ESTABLISHING SECURE PROXY CHAIN..."
        );
    }

    #[test]
    fn new_sorts_by_offset() {
        let schedule = ScanSchedule::new(vec![ScanStep::new(500, "b"), ScanStep::new(100, "a")]);
        assert_eq!(schedule.steps()[0].line, "a");
    }

    #[test]
    fn instant_keeps_lines() {
        let schedule = ScanSchedule::deep_scan().instant();
        assert!(schedule.steps().iter().all(|s| s.offset.is_zero()));
        assert_eq!(schedule.steps().len(), 10);
    }

    #[test]
    fn fire_logs_before_status() {
        let seen = Mutex::new(Vec::new());
        let handler = FnEventHandler::new(|event| {
            let entry = match event {
                TraceEvent::Log(line) => format!("log:{line}"),
                TraceEvent::Status(s) => format!("status:{s}"),
                _ => return,
            };
            seen.lock().unwrap().push(entry);
        });
        ScanStep::new(0, "DECRYPTING").with_status(ScanStatus::Decrypting).fire("@a", &handler);
        assert_eq!(
            *seen.lock().unwrap(),
            ["log:DECRYPTING", "status:DECRYPTING"]
        );
    }
}
