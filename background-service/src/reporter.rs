use boardwatch_core::Comment;

/// Minimum seconds between two latency replies.
pub const DEFAULT_REPORT_INTERVAL: i64 = 3 * 60;

/// Answers trigger comments with the observed delay, at most once per
/// `interval` seconds. Only the poll loop touches it, so it is not locked.
#[derive(Debug, Clone)]
pub struct Reporter {
    /// Polling period; a delay below it is measurement noise.
    offset: i64,
    last: Option<i64>,
    interval: i64,
}

impl Reporter {
    pub fn new(offset: i64, interval: i64) -> Self {
        Self {
            offset,
            last: None,
            interval,
        }
    }

    /// Formatted delay for `comment`, or an empty string when the previous
    /// report is too recent.
    pub fn report(&mut self, comment: &Comment, observed_at: i64) -> String {
        let delay = (observed_at - comment.ctime - self.offset).max(0);

        match self.last {
            Some(last) if observed_at - last <= self.interval => return String::new(),
            _ => self.last = Some(observed_at),
        }

        format_delay(delay)
    }
}

pub fn format_delay(delay: i64) -> String {
    if delay <= 60 {
        format!("{} seconds", delay)
    } else if delay <= 60 * 60 {
        format!("{} min {:02} sec", delay / 60, delay % 60)
    } else {
        let (h, m, s) = (delay / 3600, (delay / 60) % 60, delay % 60);
        format!("{} hr {:02} min {:02} sec", h, m, s)
    }
}
