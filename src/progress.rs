//! Progress rendering for the terminal and for headless runs.

use std::io::Write;
use std::time::{Duration, Instant};

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use dirdat_scan::{
    HashProgress, ProgressObserver, ScanItem, Throughput, format_clock, truncate_left,
};

/// Headless runs print a status line every this many files.
pub const PLAIN_REPORT_EVERY: usize = 100;

/// Columns assumed when the terminal size is unknown.
const FALLBACK_COLUMNS: usize = 80;

/// Format size in human-readable form.
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Current terminal width in columns.
pub fn terminal_columns() -> usize {
    crossterm::terminal::size()
        .map(|(cols, _)| cols as usize)
        .ok()
        .filter(|&cols| cols > 0)
        .unwrap_or(FALLBACK_COLUMNS)
}

/// `SIZE | path`, with the path cut from the left to fit `columns`.
pub fn file_line(item: &ScanItem, columns: usize) -> String {
    let size = format_size(item.size);
    let available = columns.saturating_sub(size.chars().count() + 3);
    format!("{size} | {}", truncate_left(&item.relative, available))
}

fn speed_and_eta(throughput: &Throughput, progress: &HashProgress) -> String {
    match throughput.bytes_per_second() {
        Some(speed) => {
            let eta = throughput
                .eta(progress.bytes_remaining())
                .map(format_clock)
                .unwrap_or_else(|| "--:--:--".to_string());
            format!("{}/s ETA {eta}", format_size(speed as u64))
        }
        None => "ETA --:--:--".to_string(),
    }
}

/// Spinner shown while the source tree is enumerated.
pub fn scan_spinner() -> ProgressBar {
    let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message("Scanning…");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Two-line in-place display: the current file, then a byte progress bar.
pub struct TerminalReporter {
    _multi: MultiProgress,
    header: ProgressBar,
    bar: ProgressBar,
    throughput: Throughput,
    columns: usize,
}

impl TerminalReporter {
    /// Create a reporter for `total_bytes` of hashing.
    pub fn new(total_bytes: u64) -> Self {
        let multi = MultiProgress::with_draw_target(ProgressDrawTarget::stderr());

        let header = multi.add(ProgressBar::new_spinner());
        header.set_style(
            ProgressStyle::with_template("{msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );

        let bar = multi.add(ProgressBar::new(total_bytes));
        bar.set_style(
            ProgressStyle::with_template(
                "{bar:40.cyan/blue} {percent:>3}% {binary_bytes}/{binary_total_bytes} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏ "),
        );

        Self {
            _multi: multi,
            header,
            bar,
            throughput: Throughput::default(),
            columns: terminal_columns(),
        }
    }
}

impl ProgressObserver for TerminalReporter {
    fn file_started(&mut self, item: &ScanItem) {
        self.header.set_message(file_line(item, self.columns));
    }

    fn ping(&mut self, progress: &HashProgress) {
        self.throughput.record(Instant::now(), progress.bytes_done);
        self.bar.set_position(progress.bytes_done);
        self.bar.set_message(speed_and_eta(&self.throughput, progress));
    }

    fn finished(&mut self, progress: &HashProgress) {
        self.bar.set_position(progress.bytes_done);
        self.header.finish_and_clear();
        self.bar.abandon();
    }
}

/// Line-per-batch output for logs and pipes.
pub struct PlainReporter<W: Write> {
    out: W,
    every: usize,
    throughput: Throughput,
    current: String,
    last_reported: usize,
}

impl<W: Write> PlainReporter<W> {
    /// Create a reporter writing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            every: PLAIN_REPORT_EVERY,
            throughput: Throughput::default(),
            current: String::new(),
            last_reported: 0,
        }
    }

    /// Report every `every` files instead of the default.
    #[cfg(test)]
    pub fn with_interval(mut self, every: usize) -> Self {
        self.every = every.max(1);
        self
    }

    /// Get the underlying writer.
    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ProgressObserver for PlainReporter<W> {
    fn file_started(&mut self, item: &ScanItem) {
        self.current = item.relative.clone();
    }

    fn ping(&mut self, progress: &HashProgress) {
        self.throughput.record(Instant::now(), progress.bytes_done);

        let done = progress.files_done;
        let due = done % self.every == 0 || done == progress.files_total;
        if done == self.last_reported || !due {
            return;
        }
        self.last_reported = done;

        // Progress output is best effort.
        let _ = writeln!(
            self.out,
            "[{done}/{}] {:.1}% {}/{} {} {}",
            progress.files_total,
            progress.percentage(),
            format_size(progress.bytes_done),
            format_size(progress.bytes_total),
            speed_and_eta(&self.throughput, progress),
            self.current,
        );
    }
}
