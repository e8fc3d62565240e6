use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

/// Receives progress of the long-running stages.
pub trait ProgressSink: Send + Sync {
    fn set_sub_label(&self, label: &str);
    fn progress(&self, done: usize, total: usize);
    fn reset_sub_label(&self);
}

/// Discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn set_sub_label(&self, _label: &str) {}
    fn progress(&self, _done: usize, _total: usize) {}
    fn reset_sub_label(&self) {}
}

/// Terminal progress bar.
pub struct ProgressReporter {
    bar: ProgressBar,
    label: String,
}

impl ProgressReporter {
    pub fn new(label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] {msg} [{bar:40.cyan/blue}] {pos}/{len}")?
                .progress_chars("##-"),
        );
        bar.set_message(label.clone());
        Ok(Self { bar, label })
    }

    pub fn finish(&self) {
        self.bar.finish_with_message(self.label.clone());
    }
}

impl ProgressSink for ProgressReporter {
    fn set_sub_label(&self, label: &str) {
        self.bar.set_message(format!("{}: {}", self.label, label));
    }

    fn progress(&self, done: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(done as u64);
    }

    fn reset_sub_label(&self) {
        self.bar.set_message(self.label.clone());
        self.bar.set_position(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingProgress {
        labels: Mutex<Vec<String>>,
        updates: Mutex<Vec<(usize, usize)>>,
    }

    impl ProgressSink for RecordingProgress {
        fn set_sub_label(&self, label: &str) {
            self.labels.lock().unwrap().push(label.to_string());
        }

        fn progress(&self, done: usize, total: usize) {
            self.updates.lock().unwrap().push((done, total));
        }

        fn reset_sub_label(&self) {
            self.labels.lock().unwrap().clear();
        }
    }

    #[test]
    fn test_reporter_tracks_position() {
        let reporter = ProgressReporter::new("generation").unwrap();
        reporter.set_sub_label("CH");
        reporter.progress(3, 10);
        assert_eq!(reporter.bar.position(), 3);
        assert_eq!(reporter.bar.length(), Some(10));
        reporter.reset_sub_label();
        assert_eq!(reporter.bar.position(), 0);
        reporter.finish();
    }

    #[test]
    fn test_sinks_are_usable_as_trait_objects() {
        let recording = RecordingProgress::default();
        let sinks: [&dyn ProgressSink; 2] = [&NoProgress, &recording];
        for sink in sinks {
            sink.set_sub_label("Loading");
            sink.progress(1, 2);
        }
        assert_eq!(*recording.labels.lock().unwrap(), vec!["Loading".to_string()]);
        assert_eq!(*recording.updates.lock().unwrap(), vec![(1, 2)]);
    }
}
