use chrono::{Duration, NaiveDateTime, Timelike};

const SLOT_MINUTES: i64 = 15;

const TIMESTAMP_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse an ENTSO-E timestamp in any of the published layouts.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

/// Quarter-hour timeline shared by every country of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeLine {
    slots: Vec<NaiveDateTime>,
}

impl TimeLine {
    /// From the earliest timestamp, floored to a quarter hour, to the latest.
    ///
    /// A latest timestamp on a full hour is taken as the start of an hourly
    /// value, so the three remaining quarters of that hour are appended.
    pub fn from_timestamps<I>(timestamps: I) -> Self
    where
        I: IntoIterator<Item = NaiveDateTime>,
    {
        let mut bounds: Option<(NaiveDateTime, NaiveDateTime)> = None;
        for ts in timestamps {
            bounds = Some(match bounds {
                Some((first, last)) => (first.min(ts), last.max(ts)),
                None => (ts, ts),
            });
        }
        let Some((first, last)) = bounds else {
            return Self { slots: Vec::new() };
        };

        let step = Duration::minutes(SLOT_MINUTES);
        let mut end = last;
        if last.minute() == 0 {
            end = last + step * 3;
        }

        let mut slots = Vec::new();
        let mut current = floor_to_slot(first);
        while current <= end {
            slots.push(current);
            current += step;
        }
        Self { slots }
    }

    pub fn slots(&self) -> &[NaiveDateTime] {
        &self.slots
    }

    pub fn into_slots(self) -> Vec<NaiveDateTime> {
        self.slots
    }

    /// Position of `ts` on the timeline, if it is one of its slots.
    pub fn position(&self, ts: NaiveDateTime) -> Option<usize> {
        self.slots.binary_search(&ts).ok()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn first(&self) -> Option<NaiveDateTime> {
        self.slots.first().copied()
    }

    pub fn last(&self) -> Option<NaiveDateTime> {
        self.slots.last().copied()
    }
}

fn floor_to_slot(ts: NaiveDateTime) -> NaiveDateTime {
    let minute = ts.minute() - ts.minute() % SLOT_MINUTES as u32;
    ts.date()
        .and_hms_opt(ts.hour(), minute, 0)
        .unwrap_or(ts)
}
