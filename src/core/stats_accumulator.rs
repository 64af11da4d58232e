//! Run statistics. Any thread may report through the channel senders; the
//! values are folded into the tables when `accumulate` is called, or by the
//! reporting thread once `PENDING_LIMIT` reports are queued.
use crossbeam_channel::{unbounded, Receiver, Sender};
use hashbrown::HashMap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io::{self, Write};

enum Report {
    Counter(String, i64),
    Percentage(String, i64, i64)
}

#[derive(Default)]
struct Tables {
    counters: HashMap<String, i64>,
    percentages: HashMap<String, (i64, i64)>
}

pub struct StatsAccumulator {
    sender: Sender<Report>,
    receiver: Receiver<Report>,
    tables: Mutex<Tables>
}

/// Queued reports that trigger a drain from the reporting side.
pub const PENDING_LIMIT: usize = 1024;

lazy_static! {
    static ref INSTANCE: StatsAccumulator = StatsAccumulator::new();
}

impl StatsAccumulator {
    pub fn new() -> StatsAccumulator {
        let (sender, receiver) = unbounded::<Report>();
        StatsAccumulator {
            sender,
            receiver,
            tables: Mutex::new(Tables::default())
        }
    }

    /// Returns the process-wide instance.
    pub fn instance() -> &'static StatsAccumulator {
        &INSTANCE
    }

    /// Names are `Category/Title`.
    pub fn report_counter(&self, name: &str, val: i64) {
        // The receiver lives as long as self, so the send cannot fail.
        let _ = self.sender.send(Report::Counter(name.to_owned(), val));
        self.drain_if_full();
    }

    pub fn report_percentage(&self, name: &str, num: i64, denom: i64) {
        let _ = self.sender.send(Report::Percentage(name.to_owned(), num, denom));
        self.drain_if_full();
    }

    fn drain_if_full(&self) {
        if self.receiver.len() >= PENDING_LIMIT {
            self.accumulate();
        }
    }

    /// Reports sent but not yet folded into the tables.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Drain pending reports into the tables.
    pub fn accumulate(&self) {
        let mut tables = self.tables.lock();
        for report in self.receiver.try_iter() {
            match report {
                Report::Counter(name, val) => {
                    *tables.counters.entry(name).or_default() += val;
                }
                Report::Percentage(name, num, denom) => {
                    let entry = tables.percentages.entry(name).or_default();
                    entry.0 += num;
                    entry.1 += denom;
                }
            }
        }
    }

    pub fn counter(&self, name: &str) -> i64 {
        self.accumulate();
        self.tables.lock().counters.get(name).copied().unwrap_or(0)
    }

    pub fn percentage(&self, name: &str) -> Option<(i64, i64)> {
        self.accumulate();
        self.tables.lock().percentages.get(name).copied()
    }

    pub fn clear(&self) {
        self.accumulate();
        let mut tables = self.tables.lock();
        tables.counters.clear();
        tables.percentages.clear();
    }

    pub fn print<W: Write>(&self, dest: &mut W) -> io::Result<()> {
        self.accumulate();
        let tables = self.tables.lock();
        let mut to_print: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in &tables.counters {
            let (category, title) = get_category_and_title(name);
            to_print.entry(category.into()).or_default()
                .push(format!("{:<42}               {:12}", title, value));
        }
        for (name, value) in &tables.percentages {
            if value.1 == 0 {
                continue;
            }
            let (category, title) = get_category_and_title(name);
            let percent = value.0 as f64 * 100.0 / value.1 as f64;
            to_print.entry(category.into()).or_default()
                .push(format!("{:<42}{:12} {:12} ({:.2}%)", title, value.0, value.1, percent));
        }

        writeln!(dest, "Statistics:")?;
        for (category, mut items) in to_print {
            items.sort();
            writeln!(dest, "  {}", category)?;
            for item in items {
                writeln!(dest, "    {}", item)?;
            }
        }
        Ok(())
    }
}

impl Default for StatsAccumulator {
    fn default() -> StatsAccumulator {
        StatsAccumulator::new()
    }
}

#[inline]
pub fn get_category_and_title(s: &str) -> (&str, &str) {
    let mut split = s.splitn(2, '/');
    match (split.next(), split.next()) {
        (Some(category), Some(title)) => (category, title),
        (Some(title), None) => ("", title),
        _ => ("", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_sum_reports() {
        let stats = StatsAccumulator::new();
        stats.report_counter("Tracer/Rays traced", 10);
        stats.report_counter("Tracer/Rays traced", 5);
        assert_eq!(stats.counter("Tracer/Rays traced"), 15);
        assert_eq!(stats.counter("Tracer/Unknown"), 0);
    }

    #[test]
    fn percentages_and_print() {
        let stats = StatsAccumulator::new();
        stats.report_percentage("Tracer/Rays vignetted", 1, 4);
        stats.report_percentage("Tracer/Rays vignetted", 1, 4);
        assert_eq!(stats.percentage("Tracer/Rays vignetted"), Some((2, 8)));
        let mut out = Vec::new();
        stats.print(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Tracer"));
        assert!(text.contains("25.00%"));
    }

    #[test]
    fn queue_stays_bounded() {
        let stats = StatsAccumulator::new();
        for _ in 0..10 * PENDING_LIMIT {
            stats.report_counter("Tracer/Rays traced", 1);
            stats.report_percentage("Tracer/Rays vignetted", 1, 2);
            assert!(stats.pending() < PENDING_LIMIT);
        }
        assert_eq!(stats.counter("Tracer/Rays traced"), 10 * PENDING_LIMIT as i64);
        assert_eq!(stats.percentage("Tracer/Rays vignetted"),
            Some((10 * PENDING_LIMIT as i64, 20 * PENDING_LIMIT as i64)));
        assert_eq!(stats.pending(), 0);
    }

    #[test]
    fn category_split() {
        assert_eq!(get_category_and_title("A/b/c"), ("A", "b/c"));
        assert_eq!(get_category_and_title("plain"), ("", "plain"));
    }
}
