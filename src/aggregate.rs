//! Folding protocol events into per-group results.

use std::collections::HashMap;

use crate::{
    capture::PassthroughSink,
    error::ProtocolViolation,
    outcome::{AssertionStatus, TestGroup},
    protocol::{ParseEvent, parse_line},
};

/// Test groups of one run, keyed by name and kept in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestGroups {
    groups: Vec<TestGroup>,
    index: HashMap<String, usize>,
}

impl TestGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a group, resetting it if the name was seen before.
    ///
    /// Returns the position of the group, which stays stable across resets.
    pub fn start(&mut self, name: &str) -> usize {
        if let Some(&pos) = self.index.get(name) {
            self.groups[pos].reset();
            return pos;
        }

        let pos = self.groups.len();
        self.groups.push(TestGroup::new(name));
        self.index.insert(name.to_owned(), pos);
        pos
    }

    pub fn get(&self, name: &str) -> Option<&TestGroup> {
        self.index.get(name).map(|&pos| &self.groups[pos])
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TestGroup> {
        self.groups.iter()
    }

    pub fn totals(&self) -> Totals {
        self.groups.iter().fold(Totals::default(), |totals, group| Totals {
            ok: totals.ok + group.ok(),
            fail: totals.fail + group.fail(),
        })
    }

    fn get_mut(&mut self, pos: usize) -> &mut TestGroup {
        &mut self.groups[pos]
    }
}

impl<'g> IntoIterator for &'g TestGroups {
    type Item = &'g TestGroup;
    type IntoIter = std::slice::Iter<'g, TestGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub ok: usize,
    pub fail: usize,
}

impl Totals {
    pub fn total(&self) -> usize {
        self.ok + self.fail
    }

    /// Percentage of passed assertions, `None` if no tests were run.
    pub fn success_rate(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.ok as f64 * 100.0 / total as f64),
        }
    }

    pub fn tier(&self) -> Option<Tier> {
        match (self.ok, self.fail) {
            (0, 0) => None,
            (_, 0) => Some(Tier::AllPass),
            (0, _) => Some(Tier::AllFail),
            _ => Some(Tier::Mixed),
        }
    }
}

/// Coarse classification of a run's assertions, used for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    AllPass,
    AllFail,
    Mixed,
}

/// Everything the aggregator learned from one diagnostic stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct Aggregation {
    pub groups: TestGroups,
    pub malformed_lines: usize,
    pub violations: Vec<ProtocolViolation>,
}

/// Stateful consumer of [`ParseEvent`]s.
///
/// Tracks which group is current, outcomes are recorded into it until the
/// next `start` event.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    groups: TestGroups,
    current: Option<usize>,
    lines: usize,
    malformed_lines: usize,
    violations: Vec<ProtocolViolation>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed_line<S: PassthroughSink + ?Sized>(&mut self, line: &str, sink: &mut S) {
        self.apply(parse_line(line), sink)
    }

    pub fn apply<S: PassthroughSink + ?Sized>(&mut self, event: ParseEvent, sink: &mut S) {
        self.lines += 1;
        match event {
            ParseEvent::StartGroup(name) => {
                tracing::trace!(group = %name, "test group started");
                self.current = Some(self.groups.start(&name));
            }
            ParseEvent::Outcome { label, status } => self.record(status, label),
            ParseEvent::Passthrough(text) => sink.passthrough(&text),
            ParseEvent::Malformed(line) => {
                tracing::warn!(line = self.lines, raw = %line, "malformed protocol line");
                self.malformed_lines += 1;
                sink.passthrough(&line);
            }
        }
    }

    fn record(&mut self, status: AssertionStatus, label: String) {
        match self.current {
            Some(pos) => self.groups.get_mut(pos).record(status, label),
            None => {
                let violation = ProtocolViolation::OutcomeBeforeStart {
                    label,
                    line: self.lines,
                };
                tracing::warn!(%violation, "protocol violation");
                self.violations.push(violation);
            }
        }
    }

    pub fn current(&self) -> Option<&TestGroup> {
        self.current.map(|pos| &self.groups.groups[pos])
    }

    pub fn groups(&self) -> &TestGroups {
        &self.groups
    }

    pub fn totals(&self) -> Totals {
        self.groups.totals()
    }

    pub fn malformed_lines(&self) -> usize {
        self.malformed_lines
    }

    pub fn violations(&self) -> &[ProtocolViolation] {
        &self.violations
    }

    pub fn finish(self) -> Aggregation {
        Aggregation {
            groups: self.groups,
            malformed_lines: self.malformed_lines,
            violations: self.violations,
        }
    }
}
