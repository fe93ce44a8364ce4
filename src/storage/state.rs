use std::collections::HashSet;

use super::journal::Record;
use crate::domain::Fingerprint;

/// Everything that must survive a restart.
///
/// Sources and recipients are append-only; a source's position in `sources`
/// is its external handle. Fingerprints are only ever added. A recipient
/// appears at most once, whatever the snapshot or journal repeats.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DurableState {
    seen: HashSet<Fingerprint>,
    sources: Vec<String>,
    recipients: Vec<i64>,
}

impl DurableState {
    pub fn new(
        seen: impl IntoIterator<Item = Fingerprint>,
        sources: Vec<String>,
        recipients: Vec<i64>,
    ) -> Self {
        let mut state = Self {
            seen: seen.into_iter().collect(),
            sources,
            recipients: Vec::with_capacity(recipients.len()),
        };
        for id in recipients {
            state.add_recipient(id);
        }
        state
    }

    pub fn is_new(&self, fingerprint: Fingerprint) -> bool {
        !self.seen.contains(&fingerprint)
    }

    pub fn seen(&self) -> &HashSet<Fingerprint> {
        &self.seen
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn recipients(&self) -> &[i64] {
        &self.recipients
    }

    /// Apply one journal record in memory.
    pub fn apply(&mut self, record: &Record) {
        match record {
            Record::MarkSeen(fingerprint) => {
                self.seen.insert(*fingerprint);
            }
            Record::AddSource(url) => self.sources.push(url.clone()),
            Record::AddRecipient(id) => self.add_recipient(*id),
        }
    }

    fn add_recipient(&mut self, id: i64) {
        if !self.recipients.contains(&id) {
            self.recipients.push(id);
        }
    }

    pub fn apply_all<'a>(&mut self, records: impl IntoIterator<Item = &'a Record>) {
        for record in records {
            self.apply(record);
        }
    }
}
