//! `ExpiryIterator`: buffers one version's artifacts at a time, deciding to
//! emit or discard only once the first artifact of a later version is
//! observed, per spec.md §4.4 and the state machine in §4.9. Grounded in
//! `wal::record`'s forward-only log replay shape, generalized to a
//! boundary-lookahead `Iterator` adapter so the buffer never materializes
//! the whole input (spec.md §9 "Streams with boundary lookahead").

use crate::model::LogEntry;

/// Wraps a forward-ordered, version-ordered iterator of `{Commit, Checkpoint,
/// Checksum}` entries and yields only those judged safe to delete.
///
/// An entry at version `V` is emitted iff `V <= safety_threshold` and the
/// modification time of the first artifact observed at a later version is
/// `<= cutoff_millis`. The last buffered version is never emitted: there is
/// no later artifact to witness its safety (§4.4 "Terminal flush").
pub struct ExpiryIterator<I> {
    inner: I,
    cutoff_millis: i64,
    safety_threshold: i64,
    state: State,
}

enum State {
    /// No buffered version yet.
    Empty,
    /// Buffering artifacts of `version`; `ready` holds entries already
    /// decided safe to emit, drained before pulling new input.
    Buffering { version: u64, buffer: Vec<LogEntry>, ready: std::vec::IntoIter<LogEntry> },
    Exhausted,
}

impl<I: Iterator<Item = LogEntry>> ExpiryIterator<I> {
    pub fn new(inner: I, cutoff_millis: i64, safety_threshold: i64) -> Self {
        Self {
            inner,
            cutoff_millis,
            safety_threshold,
            state: State::Empty,
        }
    }

    fn version_of(entry: &LogEntry) -> u64 {
        entry
            .version()
            .expect("expiry input is pre-filtered to versioned kinds")
    }
}

impl<I: Iterator<Item = LogEntry>> Iterator for ExpiryIterator<I> {
    type Item = LogEntry;

    fn next(&mut self) -> Option<LogEntry> {
        loop {
            let state = std::mem::replace(&mut self.state, State::Exhausted);

            let (mut version, mut buffer, mut ready) = match state {
                State::Exhausted => return None,
                State::Empty => match self.inner.next() {
                    None => return None,
                    Some(entry) => {
                        let version = Self::version_of(&entry);
                        (version, vec![entry], Vec::new().into_iter())
                    }
                },
                State::Buffering { version, buffer, ready } => (version, buffer, ready),
            };

            if let Some(entry) = ready.next() {
                self.state = State::Buffering { version, buffer, ready };
                return Some(entry);
            }

            match self.inner.next() {
                None => {
                    // Terminal flush: the last buffered version is never
                    // emitted, regardless of its contents.
                    self.state = State::Exhausted;
                }
                Some(next_entry) => {
                    let next_version = Self::version_of(&next_entry);
                    if next_version == version {
                        buffer.push(next_entry);
                        self.state = State::Buffering { version, buffer, ready };
                    } else {
                        let emit = next_entry.modification_time_millis <= self.cutoff_millis
                            && version as i64 <= self.safety_threshold;
                        let resolved: std::vec::IntoIter<LogEntry> =
                            if emit { buffer } else { Vec::new() }.into_iter();
                        version = next_version;
                        buffer = vec![next_entry];
                        self.state = State::Buffering { version, buffer, ready: resolved };
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ArtifactKind;
    use std::path::PathBuf;

    fn commit(version: u64, time: i64) -> LogEntry {
        LogEntry::new(
            PathBuf::from(format!("{:020}.json", version)),
            ArtifactKind::Commit { version, backfilled: true },
            time,
            0,
        )
    }

    #[test]
    fn emits_version_when_successor_is_old_enough() {
        let entries = vec![commit(1, 0), commit(2, 0)];
        let out: Vec<_> = ExpiryIterator::new(entries.into_iter(), 1000, 10)
            .map(|e| e.version().unwrap())
            .collect();
        assert_eq!(out, vec![1]);
    }

    #[test]
    fn withholds_version_when_successor_is_too_young() {
        let entries = vec![commit(1, 2000), commit(2, 2000)];
        let out: Vec<_> = ExpiryIterator::new(entries.into_iter(), 1000, 10)
            .map(|e| e.version().unwrap())
            .collect();
        assert!(out.is_empty());
    }

    #[test]
    fn respects_safety_threshold() {
        // version 1's successor is old enough, but H=0 means nothing above
        // version 0 may be emitted.
        let entries = vec![commit(1, 0), commit(2, 0)];
        let out: Vec<_> = ExpiryIterator::new(entries.into_iter(), 1000, 0)
            .map(|e| e.version().unwrap())
            .collect();
        assert!(out.is_empty());
    }

    #[test]
    fn terminal_version_never_emitted() {
        let entries = vec![commit(1, 0), commit(2, 0), commit(3, 0)];
        let out: Vec<_> = ExpiryIterator::new(entries.into_iter(), 1000, 10)
            .map(|e| e.version().unwrap())
            .collect();
        // version 3 has no successor witness, so it is never emitted even
        // though version 2 was.
        assert_eq!(out, vec![1, 2]);
    }

    #[test]
    fn multiple_artifacts_per_version_emit_together() {
        let mut v1a = commit(1, 0);
        v1a.kind = ArtifactKind::Checksum { version: 1 };
        let entries = vec![commit(1, 0), v1a, commit(2, 0)];
        let out: Vec<_> = ExpiryIterator::new(entries.into_iter(), 1000, 10).collect();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|e| e.version() == Some(1)));
    }

    #[test]
    fn empty_input_yields_nothing() {
        let entries: Vec<LogEntry> = Vec::new();
        let out: Vec<_> = ExpiryIterator::new(entries.into_iter(), 1000, 10).collect();
        assert!(out.is_empty());
    }
}
