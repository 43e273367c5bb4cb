//! Matching CSL records to TEI `biblStruct` entries and patching them
//!
//! For every record the item key (last segment of the CSL id) is matched
//! against the `corresp` attribute of each `biblStruct` by suffix. On a match
//! the `imprint/date` and `note[@type="bibliographic"]` are created or
//! overwritten when they differ from the record. Values that already agree
//! are left alone so a second pass over the output changes nothing.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::csl::CslRecord;
use crate::error::{Result, SyncError};
use crate::tei::{Element, TeiDocument, TEI_NS};

/// How to treat an item key that matches more than one `biblStruct`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Take the first match in document order
    #[default]
    First,
    /// Abort the run if a key matches more than once
    Unique,
}

/// Behavior switches for a reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub match_policy: MatchPolicy,
    /// Skip the note patch as well when the entry has no `imprint`
    pub couple_note_to_imprint: bool,
}

/// What happened to one field of one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldChange {
    Created,
    Updated,
    Unchanged,
    /// The record had nothing to write
    NotApplicable,
    /// The entry had no `imprint`
    SkippedNoImprint,
}

impl FieldChange {
    pub fn is_write(self) -> bool {
        matches!(self, FieldChange::Created | FieldChange::Updated)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Patched,
    Unchanged,
    SkippedMissingId,
    SkippedNoMatch,
}

/// Per-record result of a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordOutcome {
    pub item_key: String,
    pub status: RecordStatus,
    pub date: FieldChange,
    pub note: FieldChange,
}

impl RecordOutcome {
    fn skipped(item_key: &str, status: RecordStatus) -> Self {
        Self {
            item_key: item_key.to_string(),
            status,
            date: FieldChange::NotApplicable,
            note: FieldChange::NotApplicable,
        }
    }
}

/// Result of reconciling a record list against one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// True if any element was created or any text overwritten
    pub changed: bool,
    pub outcomes: Vec<RecordOutcome>,
}

/// Aggregate counts over a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    pub records: usize,
    pub matched: usize,
    pub dates_written: usize,
    pub notes_written: usize,
    pub skipped: usize,
}

impl ReconcileReport {
    pub fn stats(&self) -> ReconcileStats {
        let mut stats = ReconcileStats {
            records: self.outcomes.len(),
            ..Default::default()
        };
        for outcome in &self.outcomes {
            match outcome.status {
                RecordStatus::Patched | RecordStatus::Unchanged => stats.matched += 1,
                RecordStatus::SkippedMissingId | RecordStatus::SkippedNoMatch => {
                    stats.skipped += 1
                }
            }
            if outcome.date.is_write() {
                stats.dates_written += 1;
            }
            if outcome.note.is_write() {
                stats.notes_written += 1;
            }
        }
        stats
    }
}

/// Applies CSL records to a TEI document.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    options: ReconcileOptions,
}

impl Reconciler {
    pub fn new(options: ReconcileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ReconcileOptions {
        self.options
    }

    /// Patch `document` in place from `records`.
    ///
    /// Fails only under [`MatchPolicy::Unique`] when a key is ambiguous; the
    /// document may then be partially patched and should be discarded.
    pub fn reconcile(
        &self,
        records: &[CslRecord],
        document: &mut TeiDocument,
    ) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();
        for record in records {
            let outcome = self.reconcile_record(record, document.root_mut())?;
            if outcome.date.is_write() || outcome.note.is_write() {
                report.changed = true;
            }
            report.outcomes.push(outcome);
        }
        Ok(report)
    }

    fn reconcile_record(&self, record: &CslRecord, root: &mut Element) -> Result<RecordOutcome> {
        let item_key = record.item_key();
        let date = record.normalized_date();

        info!("Processing item key: {}", item_key);
        info!("Extracted date from JSON: {}", date.as_deref().unwrap_or("None"));

        if item_key.is_empty() {
            warn!("Skipping entry with missing item key.");
            return Ok(RecordOutcome::skipped(item_key, RecordStatus::SkippedMissingId));
        }

        let matches_key = |el: &Element| is_entry_for(el, item_key);
        if self.options.match_policy == MatchPolicy::Unique {
            let count = root.find_descendants(&matches_key).len();
            if count > 1 {
                return Err(SyncError::Ambiguous {
                    item_key: item_key.to_string(),
                    count,
                });
            }
        }

        let Some(entry) = root.find_descendant_mut(&matches_key) else {
            warn!("No matching XML entry found for item key '{}'.", item_key);
            return Ok(RecordOutcome::skipped(item_key, RecordStatus::SkippedNoMatch));
        };
        debug!(
            "Matched biblStruct corresp='{}'",
            entry.attr("corresp").unwrap_or_default()
        );

        let date_change = match entry.find_descendant_mut(&is_imprint) {
            Some(imprint) => {
                info!("Imprint element found.");
                patch_date(imprint, date.as_deref(), item_key)
            }
            None => {
                warn!("No <imprint> found for item key '{}'.", item_key);
                FieldChange::SkippedNoImprint
            }
        };

        let note_change = match record.note_text() {
            None => FieldChange::NotApplicable,
            Some(_)
                if self.options.couple_note_to_imprint
                    && date_change == FieldChange::SkippedNoImprint =>
            {
                warn!(
                    "Skipping bibliographic note for item key '{}' because it has no <imprint>.",
                    item_key
                );
                FieldChange::SkippedNoImprint
            }
            Some(note) => patch_note(entry, note, item_key),
        };

        let status = if date_change.is_write() || note_change.is_write() {
            RecordStatus::Patched
        } else {
            RecordStatus::Unchanged
        };

        Ok(RecordOutcome {
            item_key: item_key.to_string(),
            status,
            date: date_change,
            note: note_change,
        })
    }
}

/// Convenience wrapper using default options.
pub fn reconcile(records: &[CslRecord], document: &mut TeiDocument) -> Result<ReconcileReport> {
    Reconciler::default().reconcile(records, document)
}

fn is_entry_for(el: &Element, item_key: &str) -> bool {
    el.is(TEI_NS, "biblStruct")
        && el
            .attr("corresp")
            .is_some_and(|corresp| !corresp.is_empty() && corresp.ends_with(item_key))
}

fn is_imprint(el: &Element) -> bool {
    el.is(TEI_NS, "imprint")
}

fn is_date(el: &Element) -> bool {
    el.is(TEI_NS, "date")
}

fn is_bibliographic_note(el: &Element) -> bool {
    el.is(TEI_NS, "note") && el.attr("type") == Some("bibliographic")
}

fn patch_date(imprint: &mut Element, date: Option<&str>, item_key: &str) -> FieldChange {
    if let Some(existing) = imprint.find_child_mut(is_date) {
        let current = existing.text();
        info!(
            "Existing date element found: {}",
            current.as_deref().unwrap_or("None")
        );
        return match date {
            Some(date) if current.as_deref() != Some(date) => {
                existing.set_text(date);
                info!("Updated date for item key '{}' to '{}'", item_key, date);
                FieldChange::Updated
            }
            Some(_) => {
                info!("Date is already up-to-date.");
                FieldChange::Unchanged
            }
            None => {
                info!("Date is already up-to-date.");
                FieldChange::NotApplicable
            }
        };
    }

    let Some(date) = date else {
        return FieldChange::NotApplicable;
    };
    let mut element = imprint.new_child("date");
    element.set_text(date);
    imprint.append_child(element);
    info!(
        "Created new <date> element for item key '{}' with date '{}'",
        item_key, date
    );
    FieldChange::Created
}

fn patch_note(entry: &mut Element, note: &str, item_key: &str) -> FieldChange {
    if let Some(existing) = entry.find_descendant_mut(&is_bibliographic_note) {
        if existing.text().as_deref() == Some(note) {
            info!("Note is already up-to-date.");
            return FieldChange::Unchanged;
        }
        existing.set_text(note);
        info!("Updated <note type='bibliographic'> for item key '{}'", item_key);
        return FieldChange::Updated;
    }

    let mut element = entry.new_child("note");
    element.set_attr("type", "bibliographic");
    element.set_text(note);
    entry.append_child(element);
    info!("Added <note type='bibliographic'> for item key '{}'", item_key);
    FieldChange::Created
}
