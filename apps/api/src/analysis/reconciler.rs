//! Streaming Reconciler: re-slices the growing feedback document after every chunk.
//!
//! Each push re-runs the full extraction over the whole buffer rather than
//! tracking boundaries incrementally. Slots only ever move from empty to
//! non-empty or between non-empty values: a pass that extracts nothing for a
//! section leaves the previously published text in place.

use serde::{Deserialize, Serialize};

use crate::extraction::Section;

/// The summary must be longer than this (in characters) before the wizard
/// leaves the loading state.
pub const SUMMARY_READY_CHARS: usize = 50;

/// Text of the four sections. Empty means "nothing extracted yet".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSlots {
    pub summary: String,
    pub details: String,
    pub refined_copy: String,
    pub cover_letter: String,
}

impl SectionSlots {
    /// Runs the fixed extraction plan over a complete or partial document.
    pub fn from_document(document: &str) -> Self {
        let mut slots = Self::default();
        for section in Section::ALL {
            *slots.slot_mut(section) = section.extract_from(document);
        }
        slots
    }

    pub fn get(&self, section: Section) -> &str {
        match section {
            Section::Summary => &self.summary,
            Section::Breakdown => &self.details,
            Section::RefinedCopy => &self.refined_copy,
            Section::CoverLetter => &self.cover_letter,
        }
    }

    fn slot_mut(&mut self, section: Section) -> &mut String {
        match section {
            Section::Summary => &mut self.summary,
            Section::Breakdown => &mut self.details,
            Section::RefinedCopy => &mut self.refined_copy,
            Section::CoverLetter => &mut self.cover_letter,
        }
    }

    /// Copy with every empty slot replaced by its placeholder text.
    pub fn with_placeholders(&self) -> Self {
        let mut display = self.clone();
        for section in Section::ALL {
            let slot = display.slot_mut(section);
            if slot.is_empty() {
                *slot = section.placeholder().to_string();
            }
        }
        display
    }
}

/// What changed after a single chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileUpdate {
    /// Sections whose published text changed, in document order.
    pub changed: Vec<Section>,
    /// True on exactly one push: the first time the summary is long enough.
    pub summary_ready: bool,
}

/// Result of the final pass once the stream has ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalSections {
    /// Extracted text per section, empty where nothing was ever found.
    pub extracted: SectionSlots,
    /// Whether [`ReconcileUpdate::summary_ready`] was ever signalled.
    pub summary_signalled: bool,
    pub document_len: usize,
}

impl FinalSections {
    /// A generation without a summary is treated as having produced nothing.
    pub fn has_content(&self) -> bool {
        !self.extracted.summary.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct StreamReconciler {
    buffer: String,
    summary_signalled: bool,
    slots: SectionSlots,
}

impl StreamReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` and republishes every section that extracted non-empty text.
    pub fn push(&mut self, chunk: &str) -> ReconcileUpdate {
        self.buffer.push_str(chunk);
        let extracted = SectionSlots::from_document(&self.buffer);

        let mut update = ReconcileUpdate::default();
        for section in Section::ALL {
            let next = extracted.get(section);
            let slot = self.slots.slot_mut(section);
            if !next.is_empty() && slot.as_str() != next {
                *slot = next.to_string();
                update.changed.push(section);
            }
        }

        if !self.summary_signalled && extracted.summary.chars().count() > SUMMARY_READY_CHARS {
            self.summary_signalled = true;
            update.summary_ready = true;
        }

        update
    }

    pub fn slots(&self) -> &SectionSlots {
        &self.slots
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Final extraction pass over the complete document.
    ///
    /// A section that extracts empty on the final pass keeps whatever was last
    /// published for it.
    pub fn finish(self) -> FinalSections {
        let mut extracted = SectionSlots::from_document(&self.buffer);
        for section in Section::ALL {
            let slot = extracted.slot_mut(section);
            if slot.is_empty() {
                *slot = self.slots.get(section).to_string();
            }
        }

        FinalSections {
            extracted,
            summary_signalled: self.summary_signalled,
            document_len: self.buffer.len(),
        }
    }
}
