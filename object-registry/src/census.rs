//! # Census
//!
//! Best-effort count of live objects grouped by type descriptor. Used to
//! explain what filled the table when allocation runs out of capacity.
//!
//! The walk does not take the array lock, so a census taken while other
//! threads allocate or free is a snapshot of some interleaving, not of an
//! instant.

use std::collections::HashMap;

use crate::config::CensusConfig;
use crate::log::{self, LogBuilder, LogLevel};
use crate::object::TypeDescriptor;
use crate::slot_table::SlotTable;

/// Instance count of one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CensusEntry {
    /// The type.
    pub type_descriptor: TypeDescriptor,
    /// Live instances of it.
    pub instances: usize,
}

/// Live instance counts, largest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CensusReport {
    entries: Vec<CensusEntry>,
    total_objects: usize,
}

impl CensusReport {
    /// Count every live object in `slots`.
    pub fn collect(slots: &SlotTable) -> Self {
        let mut counts: HashMap<TypeDescriptor, usize> = HashMap::new();
        let mut total_objects = 0;

        for (_, _, object) in slots.iter_live() {
            *counts
                .entry(object.header().type_descriptor().clone())
                .or_default() += 1;
            total_objects += 1;
        }

        let mut entries: Vec<CensusEntry> = counts
            .into_iter()
            .map(|(type_descriptor, instances)| CensusEntry {
                type_descriptor,
                instances,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.instances
                .cmp(&a.instances)
                .then_with(|| a.type_descriptor.cmp(&b.type_descriptor))
        });

        Self {
            entries,
            total_objects,
        }
    }

    /// Per-type counts, descending.
    pub fn entries(&self) -> &[CensusEntry] {
        &self.entries
    }

    /// Number of live objects counted.
    pub fn total_objects(&self) -> usize {
        self.total_objects
    }

    /// Number of distinct types seen.
    pub fn type_count(&self) -> usize {
        self.entries.len()
    }

    /// Instances of `type_descriptor`, 0 if none.
    pub fn count_of(&self, type_descriptor: &TypeDescriptor) -> usize {
        self.entries
            .iter()
            .find(|e| &e.type_descriptor == type_descriptor)
            .map_or(0, |e| e.instances)
    }

    /// Render the report, folding small and trailing types into one line.
    pub fn lines(&self, config: &CensusConfig) -> Vec<String> {
        let mut lines = vec!["Dumping allocated object counts:".to_string()];

        let mut types_skipped = 0;
        let mut instances_skipped = 0;
        let mut instances_printed = 0;
        let mut printed_fraction = 0.0;

        for entry in &self.entries {
            if entry.instances > config.min_instances
                && printed_fraction <= config.max_printed_fraction
            {
                lines.push(format!(
                    "{:8} instances of {}",
                    entry.instances, entry.type_descriptor
                ));
                instances_printed += entry.instances;
                printed_fraction = instances_printed as f64 / self.total_objects as f64;
            } else {
                types_skipped += 1;
                instances_skipped += entry.instances;
            }
        }

        if instances_skipped > 0 {
            if printed_fraction > config.max_printed_fraction {
                lines.push(format!(
                    "{:8} instances in the remaining {:.3}% of instances of {} types",
                    instances_skipped,
                    (1.0 - printed_fraction) * 100.0,
                    types_skipped
                ));
            } else {
                lines.push(format!(
                    "{:8} instances of {} types with at most {} instances per type",
                    instances_skipped, types_skipped, config.min_instances
                ));
            }
        }

        lines.push(format!(
            "{} total objects ({} types)",
            self.total_objects,
            self.type_count()
        ));
        lines
    }

    /// Emit [`lines`](Self::lines) at `Info`.
    pub fn log(&self, config: &CensusConfig) {
        if !log::would_log(LogLevel::Info) {
            return;
        }
        for line in self.lines(config) {
            LogBuilder::new(LogLevel::Info)
                .message(line)
                .field_str("section", "census")
                .emit();
        }
    }
}
