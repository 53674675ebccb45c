//! Run totals and declared-count warnings.

use remise_core::Remittance;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub batches: usize,
    pub operations: usize,
    /// Operations whose status is exactly "Accepté"
    pub accepted: usize,
    /// Sum of the declared batch totals
    pub total_amount: f64,
}

impl Summary {
    pub fn from_remittances(remittances: &[Remittance]) -> Self {
        Summary {
            batches: remittances.len(),
            operations: remittances.iter().map(|r| r.operations.len()).sum(),
            accepted: remittances.iter().map(Remittance::accepted_count).sum(),
            total_amount: remittances.iter().map(|r| r.declared_total).sum(),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary:")?;
        writeln!(f, "  • Total remises: {}", self.batches)?;
        writeln!(f, "  • Total operations: {}", self.operations)?;
        writeln!(f, "  • Accepted operations: {}", self.accepted)?;
        write!(f, "  • Total amount: {:.2} EUR", self.total_amount)
    }
}

/// A batch whose declared operation count differs from its parsed rows
#[derive(Debug, Clone, PartialEq)]
pub struct CountWarning {
    pub file: String,
    pub declared: u32,
    pub parsed: usize,
}

impl fmt::Display for CountWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "⚠️  Warning: File {}", self.file)?;
        writeln!(
            f,
            "   Expected {} operations but found {} operation lines",
            self.declared, self.parsed
        )?;
        write!(f, "   This might indicate a different file format or parsing issue")
    }
}

pub fn count_warnings(remittances: &[Remittance]) -> Vec<CountWarning> {
    remittances
        .iter()
        .filter_map(|r| {
            r.count_mismatch().map(|m| CountWarning {
                file: r.file.name.clone(),
                declared: m.declared,
                parsed: m.parsed,
            })
        })
        .collect()
}
