//! Presentation-level filters. These narrow what a report shows; the
//! numbers themselves were computed before filtering.

use super::{export::store_column_index, ReportError, TabularReport};
use std::collections::HashSet;

#[derive(Clone, Debug, Default)]
pub struct ReportFilters {
    /// Keep only these columns, in the given order.
    pub columns: Option<Vec<String>>,
    /// Keep rows whose store column matches one of these (case-insensitive).
    pub stores: Option<Vec<String>>,
    /// Keep rows whose status column matches one of these.
    pub statuses: Option<Vec<String>>,
    /// Drop rows with `assigned == 0`.
    pub drop_zero_assigned: bool,
    /// Keep only `COMPRA` rows.
    pub purchase_only: bool,
}

impl ReportFilters {
    pub fn is_noop(&self) -> bool {
        self.columns.is_none()
            && self.stores.is_none()
            && self.statuses.is_none()
            && !self.drop_zero_assigned
            && !self.purchase_only
    }
}

fn upper_set(values: &[String]) -> HashSet<String> {
    values
        .iter()
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.trim().to_uppercase())
        .collect()
}

pub fn apply_filters(
    mut report: TabularReport,
    filters: &ReportFilters,
) -> Result<TabularReport, ReportError> {
    if let Some(stores) = &filters.stores {
        let store_col = store_column_index(&report)?;
        let wanted = upper_set(stores);
        report
            .rows
            .retain(|row| wanted.contains(&row[store_col].trim().to_uppercase()));
    }

    let status_col = report.column_index("status");
    if let Some(statuses) = &filters.statuses {
        let status_col = status_col
            .ok_or_else(|| ReportError::UnknownColumn("status".to_string()))?;
        let wanted = upper_set(statuses);
        report
            .rows
            .retain(|row| wanted.contains(&row[status_col].trim().to_uppercase()));
    }
    if filters.purchase_only {
        let status_col = status_col
            .ok_or_else(|| ReportError::UnknownColumn("status".to_string()))?;
        report.rows.retain(|row| row[status_col] == "COMPRA");
    }

    if filters.drop_zero_assigned {
        if let Some(assigned_col) = report.column_index("assigned") {
            report.rows.retain(|row| row[assigned_col] != "0");
        }
    }

    if let Some(columns) = &filters.columns {
        let mut indices = Vec::with_capacity(columns.len());
        for name in columns {
            let index = report
                .column_index(name)
                .ok_or_else(|| ReportError::UnknownColumn(name.clone()))?;
            indices.push(index);
        }
        report.columns = indices
            .iter()
            .map(|&i| report.columns[i].clone())
            .collect();
        report.rows = report
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
    }

    Ok(report)
}
