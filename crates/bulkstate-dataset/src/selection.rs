use crate::dataset::{DatasetError, TabularDataset};

/// Marked rows of one dataset, by row index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionSet {
    marked: Vec<bool>,
}

impl SelectionSet {
    pub fn for_dataset(dataset: &TabularDataset) -> Self {
        Self { marked: vec![false; dataset.len()] }
    }

    fn slot(&mut self, row: usize) -> Result<&mut bool, DatasetError> {
        let len = self.marked.len();
        self.marked.get_mut(row).ok_or(DatasetError::RowOutOfRange { row, len })
    }

    pub fn mark(&mut self, row: usize) -> Result<(), DatasetError> {
        *self.slot(row)? = true;
        Ok(())
    }

    pub fn unmark(&mut self, row: usize) -> Result<(), DatasetError> {
        *self.slot(row)? = false;
        Ok(())
    }

    /// Flips the mark and returns the new value.
    pub fn toggle(&mut self, row: usize) -> Result<bool, DatasetError> {
        let slot = self.slot(row)?;
        *slot = !*slot;
        Ok(*slot)
    }

    pub fn select_all(&mut self) {
        self.marked.iter_mut().for_each(|m| *m = true);
    }

    pub fn clear(&mut self) {
        self.marked.iter_mut().for_each(|m| *m = false);
    }

    pub fn is_marked(&self, row: usize) -> bool {
        self.marked.get(row).copied().unwrap_or(false)
    }

    pub fn selected_count(&self) -> usize {
        self.marked.iter().filter(|m| **m).count()
    }

    pub fn total(&self) -> usize {
        self.marked.len()
    }

    /// True when there is at least one row and every row is marked.
    pub fn all_selected(&self) -> bool {
        !self.marked.is_empty() && self.marked.iter().all(|m| *m)
    }

    /// Identifier-column values of the marked rows, in row order. Rows with an
    /// empty cell are skipped here and never reach the engine.
    pub fn identifiers(&self, dataset: &TabularDataset, column: &str) -> Result<Vec<String>, DatasetError> {
        let col = dataset.column_index(column)?;
        Ok(dataset
            .rows()
            .iter()
            .zip(&self.marked)
            .filter(|(_, marked)| **marked)
            .map(|(row, _)| &row[col])
            .filter(|cell| !cell.is_empty())
            .cloned()
            .collect())
    }
}
