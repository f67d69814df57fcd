use std::io;

/// One completed evaluation: the raw optimizer vector and the packed
/// outputs it produced.
#[derive(Debug, Clone)]
pub struct EvaluationRecord {
    pub index: usize,
    pub raw: Vec<f64>,
    pub objective: f64,
    pub constraints: Vec<f64>,
}

impl PartialEq for EvaluationRecord {
    fn eq(&self, other: &Self) -> bool {
        self.objective == other.objective
    }
}
impl Eq for EvaluationRecord {}

impl PartialOrd for EvaluationRecord {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        other.objective.partial_cmp(&self.objective)
    }
}

impl Ord for EvaluationRecord {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.partial_cmp(other).unwrap_or(std::cmp::Ordering::Equal)
    }
}

/// Every evaluation the nexus has completed, in call order.
#[derive(Debug, Clone, Default)]
pub struct History {
    records: Vec<EvaluationRecord>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, record: EvaluationRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[EvaluationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record with the lowest objective seen so far. Ordering is
    /// inverted so the "greatest" record is the best one.
    pub fn best(&self) -> Option<&EvaluationRecord> {
        self.records.iter().max()
    }

    /// Writes the history as CSV: one row per evaluation, one column per
    /// variable, the objective, then one column per constraint residual.
    pub fn write_csv<W: io::Write>(
        &self,
        writer: W,
        variable_names: &[&str],
        constraint_names: &[&str],
    ) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut header = vec!["evaluation".to_string()];
        header.extend(variable_names.iter().map(|n| n.to_string()));
        header.push("objective".to_string());
        header.extend(constraint_names.iter().map(|n| format!("residual_{n}")));
        csv_writer.write_record(&header)?;

        for record in &self.records {
            let mut row = vec![record.index.to_string()];
            row.extend(record.raw.iter().map(|v| v.to_string()));
            row.push(record.objective.to_string());
            row.extend(record.constraints.iter().map(|v| v.to_string()));
            csv_writer.write_record(&row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}
