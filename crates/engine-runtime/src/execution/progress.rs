/// Counts exported rows and signals every `every` rows.
#[derive(Debug, Clone)]
pub struct ProgressCounter {
    every: u64,
    rows: u64,
}

impl ProgressCounter {
    pub fn new(every: u64) -> Self {
        ProgressCounter {
            every: every.max(1),
            rows: 0,
        }
    }

    /// Adds one row; returns the running total when a report is due.
    pub fn tick(&mut self) -> Option<u64> {
        self.rows += 1;
        (self.rows % self.every == 0).then_some(self.rows)
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }
}

/// Renders a count with `,` thousands separators, e.g. `1,250,000`.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_every_n_rows() {
        let mut progress = ProgressCounter::new(3);
        let reports: Vec<_> = (0..10).filter_map(|_| progress.tick()).collect();
        assert_eq!(reports, vec![3, 6, 9]);
        assert_eq!(progress.rows(), 10);
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(10_000), "10,000");
        assert_eq!(format_count(1_250_000), "1,250,000");
    }
}
