use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Tab-separated per-iteration trend log.
#[derive(Debug)]
pub struct TrendWriter {
    writer: BufWriter<File>,
}

impl TrendWriter {
    pub fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(
            writer,
            "iteration\tobjective\tviolation\tbest_objective\tbest_violation\tpenalty_scale"
        )?;
        Ok(Self { writer })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn write_line(
        &mut self,
        iteration: u64,
        objective: f64,
        violation: f64,
        best_objective: f64,
        best_violation: f64,
        penalty_scale: f64,
    ) -> std::io::Result<()> {
        writeln!(
            self.writer,
            "{iteration}\t{objective}\t{violation}\t{best_objective}\t{best_violation}\t{penalty_scale}"
        )
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trend.tsv");
        {
            let mut trend = TrendWriter::create(&path).unwrap();
            trend.write_line(0, 1.5, 2.0, 1.5, 2.0, 1e7).unwrap();
            trend.flush().unwrap();
        }
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("iteration\tobjective"));
        assert_eq!(lines.next().unwrap(), "0\t1.5\t2\t1.5\t2\t10000000");
    }
}
