use std::io::{self, Write};

use log::warn;
use serde::Serialize;

use crate::{Result, arch::FeedforwardNetwork, evaluation::Metrics};

const SEPARATOR: &str = ";";

/// The metrics of a single training iteration, iteration `0` being the initial network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LogRow {
    pub iteration: usize,
    pub validation: Metrics,
    pub training: Metrics,
}

/// Where the trainer records one [`LogRow`] per iteration.
pub trait LogSink {
    fn record(&mut self, row: &LogRow) -> io::Result<()>;
}

impl LogSink for Vec<LogRow> {
    fn record(&mut self, row: &LogRow) -> io::Result<()> {
        self.push(*row);
        Ok(())
    }
}

/// Discards every row.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn record(&mut self, _row: &LogRow) -> io::Result<()> {
        Ok(())
    }
}

/// Writes rows as `;` separated values, one line per iteration.
pub struct CsvSink<W: Write> {
    writer: W,
}

impl<W: Write> CsvSink<W> {
    /// Creates a new `CsvSink`, writing the header line right away.
    pub fn new(mut writer: W) -> io::Result<Self> {
        let mut header = vec!["iteration".to_string()];
        for batch in ["validation", "training"] {
            for metric in ["error", "RMSE", "accuracy", "precision", "recall", "F1"] {
                header.push(format!("{batch} {metric}"));
            }
        }

        writeln!(writer, "{}", header.join(SEPARATOR))?;
        Ok(Self { writer })
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn metric_fields(m: &Metrics) -> [f64; 6] {
    [m.error, m.rmse, m.accuracy, m.precision, m.recall, m.f1]
}

impl<W: Write> LogSink for CsvSink<W> {
    fn record(&mut self, row: &LogRow) -> io::Result<()> {
        let mut fields = vec![row.iteration.to_string()];
        fields.extend(
            metric_fields(&row.validation)
                .iter()
                .chain(&metric_fields(&row.training))
                .map(|v| format!("{v:.4}")),
        );

        writeln!(self.writer, "{}", fields.join(SEPARATOR))?;
        self.writer.flush()
    }
}

/// Writes every row as a JSON object on its own line.
pub struct JsonSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> LogSink for JsonSink<W> {
    fn record(&mut self, row: &LogRow) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, row)?;
        writeln!(self.writer)?;
        self.writer.flush()
    }
}

/// Dumps the non-bias weights of the first layer grouped by accelerometer axis.
///
/// Inputs are expected to be flattened `x, y, z` entries. The header names one `x;y;z` triple per
/// neuron of the first layer, and each following line holds, for every neuron, the three weights
/// of one entry position. Networks whose input size is not a multiple of 3 are skipped with a
/// warning.
pub fn write_weights<W: Write>(network: &FeedforwardNetwork, mut writer: W) -> Result<()> {
    let input_size = network.input_size();
    if input_size % 3 != 0 {
        warn!(input_size = input_size; "cannot group first layer weights into x, y, z triples, skipping dump");
        return Ok(());
    }

    let w = &network.weights()[0];
    let header: Vec<_> = (1..=w.rows())
        .map(|j| format!("x{j}{SEPARATOR}y{j}{SEPARATOR}z{j}"))
        .collect();
    writeln!(writer, "{}", header.join(SEPARATOR))?;

    for entry in (1..w.cols()).step_by(3) {
        let line: Vec<_> = (0..w.rows())
            .flat_map(|j| (entry..entry + 3).map(move |i| (j, i)))
            .map(|(j, i)| format!("{:.4}", w.get(j, i)))
            .collect();
        writeln!(writer, "{}", line.join(SEPARATOR))?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Matrix;

    fn row(iteration: usize) -> LogRow {
        LogRow {
            iteration,
            validation: Metrics {
                error: 1.23456,
                rmse: 0.5,
                accuracy: 0.75,
                precision: 1.0,
                recall: 0.5,
                f1: 2.0 / 3.0,
            },
            training: Metrics::default(),
        }
    }

    #[test]
    fn csv_sink_writes_a_header_and_one_line_per_row() {
        let mut sink = CsvSink::new(Vec::new()).unwrap();
        sink.record(&row(0)).unwrap();
        sink.record(&row(1)).unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "iteration;validation error;validation RMSE;validation accuracy;\
             validation precision;validation recall;validation F1;training error;\
             training RMSE;training accuracy;training precision;training recall;training F1"
        );
        assert_eq!(
            lines[1],
            "0;1.2346;0.5000;0.7500;1.0000;0.5000;0.6667;0.0000;0.0000;0.0000;0.0000;0.0000;0.0000"
        );
        assert!(lines[2].starts_with("1;"));
    }

    #[test]
    fn json_sink_writes_one_object_per_row() {
        let mut sink = JsonSink::new(Vec::new());
        sink.record(&row(0)).unwrap();
        sink.record(&row(4)).unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let rows: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["iteration"], 4);
        assert_eq!(rows[0]["validation"]["accuracy"], 0.75);
        assert_eq!(rows[0]["validation"]["error"], 1.23456);
        assert_eq!(rows[0]["training"]["f1"], 0.0);
    }

    #[test]
    fn vec_sink_collects_rows() {
        let mut rows: Vec<LogRow> = Vec::new();
        rows.record(&row(3)).unwrap();
        assert_eq!(rows, vec![row(3)]);
    }

    #[test]
    fn weights_are_grouped_by_axis() {
        let w = Matrix::from_rows(&[
            [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            [0.0, -1.0, -2.0, -3.0, -4.0, -5.0, -6.0],
        ])
        .unwrap();
        let out = Matrix::zeros(1, 3);
        let net = FeedforwardNetwork::new(vec![w, out]).unwrap();

        let mut buf = Vec::new();
        write_weights(&net, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(
            text,
            "x1;y1;z1;x2;y2;z2\n\
             1.0000;2.0000;3.0000;-1.0000;-2.0000;-3.0000\n\
             4.0000;5.0000;6.0000;-4.0000;-5.0000;-6.0000\n"
        );
    }

    #[test]
    fn weights_that_are_not_triples_are_skipped() {
        let net = FeedforwardNetwork::new(vec![Matrix::zeros(1, 3)]).unwrap();

        let mut buf = Vec::new();
        write_weights(&net, &mut buf).unwrap();
        assert!(buf.is_empty());
    }
}
