use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{ensure, Result};
use tracing_subscriber::EnvFilter;

/// Smallest accepted output range is one above this.
const MIN_RANGE: u64 = 10_000;

/// Logs to stderr so that stdout only carries results.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub fn check_range(range: u64) -> Result<()> {
    ensure!(range > MIN_RANGE, "minhash_m must be more than {MIN_RANGE}, got {range}.");
    Ok(())
}

/// Rows of string cells under a header.
pub struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&'static str]) -> Self {
        Self {
            headers: headers.to_vec(),
            rows: vec![],
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.headers.len());
        self.rows.push(row);
    }

    pub fn write_csv<P>(&self, path: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let mut w = BufWriter::new(File::create(path)?);
        writeln!(w, "{}", self.headers.join(","))?;
        for row in &self.rows {
            writeln!(w, "{}", row.join(","))?;
        }
        w.flush()?;
        tracing::info!("Wrote {} rows to {}", self.rows.len(), path.display());
        Ok(())
    }

    /// Prints the first `limit` rows (all if `None`) as a fixed-width table.
    pub fn print(&self, limit: Option<usize>) {
        let rows = &self.rows[..limit.map_or(self.rows.len(), |l| l.min(self.rows.len()))];
        if rows.is_empty() {
            println!("No rows to display.");
            return;
        }
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.len()).collect();
        for row in rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.len());
            }
        }
        println!("{}", format_line(self.headers.iter().copied(), &widths));
        println!(
            "{}",
            widths
                .iter()
                .map(|&w| "-".repeat(w))
                .collect::<Vec<_>>()
                .join("-+-")
        );
        for row in rows {
            println!("{}", format_line(row.iter().map(String::as_str), &widths));
        }
    }
}

fn format_line<'a, I>(cells: I, widths: &[usize]) -> String
where
    I: Iterator<Item = &'a str>,
{
    cells
        .zip(widths)
        .map(|(c, &w)| format!("{c:<w$}"))
        .collect::<Vec<_>>()
        .join(" | ")
}
