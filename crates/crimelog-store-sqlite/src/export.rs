//! Flat snapshots of the store: one CSV per table plus a copy of the
//! database file.

use std::{
  fs,
  io::{self, BufWriter, Write},
  path::{Path, PathBuf},
};

use rusqlite::types::ValueRef;

use crate::{Error, Result, SqliteStore};

/// Tables written by [`SqliteStore::export_snapshot`], in output order.
pub const EXPORT_TABLES: &[&str] =
  &["campuses", "incidents", "offense_types", "incident_offenses"];

/// Where the snapshot went and how many data rows each table produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
  pub tables:   Vec<(String, PathBuf, usize)>,
  pub database: PathBuf,
}

/// Header followed by data rows, all rendered as text.
struct TableDump {
  columns: Vec<String>,
  rows:    Vec<Vec<String>>,
}

fn render(value: ValueRef<'_>) -> String {
  match value {
    ValueRef::Null => String::new(),
    ValueRef::Integer(i) => i.to_string(),
    ValueRef::Real(f) => f.to_string(),
    ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
  }
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
  move |source| Error::Io {
    path: path.to_path_buf(),
    source,
  }
}

// ─── CSV ─────────────────────────────────────────────────────────────────────

fn needs_quotes(field: &str) -> bool {
  field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write one comma-separated row, quoting fields that need it.
fn write_row<W: Write>(mut w: W, row: &[String]) -> io::Result<()> {
  for (i, cell) in row.iter().enumerate() {
    if i > 0 {
      w.write_all(b",")?;
    }
    if needs_quotes(cell) {
      write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
    } else {
      w.write_all(cell.as_bytes())?;
    }
  }
  w.write_all(b"\n")
}

fn write_csv(path: &Path, dump: &TableDump) -> io::Result<()> {
  let mut w = BufWriter::new(fs::File::create(path)?);
  write_row(&mut w, &dump.columns)?;
  for row in &dump.rows {
    write_row(&mut w, row)?;
  }
  w.flush()
}

// ─── Store side ──────────────────────────────────────────────────────────────

impl SqliteStore {
  async fn dump_table(&self, table: &'static str) -> Result<TableDump> {
    let dump = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!("SELECT * FROM {table} ORDER BY rowid"))?;
        let columns: Vec<String> =
          stmt.column_names().into_iter().map(str::to_owned).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([])?;
        while let Some(row) = cursor.next()? {
          let mut cells = Vec::with_capacity(width);
          for i in 0..width {
            cells.push(render(row.get_ref(i)?));
          }
          rows.push(cells);
        }
        Ok(TableDump { columns, rows })
      })
      .await?;
    Ok(dump)
  }

  /// Write every table in [`EXPORT_TABLES`] to `<dir>/<table>.csv` and a
  /// consistent copy of the database to `<dir>/<database_name>`.
  ///
  /// Existing files are overwritten.
  pub async fn export_snapshot(
    &self,
    dir:           impl AsRef<Path>,
    database_name: &str,
  ) -> Result<ExportReport> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(io_err(dir))?;

    let mut tables = Vec::with_capacity(EXPORT_TABLES.len());
    for &table in EXPORT_TABLES {
      let dump = self.dump_table(table).await?;
      let path = dir.join(format!("{table}.csv"));
      write_csv(&path, &dump).map_err(io_err(&path))?;
      tracing::info!(table, rows = dump.rows.len(), path = %path.display(), "exported table");
      tables.push((table.to_owned(), path, dump.rows.len()));
    }

    let database = dir.join(database_name);
    match fs::remove_file(&database) {
      Ok(()) => {}
      Err(e) if e.kind() == io::ErrorKind::NotFound => {}
      Err(e) => return Err(io_err(&database)(e)),
    }
    let target = database.to_string_lossy().into_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute("VACUUM INTO ?1", [target])?;
        Ok(())
      })
      .await?;
    tracing::info!(path = %database.display(), "copied database snapshot");

    Ok(ExportReport { tables, database })
  }
}
