//! Point table (CSV) support
//!
//! The interchange form of a depth point cloud is a comma separated table with
//! one row per point:
//!
//! ```text
//! x,y,z,r,g,b
//! 12,40,0.8125,201,64,33
//! ```
//!
//! `x` and `y` are pixel coordinates, `z` the fused depth in `[0, 1]` and
//! `r,g,b` the point colour. The reader locates columns through the header,
//! so any column order is accepted; extra columns are ignored.

use depthify_core::{DepthPointCloud, Error, PointRecord, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Columns of the point table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    X,
    Y,
    Z,
    Red,
    Green,
    Blue,
    Unknown,
}

impl Column {
    pub const REQUIRED: [Column; 6] = [
        Column::X,
        Column::Y,
        Column::Z,
        Column::Red,
        Column::Green,
        Column::Blue,
    ];

    /// Parse a column from its header name
    pub fn from_header(header: &str) -> Self {
        match header.trim().to_lowercase().as_str() {
            "x" | "px" => Column::X,
            "y" | "py" => Column::Y,
            "z" | "depth" => Column::Z,
            "r" | "red" => Column::Red,
            "g" | "green" => Column::Green,
            "b" | "blue" => Column::Blue,
            _ => Column::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Column::X => "x",
            Column::Y => "y",
            Column::Z => "z",
            Column::Red => "r",
            Column::Green => "g",
            Column::Blue => "b",
            Column::Unknown => "unknown",
        }
    }
}

/// Field positions resolved from a header line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    indices: [usize; 6],
}

impl Layout {
    fn from_header(line: &str) -> Result<Self> {
        let columns: Vec<Column> = line.split(',').map(Column::from_header).collect();
        let mut indices = [0usize; 6];
        for (slot, required) in indices.iter_mut().zip(Column::REQUIRED) {
            *slot = columns.iter().position(|&c| c == required).ok_or_else(|| {
                Error::InvalidData(format!("point table header is missing column '{}'", required.name()))
            })?;
        }
        Ok(Self { indices })
    }

    fn parse_row(&self, line: &str, line_number: usize) -> Result<PointRecord> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let field = |column: usize| -> Result<&str> {
            let index = self.indices[column];
            fields.get(index).copied().filter(|s| !s.is_empty()).ok_or_else(|| {
                Error::InvalidData(format!(
                    "line {}: missing '{}' field",
                    line_number,
                    Column::REQUIRED[column].name()
                ))
            })
        };
        let invalid = |column: usize, value: &str| {
            Error::InvalidData(format!(
                "line {}: invalid '{}' value '{}'",
                line_number,
                Column::REQUIRED[column].name(),
                value
            ))
        };

        let mut coords = [0u32; 2];
        for (column, coord) in coords.iter_mut().enumerate() {
            let value = field(column)?;
            *coord = value.parse().map_err(|_| invalid(column, value))?;
        }

        let value = field(2)?;
        let z: f32 = value.parse().map_err(|_| invalid(2, value))?;
        if !z.is_finite() {
            return Err(invalid(2, value));
        }

        let mut color = [0u8; 3];
        for (offset, channel) in color.iter_mut().enumerate() {
            let column = 3 + offset;
            let value = field(column)?;
            *channel = value.parse().map_err(|_| invalid(column, value))?;
        }

        Ok(PointRecord::new(coords[0], coords[1], z, color))
    }
}

/// Reader for point tables
pub struct PointTableReader;

impl PointTableReader {
    /// Read a point table from any buffered source
    pub fn read<R: BufRead>(reader: R) -> Result<DepthPointCloud> {
        let mut lines = reader.lines().enumerate();

        let layout = loop {
            match lines.next() {
                Some((_, line)) => {
                    let line = line?;
                    if !line.trim().is_empty() {
                        break Layout::from_header(&line)?;
                    }
                }
                None => return Err(Error::InvalidData("point table has no header".to_string())),
            }
        };

        let mut cloud = DepthPointCloud::new();
        for (index, line) in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            cloud.push(layout.parse_row(&line, index + 1)?);
        }
        Ok(cloud)
    }

    /// Read a point table file
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<DepthPointCloud> {
        let path = path.as_ref();
        let cloud = Self::read(BufReader::new(File::open(path)?))?;
        debug!(path = %path.display(), points = cloud.len(), "Read point table");
        Ok(cloud)
    }
}

/// Writer for point tables
pub struct PointTableWriter;

impl PointTableWriter {
    /// Write `cloud` with an `x,y,z,r,g,b` header
    pub fn write<W: Write>(cloud: &DepthPointCloud, mut writer: W) -> Result<()> {
        let header: Vec<&str> = Column::REQUIRED.iter().map(Column::name).collect();
        writeln!(writer, "{}", header.join(","))?;
        for point in cloud {
            let [r, g, b] = point.color;
            writeln!(writer, "{},{},{},{},{},{}", point.x, point.y, point.z, r, g, b)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write `cloud` to a file, replacing any existing content
    pub fn write_file<P: AsRef<Path>>(cloud: &DepthPointCloud, path: P) -> Result<()> {
        let path = path.as_ref();
        Self::write(cloud, BufWriter::new(File::create(path)?))?;
        debug!(path = %path.display(), points = cloud.len(), "Wrote point table");
        Ok(())
    }
}
