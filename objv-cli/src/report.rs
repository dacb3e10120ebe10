/// Colored terminal report of a load attempt
use std::io::Write;
use std::path::{Path, PathBuf};

use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};

use crate::Summary;

/// Writes load results for one file
pub struct Report {
    path: PathBuf,
}

impl Report {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn success<W: Write>(&self, writer: &mut W, summary: &Summary) -> std::io::Result<()> {
        let size = summary.bounds.size();
        let center = summary.bounds.center();

        writer.queue(SetForegroundColor(Color::Green))?;
        writer.queue(Print(format!("Opened file: {}\n", self.path.display())))?;
        writer.queue(ResetColor)?;

        let rows = [
            ("Vertices", summary.vertices.to_string()),
            ("Faces", summary.faces.to_string()),
            ("Edges", summary.edges.to_string()),
            ("Triangles", summary.triangles.to_string()),
            ("Texcoords", summary.texcoords.to_string()),
            ("Normals", summary.normals.to_string()),
            (
                "Size",
                format!("{:.3} x {:.3} x {:.3}", size.x, size.y, size.z),
            ),
            (
                "Center",
                format!("({:.3}, {:.3}, {:.3})", center.x, center.y, center.z),
            ),
            ("Fit distance", format!("{:.3}", summary.bounds.fit_distance())),
        ];

        for (label, value) in rows {
            writer.queue(SetForegroundColor(Color::Cyan))?;
            writer.queue(Print(format!("  {}: {}\n", label, value)))?;
        }
        writer.queue(ResetColor)?;

        if summary.bounds.max_extent() < 1e-3 {
            writer.queue(SetForegroundColor(Color::Yellow))?;
            writer.queue(Print("  Model is nearly flat or point-sized\n"))?;
            writer.queue(ResetColor)?;
        }
        Ok(())
    }

    pub fn failure<W: Write>(&self, writer: &mut W, message: &str) -> std::io::Result<()> {
        writer.queue(SetForegroundColor(Color::Red))?;
        writer.queue(Print(format!(
            "Error opening file {}: {}\n",
            self.path.display(),
            message
        )))?;
        writer.queue(ResetColor)?;
        Ok(())
    }
}
