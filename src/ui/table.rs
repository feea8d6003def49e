//! Table rendering for cache listings.

use console::measure_text_width;

/// Column alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Right,
}

/// A simple box-drawn table.
#[derive(Debug)]
pub struct Table {
    headers: Vec<String>,
    align: Vec<Align>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a new table with the given headers, all left-aligned.
    pub fn new<S: AsRef<str>>(headers: &[S]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.as_ref().to_string()).collect(),
            align: vec![Align::Left; headers.len()],
            rows: Vec::new(),
        }
    }

    /// Set one column's alignment.
    pub fn align(mut self, column: usize, align: Align) -> Self {
        if let Some(slot) = self.align.get_mut(column) {
            *slot = align;
        }
        self
    }

    /// Add a row; missing cells render empty, extra cells are dropped.
    pub fn add_row<S: AsRef<str>>(&mut self, row: &[S]) {
        self.rows
            .push(row.iter().map(|c| c.as_ref().to_string()).collect());
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        (0..self.headers.len())
            .map(|i| {
                std::iter::once(&self.headers[i])
                    .chain(self.rows.iter().filter_map(|r| r.get(i)))
                    .map(|c| measure_text_width(c))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Render the table as a string.
    pub fn render(&self) -> String {
        let widths = self.widths();
        let mut lines = vec![
            border(&widths, '┌', '┬', '┐'),
            self.render_row(&self.headers, &widths),
            border(&widths, '├', '┼', '┤'),
        ];
        lines.extend(self.rows.iter().map(|r| self.render_row(r, &widths)));
        lines.push(border(&widths, '└', '┴', '┘'));
        lines.join("\n")
    }

    fn render_row(&self, row: &[String], widths: &[usize]) -> String {
        let mut line = String::from("│");

        for (i, width) in widths.iter().enumerate() {
            let cell = row.get(i).map(String::as_str).unwrap_or("");
            let pad = " ".repeat(width.saturating_sub(measure_text_width(cell)));
            match self.align[i] {
                Align::Left => line.push_str(&format!(" {}{} │", cell, pad)),
                Align::Right => line.push_str(&format!(" {}{} │", pad, cell)),
            }
        }

        line
    }
}

fn border(widths: &[usize], left: char, mid: char, right: char) -> String {
    let inner: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{}{}{}", left, inner.join(&mid.to_string()), right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_still_renders_headers() {
        let table = Table::new(&["Cache", "Entries"]);
        assert!(table.is_empty());

        let output = table.render();
        assert!(output.contains("Cache"));
        assert_eq!(output.lines().count(), 4);
    }

    #[test]
    fn rows_and_borders() {
        let mut table = Table::new(&["Cache", "Entries", "Size"]);
        table.add_row(&["v1-precache", "8", "120.0 KB"]);
        table.add_row(&["v1-runtime", "3", "4.2 KB"]);

        let output = table.render();
        assert_eq!(table.row_count(), 2);
        assert_eq!(output.lines().count(), 6);
        assert!(output.starts_with('┌'));
        assert!(output.ends_with('┘'));
        assert!(output.contains("┼"));
    }

    #[test]
    fn right_alignment_pads_on_the_left() {
        let mut table = Table::new(&["Name", "Entries"]).align(1, Align::Right);
        table.add_row(&["a", "7"]);

        let output = table.render();
        assert!(output.contains("│       7 │"));
    }

    #[test]
    fn all_lines_have_equal_width() {
        let mut table = Table::new(&["A", "B"]);
        table.add_row(&["longer_value", "x"]);
        table.add_row(&["only"]);

        let output = table.render();
        let widths: Vec<usize> = output.lines().map(measure_text_width).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]));
    }
}
