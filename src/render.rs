use crate::sim::TickSnapshot;

/// Render a snapshot onto a `cols x rows` character grid.
///
/// World coordinates map onto cells by linear scaling against the
/// snapshot bounds; agents outside the bounds clamp onto the border.
/// Sheep draw as `o`, shepherds as `X` (drawn last, so a shepherd on top
/// of a sheep wins the cell). Row 0 is the top of the frame, i.e. +y is
/// up. Purely a convenience for terminal output; the physics never reads
/// this.
pub fn render_grid(snapshot: &TickSnapshot, cols: usize, rows: usize) -> String {
    if cols == 0 || rows == 0 {
        return String::new();
    }

    let mut grid = vec![vec!['.'; cols]; rows];
    let (width, height) = snapshot.bounds;

    let cell = |x: f64, y: f64| {
        let scale = |value: f64, extent: f64, cells: usize| -> usize {
            if extent <= 0.0 {
                return 0;
            }
            let idx = (value / extent * cells as f64).floor();
            (idx.max(0.0) as usize).min(cells - 1)
        };
        let col = scale(x, width, cols);
        let row = rows - 1 - scale(y, height, rows);
        (row, col)
    };

    for sheep in &snapshot.sheep {
        let (row, col) = cell(sheep.pos.x, sheep.pos.y);
        grid[row][col] = 'o';
    }
    for dog in &snapshot.shepherds {
        let (row, col) = cell(dog.pos.x, dog.pos.y);
        grid[row][col] = 'X';
    }

    let mut out = String::with_capacity(rows * (cols + 1));
    for row in grid {
        out.extend(row);
        out.push('\n');
    }
    out
}
