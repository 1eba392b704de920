//! Series color assignment for stacked charts.
//!
//! A pure function of the series index; the pivot transform never sees it.

use serde::Serialize;

/// Base palette as RGB triples. Series cycle through it by index.
const PALETTE: [(u8, u8, u8); 10] = [
    (54, 162, 235),  // blue
    (255, 99, 132),  // red
    (75, 192, 192),  // teal
    (255, 206, 86),  // yellow
    (153, 102, 255), // purple
    (255, 159, 64),  // orange
    (199, 199, 199), // grey
    (83, 102, 255),  // indigo
    (255, 99, 255),  // pink
    (99, 255, 132),  // green
];

const FILL_ALPHA: &str = "0.8";

/// Fill and border colors for one series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesColor {
    pub background: String,
    pub border: String,
}

/// Color for the series at `index`, cycling through the palette.
pub fn color(index: usize) -> SeriesColor {
    let (r, g, b) = PALETTE[index % PALETTE.len()];
    SeriesColor {
        background: format!("rgba({r}, {g}, {b}, {FILL_ALPHA})"),
        border: format!("rgba({r}, {g}, {b}, 1)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_color_is_blue() {
        let c = color(0);
        assert_eq!(c.background, "rgba(54, 162, 235, 0.8)");
        assert_eq!(c.border, "rgba(54, 162, 235, 1)");
    }

    #[test]
    fn colors_cycle_by_index() {
        assert_eq!(color(3), color(13));
        assert_ne!(color(0), color(1));
    }

    #[test]
    fn last_palette_entry() {
        assert_eq!(color(9).background, "rgba(99, 255, 132, 0.8)");
    }
}
