//! Renderer display options persisted with the viewer state

use serde::{Deserialize, Serialize};

/// Which world planes get a reference grid, as a bit mask over the grid normals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridAxes(u8);

impl GridAxes {
    pub const NONE: GridAxes = GridAxes(0);
    pub const X: GridAxes = GridAxes(1);
    pub const Y: GridAxes = GridAxes(2);
    pub const Z: GridAxes = GridAxes(4);
    pub const ALL: GridAxes = GridAxes(7);

    /// Build from raw bits; bits above the three axes are dropped
    pub fn from_bits(bits: u8) -> Self {
        GridAxes(bits & Self::ALL.0)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: GridAxes) -> bool {
        self.0 & other.0 == other.0
    }

    /// Normals as axis letters, e.g. `"xz"`
    pub fn normals(self) -> String {
        let mut out = String::new();
        for (flag, letter) in [(Self::X, 'x'), (Self::Y, 'y'), (Self::Z, 'z')] {
            if self.contains(flag) {
                out.push(letter);
            }
        }
        out
    }

    /// Parse axis letters; `None` if any other character appears
    pub fn from_normals(normals: &str) -> Option<Self> {
        let mut bits = 0;
        for c in normals.chars() {
            bits |= match c.to_ascii_lowercase() {
                'x' => Self::X.0,
                'y' => Self::Y.0,
                'z' => Self::Z.0,
                _ => return None,
            };
        }
        Some(GridAxes(bits))
    }

    /// Next mask in binary counting order, wrapping after all three axes
    pub fn cycle(self) -> Self {
        GridAxes((self.0 + 1) & Self::ALL.0)
    }
}

/// Which clocks are shown in the viewport overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeDisplay(u8);

impl TimeDisplay {
    pub const REAL: TimeDisplay = TimeDisplay(1);
    pub const VIRTUAL: TimeDisplay = TimeDisplay(2);
    pub const ITERATION: TimeDisplay = TimeDisplay(4);
    pub const ALL: TimeDisplay = TimeDisplay(7);

    pub fn from_bits(bits: u8) -> Self {
        TimeDisplay(bits & Self::ALL.0)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: TimeDisplay) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn cycle(self) -> Self {
        TimeDisplay((self.0 + 1) & Self::ALL.0)
    }
}

impl Default for TimeDisplay {
    fn default() -> Self {
        TimeDisplay(Self::REAL.0 | Self::VIRTUAL.0 | Self::ITERATION.0)
    }
}

/// Display options handed to the render pipeline each frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayOptions {
    pub grid: GridAxes,
    pub grid_subdivide: bool,
    pub display_grid_numbers: bool,
    pub auto_grid: bool,
    pub draw_scale: bool,
    pub time_display: TimeDisplay,
    pub wireframe: bool,
    /// Background colour, linear RGB in `0..=1`
    pub background: [f32; 3],
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            grid: GridAxes::NONE,
            grid_subdivide: false,
            display_grid_numbers: true,
            auto_grid: true,
            draw_scale: true,
            time_display: TimeDisplay::default(),
            wireframe: false,
            background: [0.2, 0.2, 0.2],
        }
    }
}
