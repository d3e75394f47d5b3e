//! Text layout: wrapping, measurement, shaping, and caret hit testing.

pub mod hit;
pub mod layout;
pub mod measure;
pub mod shaper;

pub use hit::{char_index_at_point, selection_range};
pub use layout::{
    ElementMetrics, StyleRun, WrappedLine, element_metrics, line_max_font_size, line_runs,
    line_start_x, runs_width, text_height, wrap_text,
};
pub use measure::{FixedAdvanceMeasurer, TextMeasurer};
pub use shaper::{ShapedLine, ShapedRun, TextShaper};
