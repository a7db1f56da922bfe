pub mod text;

pub use text::{collapse_whitespace, is_ascii_ws, line_of_offset, normalize_lines};
