//! Path and URL utilities.
//!
//! Pure functions for path manipulation. No side effects.
//!
//! - [`fs`]: Filesystem path normalization and root-relative components
//! - [`route`]: URL path helpers (`url_to_safe_filename`, `split_path_query`)

pub mod fs;
pub mod route;

pub use fs::{is_temp_file, normalize_path, relative_components};
