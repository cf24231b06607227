//! Configuration section definitions.
//!
//! Each module corresponds to a section in `themesync.toml`:
//!
//! | Module     | TOML Section   | Purpose                                   |
//! |------------|----------------|-------------------------------------------|
//! | `store`    | `[store]`      | Remote store host, theme, credentials     |
//! | `paths`    | `[paths]`      | Project root and the three watched roots  |
//! | `scripts`  | `[scripts]`    | Module groups, order manifest, minifier   |
//! | `styles`   | `[styles]`     | Style entry file and compiler command     |
//! | `throttle` | `[throttle]`   | Leaky-bucket request budget               |
//! | `upload`   | `[upload]`     | Binary attachment allowlist               |
//! | `serve`    | `[serve]`      | Local proxy and live-reload ports         |

mod paths;
mod scripts;
mod serve;
mod store;
mod styles;
mod throttle;
mod upload;

pub use paths::PathsConfig;
pub use scripts::ScriptsConfig;
pub use serve::ServeConfig;
pub use store::StoreConfig;
pub use styles::StylesConfig;
pub use throttle::ThrottleConfig;
pub use upload::UploadConfig;
