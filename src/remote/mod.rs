//! Rate-limited remote writer.
//!
//! Every admin API call goes through one shared [`RateLimiter`] so the
//! store's request budget is never exceeded.
//!
//! | Module     | Purpose                                              |
//! |------------|------------------------------------------------------|
//! | `throttle` | leaky bucket with FIFO overflow queue                |
//! | `client`   | asset, resource and storefront HTTP operations       |
//! | `asset`    | `AssetStore` seam and the read-then-upload chain     |
//! | `link`     | `Link` header cursor parsing                         |
//! | `error`    | `RemoteError`                                        |

mod asset;
mod client;
mod error;
mod link;
mod throttle;

pub use asset::{AssetStore, AssetValue, RemoteAsset, read_file_then_upload, read_source};
pub use client::{RemoteClient, ResourcePage, ResourceType, StoreEndpoint};
pub use error::RemoteError;
pub use link::next_link;
pub use throttle::{Dropped, RateLimiter};
