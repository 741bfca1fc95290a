//! External song converter.
//!
//! Converting a downloaded archive is a two-step affair: `import` turns the
//! raw archive into an intermediate directory, `package` turns that
//! directory into the final distributable package.

mod config;
mod error;
mod onyx;
mod traits;

pub use config::ConverterConfig;
pub use error::ConverterError;
pub use onyx::OnyxConverter;
pub use traits::SongConverter;

/// Builds the package content id from artist and title.
///
/// The id ends up in the package metadata and must carry no whitespace.
pub fn content_id(artist: &str, title: &str) -> String {
    format!("UP0006-BLUS30463_00-RB3CUST{}_{}", artist, title).replace(' ', "")
}
