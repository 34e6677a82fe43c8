//! App Icons
//!
//! Icons travel to the device as fixed 2048-byte bitmaps. A payload is either
//! complete or not sent at all: when an icon cannot be produced the whole app
//! sequence is skipped.

pub mod encoder;
pub mod source;

use thiserror::Error;

use crate::apps::AppRecord;

pub use encoder::{encode_icon, pack_rgb565, IconBitmap, PixelFormat, RawImage, ICON_BYTES, ICON_SIZE};
pub use source::{decode_netpbm, IconChain, IconSource, PlaceholderIcons, PpmDirectoryIcons};

/// Errors producing an icon
#[derive(Debug, Error)]
pub enum IconError {
    /// The source has no icon for this app
    #[error("No icon for app '{0}'")]
    NotFound(String),

    /// The icon exists but could not be decoded
    #[error("Icon decode failed: {0}")]
    Decode(String),

    /// IO error reading the icon
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetch and encode an app's icon
///
/// # Errors
///
/// Propagates the source's error; encoding itself cannot fail once the
/// image is decoded.
pub async fn load_icon(source: &dyn IconSource, app: &AppRecord) -> Result<IconBitmap, IconError> {
    let image = source.icon_for(app).await?;
    Ok(encode_icon(&image))
}
