//! Icon Sources
//!
//! Where raw app icons come from. Sources return decoded pixels
//! ([`RawImage`]); turning them into the wire format is the encoder's job.
//!
//! - [`PpmDirectoryIcons`]: binary PPM/PGM files named after the app
//! - [`PlaceholderIcons`]: a generated tile, for apps without an icon
//! - [`IconChain`]: tries sources in order

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use super::encoder::{PixelFormat, RawImage, ICON_SIZE};
use super::IconError;
use crate::apps::AppRecord;

/// Provider of raw icon images
#[async_trait]
pub trait IconSource: Send + Sync {
    /// Raw icon for an app
    ///
    /// `IconError::NotFound` means "no icon here, try elsewhere"; any other
    /// error means the icon exists but is unusable.
    async fn icon_for(&self, app: &AppRecord) -> Result<RawImage, IconError>;
}

// =============================================================================
// Netpbm directory
// =============================================================================

/// Icons stored as binary Netpbm files (`P6` colour, `P5` gray)
///
/// For an app `Spotify` running `/opt/spotify/spotify-bin` the lookup order
/// is `spotify.ppm`, `spotify.pgm`, `spotify-bin.ppm`, `spotify-bin.pgm`.
/// Icon files can be produced with e.g. `convert icon.png -resize 32x32 icon.ppm`.
#[derive(Clone, Debug)]
pub struct PpmDirectoryIcons {
    dir: PathBuf,
}

impl PpmDirectoryIcons {
    /// Look for icons in `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory searched
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn candidates(&self, app: &AppRecord) -> Vec<PathBuf> {
        let mut stems = vec![app.key().as_str().to_string()];
        if let Some(stem) = app
            .executable
            .as_deref()
            .and_then(Path::file_stem)
            .and_then(|s| s.to_str())
        {
            let stem = stem.to_lowercase();
            if !stems.contains(&stem) {
                stems.push(stem);
            }
        }

        stems
            .iter()
            .flat_map(|stem| {
                ["ppm", "pgm"]
                    .into_iter()
                    .map(move |ext| self.dir.join(format!("{stem}.{ext}")))
            })
            .collect()
    }
}

#[async_trait]
impl IconSource for PpmDirectoryIcons {
    async fn icon_for(&self, app: &AppRecord) -> Result<RawImage, IconError> {
        for path in self.candidates(app) {
            match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    tracing::debug!(app = %app.name, path = %path.display(), "Loading icon");
                    return decode_netpbm(&bytes);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(IconError::Io(e)),
            }
        }
        Err(IconError::NotFound(app.name.clone()))
    }
}

/// Header scanner for Netpbm files
struct HeaderReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> HeaderReader<'a> {
    fn skip_whitespace_and_comments(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            if b == b'#' {
                while let Some(&c) = self.bytes.get(self.pos) {
                    self.pos += 1;
                    if c == b'\n' {
                        break;
                    }
                }
            } else if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn token(&mut self) -> Result<&'a [u8], IconError> {
        self.skip_whitespace_and_comments();
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| !b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(IconError::Decode("truncated Netpbm header".to_string()));
        }
        Ok(&self.bytes[start..self.pos])
    }

    fn number(&mut self, what: &str) -> Result<usize, IconError> {
        let token = self.token()?;
        std::str::from_utf8(token)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| IconError::Decode(format!("invalid Netpbm {what}")))
    }
}

/// Decode a binary PPM (`P6`) or PGM (`P5`) image with maxval <= 255
///
/// # Errors
///
/// Returns `IconError::Decode` for any other format or a truncated file.
pub fn decode_netpbm(bytes: &[u8]) -> Result<RawImage, IconError> {
    let mut header = HeaderReader { bytes, pos: 0 };
    let format = match header.token()? {
        b"P6" => PixelFormat::Rgb,
        b"P5" => PixelFormat::Gray,
        other => {
            return Err(IconError::Decode(format!(
                "unsupported Netpbm magic {:?}",
                String::from_utf8_lossy(other)
            )))
        }
    };
    let width = header.number("width")?;
    let height = header.number("height")?;
    let maxval = header.number("maxval")?;
    if maxval == 0 || maxval > 255 {
        return Err(IconError::Decode(format!(
            "unsupported Netpbm maxval {maxval}"
        )));
    }

    // Exactly one whitespace byte separates the header from the raster
    let raster_start = header.pos + 1;
    let needed = width
        .saturating_mul(height)
        .saturating_mul(format.bytes_per_pixel());
    let raster = bytes
        .get(raster_start..)
        .filter(|r| r.len() >= needed)
        .ok_or_else(|| IconError::Decode("truncated Netpbm raster".to_string()))?;

    let data = raster[..needed]
        .iter()
        .map(|&v| {
            if maxval == 255 {
                v
            } else {
                (usize::from(v).min(maxval) * 255 / maxval) as u8
            }
        })
        .collect();
    RawImage::new(width, height, format, data)
}

// =============================================================================
// Placeholder
// =============================================================================

/// Generated icon: a tile coloured from the app's key with a darker border
///
/// Always has an icon, so it is normally the last source in a chain.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlaceholderIcons;

const BORDER: usize = 2;

impl PlaceholderIcons {
    /// Build the placeholder for an app
    pub fn render(app: &AppRecord) -> Result<RawImage, IconError> {
        let hash = crc32fast::hash(app.key().as_str().as_bytes()).to_le_bytes();
        let fill = [
            64 + hash[0] % 160,
            64 + hash[1] % 160,
            64 + hash[2] % 160,
        ];
        let edge = fill.map(|c| c / 2);

        let mut data = Vec::with_capacity(ICON_SIZE * ICON_SIZE * 3);
        for y in 0..ICON_SIZE {
            for x in 0..ICON_SIZE {
                let on_border = x < BORDER
                    || y < BORDER
                    || x >= ICON_SIZE - BORDER
                    || y >= ICON_SIZE - BORDER;
                data.extend_from_slice(if on_border { &edge } else { &fill });
            }
        }

        RawImage::new(ICON_SIZE, ICON_SIZE, PixelFormat::Rgb, data)
    }
}

#[async_trait]
impl IconSource for PlaceholderIcons {
    async fn icon_for(&self, app: &AppRecord) -> Result<RawImage, IconError> {
        Self::render(app)
    }
}

// =============================================================================
// Chain
// =============================================================================

/// Tries each source in turn until one has an icon
#[derive(Clone, Default)]
pub struct IconChain {
    sources: Vec<Arc<dyn IconSource>>,
}

impl std::fmt::Debug for IconChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconChain")
            .field("sources", &self.sources.len())
            .finish()
    }
}

impl IconChain {
    /// Empty chain (every lookup is `NotFound`)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source
    #[must_use]
    pub fn with(mut self, source: impl IconSource + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    /// Number of sources
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the chain has no sources
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[async_trait]
impl IconSource for IconChain {
    async fn icon_for(&self, app: &AppRecord) -> Result<RawImage, IconError> {
        for source in &self.sources {
            match source.icon_for(app).await {
                Err(IconError::NotFound(_)) => continue,
                other => return other,
            }
        }
        Err(IconError::NotFound(app.name.clone()))
    }
}
