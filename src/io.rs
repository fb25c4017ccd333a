use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use image::codecs::png::PngEncoder;
use image::{ImageEncoder, ImageError, RgbImage, RgbaImage};

/// Saved drawings are named `drawing_YYYY-MM-DD.png`.
const DRAWING_FILE_PREFIX: &str = "drawing_";
const DRAWING_FILE_EXT: &str = "png";

// ============================================================================
// ERRORS
// ============================================================================

/// Error type for drawing persistence.
#[derive(Debug)]
pub enum DrawingError {
    Io(std::io::Error),
    /// The file exists but is not a readable image.
    Decode { path: PathBuf, source: ImageError },
    Encode { path: PathBuf, source: ImageError },
    InvalidCanvas { width: u32, height: u32 },
}

impl std::fmt::Display for DrawingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DrawingError::Io(e) => write!(f, "I/O error: {}", e),
            DrawingError::Decode { path, source } => {
                write!(f, "Could not read drawing '{}': {}", path.display(), source)
            }
            DrawingError::Encode { path, source } => {
                write!(f, "Could not write drawing '{}': {}", path.display(), source)
            }
            DrawingError::InvalidCanvas { width, height } => {
                write!(f, "Invalid canvas size {}x{}", width, height)
            }
        }
    }
}

impl std::error::Error for DrawingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DrawingError::Io(e) => Some(e),
            DrawingError::Decode { source, .. } | DrawingError::Encode { source, .. } => Some(source),
            DrawingError::InvalidCanvas { .. } => None,
        }
    }
}

impl From<std::io::Error> for DrawingError {
    fn from(e: std::io::Error) -> Self {
        DrawingError::Io(e)
    }
}

// ============================================================================
// PATHS
// ============================================================================

/// Where the drawing for `date` lives inside `data_dir`.
pub fn drawing_path_for_date(data_dir: &Path, date: NaiveDate) -> PathBuf {
    data_dir.join(format!(
        "{}{}.{}",
        DRAWING_FILE_PREFIX,
        date.format("%Y-%m-%d"),
        DRAWING_FILE_EXT
    ))
}

/// Whether a drawing has been saved for `date`.
pub fn has_saved_drawing(data_dir: &Path, date: NaiveDate) -> bool {
    drawing_path_for_date(data_dir, date).is_file()
}

// ============================================================================
// LOAD / SAVE
// ============================================================================

/// Read a drawing file as RGBA.  A missing file is `Ok(None)`; a file that
/// exists but cannot be decoded is an error, never a silent blank canvas.
pub fn load_drawing(path: &Path) -> Result<Option<RgbaImage>, DrawingError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let reader = image::io::Reader::new(BufReader::new(file)).with_guessed_format()?;
    let decoded = reader.decode().map_err(|source| DrawingError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(decoded.to_rgba8()))
}

/// Write a flattened drawing as an opaque RGB PNG, creating the parent
/// directory if needed.
pub fn save_drawing(path: &Path, image: &RgbImage) -> Result<(), DrawingError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let encode_err = |source: ImageError| DrawingError::Encode {
        path: path.to_path_buf(),
        source,
    };

    PngEncoder::new(&mut writer)
        .write_image(image.as_raw(), image.width(), image.height(), image::ColorType::Rgb8)
        .map_err(encode_err)?;
    writer.flush()?;
    Ok(())
}
