//! Disc image access.
//!
//! Detects the image format (ISO, raw BIN, CUE sheet, CHD), reads sectors by
//! index and writes modified sectors back to ISO and raw BIN images.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::DiscError;
use crate::sector::{CD_SYNC_PATTERN, RAW_SECTOR_SIZE, Sector, SectorLayout, USER_DATA_SIZE};
use crate::ReadSeek;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// ISO 9660 Primary Volume Descriptor is always at sector 16.
const PVD_SECTOR: u64 = 16;

/// Standard identifier of an ISO 9660 volume descriptor.
const ISO_STANDARD_ID: &[u8; 5] = b"CD001";

/// CHD file magic bytes.
const CHD_MAGIC: &[u8; 8] = b"MComprHD";

/// Bytes inspected when looking for CUE sheet commands.
const CUE_PROBE_SIZE: u64 = 512;

// ---------------------------------------------------------------------------
// Sector source / sink
// ---------------------------------------------------------------------------

/// Anything sectors can be read from by index.
pub trait SectorSource {
    fn sector_count(&self) -> u32;

    fn read_sector(&mut self, index: u32) -> Result<Sector, DiscError>;
}

/// Anything modified sectors can be written back to.
pub trait SectorSink {
    fn write_sector(&mut self, sector: &Sector) -> Result<(), DiscError>;
}

/// In-memory sectors, indexed by position.
impl SectorSource for Vec<Sector> {
    fn sector_count(&self) -> u32 {
        self.len() as u32
    }

    fn read_sector(&mut self, index: u32) -> Result<Sector, DiscError> {
        self.get(index as usize)
            .cloned()
            .ok_or(DiscError::SectorOutOfRange {
                sector: index,
                count: self.len() as u32,
            })
    }
}

impl SectorSink for Vec<Sector> {
    fn write_sector(&mut self, sector: &Sector) -> Result<(), DiscError> {
        let count = self.len() as u32;
        let slot = self
            .get_mut(sector.index() as usize)
            .ok_or(DiscError::SectorOutOfRange {
                sector: sector.index(),
                count,
            })?;
        *slot = sector.clone();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Disc format detection
// ---------------------------------------------------------------------------

/// Detected disc image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscFormat {
    /// Standard 2048 byte/sector ISO image.
    Iso2048,
    /// Raw 2352 byte/sector BIN image.
    RawSector2352,
    /// CUE sheet (text file referencing BIN tracks).
    Cue,
    /// MAME Compressed Hunks of Data.
    Chd,
}

impl DiscFormat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Iso2048 => "ISO 9660",
            Self::RawSector2352 => "Raw BIN (2352)",
            Self::Cue => "CUE Sheet",
            Self::Chd => "CHD",
        }
    }

    /// Bytes per sector as stored in the image file.
    fn sector_size(&self) -> Option<u64> {
        match self {
            Self::Iso2048 => Some(USER_DATA_SIZE as u64),
            Self::RawSector2352 => Some(RAW_SECTOR_SIZE as u64),
            Self::Cue | Self::Chd => None,
        }
    }
}

/// Detect the disc image format by examining the reader content.
pub fn detect_disc_format(reader: &mut dyn ReadSeek) -> Result<DiscFormat, DiscError> {
    let head = read_head(reader, CUE_PROBE_SIZE)?;
    if head.len() < CD_SYNC_PATTERN.len() {
        return Err(DiscError::TooSmall {
            expected: CD_SYNC_PATTERN.len() as u64,
            actual: head.len() as u64,
        });
    }

    let format = if head.starts_with(CHD_MAGIC) {
        Some(DiscFormat::Chd)
    } else if head.starts_with(&CD_SYNC_PATTERN) {
        Some(DiscFormat::RawSector2352)
    } else if is_cue_text(&head) {
        Some(DiscFormat::Cue)
    } else if has_iso_descriptor(reader)? {
        Some(DiscFormat::Iso2048)
    } else {
        None
    };

    reader.seek(SeekFrom::Start(0))?;
    format.ok_or_else(|| DiscError::invalid_format("Not a recognized disc image format"))
}

/// Up to `len` bytes from the start of the image.
fn read_head(reader: &mut dyn ReadSeek, len: u64) -> Result<Vec<u8>, DiscError> {
    reader.seek(SeekFrom::Start(0))?;
    let mut head = Vec::with_capacity(len as usize);
    (&mut *reader).take(len).read_to_end(&mut head)?;
    Ok(head)
}

/// Text with both a FILE and a TRACK command.
fn is_cue_text(head: &[u8]) -> bool {
    if !head
        .iter()
        .all(|&b| matches!(b, 0x09..=0x0D | 0x1A | 0x20..=0xFF))
    {
        return false;
    }
    let text = String::from_utf8_lossy(head).to_ascii_uppercase();
    text.contains("FILE ") && text.contains("TRACK ")
}

fn has_iso_descriptor(reader: &mut dyn ReadSeek) -> Result<bool, DiscError> {
    // Skip the descriptor type byte
    reader.seek(SeekFrom::Start(PVD_SECTOR * USER_DATA_SIZE as u64 + 1))?;
    let mut id = [0u8; 5];
    Ok(reader.read_exact(&mut id).is_ok() && &id == ISO_STANDARD_ID)
}

// ---------------------------------------------------------------------------
// CUE sheet parsing
// ---------------------------------------------------------------------------

/// Sector layout of a CUE `TRACK`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackMode {
    Audio,
    /// `MODE1/2048` or `MODE2/2048`: user data only.
    Cooked,
    /// `MODE1/2352` or `MODE2/2352`: full raw sectors.
    Raw,
}

impl TrackMode {
    fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "AUDIO" => Some(Self::Audio),
            "MODE1/2048" | "MODE2/2048" => Some(Self::Cooked),
            "MODE1/2352" | "MODE2/2352" => Some(Self::Raw),
            _ => None,
        }
    }

    /// Format to open a file holding this track with, `None` for audio.
    pub fn image_format(self) -> Option<DiscFormat> {
        match self {
            Self::Audio => None,
            Self::Cooked => Some(DiscFormat::Iso2048),
            Self::Raw => Some(DiscFormat::RawSector2352),
        }
    }
}

/// A parsed CUE sheet.
#[derive(Debug, Clone)]
pub struct CueSheet {
    pub files: Vec<CueFile>,
}

/// A FILE entry and the modes of the tracks it holds.
#[derive(Debug, Clone)]
pub struct CueFile {
    pub filename: String,
    pub tracks: Vec<TrackMode>,
}

impl CueSheet {
    /// The first file holding a data track, with the format of that track.
    pub fn data_file(&self) -> Option<(&CueFile, DiscFormat)> {
        self.files.iter().find_map(|file| {
            file.tracks
                .iter()
                .find_map(|mode| mode.image_format())
                .map(|format| (file, format))
        })
    }
}

/// Parse a CUE sheet from its text content.
///
/// Only FILE and TRACK commands are read; INDEX, PREGAP, REM and the rest
/// don't change the sector layout of a file.
pub fn parse_cue(content: &str) -> Result<CueSheet, DiscError> {
    let mut files: Vec<CueFile> = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        let line_no = line_no + 1;
        let Some((command, args)) = line.trim().split_once(char::is_whitespace) else {
            continue;
        };
        let args = args.trim();

        if command.eq_ignore_ascii_case("FILE") {
            files.push(CueFile {
                filename: cue_filename(args, line_no)?,
                tracks: Vec::new(),
            });
        } else if command.eq_ignore_ascii_case("TRACK") {
            let mode = cue_track_mode(args, line_no)?;
            let file = files.last_mut().ok_or_else(|| {
                DiscError::invalid_format(format!("CUE line {line_no}: TRACK before any FILE"))
            })?;
            file.tracks.push(mode);
        }
    }

    if files.is_empty() {
        return Err(DiscError::invalid_format(
            "CUE sheet contains no FILE entries",
        ));
    }
    Ok(CueSheet { files })
}

/// `"name with spaces.bin" BINARY` or `name.bin BINARY`.
fn cue_filename(args: &str, line_no: usize) -> Result<String, DiscError> {
    let name = match args.strip_prefix('"') {
        Some(quoted) => quoted.split_once('"').map(|(name, _)| name).ok_or_else(|| {
            DiscError::invalid_format(format!("CUE line {line_no}: unterminated quote"))
        })?,
        None => args.split_whitespace().next().unwrap_or_default(),
    };
    if name.is_empty() {
        return Err(DiscError::invalid_format(format!(
            "CUE line {line_no}: FILE without a name"
        )));
    }
    Ok(name.to_string())
}

/// `01 MODE2/2352`
fn cue_track_mode(args: &str, line_no: usize) -> Result<TrackMode, DiscError> {
    let mut words = args.split_whitespace();
    let (Some(number), Some(mode)) = (words.next(), words.next()) else {
        return Err(DiscError::invalid_format(format!(
            "CUE line {line_no}: TRACK needs a number and a mode"
        )));
    };
    if number.parse::<u8>().is_err() {
        return Err(DiscError::invalid_format(format!(
            "CUE line {line_no}: bad track number {number}"
        )));
    }
    TrackMode::parse(mode).ok_or_else(|| {
        DiscError::invalid_format(format!("CUE line {line_no}: unsupported track mode {mode}"))
    })
}

// ---------------------------------------------------------------------------
// Disc images
// ---------------------------------------------------------------------------

enum Backend<F: Read + Seek> {
    Plain {
        reader: F,
        sector_size: u64,
    },
    Chd {
        chd: chd::Chd<F>,
        hunk_buf: Vec<u8>,
        cmp_buf: Vec<u8>,
        current_hunk: Option<u32>,
    },
}

/// A disc image opened for sector access.
pub struct DiscImage<F: Read + Seek> {
    format: DiscFormat,
    sector_count: u32,
    backend: Backend<F>,
}

impl<F: Read + Seek> std::fmt::Debug for DiscImage<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscImage")
            .field("format", &self.format)
            .field("sector_count", &self.sector_count)
            .finish()
    }
}

impl DiscImage<File> {
    /// Open an image file for reading.
    ///
    /// CUE sheets are resolved to their first data file, opened as an ISO
    /// or raw BIN image according to the mode of its data track.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DiscError> {
        Self::open_path(path.as_ref(), false)
    }

    /// Open an ISO or raw BIN image (directly or through a CUE sheet) for
    /// reading and writing.
    pub fn open_writable(path: impl AsRef<Path>) -> Result<Self, DiscError> {
        Self::open_path(path.as_ref(), true)
    }

    fn open_path(path: &Path, writable: bool) -> Result<Self, DiscError> {
        let open = |p: &Path| -> Result<File, DiscError> {
            Ok(OpenOptions::new().read(true).write(writable).open(p)?)
        };

        let mut file = open(path)?;
        let format = match detect_disc_format(&mut file) {
            Ok(format) => format,
            Err(DiscError::InvalidFormat(_)) if has_extension(path, "iso") => {
                log::warn!(
                    "{}: no ISO 9660 descriptor, assuming 2048-byte sectors",
                    path.display()
                );
                DiscFormat::Iso2048
            }
            Err(e) => return Err(e),
        };

        match format {
            DiscFormat::Cue => {
                let mut content = String::new();
                file.read_to_string(&mut content)?;
                let cue = parse_cue(&content)?;
                let (data_file, track_format) = cue
                    .data_file()
                    .ok_or_else(|| DiscError::invalid_format("CUE sheet has no data track"))?;
                let parent = path.parent().unwrap_or_else(|| Path::new("."));
                let data_path = parent.join(&data_file.filename);
                log::debug!(
                    "CUE sheet data track: {} ({})",
                    data_path.display(),
                    track_format.name()
                );
                Self::with_format(open(&data_path)?, track_format)
            }
            DiscFormat::Chd if writable => Err(DiscError::unsupported(
                "CHD images are read-only",
            )),
            _ => Self::with_format(file, format),
        }
    }
}

impl<F: Read + Seek> DiscImage<F> {
    /// Detect the format of `reader` and open it.
    pub fn from_reader(mut reader: F) -> Result<Self, DiscError> {
        let format = detect_disc_format(&mut reader)?;
        Self::with_format(reader, format)
    }

    /// Open `reader` as an image of the given format.
    pub fn with_format(mut reader: F, format: DiscFormat) -> Result<Self, DiscError> {
        match format {
            DiscFormat::Iso2048 | DiscFormat::RawSector2352 => {
                let sector_size = format.sector_size().unwrap_or(RAW_SECTOR_SIZE as u64);
                let len = reader.seek(SeekFrom::End(0))?;
                reader.seek(SeekFrom::Start(0))?;
                if len < sector_size {
                    return Err(DiscError::TooSmall {
                        expected: sector_size,
                        actual: len,
                    });
                }
                if len % sector_size != 0 {
                    log::warn!(
                        "image size {} is not a multiple of {}; ignoring {} trailing bytes",
                        len,
                        sector_size,
                        len % sector_size
                    );
                }
                let sector_count = u32::try_from(len / sector_size)
                    .map_err(|_| DiscError::invalid_format("Image has too many sectors"))?;
                Ok(Self {
                    format,
                    sector_count,
                    backend: Backend::Plain {
                        reader,
                        sector_size,
                    },
                })
            }
            DiscFormat::Chd => {
                let chd = chd::Chd::open(reader, None)
                    .map_err(|e| DiscError::chd(format!("Failed to open CHD: {}", e)))?;
                let unit_bytes = chd.header().unit_bytes() as u64;
                if unit_bytes < RAW_SECTOR_SIZE as u64 {
                    return Err(DiscError::invalid_format(format!(
                        "CHD unit size {} is not a CD sector",
                        unit_bytes
                    )));
                }
                let sector_count = u32::try_from(chd.header().logical_bytes() / unit_bytes)
                    .map_err(|_| DiscError::invalid_format("Image has too many sectors"))?;
                let hunk_buf = chd.get_hunksized_buffer();
                let cmp_buf = Vec::with_capacity(chd.header().hunk_size() as usize);
                Ok(Self {
                    format,
                    sector_count,
                    backend: Backend::Chd {
                        chd,
                        hunk_buf,
                        cmp_buf,
                        current_hunk: None,
                    },
                })
            }
            DiscFormat::Cue => Err(DiscError::unsupported(
                "CUE sheets must be opened by path",
            )),
        }
    }

    pub fn format(&self) -> DiscFormat {
        self.format
    }

    fn check_range(&self, index: u32) -> Result<(), DiscError> {
        if index >= self.sector_count {
            return Err(DiscError::SectorOutOfRange {
                sector: index,
                count: self.sector_count,
            });
        }
        Ok(())
    }
}

impl<F: Read + Seek> SectorSource for DiscImage<F> {
    fn sector_count(&self) -> u32 {
        self.sector_count
    }

    fn read_sector(&mut self, index: u32) -> Result<Sector, DiscError> {
        self.check_range(index)?;
        match &mut self.backend {
            Backend::Plain {
                reader,
                sector_size,
            } => {
                reader.seek(SeekFrom::Start(index as u64 * *sector_size))?;
                let mut bytes = vec![0u8; *sector_size as usize];
                reader.read_exact(&mut bytes)?;
                Ok(match self.format {
                    DiscFormat::Iso2048 => Sector::from_iso(index, bytes),
                    _ => Sector::from_raw(index, bytes),
                })
            }
            Backend::Chd {
                chd,
                hunk_buf,
                cmp_buf,
                current_hunk,
            } => {
                let unit_bytes = chd.header().unit_bytes() as u64;
                let hunk_size = chd.header().hunk_size() as u64;
                let byte_offset = index as u64 * unit_bytes;
                let hunk_num = (byte_offset / hunk_size) as u32;
                let offset_in_hunk = (byte_offset % hunk_size) as usize;

                if *current_hunk != Some(hunk_num) {
                    let mut hunk = chd.hunk(hunk_num).map_err(|e| {
                        DiscError::chd(format!("Failed to get CHD hunk {}: {}", hunk_num, e))
                    })?;
                    cmp_buf.clear();
                    hunk.read_hunk_in(cmp_buf, hunk_buf).map_err(|e| {
                        DiscError::chd(format!(
                            "Failed to decompress CHD hunk {}: {}",
                            hunk_num, e
                        ))
                    })?;
                    *current_hunk = Some(hunk_num);
                }

                if offset_in_hunk + RAW_SECTOR_SIZE > hunk_buf.len() {
                    return Err(DiscError::chd(
                        "CHD sector data extends beyond hunk boundary",
                    ));
                }
                let bytes = hunk_buf[offset_in_hunk..offset_in_hunk + RAW_SECTOR_SIZE].to_vec();
                Ok(Sector::from_raw(index, bytes))
            }
        }
    }
}

impl<F: Read + Write + Seek> SectorSink for DiscImage<F> {
    fn write_sector(&mut self, sector: &Sector) -> Result<(), DiscError> {
        self.check_range(sector.index())?;
        let Backend::Plain {
            reader,
            sector_size,
        } = &mut self.backend
        else {
            return Err(DiscError::unsupported("CHD images are read-only"));
        };

        let expected_iso = self.format == DiscFormat::Iso2048;
        if (sector.layout() == SectorLayout::Iso) != expected_iso
            || sector.bytes().len() as u64 != *sector_size
        {
            return Err(DiscError::invalid_format(format!(
                "{} sector does not match a {} image",
                sector.layout().name(),
                self.format.name()
            )));
        }

        reader.seek(SeekFrom::Start(sector.index() as u64 * *sector_size))?;
        reader.write_all(sector.bytes())?;
        Ok(())
    }
}

impl<F: Read + Write + Seek> DiscImage<F> {
    /// Flush pending writes to the underlying file.
    pub fn flush(&mut self) -> Result<(), DiscError> {
        if let Backend::Plain { reader, .. } = &mut self.backend {
            reader.flush()?;
        }
        Ok(())
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

#[cfg(test)]
#[path = "tests/disc_tests.rs"]
mod tests;
