//! Data models for the track library.
//!
//! This module defines the canonical `TrackRecord` value type together with
//! its field taxonomy: the closed `TrackFileType` enumeration, its coarse
//! `FormatFamily` grouping and the `TrackField` names used by diffs.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Deserializer, Serialize};

/// Sample bit depth carried by lossless file types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BitDepth {
    /// 4-bit samples.
    Bits4,
    /// 8-bit samples.
    Bits8,
    /// 16-bit samples (CD quality).
    Bits16,
    /// 24-bit samples.
    Bits24,
    /// 32-bit integral samples.
    Bits32,
}

impl BitDepth {
    /// Number of bits per sample.
    #[must_use]
    pub fn bits(self) -> u32 {
        match self {
            Self::Bits4 => 4,
            Self::Bits8 => 8,
            Self::Bits16 => 16,
            Self::Bits24 => 24,
            Self::Bits32 => 32,
        }
    }

    /// Maps a bit count back to a depth, if it is one of the known widths.
    #[must_use]
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            4 => Some(Self::Bits4),
            8 => Some(Self::Bits8),
            16 => Some(Self::Bits16),
            24 => Some(Self::Bits24),
            32 => Some(Self::Bits32),
            _ => None,
        }
    }
}

/// MP3 bitrate mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mp3Mode {
    /// Constant bitrate.
    Constant,
    /// Variable bitrate.
    Variable,
}

/// Coarse codec grouping used for inclusive format matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatFamily {
    /// Any FLAC variant.
    Flac,
    /// Any Apple Lossless variant.
    Alac,
    /// Any AIFF variant.
    Aiff,
    /// Any Monkey's Audio variant.
    MonkeysAudio,
    /// Lossy codecs (MP3, AAC, Vorbis, Opus).
    Lossy,
    /// Files whose format could not be determined.
    Unknown,
}

/// Audio file type with its codec family and bit-depth variant.
///
/// A `None` bit depth on a lossless variant means the depth was not
/// reported by the metadata source. The serialized form is a string tag
/// (`"FLAC_24"`, `"MP3_VBR"`, ...); unknown tags decode to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum TrackFileType {
    /// Free Lossless Audio Codec.
    Flac(Option<BitDepth>),
    /// Apple Lossless (16 or 24 bit).
    Alac(Option<BitDepth>),
    /// Audio Interchange File Format PCM.
    Aiff(Option<BitDepth>),
    /// Monkey's Audio (8, 16 or 24 bit).
    MonkeysAudio(Option<BitDepth>),
    /// MPEG Layer III.
    Mp3(Mp3Mode),
    /// AAC in an M4A container.
    Aac,
    /// Ogg Vorbis.
    Vorbis,
    /// Opus.
    Opus,
    /// Unrecognised format.
    #[default]
    Unknown,
}

impl TrackFileType {
    /// Returns the coarse family this variant belongs to.
    #[must_use]
    pub fn family(self) -> FormatFamily {
        match self {
            Self::Flac(_) => FormatFamily::Flac,
            Self::Alac(_) => FormatFamily::Alac,
            Self::Aiff(_) => FormatFamily::Aiff,
            Self::MonkeysAudio(_) => FormatFamily::MonkeysAudio,
            Self::Mp3(_) | Self::Aac | Self::Vorbis | Self::Opus => FormatFamily::Lossy,
            Self::Unknown => FormatFamily::Unknown,
        }
    }

    /// Returns the bit-depth variant, if this is a lossless type that carries one.
    #[must_use]
    pub fn bit_depth(self) -> Option<BitDepth> {
        match self {
            Self::Flac(depth) | Self::Alac(depth) | Self::Aiff(depth) | Self::MonkeysAudio(depth) => {
                depth
            }
            _ => None,
        }
    }

    /// Whether the file type stores audio losslessly.
    #[must_use]
    pub fn is_lossless(self) -> bool {
        !matches!(self.family(), FormatFamily::Lossy | FormatFamily::Unknown)
    }

    /// Returns the stable string tag of this variant.
    #[must_use]
    pub fn as_tag(self) -> &'static str {
        use BitDepth::{Bits4, Bits8, Bits16, Bits24, Bits32};

        match self {
            Self::Flac(None) => "FLAC",
            Self::Flac(Some(Bits4)) => "FLAC_4",
            Self::Flac(Some(Bits8)) => "FLAC_8",
            Self::Flac(Some(Bits16)) => "FLAC_16",
            Self::Flac(Some(Bits24)) => "FLAC_24",
            Self::Flac(Some(Bits32)) => "FLAC_32",
            Self::Alac(Some(Bits16)) => "ALAC_16",
            Self::Alac(Some(Bits24)) => "ALAC_24",
            Self::Alac(_) => "ALAC",
            Self::Aiff(None) => "AIFF",
            Self::Aiff(Some(Bits4)) => "AIFF_4",
            Self::Aiff(Some(Bits8)) => "AIFF_8",
            Self::Aiff(Some(Bits16)) => "AIFF_16",
            Self::Aiff(Some(Bits24)) => "AIFF_24",
            Self::Aiff(Some(Bits32)) => "AIFF_32",
            Self::MonkeysAudio(Some(Bits8)) => "MonkeysAudio_8",
            Self::MonkeysAudio(Some(Bits16)) => "MonkeysAudio_16",
            Self::MonkeysAudio(Some(Bits24)) => "MonkeysAudio_24",
            Self::MonkeysAudio(_) => "MonkeysAudio",
            Self::Mp3(Mp3Mode::Constant) => "MP3_CBR",
            Self::Mp3(Mp3Mode::Variable) => "MP3_VBR",
            Self::Aac => "AAC",
            Self::Vorbis => "Vorbis",
            Self::Opus => "Opus",
            Self::Unknown => "Unknown",
        }
    }

    /// Parses a string tag produced by [`TrackFileType::as_tag`].
    ///
    /// Tags outside the vocabulary map to `Unknown`.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        let (family, depth) = match tag.rsplit_once('_') {
            Some((family, bits)) => match bits.parse::<u32>().ok().and_then(BitDepth::from_bits) {
                Some(depth) => (family, Some(depth)),
                None => (tag, None),
            },
            None => (tag, None),
        };

        match (family, depth) {
            ("FLAC", depth) => Self::Flac(depth),
            ("ALAC", None | Some(BitDepth::Bits16 | BitDepth::Bits24)) => Self::Alac(depth),
            ("AIFF", depth) => Self::Aiff(depth),
            (
                "MonkeysAudio",
                None | Some(BitDepth::Bits8 | BitDepth::Bits16 | BitDepth::Bits24),
            ) => Self::MonkeysAudio(depth),
            ("MP3_CBR", None) => Self::Mp3(Mp3Mode::Constant),
            ("MP3_VBR", None) => Self::Mp3(Mp3Mode::Variable),
            ("AAC", None) => Self::Aac,
            ("Vorbis", None) => Self::Vorbis,
            ("Opus", None) => Self::Opus,
            _ => Self::Unknown,
        }
    }
}

impl From<TrackFileType> for String {
    fn from(file_type: TrackFileType) -> Self {
        file_type.as_tag().to_string()
    }
}

impl From<String> for TrackFileType {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl Display for TrackFileType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        use BitDepth::{Bits4, Bits8, Bits16, Bits24, Bits32};

        let name = match self {
            Self::Flac(None) => "FLAC",
            Self::Flac(Some(Bits4)) => "FLAC (4-bit)",
            Self::Flac(Some(Bits8)) => "FLAC (8-bit)",
            Self::Flac(Some(Bits16)) => "FLAC (16-bit)",
            Self::Flac(Some(Bits24)) => "FLAC (24-bit Hi-Res)",
            Self::Flac(Some(Bits32)) => "FLAC (32-bit Integral)",
            Self::Alac(Some(Bits16)) => "Apple Lossless (16-bit)",
            Self::Alac(Some(Bits24)) => "Apple Lossless (24-bit Hi-Res)",
            Self::Alac(_) => "Apple Lossless",
            Self::Aiff(None) => "AIFF (PCM Audio)",
            Self::Aiff(Some(Bits4)) => "AIFF (4-bit PCM)",
            Self::Aiff(Some(Bits8)) => "AIFF (8-bit PCM)",
            Self::Aiff(Some(Bits16)) => "AIFF (16-bit PCM)",
            Self::Aiff(Some(Bits24)) => "AIFF (24-bit PCM)",
            Self::Aiff(Some(Bits32)) => "AIFF (32-bit PCM)",
            Self::MonkeysAudio(Some(Bits8)) => "Monkey's Audio (8-bit)",
            Self::MonkeysAudio(Some(Bits16)) => "Monkey's Audio (16-bit)",
            Self::MonkeysAudio(Some(Bits24)) => "Monkey's Audio (24-bit)",
            Self::MonkeysAudio(_) => "Monkey's Audio",
            Self::Mp3(Mp3Mode::Constant) => "MP3 (Constant Bitrate)",
            Self::Mp3(Mp3Mode::Variable) => "MP3 (Variable Bitrate)",
            Self::Aac => "AAC (M4A Audio)",
            Self::Vorbis => "Vorbis",
            Self::Opus => "Opus",
            Self::Unknown => "Unknown",
        };
        write!(f, "{name}")
    }
}

/// Names of the fields of a `TrackRecord`, used to describe modifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackField {
    /// `file_path`
    FilePath,
    /// `title`
    Title,
    /// `artist`
    Artist,
    /// `album_artists`
    AlbumArtists,
    /// `album`
    Album,
    /// `year`
    Year,
    /// `track_number`
    TrackNumber,
    /// `disc_number`
    DiscNumber,
    /// `musicbrainz_track_id`
    MusicbrainzTrackId,
    /// `has_front_cover`
    HasFrontCover,
    /// `front_cover_width`
    FrontCoverWidth,
    /// `front_cover_height`
    FrontCoverHeight,
    /// `bitrate`
    Bitrate,
    /// `sample_rate`
    SampleRate,
    /// `source`
    Source,
    /// `duration`
    Duration,
    /// `file_type`
    FileType,
    /// `updated`
    Updated,
}

/// Metadata snapshot of a single audio file.
///
/// Records are keyed by `file_path`. Missing fields deserialize to their
/// zero values, and a missing or zero disc number is normalised to 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackRecord {
    /// Path of the audio file; unique within a snapshot.
    pub file_path: String,
    /// Track title.
    pub title: String,
    /// Track artist.
    pub artist: String,
    /// Album artists in tag order.
    pub album_artists: Vec<String>,
    /// Album title.
    pub album: String,
    /// Release year (0 when unknown).
    pub year: i32,
    /// Track number within the disc.
    pub track_number: u32,
    /// Disc number, never 0.
    #[serde(deserialize_with = "deserialize_disc_number")]
    pub disc_number: u32,
    /// MusicBrainz recording identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub musicbrainz_track_id: Option<String>,
    /// Whether the file embeds a front cover picture.
    pub has_front_cover: bool,
    /// Front cover width in pixels (0 without a cover).
    pub front_cover_width: u32,
    /// Front cover height in pixels (0 without a cover).
    pub front_cover_height: u32,
    /// Bitrate in kbps.
    pub bitrate: u32,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Where the file came from (ripper, store, ...).
    pub source: String,
    /// Duration in milliseconds.
    pub duration: u64,
    /// Codec and bit-depth classification.
    pub file_type: TrackFileType,
    /// Date of the last metadata update (`YYYY-MM-DD`, `YYYY-MM`, `YYYY` or empty).
    pub updated: String,
}

impl Default for TrackRecord {
    fn default() -> Self {
        Self {
            file_path: String::new(),
            title: String::new(),
            artist: String::new(),
            album_artists: Vec::new(),
            album: String::new(),
            year: 0,
            track_number: 0,
            disc_number: 1,
            musicbrainz_track_id: None,
            has_front_cover: false,
            front_cover_width: 0,
            front_cover_height: 0,
            bitrate: 0,
            sample_rate: 0,
            source: String::new(),
            duration: 0,
            file_type: TrackFileType::Unknown,
            updated: String::new(),
        }
    }
}

impl TrackRecord {
    /// Creates an otherwise empty record for the given path.
    #[must_use]
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Self::default()
        }
    }

    /// Album artists joined with `;` for display.
    #[must_use]
    pub fn album_artists_display(&self) -> String {
        self.album_artists.join(";")
    }

    /// Whether a non-empty MusicBrainz identifier is present.
    #[must_use]
    pub fn has_musicbrainz_id(&self) -> bool {
        self.musicbrainz_track_id
            .as_deref()
            .is_some_and(|id| !id.is_empty())
    }

    /// Lists the fields whose values differ between `self` and `other`.
    ///
    /// # Arguments
    ///
    /// * `other` - Record to compare against.
    ///
    /// # Returns
    ///
    /// The differing fields in declaration order; empty when the records are equal.
    #[must_use]
    pub fn changed_fields(&self, other: &Self) -> Vec<TrackField> {
        let checks = [
            (TrackField::FilePath, self.file_path != other.file_path),
            (TrackField::Title, self.title != other.title),
            (TrackField::Artist, self.artist != other.artist),
            (TrackField::AlbumArtists, self.album_artists != other.album_artists),
            (TrackField::Album, self.album != other.album),
            (TrackField::Year, self.year != other.year),
            (TrackField::TrackNumber, self.track_number != other.track_number),
            (TrackField::DiscNumber, self.disc_number != other.disc_number),
            (
                TrackField::MusicbrainzTrackId,
                self.musicbrainz_track_id != other.musicbrainz_track_id,
            ),
            (TrackField::HasFrontCover, self.has_front_cover != other.has_front_cover),
            (
                TrackField::FrontCoverWidth,
                self.front_cover_width != other.front_cover_width,
            ),
            (
                TrackField::FrontCoverHeight,
                self.front_cover_height != other.front_cover_height,
            ),
            (TrackField::Bitrate, self.bitrate != other.bitrate),
            (TrackField::SampleRate, self.sample_rate != other.sample_rate),
            (TrackField::Source, self.source != other.source),
            (TrackField::Duration, self.duration != other.duration),
            (TrackField::FileType, self.file_type != other.file_type),
            (TrackField::Updated, self.updated != other.updated),
        ];

        checks
            .into_iter()
            .filter_map(|(field, changed)| changed.then_some(field))
            .collect()
    }
}

fn deserialize_disc_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let disc = Option::<u32>::deserialize(deserializer)?;
    Ok(disc.filter(|&n| n != 0).unwrap_or(1))
}

#[cfg(test)]
mod tests {
    use serde_json::{from_str, to_string};

    use crate::library::models::{
        BitDepth, FormatFamily, Mp3Mode, TrackField, TrackFileType, TrackRecord,
    };

    #[test]
    fn test_file_type_family() {
        assert_eq!(
            TrackFileType::Flac(Some(BitDepth::Bits24)).family(),
            FormatFamily::Flac
        );
        assert_eq!(TrackFileType::Mp3(Mp3Mode::Variable).family(), FormatFamily::Lossy);
        assert_eq!(TrackFileType::Opus.family(), FormatFamily::Lossy);
        assert_eq!(
            TrackFileType::MonkeysAudio(None).family(),
            FormatFamily::MonkeysAudio
        );
        assert_eq!(TrackFileType::Unknown.family(), FormatFamily::Unknown);
        assert!(TrackFileType::Alac(Some(BitDepth::Bits16)).is_lossless());
        assert!(!TrackFileType::Aac.is_lossless());
    }

    #[test]
    fn test_file_type_tags() {
        let all = [
            TrackFileType::Flac(None),
            TrackFileType::Flac(Some(BitDepth::Bits4)),
            TrackFileType::Flac(Some(BitDepth::Bits32)),
            TrackFileType::Alac(Some(BitDepth::Bits24)),
            TrackFileType::Aiff(Some(BitDepth::Bits8)),
            TrackFileType::MonkeysAudio(Some(BitDepth::Bits16)),
            TrackFileType::Mp3(Mp3Mode::Constant),
            TrackFileType::Aac,
            TrackFileType::Vorbis,
            TrackFileType::Unknown,
        ];
        for file_type in all {
            assert_eq!(TrackFileType::from_tag(file_type.as_tag()), file_type);
        }

        assert_eq!(TrackFileType::from_tag("ALAC_8"), TrackFileType::Unknown);
        assert_eq!(TrackFileType::from_tag("WMA"), TrackFileType::Unknown);
        assert_eq!(TrackFileType::from_tag("FLAC_12"), TrackFileType::Unknown);
    }

    #[test]
    fn test_file_type_display() {
        assert_eq!(
            TrackFileType::Flac(Some(BitDepth::Bits24)).to_string(),
            "FLAC (24-bit Hi-Res)"
        );
        assert_eq!(
            TrackFileType::Mp3(Mp3Mode::Variable).to_string(),
            "MP3 (Variable Bitrate)"
        );
    }

    #[test]
    fn test_track_deserialization_defaults() {
        let track: TrackRecord =
            from_str(r#"{"filePath": "/music/a.flac", "title": "A", "discNumber": 0}"#).unwrap();
        assert_eq!(track.file_path, "/music/a.flac");
        assert_eq!(track.disc_number, 1);
        assert_eq!(track.file_type, TrackFileType::Unknown);
        assert!(track.album_artists.is_empty());

        let track: TrackRecord = from_str(r#"{"filePath": "/music/b.flac"}"#).unwrap();
        assert_eq!(track.disc_number, 1);
    }

    #[test]
    fn test_track_serialization() {
        let track = TrackRecord {
            title: "Hotel California".to_string(),
            artist: "The Eagles".to_string(),
            album_artists: vec!["The Eagles".to_string()],
            file_type: TrackFileType::Flac(Some(BitDepth::Bits16)),
            disc_number: 2,
            ..TrackRecord::new("/music/hotel.flac")
        };

        let serialized = to_string(&track).unwrap();
        assert!(serialized.contains(r#""fileType":"FLAC_16""#));
        assert!(serialized.contains(r#""albumArtists":["The Eagles"]"#));
        let deserialized: TrackRecord = from_str(&serialized).unwrap();
        assert_eq!(track, deserialized);
    }

    #[test]
    fn test_changed_fields() {
        let before = TrackRecord::new("/music/a.flac");
        let after = TrackRecord {
            title: "New".to_string(),
            bitrate: 320,
            ..before.clone()
        };

        assert!(before.changed_fields(&before).is_empty());
        assert_eq!(
            before.changed_fields(&after),
            vec![TrackField::Title, TrackField::Bitrate]
        );
    }

    #[test]
    fn test_album_artists_display() {
        let track = TrackRecord {
            album_artists: vec!["A".to_string(), "B".to_string()],
            ..TrackRecord::default()
        };
        assert_eq!(track.album_artists_display(), "A;B");
        assert!(!track.has_musicbrainz_id());
    }
}
