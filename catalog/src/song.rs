use core::fmt;
use std::cmp::Ordering;

/// A single chart entry.
///
/// Songs are ordered by tempo first, the remaining fields only break ties so
/// that the order stays consistent with equality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Song {
    pub title: String,
    pub artist: String,
    pub genres: String,
    pub year: u32,
    /// Speed in beats per minute.
    pub bpm: u32,
    pub energy: u32,
    pub danceability: u32,
    /// Loudness in dB, usually negative.
    pub loudness: i32,
    pub liveness: u32,
}

impl Song {
    #[allow(clippy::type_complexity)]
    fn sort_key(&self) -> (u32, &str, &str, u32, &str, u32, u32, i32, u32) {
        (
            self.bpm,
            self.title.as_str(),
            self.artist.as_str(),
            self.year,
            self.genres.as_str(),
            self.energy,
            self.danceability,
            self.loudness,
            self.liveness,
        )
    }
}

impl Ord for Song {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for Song {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} by {} ({}, {} bpm)",
            self.title, self.artist, self.year, self.bpm
        )
    }
}
