use log::debug;
use rbtree::{RedBlackTree, StartPoint};

use crate::error::{Error, Result};
use crate::song::Song;

/// How many songs [`Library::five_most_danceable`] reports.
const MOST_DANCEABLE: usize = 5;

/// A song collection with a saved tempo range and release-year filter.
///
/// Songs are kept in a red-black tree ordered by tempo. A range query copies
/// the matching songs into a scratch list; the year filter and the
/// danceability ranking only ever replay that list and never go back to the
/// tree.
#[derive(Debug, Default)]
pub struct Library {
    songs: RedBlackTree<Song>,
    // songs of the last requested bpm range, not yet filtered by year
    in_range: Option<Vec<Song>>,
    bpm_range: Option<(u32, u32)>,
    max_year: Option<u32>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a song. Songs comparing equal are all kept.
    pub fn insert(&mut self, song: Song) -> bool {
        self.songs.insert(song)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    #[inline]
    pub fn bpm_range(&self) -> Option<(u32, u32)> {
        self.bpm_range
    }

    #[inline]
    pub fn max_year(&self) -> Option<u32> {
        self.max_year
    }

    /// Titles of the songs with `low <= bpm <= high`, in ascending bpm, that
    /// also pass the current year filter.
    ///
    /// The range is saved and reused by [`filter_old_songs`] and
    /// [`five_most_danceable`].
    ///
    /// [`filter_old_songs`]: Library::filter_old_songs
    /// [`five_most_danceable`]: Library::five_most_danceable
    pub fn get_range(&mut self, low: u32, high: u32) -> Result<Vec<String>> {
        if low > high {
            return Err(Error::InvalidRange { low, high });
        }

        let slower = |song: &Song| song.bpm < low;
        let in_range: Vec<Song> = self
            .songs
            .iter_from(StartPoint::Before(&slower))
            .take_while(|song| song.bpm <= high)
            .cloned()
            .collect();
        debug!(
            "{} of {} songs between {low} and {high} bpm",
            in_range.len(),
            self.songs.len()
        );

        self.bpm_range = Some((low, high));
        let titles = self.titles_within_year(&in_range);
        self.in_range = Some(in_range);
        Ok(titles)
    }

    /// Saves `max_year` as the year filter and returns the titles of the
    /// saved range that are not newer than it, in ascending bpm.
    ///
    /// Returns an empty list if no range has been requested yet.
    pub fn filter_old_songs(&mut self, max_year: u32) -> Vec<String> {
        self.max_year = Some(max_year);
        debug!("year filter set to {max_year}");
        match &self.in_range {
            Some(in_range) => self.titles_within_year(in_range),
            None => Vec::new(),
        }
    }

    /// Removes the year filter.
    pub fn clear_year_filter(&mut self) {
        self.max_year = None;
    }

    /// Up to five songs of the saved range that pass the year filter, with
    /// the highest danceability, formatted as `"<danceability>: <title>"` in
    /// increasing danceability.
    pub fn five_most_danceable(&self) -> Result<Vec<String>> {
        let in_range = self.in_range.as_ref().ok_or(Error::RangeNotSet)?;

        let mut candidates: Vec<&Song> = in_range
            .iter()
            .filter(|song| self.passes_year_filter(song))
            .collect();
        candidates.sort_by(|a, b| b.danceability.cmp(&a.danceability));
        candidates.truncate(MOST_DANCEABLE);
        debug!("{} most danceable songs", candidates.len());

        Ok(candidates
            .into_iter()
            .rev()
            .map(|song| format!("{}: {}", song.danceability, song.title))
            .collect())
    }

    fn passes_year_filter(&self, song: &Song) -> bool {
        self.max_year.map_or(true, |max_year| song.year <= max_year)
    }

    fn titles_within_year(&self, songs: &[Song]) -> Vec<String> {
        songs
            .iter()
            .filter(|song| self.passes_year_filter(song))
            .map(|song| song.title.clone())
            .collect()
    }
}

impl Extend<Song> for Library {
    fn extend<I: IntoIterator<Item = Song>>(&mut self, iter: I) {
        for song in iter {
            self.insert(song);
        }
    }
}

impl FromIterator<Song> for Library {
    fn from_iter<I: IntoIterator<Item = Song>>(iter: I) -> Self {
        let mut library = Self::new();
        library.extend(iter);
        library
    }
}
