use super::float_key;
use std::hash::{Hash, Hasher};

/// One song-metadata record, already coerced to the declared song schema.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SongMetadata {
    pub artist_id: Option<String>,
    pub artist_latitude: Option<f64>,
    pub artist_location: Option<String>,
    pub artist_longitude: Option<f64>,
    pub artist_name: Option<String>,
    pub duration: Option<f64>,
    pub num_songs: Option<f64>,
    pub song_id: Option<String>,
    pub title: Option<String>,
    pub year: Option<i32>,
}

/// Row of the `songs` dimension.
#[derive(Clone, Debug, Default)]
pub struct SongRecord {
    pub song_id: Option<String>,
    pub title: Option<String>,
    pub artist_id: Option<String>,
    pub year: Option<i32>,
    pub duration: Option<f64>,
}

type SongKey<'a> = (
    Option<&'a str>,
    Option<&'a str>,
    Option<&'a str>,
    Option<i32>,
    Option<u64>,
);

impl SongRecord {
    fn key(&self) -> SongKey<'_> {
        (
            self.song_id.as_deref(),
            self.title.as_deref(),
            self.artist_id.as_deref(),
            self.year,
            float_key(self.duration),
        )
    }
}

impl PartialEq for SongRecord {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for SongRecord {}

impl Hash for SongRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl From<&SongMetadata> for SongRecord {
    fn from(raw: &SongMetadata) -> Self {
        Self {
            song_id: raw.song_id.clone(),
            title: raw.title.clone(),
            artist_id: raw.artist_id.clone(),
            year: raw.year,
            duration: raw.duration,
        }
    }
}

/// Row of the `artists` dimension.
#[derive(Clone, Debug, Default)]
pub struct ArtistRecord {
    pub artist_id: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

type ArtistKey<'a> = (
    Option<&'a str>,
    Option<&'a str>,
    Option<&'a str>,
    Option<u64>,
    Option<u64>,
);

impl ArtistRecord {
    fn key(&self) -> ArtistKey<'_> {
        (
            self.artist_id.as_deref(),
            self.name.as_deref(),
            self.location.as_deref(),
            float_key(self.latitude),
            float_key(self.longitude),
        )
    }
}

impl PartialEq for ArtistRecord {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ArtistRecord {}

impl Hash for ArtistRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl From<&SongMetadata> for ArtistRecord {
    fn from(raw: &SongMetadata) -> Self {
        Self {
            artist_id: raw.artist_id.clone(),
            name: raw.artist_name.clone(),
            location: raw.artist_location.clone(),
            latitude: raw.artist_latitude,
            longitude: raw.artist_longitude,
        }
    }
}
