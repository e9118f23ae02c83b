//! Songs and artists dimensions from raw song metadata.

use super::distinct;
use crate::model::{ArtistRecord, SongMetadata, SongRecord};
use rayon::prelude::*;
use tracing::debug;

pub struct CatalogTables {
    pub songs: Vec<SongRecord>,
    pub artists: Vec<ArtistRecord>,
}

pub fn extract_songs(records: &[SongMetadata]) -> Vec<SongRecord> {
    distinct(records.par_iter().map(SongRecord::from).collect())
}

pub fn extract_artists(records: &[SongMetadata]) -> Vec<ArtistRecord> {
    distinct(records.par_iter().map(ArtistRecord::from).collect())
}

pub fn extract_catalog(records: &[SongMetadata]) -> CatalogTables {
    let (songs, artists) = rayon::join(|| extract_songs(records), || extract_artists(records));
    debug!(
        "Extracted {} songs and {} artists from {} song records",
        songs.len(),
        artists.len(),
        records.len()
    );
    CatalogTables { songs, artists }
}
