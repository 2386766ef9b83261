use std::sync::Arc;

use tracing::trace;

use crate::model::{MasterPlaylist, MediaPlaylist};

/// Installs a freshly loaded media playlist into a master snapshot.
///
/// Returns `None` when nothing changed: the variant is unknown, or its
/// previous snapshot has the same segment count and media sequence.
/// Otherwise a new master is returned. Entries other than the updated one
/// share their `Arc` with the old snapshot.
pub fn update_master(
    master: &Arc<MasterPlaylist>,
    media: MediaPlaylist,
) -> Option<Arc<MasterPlaylist>> {
    let position = master.position(&media.uri)?;

    if let Some(previous) = &master.variants()[position].media {
        if previous.segments.len() == media.segments.len()
            && previous.media_sequence == media.media_sequence
        {
            trace!(uri = %media.uri, "Playlist unchanged");
            return None;
        }
    }

    let mut updated = MasterPlaylist::clone(master);
    updated.variants_mut()[position].media = Some(Arc::new(media));
    Some(Arc::new(updated))
}
