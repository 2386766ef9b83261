//! Playlist loading state machine.
//!
//! The loader does no I/O of its own. It queues [`LoaderCommand`]s for the
//! owner to carry out and [`LoaderEvent`]s describing what changed, and it is
//! fed back through [`PlaylistLoader::handle_response`] and
//! [`PlaylistLoader::on_refresh_timeout`].

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use playlist::{Manifest, MasterPlaylist, MediaPlaylist, Playlist, resolve_uri, update_master};
use tracing::{debug, trace, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, MediaError};
use crate::fetch::{FetchError, FetchRequest, FetchResponse, RequestId, RequestKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    /// Waiting for the source playlist.
    HaveNothing,
    /// The master is known, its first media playlist is loading.
    HaveMaster,
    /// A media playlist is loaded and no request is outstanding.
    HaveMetadata,
    /// The active media playlist is being refreshed.
    HaveCurrentMetadata,
    /// Another media playlist is being fetched to replace the active one.
    SwitchingMedia,
}

/// Work the owner of a state machine must carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum LoaderCommand {
    Fetch(FetchRequest),
    /// Cancel the request and drop its result.
    Abort(RequestId),
    /// Call `on_refresh_timeout` after the delay, replacing any earlier
    /// schedule.
    ScheduleRefresh(Duration),
    CancelRefresh,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoaderEvent {
    /// The master snapshot or the active media playlist changed.
    LoadedPlaylist,
    /// The first media playlist is available.
    LoadedMetadata,
    Error(MediaError),
}

#[derive(Debug)]
enum PendingTarget {
    Source,
    /// A media playlist, by the URI it is listed under in the master.
    Media(String),
}

#[derive(Debug)]
struct PendingRequest {
    id: RequestId,
    url: String,
    target: PendingTarget,
}

pub struct PlaylistLoader {
    source: String,
    with_credentials: bool,
    timeout: Duration,
    default_target_duration: Duration,
    state: LoaderState,
    master: Option<Arc<MasterPlaylist>>,
    media_uri: Option<String>,
    request: Option<PendingRequest>,
    metadata_loaded: bool,
    error: Option<MediaError>,
    commands: VecDeque<LoaderCommand>,
    events: VecDeque<LoaderEvent>,
}

impl PlaylistLoader {
    /// Creates a loader and queues the fetch of `source`.
    pub fn new(source: impl Into<String>, config: &EngineConfig) -> Self {
        let mut loader = Self {
            source: source.into(),
            with_credentials: config.with_credentials,
            timeout: config.http.timeout,
            default_target_duration: config.loader.default_target_duration,
            state: LoaderState::HaveNothing,
            master: None,
            media_uri: None,
            request: None,
            metadata_loaded: false,
            error: None,
            commands: VecDeque::new(),
            events: VecDeque::new(),
        };
        let url = loader.source.clone();
        loader.fetch(url, PendingTarget::Source);
        loader
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn state(&self) -> LoaderState {
        self.state
    }

    pub fn master(&self) -> Option<&Arc<MasterPlaylist>> {
        self.master.as_ref()
    }

    /// The active media playlist snapshot.
    pub fn media(&self) -> Option<&Arc<MediaPlaylist>> {
        let uri = self.media_uri.as_deref()?;
        self.master.as_ref()?.media(uri)
    }

    /// URI of the active media playlist, as listed in the master.
    pub fn media_uri(&self) -> Option<&str> {
        self.media_uri.as_deref()
    }

    /// The last playlist failure.
    pub fn error(&self) -> Option<&MediaError> {
        self.error.as_ref()
    }

    /// Whether `id` is the playlist request the loader is waiting for.
    pub fn is_pending(&self, id: RequestId) -> bool {
        self.request.as_ref().is_some_and(|r| r.id == id)
    }

    pub fn poll_command(&mut self) -> Option<LoaderCommand> {
        self.commands.pop_front()
    }

    pub fn poll_event(&mut self) -> Option<LoaderEvent> {
        self.events.pop_front()
    }

    /// Makes `uri` the active media playlist.
    ///
    /// Switching to the active playlist, or to the one already being
    /// fetched, does nothing. Otherwise any outstanding playlist request is
    /// aborted.
    pub fn switch_media(&mut self, uri: &str) -> Result<(), EngineError> {
        if matches!(
            self.state,
            LoaderState::HaveNothing | LoaderState::HaveMaster
        ) {
            return Err(EngineError::InvalidState {
                operation: "switch media",
                state: self.state,
            });
        }
        let Some(master) = &self.master else {
            return Err(EngineError::InvalidState {
                operation: "switch media",
                state: self.state,
            });
        };
        if master.position(uri).is_none() {
            return Err(EngineError::UnknownPlaylist(uri.to_string()));
        }

        if self.media_uri.as_deref() == Some(uri) {
            if self.state == LoaderState::SwitchingMedia {
                // Back to the active playlist before the switch completed.
                if let Some(pending) = self.request.take() {
                    self.commands.push_back(LoaderCommand::Abort(pending.id));
                }
                self.state = LoaderState::HaveMetadata;
                let delay = self
                    .media()
                    .filter(|m| !m.end_list)
                    .map(|m| self.refresh_delay(m, true));
                if let Some(delay) = delay {
                    self.schedule_refresh(delay);
                }
            }
            return Ok(());
        }

        let url = self.media_url(uri);
        if let Some(pending) = &self.request {
            if pending.url == url {
                return Ok(());
            }
        }
        if let Some(pending) = self.request.take() {
            trace!(id = %pending.id, url = %pending.url, "Aborting playlist request");
            self.commands.push_back(LoaderCommand::Abort(pending.id));
        }

        debug!(from = ?self.media_uri, to = %uri, "Switching media playlist");
        self.state = LoaderState::SwitchingMedia;
        self.fetch(url, PendingTarget::Media(uri.to_string()));
        Ok(())
    }

    /// Re-fetches the active media playlist of a live stream.
    pub fn on_refresh_timeout(&mut self) {
        if self.state != LoaderState::HaveMetadata {
            trace!(state = ?self.state, "Ignoring refresh timeout");
            return;
        }
        let Some(uri) = self.media_uri.clone() else {
            return;
        };
        self.state = LoaderState::HaveCurrentMetadata;
        let url = self.media_url(&uri);
        self.fetch(url, PendingTarget::Media(uri));
    }

    /// Consumes the outcome of a request. Returns `false` when `id` is not
    /// the request the loader is waiting for; such stale results are dropped.
    pub fn handle_response(
        &mut self,
        id: RequestId,
        result: Result<FetchResponse, FetchError>,
    ) -> bool {
        if !self.is_pending(id) {
            return false;
        }
        let Some(pending) = self.request.take() else {
            return false;
        };

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                self.fail(MediaError::from(&err));
                return true;
            }
        };

        let manifest = match Manifest::from_bytes(&response.body) {
            Ok(manifest) => manifest,
            Err(err) => {
                self.fail(MediaError::unsupported(response.status, err.to_string()));
                return true;
            }
        };

        let identity = match &pending.target {
            PendingTarget::Source => self.source.clone(),
            PendingTarget::Media(uri) => uri.clone(),
        };
        let playlist = match manifest.into_playlist(identity) {
            Ok(playlist) => playlist,
            Err(err) => {
                self.fail(MediaError::unsupported(response.status, err.to_string()));
                return true;
            }
        };

        match (pending.target, playlist) {
            (PendingTarget::Source, Playlist::Master(master)) => self.have_master(master),
            (PendingTarget::Source, Playlist::Media(media)) => {
                self.master = Some(Arc::new(MasterPlaylist::single(self.source.clone())));
                self.state = LoaderState::HaveMaster;
                self.have_metadata(media);
            }
            (PendingTarget::Media(_), Playlist::Media(media)) => self.have_metadata(media),
            (PendingTarget::Media(uri), Playlist::Master(_)) => {
                self.fail(MediaError::unsupported(
                    response.status,
                    format!("expected a media playlist at {uri}, found a master playlist"),
                ));
            }
        }
        true
    }

    fn have_master(&mut self, master: MasterPlaylist) {
        debug!(
            uri = %master.uri,
            variants = master.variants().len(),
            "Loaded master playlist"
        );
        let first = master.variants().first().map(|v| v.uri.clone());
        self.master = Some(Arc::new(master));
        self.state = LoaderState::HaveMaster;
        self.events.push_back(LoaderEvent::LoadedPlaylist);

        if let Some(uri) = first {
            let url = self.media_url(&uri);
            self.fetch(url, PendingTarget::Media(uri));
        }
    }

    fn have_metadata(&mut self, media: MediaPlaylist) {
        let Some(master) = &self.master else {
            return;
        };
        let uri = media.uri.clone();
        let updated = update_master(master, media);
        let changed = updated.is_some();
        if let Some(updated) = updated {
            self.master = Some(updated);
        }

        debug!(
            uri = %uri,
            changed,
            state = ?self.state,
            "Loaded media playlist"
        );
        self.state = LoaderState::HaveMetadata;
        self.media_uri = Some(uri);

        let delay = self.media().and_then(|media| {
            (!media.end_list).then(|| self.refresh_delay(media, changed))
        });
        if let Some(delay) = delay {
            self.schedule_refresh(delay);
        }

        self.events.push_back(LoaderEvent::LoadedPlaylist);
        if !self.metadata_loaded {
            self.metadata_loaded = true;
            self.events.push_back(LoaderEvent::LoadedMetadata);
        }
    }

    fn refresh_delay(&self, media: &MediaPlaylist, changed: bool) -> Duration {
        let delay = media
            .target_duration
            .and_then(|d| Duration::try_from_secs_f64(d).ok())
            .unwrap_or(self.default_target_duration);
        if changed { delay } else { delay / 2 }
    }

    fn schedule_refresh(&mut self, delay: Duration) {
        trace!(delay_ms = delay.as_millis() as u64, "Scheduling playlist refresh");
        self.commands.push_back(LoaderCommand::ScheduleRefresh(delay));
    }

    /// Absolute URL of a variant. The source itself is never re-resolved.
    fn media_url(&self, uri: &str) -> String {
        match &self.master {
            Some(master) if master.uri != uri => resolve_uri(&master.uri, uri),
            _ => uri.to_string(),
        }
    }

    fn fetch(&mut self, url: String, target: PendingTarget) {
        let request = FetchRequest::new(
            url.clone(),
            RequestKind::Playlist,
            self.with_credentials,
            self.timeout,
        );
        debug!(id = %request.id, url = %url, target = ?target, "Requesting playlist");
        self.request = Some(PendingRequest {
            id: request.id,
            url,
            target,
        });
        self.commands.push_back(LoaderCommand::Fetch(request));
    }

    fn fail(&mut self, error: MediaError) {
        warn!(
            status = error.status,
            code = error.code,
            state = ?self.state,
            "Playlist request failed: {}",
            error.message
        );
        self.error = Some(error.clone());
        self.commands.push_back(LoaderCommand::CancelRefresh);
        self.events.push_back(LoaderEvent::Error(error));
    }
}
