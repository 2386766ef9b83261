//! Segment scheduling, transmuxing and bitrate adaptation.
//!
//! [`StreamingController`] owns a [`PlaylistLoader`], a [`SegmentDemuxer`]
//! and the [`PlaybackSink`]. Like the loader it performs no I/O: network
//! work is queued as [`LoaderCommand`]s and results come back through
//! [`StreamingController::handle_response`].

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use flv::{FlvHeader, FlvTag};
use hls::{SegmentDemuxer, TransmuxError};
use playlist::{MediaPlaylist, Segment, VariantRef, resolve_uri};
use tracing::{debug, trace, warn};

use crate::config::{EngineConfig, StreamingConfig};
use crate::error::{EngineError, MediaError};
use crate::fetch::{FetchError, FetchRequest, FetchResponse, RequestId, RequestKind};
use crate::loader::{LoaderCommand, LoaderEvent, PlaylistLoader};
use crate::sink::PlaybackSink;

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// The FLV header was appended and segment loading has started.
    LoadedMetadata,
    /// The presentation duration in seconds changed (infinite when live).
    DurationChange(f64),
    /// A segment could not be fetched or transmuxed and was skipped.
    Error(MediaError),
    /// A playlist could not be loaded. Playback cannot continue.
    PlaylistError(MediaError),
    /// The last segment of an ended playlist was appended.
    EndOfStream,
}

#[derive(Debug)]
struct PendingSegment {
    id: RequestId,
    url: String,
    discontinuity: bool,
}

pub struct StreamingController<S> {
    config: StreamingConfig,
    with_credentials: bool,
    timeout: Duration,
    loader: PlaylistLoader,
    sink: S,
    demuxer: SegmentDemuxer,
    media_index: usize,
    last_media: Option<Arc<MediaPlaylist>>,
    bandwidth: Option<f64>,
    segment_request: Option<PendingSegment>,
    seek_target: Option<f64>,
    /// Tags presenting before this time (ms) are dropped.
    seek_offset: Option<i64>,
    duration: Option<f64>,
    header_appended: bool,
    ended: bool,
    error: Option<MediaError>,
    commands: VecDeque<LoaderCommand>,
    events: VecDeque<ControllerEvent>,
}

impl<S: PlaybackSink> StreamingController<S> {
    /// Creates a controller for `source` and queues the source fetch.
    pub fn new(source: impl Into<String>, config: &EngineConfig, sink: S) -> Self {
        let mut controller = Self {
            config: config.streaming.clone(),
            with_credentials: config.with_credentials,
            timeout: config.http.timeout,
            loader: PlaylistLoader::new(source, config),
            sink,
            demuxer: SegmentDemuxer::new(),
            media_index: 0,
            last_media: None,
            bandwidth: config.streaming.initial_bandwidth,
            segment_request: None,
            seek_target: None,
            seek_offset: None,
            duration: None,
            header_appended: false,
            ended: false,
            error: None,
            commands: VecDeque::new(),
            events: VecDeque::new(),
        };
        controller.drain_loader_commands();
        controller
    }

    pub fn loader(&self) -> &PlaylistLoader {
        &self.loader
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Index of the next segment to load in the active media playlist.
    pub fn media_index(&self) -> usize {
        self.media_index
    }

    /// Last measured throughput in bits per second.
    pub fn bandwidth(&self) -> Option<f64> {
        self.bandwidth
    }

    /// The last segment or playlist failure.
    pub fn error(&self) -> Option<&MediaError> {
        self.error.as_ref()
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn poll_command(&mut self) -> Option<LoaderCommand> {
        self.commands.pop_front()
    }

    pub fn poll_event(&mut self) -> Option<ControllerEvent> {
        self.events.pop_front()
    }

    /// The duration last reported through [`ControllerEvent::DurationChange`].
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Duration of the active media playlist.
    pub fn total_duration(&self) -> Option<f64> {
        self.loader.media().map(|media| media.total_duration())
    }

    /// The pending seek target, or the sink's playback position.
    pub fn current_time(&self) -> f64 {
        self.seek_target
            .unwrap_or_else(|| self.sink.current_time())
    }

    /// Index of the segment of the active playlist containing `seconds`.
    pub fn get_media_index_for_time(&self, seconds: f64) -> Option<usize> {
        self.loader.media()?.segment_index_for_time(seconds)
    }

    /// Restarts loading from the segment containing `seconds`.
    ///
    /// The outstanding segment request and buffered data are dropped. Tags
    /// presenting before the target are discarded when they arrive.
    pub fn seek(&mut self, seconds: f64) {
        let Some(media) = self.loader.media().cloned() else {
            return;
        };

        let index = media.segment_index_for_time(seconds);
        self.media_index = index.unwrap_or(media.segments.len());
        // A target beyond the last segment can never be reached.
        self.seek_target = index.map(|_| seconds);
        debug!(seconds, index = self.media_index, "Seeking");

        if let Some(pending) = self.segment_request.take() {
            self.commands.push_back(LoaderCommand::Abort(pending.id));
        }
        self.demuxer.abort();
        self.sink.abort();
        self.ended = false;

        if index.is_some() {
            self.fill_buffer(Some((seconds * 1000.0) as i64));
        } else {
            self.seek_offset = None;
        }
    }

    /// Periodic buffer check.
    pub fn on_tick(&mut self) {
        self.fill_buffer(None);
    }

    pub fn on_refresh_timeout(&mut self) -> Result<(), EngineError> {
        self.loader.on_refresh_timeout();
        self.drain_loader()
    }

    /// Consumes the outcome of a request issued through a
    /// [`LoaderCommand::Fetch`]. Stale results are dropped.
    ///
    /// Only sink failures are returned as errors. Network and decode
    /// failures are reported as events.
    pub fn handle_response(
        &mut self,
        id: RequestId,
        result: Result<FetchResponse, FetchError>,
    ) -> Result<(), EngineError> {
        if self.loader.is_pending(id) {
            self.loader.handle_response(id, result);
            return self.drain_loader();
        }

        match self.segment_request.take() {
            Some(pending) if pending.id == id => self.handle_segment(pending, result),
            other => {
                trace!(id = %id, "Ignoring stale response");
                self.segment_request = other;
                Ok(())
            }
        }
    }

    /// Picks the variant to play at the measured bandwidth.
    ///
    /// Variants whose bandwidth, scaled by the configured variance, is below
    /// the throughput are candidates. Among them the widest one fitting the
    /// viewport wins, then the lowest-bandwidth candidate, then the
    /// lowest-bandwidth variant overall.
    pub fn select_playlist(&self) -> Option<&VariantRef> {
        let master = self.loader.master()?;

        let mut sorted: Vec<&VariantRef> = master.variants().iter().collect();
        sorted.sort_by(|a, b| compare_bandwidth(a.bandwidth(), b.bandwidth()));

        let bandwidth = match self.config.max_bandwidth {
            Some(max) => self.bandwidth.unwrap_or(0.0).min(max),
            None => self.bandwidth.unwrap_or(0.0),
        };
        let variance = self.config.bandwidth_variance;
        let candidates: Vec<&VariantRef> = sorted
            .iter()
            .copied()
            .filter(|v| {
                v.bandwidth()
                    .is_some_and(|b| (b as f64) * variance < bandwidth)
            })
            .collect();

        let fallback = candidates.first().copied();

        let viewport = self.sink.viewport().or(self.config.viewport);
        let preferred = viewport.and_then(|viewport| {
            let mut sized: Vec<&VariantRef> = candidates
                .iter()
                .copied()
                .filter(|v| v.attributes.resolution.is_some())
                .collect();
            sized.sort_by_key(|v| (v.attributes.resolution.map(|r| r.width), v.bandwidth()));
            sized.into_iter().rev().find(|v| {
                v.attributes
                    .resolution
                    .is_some_and(|r| r.fits_within(&viewport))
            })
        });

        preferred.or(fallback).or(sorted.first().copied())
    }

    fn fill_buffer(&mut self, seek_offset: Option<i64>) {
        if self.segment_request.is_some() {
            return;
        }
        let Some(media) = self.loader.media().cloned() else {
            return;
        };
        let Some(segment) = media.segments.get(self.media_index) else {
            return;
        };

        if seek_offset.is_none() {
            let buffered = self.sink.buffered_end() - self.sink.current_time();
            if buffered >= self.config.goal_buffer_length.as_secs_f64() {
                return;
            }
        } else {
            self.seek_offset = seek_offset;
        }

        let url = self.segment_url(&media, segment);
        let request = FetchRequest::new(
            url.clone(),
            RequestKind::Segment,
            self.with_credentials,
            self.timeout,
        );
        debug!(
            id = %request.id,
            index = self.media_index,
            sequence = media.media_sequence + self.media_index as u64,
            url = %url,
            "Requesting segment"
        );
        self.segment_request = Some(PendingSegment {
            id: request.id,
            url,
            discontinuity: segment.discontinuity,
        });
        self.commands.push_back(LoaderCommand::Fetch(request));
    }

    fn segment_url(&self, media: &MediaPlaylist, segment: &Segment) -> String {
        let source = self.loader.source();
        if media.uri == source {
            resolve_uri(source, &segment.uri)
        } else {
            resolve_uri(&resolve_uri(source, &media.uri), &segment.uri)
        }
    }

    fn handle_segment(
        &mut self,
        pending: PendingSegment,
        result: Result<FetchResponse, FetchError>,
    ) -> Result<(), EngineError> {
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                warn!(url = %pending.url, status = err.status, "Segment request failed: {}", err.message);
                self.report(MediaError::from(&err));
                self.media_index += 1;
                return self.check_end_of_stream();
            }
        };

        self.bandwidth = Some(response.throughput());
        trace!(
            url = %pending.url,
            bytes = response.body.len(),
            bandwidth = response.throughput(),
            "Segment received"
        );

        match self.transmux(&response.body, pending.discontinuity) {
            Ok(tags) => self.append_tags(tags)?,
            Err(err) => {
                warn!(url = %pending.url, "Failed to transmux segment: {err}");
                self.demuxer.abort();
                self.report(MediaError::decode(response.status, err.to_string()));
            }
        }

        self.media_index += 1;
        self.check_end_of_stream()?;

        let Some(uri) = self.select_playlist().map(|v| v.uri.clone()) else {
            return Ok(());
        };
        self.loader.switch_media(&uri)?;
        self.drain_loader()
    }

    fn transmux(&mut self, body: &[u8], discontinuity: bool) -> Result<Vec<FlvTag>, TransmuxError> {
        if discontinuity {
            self.demuxer.discontinuity()?;
        }
        self.demuxer.push(body)?;
        self.demuxer.flush()?;
        Ok(self.demuxer.take_tags())
    }

    fn append_tags(&mut self, mut tags: Vec<FlvTag>) -> Result<(), EngineError> {
        if let Some(offset) = self.seek_offset {
            tags.retain(|tag| tag.pts >= offset);
            if let Some(first) = tags.first() {
                debug!(offset, pts = first.pts, "Seek complete");
                self.sink.set_current_time(first.pts as f64 / 1000.0);
                self.seek_offset = None;
                self.seek_target = None;
            }
        }

        for tag in &tags {
            self.sink.append(tag)?;
        }
        Ok(())
    }

    fn check_end_of_stream(&mut self) -> Result<(), EngineError> {
        let Some(media) = self.loader.media() else {
            return Ok(());
        };
        if !self.ended && media.end_list && self.media_index >= media.segments.len() {
            debug!(segments = media.segments.len(), "End of stream");
            self.ended = true;
            self.sink.end_of_stream()?;
            self.events.push_back(ControllerEvent::EndOfStream);
        }
        Ok(())
    }

    fn report(&mut self, error: MediaError) {
        self.error = Some(error.clone());
        self.events.push_back(ControllerEvent::Error(error));
    }

    fn drain_loader_commands(&mut self) {
        while let Some(command) = self.loader.poll_command() {
            self.commands.push_back(command);
        }
    }

    fn drain_loader(&mut self) -> Result<(), EngineError> {
        self.drain_loader_commands();
        while let Some(event) = self.loader.poll_event() {
            match event {
                LoaderEvent::LoadedPlaylist => self.on_loaded_playlist(),
                LoaderEvent::LoadedMetadata => self.on_loaded_metadata()?,
                LoaderEvent::Error(error) => {
                    self.error = Some(error.clone());
                    self.events.push_back(ControllerEvent::PlaylistError(error));
                }
            }
        }
        self.drain_loader_commands();
        Ok(())
    }

    fn on_loaded_playlist(&mut self) {
        let Some(media) = self.loader.media().cloned() else {
            return;
        };

        let duration = media.total_duration();
        if self.duration != Some(duration) {
            debug!(duration, "Duration changed");
            self.duration = Some(duration);
            self.events.push_back(ControllerEvent::DurationChange(duration));
        }

        let index = translate_media_index(self.media_index, self.last_media.as_deref(), &media);
        if index != self.media_index {
            trace!(from = self.media_index, to = index, "Media index translated");
        }
        self.media_index = index;
        self.last_media = Some(media);
    }

    fn on_loaded_metadata(&mut self) -> Result<(), EngineError> {
        if !self.header_appended {
            let header = FlvHeader::new(true, true);
            let duration = self.duration.filter(|d| d.is_finite());
            let bytes = match header.encode_with_duration(duration) {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!("Failed to encode duration metadata: {err}");
                    header.encode()
                }
            };
            self.sink.append_header(bytes)?;
            self.header_appended = true;
        }

        self.events.push_back(ControllerEvent::LoadedMetadata);
        self.fill_buffer(None);
        Ok(())
    }
}

fn compare_bandwidth(a: Option<u64>, b: Option<u64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Maps the index of the next segment in `old` onto `new`.
///
/// The segment before `index` is looked up by URI in the new list. When it
/// is gone, media sequence numbers line the lists up instead. The result is
/// clamped to `[0, new.segments.len()]`.
pub fn translate_media_index(
    index: usize,
    old: Option<&MediaPlaylist>,
    new: &MediaPlaylist,
) -> usize {
    if index == 0 {
        return 0;
    }
    let Some(old) = old else {
        return 0;
    };

    if let Some(previous) = old.segments.get(index - 1) {
        if let Some(position) = new.segments.iter().rposition(|s| s.uri == previous.uri) {
            return position + 1;
        }
    }

    let translated = (old.media_sequence as i128 + index as i128) - new.media_sequence as i128;
    translated.clamp(0, new.segments.len() as i128) as usize
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;
    use crate::loader::tests::{MASTER, SOURCE, live_media, ok};
    use crate::sink::tests::MemorySink;
    use bytes::Bytes;
    use hls::test_util::{TsMuxer, VIDEO_PID, adts_frame, inter_frame, key_frame, sample_segment};
    use playlist::{Resolution, Segment};

    const VOD: &str = "#EXTM3U\n\
        #EXT-X-TARGETDURATION:1\n\
        #EXTINF:1,\n0.ts\n\
        #EXTINF:1,\n1.ts\n\
        #EXT-X-ENDLIST\n";

    fn media(sequence: u64, uris: &[&str]) -> MediaPlaylist {
        MediaPlaylist {
            uri: "index.m3u8".to_string(),
            version: None,
            media_sequence: sequence,
            target_duration: Some(10.0),
            explicit_duration: None,
            end_list: false,
            playlist_type: None,
            allow_cache: true,
            segments: uris
                .iter()
                .map(|uri| Segment {
                    uri: uri.to_string(),
                    duration: Some(10.0),
                    title: None,
                    byterange: None,
                    discontinuity: false,
                })
                .collect(),
        }
    }

    const VOD_DISCONTINUITY: &str = "#EXTM3U\n\
        #EXT-X-TARGETDURATION:1\n\
        #EXTINF:1,\n0.ts\n\
        #EXT-X-DISCONTINUITY\n\
        #EXTINF:1,\n1.ts\n\
        #EXT-X-ENDLIST\n";

    /// A segment whose timestamps start over at zero.
    fn restarted_segment(frames: u64) -> Vec<u8> {
        let mut muxer = TsMuxer::new();
        let mut segment = muxer.psi();
        for i in 0..frames {
            let unit = if i == 0 {
                key_frame(&[0x88, 0x84, 0x00, 0x33])
            } else {
                inter_frame(&[0x9A, 0x02, i as u8, 0x10])
            };
            segment.extend(muxer.video(40 * i, 40 * i, &unit));
            segment.extend(muxer.audio(23 * i, &adts_frame(4, 2, &[0x21, 0x10, i as u8])));
        }
        segment
    }

    /// Plays both segments of `playlist` and returns the DTS of the tags
    /// appended for the first and the second segment.
    fn play_two_segments(playlist: &str) -> (Vec<i64>, Vec<i64>) {
        let (mut controller, segment) = started(&EngineConfig::default(), MASTER, playlist);
        let first = segment.unwrap();
        controller
            .handle_response(first.id, segment_ok(&first, sample_segment(10)))
            .unwrap();
        let before: Vec<i64> = controller.sink().tags.iter().map(|t| t.dts).collect();

        controller.on_tick();
        let second = fetches(&commands(&mut controller)).remove(0);
        controller
            .handle_response(second.id, segment_ok(&second, restarted_segment(5)))
            .unwrap();
        assert!(controller.error().is_none());
        let after = controller.sink().tags[before.len()..]
            .iter()
            .map(|t| t.dts)
            .collect();
        (before, after)
    }

    fn commands(controller: &mut StreamingController<MemorySink>) -> Vec<LoaderCommand> {
        std::iter::from_fn(|| controller.poll_command()).collect()
    }

    fn events(controller: &mut StreamingController<MemorySink>) -> Vec<ControllerEvent> {
        std::iter::from_fn(|| controller.poll_event()).collect()
    }

    fn fetches(commands: &[LoaderCommand]) -> Vec<FetchRequest> {
        commands
            .iter()
            .filter_map(|c| match c {
                LoaderCommand::Fetch(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    fn segment_ok(request: &FetchRequest, body: Vec<u8>) -> Result<FetchResponse, FetchError> {
        Ok(FetchResponse {
            id: request.id,
            url: request.url.clone(),
            status: 200,
            body: Bytes::from(body),
            elapsed: Duration::from_millis(100),
        })
    }

    /// A controller that has loaded `master` and the media playlist `body`,
    /// and returns the segment request issued after metadata.
    fn started(
        config: &EngineConfig,
        master: &str,
        body: &str,
    ) -> (StreamingController<MemorySink>, Option<FetchRequest>) {
        let mut controller = StreamingController::new(SOURCE, config, MemorySink::default());
        let source = fetches(&commands(&mut controller)).remove(0);
        controller
            .handle_response(source.id, ok(source.id, SOURCE, master))
            .unwrap();
        let media = fetches(&commands(&mut controller)).remove(0);
        controller
            .handle_response(media.id, ok(media.id, &media.url, body))
            .unwrap();
        let segment = fetches(&commands(&mut controller))
            .into_iter()
            .find(|r| r.kind == RequestKind::Segment);
        (controller, segment)
    }

    fn with_bandwidth(bandwidth: f64, viewport: Option<Resolution>) -> StreamingController<MemorySink> {
        let mut builder = EngineConfig::builder().with_initial_bandwidth(bandwidth);
        if let Some(viewport) = viewport {
            builder = builder.with_viewport(viewport);
        }
        started(&builder.build(), MASTER, &live_media(0, 3)).0
    }

    fn selected(controller: &StreamingController<MemorySink>) -> &str {
        &controller.select_playlist().unwrap().uri
    }

    #[test]
    fn test_select_playlist_example() {
        let controller = with_bandwidth(
            1_300_000.0,
            Some(Resolution {
                width: 640,
                height: 480,
            }),
        );
        assert_eq!(selected(&controller), "low/index.m3u8");
    }

    #[test]
    fn test_select_playlist_by_viewport() {
        let wide = Resolution {
            width: 1920,
            height: 1080,
        };
        assert_eq!(selected(&with_bandwidth(10_000_000.0, Some(wide))), "high/index.m3u8");

        let medium = Resolution {
            width: 1000,
            height: 600,
        };
        assert_eq!(selected(&with_bandwidth(10_000_000.0, Some(medium))), "mid/index.m3u8");

        // The viewport cannot raise the choice above the bandwidth.
        assert_eq!(selected(&with_bandwidth(2_000_000.0, Some(wide))), "mid/index.m3u8");
    }

    #[test]
    fn test_select_playlist_fallbacks() {
        // Without a viewport the lowest candidate is used.
        assert_eq!(selected(&with_bandwidth(10_000_000.0, None)), "low/index.m3u8");

        // Nothing fits the bandwidth.
        assert_eq!(selected(&with_bandwidth(100.0, None)), "low/index.m3u8");

        // Nothing fits the viewport.
        let tiny = Resolution {
            width: 100,
            height: 100,
        };
        assert_eq!(selected(&with_bandwidth(10_000_000.0, Some(tiny))), "low/index.m3u8");
    }

    #[test]
    fn test_select_playlist_max_bandwidth() {
        let wide = Resolution {
            width: 1920,
            height: 1080,
        };
        let config = EngineConfig::builder()
            .with_initial_bandwidth(10_000_000.0)
            .with_max_bandwidth(1_500_000.0)
            .with_viewport(wide)
            .build();
        let (controller, _) = started(&config, MASTER, &live_media(0, 3));
        assert_eq!(selected(&controller), "mid/index.m3u8");
    }

    #[test]
    fn test_select_playlist_without_bandwidth_attributes() {
        let master = "#EXTM3U\n\
            #EXT-X-STREAM-INF:PROGRAM-ID=1\n\
            plain.m3u8\n\
            #EXT-X-STREAM-INF:BANDWIDTH=800000\n\
            rated.m3u8\n";
        let config = EngineConfig::builder().with_initial_bandwidth(100.0).build();
        let (controller, _) = started(&config, master, &live_media(0, 1));
        assert_eq!(selected(&controller), "rated.m3u8");
    }

    #[test]
    fn test_translate_media_index_example() {
        let old = media(0, &["0.ts", "1.ts", "2.ts", "3.ts", "4.ts", "5.ts"]);
        let new = media(2, &["2.ts", "3.ts", "4.ts", "5.ts", "6.ts", "7.ts"]);
        assert_eq!(translate_media_index(5, Some(&old), &new), 3);
        assert_eq!(translate_media_index(0, Some(&old), &new), 0);
        assert_eq!(translate_media_index(3, None, &new), 0);
    }

    #[test]
    fn test_translate_media_index_by_sequence() {
        let old = media(10, &["a.ts", "b.ts", "c.ts", "d.ts"]);

        let shifted = media(12, &["x.ts", "y.ts", "z.ts"]);
        assert_eq!(translate_media_index(3, Some(&old), &shifted), 1);

        let ahead = media(20, &["x.ts", "y.ts"]);
        assert_eq!(translate_media_index(3, Some(&old), &ahead), 0);

        let behind = media(0, &["x.ts", "y.ts"]);
        assert_eq!(translate_media_index(3, Some(&old), &behind), 2);
    }

    #[test]
    fn test_metadata_appends_header_and_requests_segment() {
        let (mut controller, segment) = started(&EngineConfig::default(), MASTER, VOD);

        let segment = segment.unwrap();
        assert_eq!(segment.url, "http://example.com/live/low/0.ts");
        assert_eq!(segment.kind, RequestKind::Segment);

        let header = controller.sink().header.clone().unwrap();
        assert_eq!(&header[..3], b"FLV");
        // Header, PreviousTagSize0 and a duration metadata tag.
        assert!(header.len() > 13);

        assert_eq!(
            events(&mut controller),
            vec![
                ControllerEvent::DurationChange(2.0),
                ControllerEvent::LoadedMetadata
            ]
        );
        assert_eq!(controller.duration(), Some(2.0));
        assert_eq!(controller.total_duration(), Some(2.0));
    }

    #[test]
    fn test_live_header_has_no_duration() {
        let (mut controller, _) = started(&EngineConfig::default(), MASTER, &live_media(0, 3));
        assert_eq!(controller.sink().header.as_ref().unwrap().len(), 13);
        assert_eq!(
            events(&mut controller)[0],
            ControllerEvent::DurationChange(f64::INFINITY)
        );
    }

    #[test]
    fn test_segments_play_to_end_of_stream() {
        let (mut controller, segment) = started(&EngineConfig::default(), MASTER, VOD);
        events(&mut controller);

        let first = segment.unwrap();
        controller
            .handle_response(first.id, segment_ok(&first, sample_segment(10)))
            .unwrap();
        assert_eq!(controller.media_index(), 1);
        assert!(controller.bandwidth().unwrap() > 0.0);
        let appended = controller.sink().tags.len();
        assert!(appended > 0);
        assert!(controller.sink().tags.windows(2).all(|w| w[0].dts <= w[1].dts));
        assert!(!controller.is_ended());

        controller.on_tick();
        let second = fetches(&commands(&mut controller)).remove(0);
        assert_eq!(second.url, "http://example.com/live/low/1.ts");

        controller
            .handle_response(second.id, segment_ok(&second, sample_segment(10)))
            .unwrap();
        assert!(controller.sink().tags.len() > appended);
        assert!(controller.sink().ended);
        assert!(controller.is_ended());
        assert_eq!(events(&mut controller), vec![ControllerEvent::EndOfStream]);

        // Nothing left to load.
        controller.on_tick();
        assert!(fetches(&commands(&mut controller)).is_empty());
    }

    #[test]
    fn test_discontinuity_keeps_timeline_increasing() {
        let (before, after) = play_two_segments(VOD_DISCONTINUITY);
        let last = *before.iter().max().unwrap();
        assert!(!after.is_empty());
        assert_eq!(after[0], last);
        assert!(after.iter().all(|&dts| dts >= last));
        assert!(after.windows(2).all(|w| w[0] <= w[1]));

        // Without the tag the restarted timestamps jump backwards.
        let (before, after) = play_two_segments(VOD);
        let last = *before.iter().max().unwrap();
        assert!(after.iter().any(|&dts| dts < last));
    }

    #[test]
    fn test_full_buffer_skips_fill() {
        let (mut controller, segment) = started(&EngineConfig::default(), MASTER, &live_media(0, 3));
        let first = segment.unwrap();
        controller
            .handle_response(first.id, segment_ok(&first, sample_segment(10)))
            .unwrap();
        commands(&mut controller);

        // Under 0.3 s buffered, below the 5 s goal.
        controller.on_tick();
        assert_eq!(fetches(&commands(&mut controller)).len(), 1);

        // A request is already outstanding.
        controller.on_tick();
        assert!(fetches(&commands(&mut controller)).is_empty());
    }

    #[test]
    fn test_buffer_goal_reached() {
        let config = EngineConfig::builder()
            .with_goal_buffer_length(Duration::from_millis(100))
            .build();
        let (mut controller, segment) = started(&config, MASTER, &live_media(0, 3));
        let first = segment.unwrap();
        controller
            .handle_response(first.id, segment_ok(&first, sample_segment(10)))
            .unwrap();
        commands(&mut controller);

        controller.on_tick();
        assert!(fetches(&commands(&mut controller)).is_empty());
    }

    #[test]
    fn test_segment_failure_advances() {
        let (mut controller, segment) = started(&EngineConfig::default(), MASTER, &live_media(0, 3));
        events(&mut controller);
        let first = segment.unwrap();

        controller
            .handle_response(
                first.id,
                Err(FetchError::new(502, "Bad Gateway", &first.url)),
            )
            .unwrap();
        assert_eq!(controller.media_index(), 1);
        let error = controller.error().unwrap().clone();
        assert_eq!(error.status, 502);
        assert_eq!(error.code, 4);
        assert_eq!(events(&mut controller), vec![ControllerEvent::Error(error)]);
        assert!(controller.sink().tags.is_empty());
    }

    #[test]
    fn test_transmux_error_skips_segment() {
        let (mut controller, segment) = started(&EngineConfig::default(), MASTER, &live_media(0, 3));
        events(&mut controller);
        let first = segment.unwrap();

        let mut muxer = TsMuxer::new();
        let mut body = muxer.psi();
        body.extend(muxer.packetize(VIDEO_PID, &[0x00, 0x00, 0x02, 0xE0, 0x00, 0x00], true));

        controller
            .handle_response(first.id, segment_ok(&first, body))
            .unwrap();
        assert_eq!(controller.media_index(), 1);
        assert!(controller.sink().tags.is_empty());
        let events = events(&mut controller);
        assert!(matches!(
            events.as_slice(),
            [ControllerEvent::Error(MediaError { code: 3, .. })]
        ));

        // The next segment transmuxes normally.
        controller.on_tick();
        let second = fetches(&commands(&mut controller)).remove(0);
        controller
            .handle_response(second.id, segment_ok(&second, sample_segment(5)))
            .unwrap();
        assert!(!controller.sink().tags.is_empty());
    }

    #[test]
    fn test_segment_switches_variant() {
        let wide = Resolution {
            width: 1920,
            height: 1080,
        };
        let config = EngineConfig::builder().with_viewport(wide).build();
        let (mut controller, segment) = started(&config, MASTER, &live_media(0, 3));
        let first = segment.unwrap();

        let body = sample_segment(10);
        let response = FetchResponse {
            id: first.id,
            url: first.url.clone(),
            status: 200,
            body: Bytes::from(body),
            elapsed: Duration::from_millis(1),
        };
        controller.handle_response(first.id, Ok(response)).unwrap();

        let playlist = fetches(&commands(&mut controller)).remove(0);
        assert_eq!(playlist.kind, RequestKind::Playlist);
        assert_eq!(playlist.url, "http://example.com/live/high/index.m3u8");

        controller
            .handle_response(playlist.id, ok(playlist.id, &playlist.url, &live_media(0, 3)))
            .unwrap();
        assert_eq!(controller.loader().media_uri(), Some("high/index.m3u8"));
        // 0.ts was loaded from the old variant, so 1.ts comes next.
        assert_eq!(controller.media_index(), 1);

        controller.on_tick();
        let next = fetches(&commands(&mut controller)).remove(0);
        assert_eq!(next.url, "http://example.com/live/high/1.ts");
    }

    #[test]
    fn test_stale_segment_response_ignored() {
        let (mut controller, segment) = started(&EngineConfig::default(), MASTER, &live_media(0, 3));
        let first = segment.unwrap();
        let stale = RequestId::next();

        controller
            .handle_response(stale, segment_ok(&first, sample_segment(5)))
            .unwrap();
        assert!(controller.sink().tags.is_empty());
        assert_eq!(controller.media_index(), 0);

        // The real response is still accepted.
        controller
            .handle_response(first.id, segment_ok(&first, sample_segment(5)))
            .unwrap();
        assert_eq!(controller.media_index(), 1);
    }

    #[test]
    fn test_seek_drops_earlier_tags() {
        let (mut controller, segment) = started(&EngineConfig::default(), MASTER, VOD);
        let first = segment.unwrap();
        assert_eq!(controller.get_media_index_for_time(0.5), Some(0));
        assert_eq!(controller.get_media_index_for_time(1.5), Some(1));
        assert_eq!(controller.get_media_index_for_time(5.0), None);

        controller.seek(0.5);
        assert_eq!(controller.current_time(), 0.5);
        assert_eq!(controller.sink().aborts, 1);

        let commands = commands(&mut controller);
        assert_eq!(commands[0], LoaderCommand::Abort(first.id));
        let refetch = fetches(&commands).remove(0);
        assert_eq!(refetch.url, first.url);

        controller
            .handle_response(refetch.id, segment_ok(&refetch, sample_segment(25)))
            .unwrap();
        let tags = &controller.sink().tags;
        assert!(!tags.is_empty());
        assert!(tags.iter().all(|t| t.pts >= 500));
        let position = tags[0].pts as f64 / 1000.0;
        assert_eq!(controller.sink().position, position);
        assert_eq!(controller.current_time(), position);
    }

    #[test]
    fn test_seek_past_end() {
        let (mut controller, _) = started(&EngineConfig::default(), MASTER, VOD);
        commands(&mut controller);
        controller.seek(10.0);
        assert_eq!(controller.media_index(), 2);
        // The unreachable target is not reported as the position.
        assert_eq!(controller.current_time(), 0.0);
        // Only the abort of the initial request.
        assert!(fetches(&commands(&mut controller)).is_empty());
    }

    #[test]
    fn test_playlist_error_event() {
        let mut controller =
            StreamingController::new(SOURCE, &EngineConfig::default(), MemorySink::default());
        let source = fetches(&commands(&mut controller)).remove(0);
        controller
            .handle_response(source.id, Err(FetchError::new(404, "Not Found", SOURCE)))
            .unwrap();

        let error = controller.error().unwrap().clone();
        assert_eq!(error.code, 2);
        assert_eq!(
            events(&mut controller),
            vec![ControllerEvent::PlaylistError(error)]
        );
        assert!(controller.sink().header.is_none());
    }
}
