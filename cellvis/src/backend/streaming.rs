/*!
    Streaming media backend over FFmpeg.
*/

use std::path::Path;

use cellvis_decode::{DecodedFrame, SendOutcome, SubtitleDecoder, VideoDecoder};
use cellvis_source::{Source, SourceConfig};
use cellvis_transform::{ScalingAlgorithm, VideoTransform, VideoTransformConfig};
use cellvis_types::{Packet, VideoFrame, subtitle};

use super::pump::{PacketPump, PacketSink, PacketSource};
use super::{DecodeBackend, FrameInfo, check_target};
use crate::error::{Error, Result};

/**
    Configuration for the streaming backend.
*/
#[derive(Clone, Copy, Debug)]
pub struct StreamingConfig {
    pub scaling: ScalingAlgorithm,
    /// Consecutive packets the codec may refuse before decoding fails.
    pub max_send_failures: u32,
    pub subtitles: bool,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            scaling: ScalingAlgorithm::default(),
            max_send_failures: 32,
            subtitles: true,
        }
    }
}

impl PacketSource for Source {
    fn next_packet(&mut self) -> cellvis_types::Result<Option<Packet>> {
        Source::next_packet(self)
    }
}

impl PacketSink for VideoDecoder {
    type Frame = DecodedFrame;

    fn send_packet(&mut self, packet: &Packet) -> SendOutcome {
        VideoDecoder::send_packet(self, packet)
    }

    fn send_eof(&mut self) -> SendOutcome {
        VideoDecoder::send_eof(self)
    }

    fn receive_frame(&mut self) -> cellvis_types::Result<Option<DecodedFrame>> {
        VideoDecoder::receive_frame(self)
    }
}

/**
    Decodes video files through FFmpeg.

    Packets are read one at a time. Subtitle packets are decoded on the
    side and never fail the video path. Decoded frames stay in the codec's
    pixel format until [`scale`](DecodeBackend::scale) converts them.
*/
pub struct StreamingMediaBackend {
    pump: PacketPump<Source, VideoDecoder>,
    subtitles: Option<SubtitleDecoder>,
    transform: VideoTransform,
    frame: Option<DecodedFrame>,
    scaled: Option<VideoFrame>,
    subtitle: Option<String>,
}

impl StreamingMediaBackend {
    pub fn open(path: &Path, config: StreamingConfig) -> Result<Self> {
        let mut source = Source::open(
            path,
            SourceConfig {
                subtitles: config.subtitles,
            },
        )?;

        let codec_config = source
            .take_video_codec_config()
            .ok_or_else(|| Error::Decode("source has no video codec".into()))?;
        log::debug!("video codec {:?}", codec_config.codec_id());
        let decoder = VideoDecoder::new(codec_config)?;

        let subtitles = source
            .take_subtitle_codec_config()
            .and_then(|codec_config| match SubtitleDecoder::new(codec_config) {
                Ok(decoder) => Some(decoder),
                Err(e) => {
                    log::warn!("ignoring subtitle stream: {}", e);
                    None
                }
            });

        let (width, height) = source.native_dimensions();
        let transform = VideoTransform::new(
            VideoTransformConfig::to_rgba(width, height).with_algorithm(config.scaling),
        );

        Ok(Self {
            pump: PacketPump::new(source, decoder, config.max_send_failures),
            subtitles,
            transform,
            frame: None,
            scaled: None,
            subtitle: None,
        })
    }
}

/**
    Best effort: a subtitle packet that fails to decode is logged and
    skipped.
*/
fn decode_subtitle(
    decoder: &mut Option<SubtitleDecoder>,
    current: &mut Option<String>,
    packet: &Packet,
) {
    let Some(decoder) = decoder.as_mut() else {
        return;
    };
    match decoder.decode(packet) {
        Ok(Some(rects)) => *current = subtitle::extract_text(&rects),
        Ok(None) => {}
        Err(e) => log::debug!("subtitle decode failed: {}", e),
    }
}

impl DecodeBackend for StreamingMediaBackend {
    fn decode_next(&mut self) -> Result<FrameInfo> {
        let Self {
            pump,
            subtitles,
            subtitle,
            ..
        } = self;
        let frame = pump.next_frame(|packet| decode_subtitle(subtitles, subtitle, packet))?;

        let info = FrameInfo {
            width: frame.width() as usize,
            height: frame.height() as usize,
            timing: frame.timing,
        };
        self.frame = Some(frame);
        self.scaled = None;
        Ok(info)
    }

    fn native_dimensions(&self) -> (usize, usize) {
        let (width, height) = self.pump.source().native_dimensions();
        (width as usize, height as usize)
    }

    fn scale(&mut self, width: usize, height: usize) -> Result<usize> {
        check_target(width, height)?;
        let frame = self.frame.as_ref().ok_or(Error::NoPixels)?;
        let (width, height) = match (u32::try_from(width), u32::try_from(height)) {
            (Ok(width), Ok(height)) => (width, height),
            _ => return Err(Error::Decode(format!("cannot scale to {}x{}", width, height))),
        };

        self.transform.set_target(width, height);
        let scaled = self.transform.transform(&frame.frame, frame.timing)?;
        let stride = scaled.stride();
        self.scaled = Some(scaled);
        Ok(stride)
    }

    fn pixels(&self) -> Option<&[u8]> {
        self.scaled.as_ref().map(|frame| frame.data.as_slice())
    }

    fn subtitle(&self) -> Option<String> {
        self.subtitle.clone()
    }
}

impl std::fmt::Debug for StreamingMediaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingMediaBackend")
            .field("source", self.pump.source())
            .field("pump", &self.pump)
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}
