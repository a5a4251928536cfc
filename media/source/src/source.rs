/*!
    Media source implementation.
*/

use std::path::Path;

use ffmpeg_next::{codec, format::context::Input as InputContext, media::Type};

use cellvis_types::{Error, Packet, Rational, Result, StreamKind};

use crate::codec_config::CodecConfig;
use crate::convert::{error_from_ffmpeg, pts_from_ffmpeg, rational_from_ffmpeg};

/**
    Configuration for opening a media source.
*/
#[derive(Clone, Copy, Debug)]
pub struct SourceConfig {
    /// Select the best subtitle stream as a secondary stream.
    pub subtitles: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self { subtitles: true }
    }
}

/**
    A media source that produces compressed packets.

    The best video stream is the primary stream; a missing video stream is
    an open error. The best subtitle stream, when present and wanted, is the
    secondary stream. Packets from all other streams are skipped.
*/
pub struct Source {
    input: InputContext,
    video_stream_index: usize,
    subtitle_stream_index: Option<usize>,
    video_time_base: Rational,
    subtitle_time_base: Rational,
    video_codec_config: Option<CodecConfig>,
    subtitle_codec_config: Option<CodecConfig>,
    width: u32,
    height: u32,
}

impl Source {
    /**
        Open a media file.

        # Example

        ```ignore
        let source = Source::open("video.mkv", SourceConfig::default())?;
        let (width, height) = source.native_dimensions();
        ```
    */
    pub fn open<P: AsRef<Path>>(path: P, config: SourceConfig) -> Result<Self> {
        ffmpeg_next::init().map_err(error_from_ffmpeg)?;

        let input = ffmpeg_next::format::input(&path).map_err(|e| {
            if e.to_string().contains("No such file") {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    e.to_string(),
                ))
            } else {
                error_from_ffmpeg(e)
            }
        })?;

        let (video_stream_index, video_time_base, video_params) = {
            let stream = input
                .streams()
                .best(Type::Video)
                .ok_or_else(|| Error::unsupported("no video stream"))?;
            (
                stream.index(),
                rational_from_ffmpeg(stream.time_base()),
                stream.parameters(),
            )
        };

        // The parameters alone don't expose the frame size; open a throwaway
        // decoder context to read it.
        let (width, height) = {
            let decoder = codec::context::Context::from_parameters(video_params.clone())
                .and_then(|ctx| ctx.decoder().video())
                .map_err(error_from_ffmpeg)?;
            (decoder.width(), decoder.height())
        };

        let subtitle = if config.subtitles {
            input.streams().best(Type::Subtitle).map(|stream| {
                (
                    stream.index(),
                    rational_from_ffmpeg(stream.time_base()),
                    stream.parameters(),
                )
            })
        } else {
            None
        };

        let (subtitle_stream_index, subtitle_time_base, subtitle_codec_config) = match subtitle {
            Some((index, time_base, params)) => {
                log::debug!("using subtitle stream {}", index);
                let codec_config = CodecConfig::new(params, StreamKind::Subtitle, time_base);
                (Some(index), time_base, Some(codec_config))
            }
            None => (None, Rational::default(), None),
        };

        log::debug!(
            "opened {}: video stream {} ({}x{})",
            path.as_ref().display(),
            video_stream_index,
            width,
            height
        );

        Ok(Self {
            input,
            video_stream_index,
            subtitle_stream_index,
            video_time_base,
            subtitle_time_base,
            video_codec_config: Some(CodecConfig::new(
                video_params,
                StreamKind::Video,
                video_time_base,
            )),
            subtitle_codec_config,
            width,
            height,
        })
    }

    /**
        Native frame size of the primary stream, as (width, height).
    */
    pub fn native_dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /**
        Take the video codec configuration. Returns `None` once taken.
    */
    pub fn take_video_codec_config(&mut self) -> Option<CodecConfig> {
        self.video_codec_config.take()
    }

    /**
        Take the subtitle codec configuration, if a subtitle stream was selected.
    */
    pub fn take_subtitle_codec_config(&mut self) -> Option<CodecConfig> {
        self.subtitle_codec_config.take()
    }

    /**
        Read the next packet from a selected stream.

        Returns `Ok(None)` at end of input. Packets come back in file order,
        interleaved between the primary and secondary streams; check
        `packet.stream` to route them.
    */
    pub fn next_packet(&mut self) -> Result<Option<Packet>> {
        loop {
            let (stream, ffmpeg_packet) = match self.input.packets().next() {
                Some(item) => item,
                None => return Ok(None),
            };

            let index = stream.index();
            let (kind, time_base) = if index == self.video_stream_index {
                (StreamKind::Video, self.video_time_base)
            } else if Some(index) == self.subtitle_stream_index {
                (StreamKind::Subtitle, self.subtitle_time_base)
            } else {
                continue;
            };

            let data = ffmpeg_packet.data().map(<[u8]>::to_vec).unwrap_or_default();

            return Ok(Some(Packet::new(
                data,
                pts_from_ffmpeg(ffmpeg_packet.pts()),
                pts_from_ffmpeg(ffmpeg_packet.dts()),
                ffmpeg_packet.duration(),
                time_base,
                ffmpeg_packet.is_key(),
                kind,
            )));
        }
    }
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("video_stream_index", &self.video_stream_index)
            .field("subtitle_stream_index", &self.subtitle_stream_index)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}
