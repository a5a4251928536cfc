/*!
    Video decoder implementation.
*/

use ffmpeg_next::{
    codec::decoder::Video as VideoDecoderFFmpeg, ffi, format::Pixel, packet::Mut as PacketMut,
    util::frame::video::Video as VideoFrameFFmpeg,
};

use cellvis_source::{CodecConfig, error_from_ffmpeg};
use cellvis_types::{FrameTiming, Packet, Pts, Rational, Result, SendOutcome, StreamKind};

/**
    A frame straight out of the codec.

    The pixels stay in the codec's own layout and pixel format, whatever it
    is; the scaler reads them from here.
*/
pub struct DecodedFrame {
    pub frame: VideoFrameFFmpeg,
    pub timing: FrameTiming,
}

impl DecodedFrame {
    pub fn width(&self) -> u32 {
        self.frame.width()
    }

    pub fn height(&self) -> u32 {
        self.frame.height()
    }

    pub fn format(&self) -> Pixel {
        self.frame.format()
    }
}

impl std::fmt::Debug for DecodedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedFrame")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("format", &self.format())
            .field("timing", &self.timing)
            .finish()
    }
}

/**
    Video decoder.

    A thin wrapper over the codec's send/receive state machine. Packets go
    in with [`send_packet`](Self::send_packet), frames come out of
    [`receive_frame`](Self::receive_frame), and [`send_eof`](Self::send_eof)
    starts draining whatever the codec still buffers.
*/
pub struct VideoDecoder {
    decoder: VideoDecoderFFmpeg,
    time_base: Rational,
}

impl VideoDecoder {
    /**
        Open a decoder for the video stream `codec_config` describes.
        Frames are stamped in the stream's time base.
    */
    pub fn new(codec_config: CodecConfig) -> Result<Self> {
        ffmpeg_next::init().map_err(error_from_ffmpeg)?;

        let time_base = codec_config.time_base();
        let decoder = codec_config
            .into_context(StreamKind::Video)?
            .decoder()
            .video()
            .map_err(error_from_ffmpeg)?;

        Ok(Self { decoder, time_base })
    }

    /**
        Hand one packet to the codec.

        Never fails outright: a full input queue and a refused packet are
        both reported through [`SendOutcome`] so the caller can keep the
        packet or drop it.
    */
    pub fn send_packet(&mut self, packet: &Packet) -> SendOutcome {
        let mut ffmpeg_pkt = if packet.data.is_empty() {
            ffmpeg_next::Packet::empty()
        } else {
            ffmpeg_next::Packet::copy(&packet.data)
        };

        unsafe {
            let pkt_ptr = ffmpeg_pkt.as_mut_ptr();
            if let Some(pts) = packet.pts {
                (*pkt_ptr).pts = pts.0;
            }
            if let Some(dts) = packet.dts {
                (*pkt_ptr).dts = dts.0;
            }
            (*pkt_ptr).duration = packet.duration;
        }

        match self.decoder.send_packet(&ffmpeg_pkt) {
            Ok(()) => SendOutcome::Accepted,
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => SendOutcome::Full,
            Err(e) => SendOutcome::Rejected(error_from_ffmpeg(e)),
        }
    }

    /**
        Signal end of input. Frames the codec still buffers can then be
        received until [`receive_frame`](Self::receive_frame) reports
        end of stream.
    */
    pub fn send_eof(&mut self) -> SendOutcome {
        match self.decoder.send_eof() {
            Ok(()) => SendOutcome::Accepted,
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => SendOutcome::Full,
            // Already draining
            Err(ffmpeg_next::Error::Eof) => SendOutcome::Accepted,
            Err(e) => SendOutcome::Rejected(error_from_ffmpeg(e)),
        }
    }

    /**
        Take the next decoded frame.

        Returns `Ok(None)` when the codec needs more input, and
        `Err(Error::EndOfStream)` once it is fully drained after
        [`send_eof`](Self::send_eof).
    */
    pub fn receive_frame(&mut self) -> Result<Option<DecodedFrame>> {
        let mut frame = VideoFrameFFmpeg::empty();
        match self.decoder.receive_frame(&mut frame) {
            Ok(()) => {
                // best_effort_timestamp, falling back to the raw pts
                let pts = frame.timestamp().or_else(|| frame.pts()).map(Pts);
                let duration = unsafe { (*frame.as_ptr()).duration };
                log::trace!(
                    "decoded {}x{} {:?} frame, pts {:?}",
                    frame.width(),
                    frame.height(),
                    frame.format(),
                    pts
                );
                Ok(Some(DecodedFrame {
                    frame,
                    timing: FrameTiming::new(pts, duration, self.time_base),
                }))
            }
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => Ok(None),
            Err(e) => Err(error_from_ffmpeg(e)),
        }
    }
}

impl std::fmt::Debug for VideoDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoDecoder")
            .field("time_base", &self.time_base)
            .finish_non_exhaustive()
    }
}
