/*!
    Subtitle decoder implementation.
*/

use ffmpeg_next::codec::{
    decoder::Subtitle as SubtitleDecoderFFmpeg,
    subtitle::{Rect, Subtitle as SubtitleFFmpeg},
};

use cellvis_source::{CodecConfig, error_from_ffmpeg};
use cellvis_types::{Packet, Result, StreamKind, SubtitleRect};

/**
    Subtitle decoder.

    Decodes subtitle packets into rectangles. Text extraction from those
    rectangles lives in `cellvis_types::subtitle`.
*/
pub struct SubtitleDecoder {
    decoder: SubtitleDecoderFFmpeg,
}

impl SubtitleDecoder {
    pub fn new(codec_config: CodecConfig) -> Result<Self> {
        let decoder = codec_config
            .into_context(StreamKind::Subtitle)?
            .decoder()
            .subtitle()
            .map_err(error_from_ffmpeg)?;

        Ok(Self { decoder })
    }

    /**
        Decode one subtitle packet.

        Returns `Ok(None)` when the packet completes no subtitle.
    */
    pub fn decode(&mut self, packet: &Packet) -> Result<Option<Vec<SubtitleRect>>> {
        let mut ffmpeg_pkt = ffmpeg_next::Packet::copy(&packet.data);
        if let Some(pts) = packet.pts {
            ffmpeg_pkt.set_pts(Some(pts.0));
        }

        let mut subtitle = SubtitleFFmpeg::new();
        let got = self
            .decoder
            .decode(&ffmpeg_pkt, &mut subtitle)
            .map_err(error_from_ffmpeg)?;
        if !got {
            return Ok(None);
        }

        let rects = subtitle
            .rects()
            .filter_map(|rect| match rect {
                Rect::Ass(ass) => Some(SubtitleRect::Ass(ass.get().to_owned())),
                Rect::Text(text) => Some(SubtitleRect::Text(text.get().to_owned())),
                Rect::Bitmap(_) => Some(SubtitleRect::Bitmap),
                Rect::None(_) => None,
            })
            .collect();

        Ok(Some(rects))
    }
}

impl std::fmt::Debug for SubtitleDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubtitleDecoder").finish_non_exhaustive()
    }
}
