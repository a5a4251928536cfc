/*!
    Per-stream decoder setup handed from the source to the decoders.
*/

use ffmpeg_next::codec;

use cellvis_types::{Error, Rational, Result, StreamKind};

/**
    Everything a decoder needs to know about one selected stream.

    Taken from a [`Source`](crate::Source) once per stream. The stream's
    time base travels with the parameters so decoded frames are stamped in
    stream units rather than codec units.
*/
pub struct CodecConfig {
    parameters: codec::Parameters,
    kind: StreamKind,
    time_base: Rational,
}

impl CodecConfig {
    pub(crate) fn new(parameters: codec::Parameters, kind: StreamKind, time_base: Rational) -> Self {
        Self {
            parameters,
            kind,
            time_base,
        }
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn codec_id(&self) -> codec::Id {
        self.parameters.id()
    }

    /**
        Open a decoder context for the stream, checking that the stream is
        of the kind the caller decodes.
    */
    pub fn into_context(self, expected: StreamKind) -> Result<codec::context::Context> {
        if self.kind != expected {
            return Err(Error::unsupported(format!(
                "{:?} stream given to a {:?} decoder",
                self.kind, expected
            )));
        }
        codec::context::Context::from_parameters(self.parameters)
            .map_err(crate::convert::error_from_ffmpeg)
    }
}

impl std::fmt::Debug for CodecConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecConfig")
            .field("kind", &self.kind)
            .field("codec_id", &self.parameters.id())
            .field("time_base", &self.time_base)
            .finish()
    }
}
