/*!
    Video frame transformation.
*/

use ffmpeg_next::{
    format::Pixel,
    software::scaling::{context::Context as ScalerContext, flag::Flags as ScalerFlags},
    util::frame::video::Video as VideoFrameFFmpeg,
};

use cellvis_source::{copy_planes_from_ffmpeg, pixel_format_to_ffmpeg};
use cellvis_types::{Error, FrameTiming, PixelFormat, Result, VideoFrame};

/**
    Resampling filter used when frames are resized to the cell grid.

    Cell grids are small, so frames are nearly always downscaled hard;
    Lanczos keeps edges readable at that ratio.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScalingAlgorithm {
    Nearest,
    Bilinear,
    Bicubic,
    #[default]
    Lanczos,
}

impl ScalingAlgorithm {
    fn to_ffmpeg_flags(self) -> ScalerFlags {
        match self {
            Self::Nearest => ScalerFlags::POINT,
            Self::Bilinear => ScalerFlags::BILINEAR,
            Self::Bicubic => ScalerFlags::BICUBIC,
            Self::Lanczos => ScalerFlags::LANCZOS,
        }
    }
}

/**
    Configuration for video transformation.
*/
#[derive(Clone, Debug)]
pub struct VideoTransformConfig {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    /// Target pixel format. Must be a packed 32-bit format.
    pub format: PixelFormat,
    /// Scaling algorithm to use.
    pub algorithm: ScalingAlgorithm,
}

impl VideoTransformConfig {
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            algorithm: ScalingAlgorithm::default(),
        }
    }

    /**
        Create configuration for RGBA output, which is what the renderer
        consumes.
    */
    pub fn to_rgba(width: u32, height: u32) -> Self {
        Self::new(width, height, PixelFormat::Rgba)
    }

    /**
        Set the scaling algorithm.
    */
    pub fn with_algorithm(mut self, algorithm: ScalingAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }
}

/**
    Video frame transformer.

    Converts decoded frames to packed 32-bit output at the target size.
    Frames are read in whatever format the codec produced, including high
    bit depth and full-range (JPEG) YUV; the scaler does the conversion.
    The scaler context is created lazily and reused while the source
    geometry, source format and target stay the same; changing any of
    them rebuilds it on the next frame.
*/
pub struct VideoTransform {
    config: VideoTransformConfig,
    scaler_state: Option<ScalerState>,
}

struct ScalerState {
    context: ScalerContext,
    key: ScalerKey,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ScalerKey {
    src_width: u32,
    src_height: u32,
    src_format: Pixel,
    dst_width: u32,
    dst_height: u32,
    dst_format: Pixel,
}

impl VideoTransform {
    pub fn new(config: VideoTransformConfig) -> Self {
        Self {
            config,
            scaler_state: None,
        }
    }

    /**
        Change the output size. The cached scaler is dropped if the size
        actually changed.
    */
    pub fn set_target(&mut self, width: u32, height: u32) {
        if self.config.width != width || self.config.height != height {
            log::debug!(
                "scaler target {}x{} -> {}x{}",
                self.config.width,
                self.config.height,
                width,
                height
            );
            self.config.width = width;
            self.config.height = height;
            self.scaler_state = None;
        }
    }

    /**
        Scale a decoded frame to the target size and format.

        `timing` is carried over to the output unchanged.
    */
    pub fn transform(
        &mut self,
        frame: &VideoFrameFFmpeg,
        timing: FrameTiming,
    ) -> Result<VideoFrame> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(Error::corrupt("input frame has zero dimensions"));
        }
        if frame.format() == Pixel::None {
            return Err(Error::corrupt("input frame has no pixel format"));
        }
        if self.config.width == 0 || self.config.height == 0 {
            return Err(Error::unsupported("scaler target has zero dimensions"));
        }
        if self.config.format.bits_per_pixel() != 32 || self.config.format.is_planar() {
            return Err(Error::unsupported(format!(
                "scaler output must be packed 32-bit, not {:?}",
                self.config.format
            )));
        }

        let key = ScalerKey {
            src_width: frame.width(),
            src_height: frame.height(),
            src_format: frame.format(),
            dst_width: self.config.width,
            dst_height: self.config.height,
            dst_format: pixel_format_to_ffmpeg(self.config.format)?,
        };

        let state = match self.scaler_state.take() {
            Some(state) if state.key == key => state,
            _ => Self::init_scaler(key, self.config.algorithm)?,
        };
        let state = self.scaler_state.insert(state);

        let mut dst_frame = VideoFrameFFmpeg::new(key.dst_format, key.dst_width, key.dst_height);
        state
            .context
            .run(frame, &mut dst_frame)
            .map_err(|e| Error::corrupt(format!("scaling failed: {}", e)))?;

        let data = copy_planes_from_ffmpeg(&dst_frame, self.config.format)?;
        VideoFrame::try_new(
            data,
            key.dst_width,
            key.dst_height,
            self.config.format,
            timing,
        )
    }

    fn init_scaler(key: ScalerKey, algorithm: ScalingAlgorithm) -> Result<ScalerState> {
        log::debug!(
            "creating scaler {}x{} {:?} -> {}x{} {:?}",
            key.src_width,
            key.src_height,
            key.src_format,
            key.dst_width,
            key.dst_height,
            key.dst_format
        );

        let context = ScalerContext::get(
            key.src_format,
            key.src_width,
            key.src_height,
            key.dst_format,
            key.dst_width,
            key.dst_height,
            algorithm.to_ffmpeg_flags(),
        )
        .map_err(|e| Error::unsupported(format!("failed to create scaler: {}", e)))?;

        Ok(ScalerState { context, key })
    }
}

impl std::fmt::Debug for VideoTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoTransform")
            .field("config", &self.config)
            .field("initialized", &self.scaler_state.is_some())
            .finish()
    }
}
