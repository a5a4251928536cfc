/*!
    Compressed packets as produced by a demuxer.
*/

use crate::{Error, Pts, Rational};

/**
    Which selected stream a packet belongs to.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// The primary (video) stream.
    Video,
    /// The secondary (subtitle/text) stream.
    Subtitle,
}

/**
    One demuxed, still-encoded unit of stream data.
*/
#[derive(Clone, Debug)]
pub struct Packet {
    pub data: Vec<u8>,
    pub pts: Option<Pts>,
    pub dts: Option<Pts>,
    /// Duration in `time_base` units.
    pub duration: i64,
    pub time_base: Rational,
    pub is_keyframe: bool,
    pub stream: StreamKind,
}

impl Packet {
    pub fn new(
        data: Vec<u8>,
        pts: Option<Pts>,
        dts: Option<Pts>,
        duration: i64,
        time_base: Rational,
        is_keyframe: bool,
        stream: StreamKind,
    ) -> Self {
        Self {
            data,
            pts,
            dts,
            duration,
            time_base,
            is_keyframe,
            stream,
        }
    }

    pub fn is_subtitle(&self) -> bool {
        self.stream == StreamKind::Subtitle
    }
}

/**
    What a decoder did with a packet (or with end of input) it was handed.
*/
#[derive(Debug)]
pub enum SendOutcome {
    /// The decoder took it.
    Accepted,
    /// The decoder's input is full. Receive frames, then send the same
    /// packet again.
    Full,
    /// The decoder refused the packet. It will never accept it.
    Rejected(Error),
}
