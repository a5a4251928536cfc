/*!
    Packet pump: moves packets from a demuxer into a codec and frames back
    out, through the codec's send/receive state machine.

    The codec may be too full to take a packet, may refuse one outright, or
    may hold frames back until end of input. The pump handles all three so
    the streaming backend only sees "next frame" or "end of stream".
*/

use cellvis_types::{Packet, SendOutcome};

use crate::error::{Error, Result};

/**
    Where packets come from. `Ok(None)` is end of input.
*/
pub(crate) trait PacketSource {
    fn next_packet(&mut self) -> cellvis_types::Result<Option<Packet>>;
}

/**
    A codec with a send/receive interface.
*/
pub(crate) trait PacketSink {
    type Frame;

    fn send_packet(&mut self, packet: &Packet) -> SendOutcome;

    fn send_eof(&mut self) -> SendOutcome;

    /**
        `Ok(None)` means the codec wants more input. End of stream is
        reported as an error once it is drained.
    */
    fn receive_frame(&mut self) -> cellvis_types::Result<Option<Self::Frame>>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Input {
    Reading,
    /// The source is exhausted; end of input still has to reach the codec.
    EofPending,
    Draining,
}

pub(crate) struct PacketPump<S, D> {
    source: S,
    decoder: D,
    pending: Option<Packet>,
    input: Input,
    send_failures: u32,
    max_send_failures: u32,
}

impl<S: PacketSource, D: PacketSink> PacketPump<S, D> {
    /**
        `max_send_failures` is the number of consecutive packets the codec
        may refuse before decoding fails.
    */
    pub(crate) fn new(source: S, decoder: D, max_send_failures: u32) -> Self {
        Self {
            source,
            decoder,
            pending: None,
            input: Input::Reading,
            send_failures: 0,
            max_send_failures,
        }
    }

    pub(crate) fn source(&self) -> &S {
        &self.source
    }

    /**
        Receive the next frame, feeding the codec as needed.

        Subtitle packets read along the way go to `on_subtitle` and never
        reach the codec.
    */
    pub(crate) fn next_frame(&mut self, mut on_subtitle: impl FnMut(&Packet)) -> Result<D::Frame> {
        loop {
            if let Some(frame) = self.decoder.receive_frame()? {
                return Ok(frame);
            }

            // Nothing buffered after end of input means nothing is coming.
            if self.input == Input::Draining {
                return Err(Error::EndOfStream);
            }
            self.feed(&mut on_subtitle)?;
        }
    }

    /**
        Feed the codec. Returns once one packet has been handed over (or
        left pending), or end of input has been signalled.
    */
    fn feed(&mut self, on_subtitle: &mut impl FnMut(&Packet)) -> Result<()> {
        if self.input == Input::EofPending {
            return self.send_eof();
        }

        loop {
            let packet = match self.pending.take() {
                Some(packet) => packet,
                None => match self.source.next_packet()? {
                    Some(packet) => packet,
                    None => {
                        log::debug!("end of input, draining decoder");
                        return self.send_eof();
                    }
                },
            };

            if packet.is_subtitle() {
                on_subtitle(&packet);
                continue;
            }

            match self.decoder.send_packet(&packet) {
                SendOutcome::Accepted => {
                    self.send_failures = 0;
                    return Ok(());
                }
                SendOutcome::Full => {
                    self.pending = Some(packet);
                    return Ok(());
                }
                SendOutcome::Rejected(e) => {
                    // The packet is dropped; the next one may still decode.
                    self.send_failures += 1;
                    log::warn!(
                        "codec rejected packet ({} in a row): {}",
                        self.send_failures,
                        e
                    );
                    if self.send_failures >= self.max_send_failures {
                        return Err(Error::Decode(format!(
                            "codec rejected {} packets in a row: {}",
                            self.send_failures, e
                        )));
                    }
                }
            }
        }
    }

    fn send_eof(&mut self) -> Result<()> {
        match self.decoder.send_eof() {
            SendOutcome::Accepted => self.input = Input::Draining,
            SendOutcome::Full => self.input = Input::EofPending,
            SendOutcome::Rejected(e) => return Err(e.into()),
        }
        Ok(())
    }
}

impl<S, D> std::fmt::Debug for PacketPump<S, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketPump")
            .field("input", &self.input)
            .field("pending", &self.pending.is_some())
            .field("send_failures", &self.send_failures)
            .finish_non_exhaustive()
    }
}
