//! The event contract between the decoder and its consumer.
//!
//! The driver emits exactly one event per character position: either a
//! text codepoint or one of the reserved control marks that structure the
//! document (paragraph ends, cell ends, anchors, breaks).

use super::properties::PropertyState;

/// Reserved control values emitted in place of a text codepoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMark {
    /// 0x0001 - inline picture anchor; the sink may pull the bytes
    InlinePicture,
    /// 0x0002 - footnote reference mark
    FootnoteMark,
    /// 0x0007 - cell end mark (row end at a TTP paragraph)
    CellMark,
    /// 0x0008 - floating picture anchor
    FloatingPicture,
    /// 0x0009 - horizontal tab
    Tab,
    /// 0x000B - hard line break
    LineBreak,
    /// 0x000C - page break
    PageBreak,
    /// 0x000D - paragraph end mark
    ParagraphMark,
    /// 0x0013 - hyperlink start
    HyperlinkStart,
    /// 0x0014 - hyperlink separator between URL and display text
    HyperlinkSeparator,
    /// 0x0015 - hyperlink end
    HyperlinkEnd,
    /// 0x001E - hyphen
    Hyphen,
    /// 0x001F - soft hyphen
    SoftHyphen,
    /// Any other sub-0x20 control value
    Other(u16),
}

impl ControlMark {
    /// Map a raw control value to its mark.
    pub fn from_value(value: u16) -> Self {
        match value {
            0x0001 => ControlMark::InlinePicture,
            0x0002 => ControlMark::FootnoteMark,
            0x0007 => ControlMark::CellMark,
            0x0008 => ControlMark::FloatingPicture,
            0x0009 => ControlMark::Tab,
            0x000B => ControlMark::LineBreak,
            0x000C => ControlMark::PageBreak,
            0x000D => ControlMark::ParagraphMark,
            0x0013 => ControlMark::HyperlinkStart,
            0x0014 => ControlMark::HyperlinkSeparator,
            0x0015 => ControlMark::HyperlinkEnd,
            0x001E => ControlMark::Hyphen,
            0x001F => ControlMark::SoftHyphen,
            other => ControlMark::Other(other),
        }
    }

    /// The raw control value of this mark.
    pub fn value(self) -> u16 {
        match self {
            ControlMark::InlinePicture => 0x0001,
            ControlMark::FootnoteMark => 0x0002,
            ControlMark::CellMark => 0x0007,
            ControlMark::FloatingPicture => 0x0008,
            ControlMark::Tab => 0x0009,
            ControlMark::LineBreak => 0x000B,
            ControlMark::PageBreak => 0x000C,
            ControlMark::ParagraphMark => 0x000D,
            ControlMark::HyperlinkStart => 0x0013,
            ControlMark::HyperlinkSeparator => 0x0014,
            ControlMark::HyperlinkEnd => 0x0015,
            ControlMark::Hyphen => 0x001E,
            ControlMark::SoftHyphen => 0x001F,
            ControlMark::Other(v) => v,
        }
    }
}

/// One decoded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocEvent {
    /// A text codepoint
    Char(char),
    /// A reserved control value
    Control(ControlMark),
}

impl DocEvent {
    /// Classify a decoded codepoint into an event.
    ///
    /// Values reserved by the contract (all below 0x20) become control
    /// marks; anything else is text. Unrepresentable codepoints fold to
    /// U+FFFD.
    pub fn from_codepoint(value: u32) -> Self {
        if value < 0x20 {
            DocEvent::Control(ControlMark::from_value(value as u16))
        } else {
            DocEvent::Char(char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER))
        }
    }
}

/// Whether the driver continues after a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkFlow {
    Continue,
    /// Abort the traversal; the session unwinds cleanly
    Stop,
}

/// Consumer of decoded events.
///
/// One hook per sub-document; each receives the composed property state
/// and the event. Footnote and header hooks default to ignoring their
/// input. Callbacks must not re-enter the session (the exclusive borrow
/// enforces this).
pub trait EventSink {
    /// Main document body.
    fn main_document(&mut self, props: &PropertyState, event: DocEvent) -> SinkFlow;

    /// Footnote sub-document.
    fn footnotes(&mut self, _props: &PropertyState, _event: DocEvent) -> SinkFlow {
        SinkFlow::Continue
    }

    /// Header/footer/separator sub-document.
    fn headers(&mut self, _props: &PropertyState, _event: DocEvent) -> SinkFlow {
        SinkFlow::Continue
    }
}

/// How a traversal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// All sub-documents were emitted
    Finished,
    /// A sink requested termination
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_roundtrip() {
        for value in [
            0x0001u16, 0x0002, 0x0007, 0x0008, 0x0009, 0x000B, 0x000C, 0x000D, 0x0013, 0x0014,
            0x0015, 0x001E, 0x001F,
        ] {
            assert_eq!(ControlMark::from_value(value).value(), value);
        }
        assert_eq!(ControlMark::from_value(0x0003), ControlMark::Other(3));
    }

    #[test]
    fn test_classification() {
        assert_eq!(
            DocEvent::from_codepoint(0x0D),
            DocEvent::Control(ControlMark::ParagraphMark)
        );
        assert_eq!(DocEvent::from_codepoint(0x41), DocEvent::Char('A'));
        // en/em dash decode as plain characters
        assert_eq!(DocEvent::from_codepoint(0x2014), DocEvent::Char('\u{2014}'));
    }
}
