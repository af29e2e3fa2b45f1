//! Minimal HID report descriptor item decoder
//!
//! Only enough of the item encoding is understood to recover the top-level
//! Usage Page and Usage. Long items are skipped over without looking at
//! their payload. See HID 1.11 sections 6.2.2.2 (short items) and 6.2.2.3
//! (long items).

use tracing::trace;

use crate::error::DescriptorError;
use crate::protocol::tag;

/// Payload length for each short-item size class (bSize = 0, 1, 2, 3)
const SHORT_PAYLOAD_LEN: [usize; 4] = [0, 1, 2, 4];

/// Header bytes counted in a long item's cursor advance
const LONG_ITEM_HEADER: usize = 5;

/// One decoded item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportItem {
    /// Short items: prefix byte with the size bits cleared.
    /// Long items: bLongItemTag.
    pub tag: u8,
    /// Little-endian, zero-extended payload. Always zero for long items.
    pub value: u32,
}

/// Decode the item at `*cursor` and advance the cursor past it.
///
/// `data.len()` is the exclusive end bound. Items whose trailing bytes would
/// reach the end bound are rejected rather than read.
pub fn decode_item(data: &[u8], cursor: &mut usize) -> Result<ReportItem, DescriptorError> {
    let p = *cursor;
    let end = data.len();
    if p >= end {
        return Err(DescriptorError::EndOfBuffer { offset: p });
    }

    let prefix = data[p];
    let (item, advance) = if prefix == tag::LONG_ITEM {
        if p + LONG_ITEM_HEADER >= end {
            return Err(DescriptorError::Truncated {
                offset: p,
                needed: p + LONG_ITEM_HEADER + 1 - end,
            });
        }
        let data_size = data[p + 1] as usize;
        if p + data_size >= end {
            return Err(DescriptorError::Truncated {
                offset: p,
                needed: p + data_size + 1 - end,
            });
        }
        let item = ReportItem {
            tag: data[p + 2],
            value: 0,
        };
        (item, LONG_ITEM_HEADER + data_size)
    } else {
        let len = SHORT_PAYLOAD_LEN[(prefix & 0x03) as usize];
        if p + len + 1 >= end {
            return Err(DescriptorError::Truncated {
                offset: p,
                needed: p + len + 2 - end,
            });
        }
        let value = data[p + 1..p + 1 + len]
            .iter()
            .rev()
            .fold(0u32, |acc, &b| (acc << 8) | b as u32);
        let item = ReportItem {
            tag: prefix & 0xFC,
            value,
        };
        (item, 1 + len)
    };

    *cursor = p + advance;
    Ok(item)
}

/// Iterator over the decodable items of a report descriptor
///
/// Stops at the first item that cannot be decoded.
pub struct ReportItems<'a> {
    data: &'a [u8],
    cursor: usize,
    stopped: Option<DescriptorError>,
}

impl<'a> ReportItems<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            cursor: 0,
            stopped: None,
        }
    }

    /// Why iteration ended, once it has
    pub fn stop_reason(&self) -> Option<DescriptorError> {
        self.stopped
    }
}

impl Iterator for ReportItems<'_> {
    type Item = ReportItem;

    fn next(&mut self) -> Option<ReportItem> {
        if self.stopped.is_some() {
            return None;
        }
        match decode_item(self.data, &mut self.cursor) {
            Ok(item) => Some(item),
            Err(e) => {
                trace!("descriptor scan stopped: {}", e);
                self.stopped = Some(e);
                None
            }
        }
    }
}

/// Top-level usage recovered from a report descriptor. Zero means absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TopLevelUsage {
    pub usage_page: u32,
    pub usage: u32,
}

impl TopLevelUsage {
    /// Both a usage page and a usage were found and are non-zero
    pub fn is_complete(&self) -> bool {
        self.usage_page != 0 && self.usage != 0
    }
}

/// Find the first Usage Page and the first Usage item of a descriptor.
pub fn top_level_usage(data: &[u8]) -> TopLevelUsage {
    let mut usage_page = None;
    let mut usage = None;

    for item in ReportItems::new(data) {
        trace!("  tag: {:X}, val {:X}", item.tag, item.value);
        match item.tag {
            tag::USAGE_PAGE if usage_page.is_none() => usage_page = Some(item.value),
            tag::USAGE if usage.is_none() => usage = Some(item.value),
            _ => {}
        }
        if usage_page.is_some() && usage.is_some() {
            break;
        }
    }

    TopLevelUsage {
        usage_page: usage_page.unwrap_or(0),
        usage: usage.unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Report descriptor of the Teensy raw HID example firmware
    const TEENSY_RAWHID: &[u8] = &[
        0x06, 0xAB, 0xFF, // Usage Page (0xFFAB)
        0x0A, 0x00, 0x02, // Usage (0x0200)
        0xA1, 0x01, // Collection (Application)
        0x75, 0x08, // Report Size (8)
        0x15, 0x00, // Logical Minimum (0)
        0x26, 0xFF, 0x00, // Logical Maximum (255)
        0x95, 0x40, // Report Count (64)
        0x09, 0x01, // Usage (1)
        0x81, 0x02, // Input (Data, Var, Abs)
        0x95, 0x40, // Report Count (64)
        0x09, 0x02, // Usage (2)
        0x91, 0x02, // Output (Data, Var, Abs)
        0xC0, // End Collection
    ];

    #[test]
    fn test_short_items() {
        let mut cursor = 0;
        let item = decode_item(TEENSY_RAWHID, &mut cursor).unwrap();
        assert_eq!(item, ReportItem { tag: 0x04, value: 0xFFAB });
        assert_eq!(cursor, 3);

        let item = decode_item(TEENSY_RAWHID, &mut cursor).unwrap();
        assert_eq!(item, ReportItem { tag: 0x08, value: 0x0200 });
        assert_eq!(cursor, 6);

        let item = decode_item(TEENSY_RAWHID, &mut cursor).unwrap();
        assert_eq!(item, ReportItem { tag: 0xA0, value: 0x01 });
        assert_eq!(cursor, 8);
    }

    #[test]
    fn test_zero_and_four_byte_payloads() {
        let data = [0xC0, 0x07, 0x78, 0x56, 0x34, 0x12, 0x00];
        let mut cursor = 0;
        let item = decode_item(&data, &mut cursor).unwrap();
        assert_eq!(item, ReportItem { tag: 0xC0, value: 0 });
        assert_eq!(cursor, 1);

        let item = decode_item(&data, &mut cursor).unwrap();
        assert_eq!(item, ReportItem { tag: 0x04, value: 0x1234_5678 });
        assert_eq!(cursor, 6);
    }

    #[test]
    fn test_long_item() {
        // bDataSize = 2, bLongItemTag = 0x33, followed by filler
        let data = [0xFE, 0x02, 0x33, 0xAA, 0xBB, 0x00, 0x00, 0x00];
        let mut cursor = 0;
        let item = decode_item(&data, &mut cursor).unwrap();
        assert_eq!(item, ReportItem { tag: 0x33, value: 0 });
        assert_eq!(cursor, 7);
    }

    #[test]
    fn test_long_item_truncated() {
        let data = [0xFE, 0x02, 0x33, 0xAA, 0xBB];
        let mut cursor = 0;
        assert!(matches!(
            decode_item(&data, &mut cursor),
            Err(DescriptorError::Truncated { offset: 0, .. })
        ));
        assert_eq!(cursor, 0);

        // header fits but bDataSize reaches the end bound
        let data = [0xFE, 0x08, 0x33, 0x00, 0x00, 0x00, 0x00];
        assert!(decode_item(&data, &mut 0).is_err());
    }

    #[test]
    fn test_end_of_buffer() {
        let mut cursor = 3;
        assert_eq!(
            decode_item(&[0x09, 0x01, 0x00], &mut cursor),
            Err(DescriptorError::EndOfBuffer { offset: 3 })
        );
        assert_eq!(
            decode_item(&[], &mut 0),
            Err(DescriptorError::EndOfBuffer { offset: 0 })
        );
    }

    #[test]
    fn test_item_touching_end_is_rejected() {
        // The payload would fit exactly, but the bound check keeps one byte
        // of slack past the item.
        let data = [0x06, 0xAB, 0xFF];
        assert!(matches!(
            decode_item(&data, &mut 0),
            Err(DescriptorError::Truncated { offset: 0, needed: 1 })
        ));
        // A lone zero-length item is rejected for the same reason
        assert!(decode_item(&[0xC0], &mut 0).is_err());
    }

    #[test]
    fn test_items_iterator_stops_on_failure() {
        let mut items = ReportItems::new(&[0x09, 0x01, 0x06, 0xAB]);
        assert_eq!(items.next(), Some(ReportItem { tag: 0x08, value: 1 }));
        assert_eq!(items.next(), None);
        assert!(matches!(
            items.stop_reason(),
            Some(DescriptorError::Truncated { offset: 2, .. })
        ));
        assert_eq!(items.next(), None);
    }

    #[test]
    fn test_top_level_usage_teensy() {
        let usage = top_level_usage(TEENSY_RAWHID);
        assert_eq!(
            usage,
            TopLevelUsage {
                usage_page: 0xFFAB,
                usage: 0x0200
            }
        );
        assert!(usage.is_complete());
    }

    #[test]
    fn test_top_level_usage_keeps_first_values() {
        let data = [
            0x05, 0x01, // Usage Page (Generic Desktop)
            0x05, 0x0C, // Usage Page (Consumer)
            0x09, 0x06, // Usage (Keyboard)
            0x09, 0x02, // Usage (Mouse)
            0xC0,
        ];
        let usage = top_level_usage(&data);
        assert_eq!(usage.usage_page, 0x01);
        assert_eq!(usage.usage, 0x06);
    }

    #[test]
    fn test_top_level_usage_missing_usage() {
        let data = [0x06, 0xAB, 0xFF, 0xA1, 0x01, 0xC0];
        let usage = top_level_usage(&data);
        assert_eq!(usage.usage_page, 0xFFAB);
        assert_eq!(usage.usage, 0);
        assert!(!usage.is_complete());
    }

    #[test]
    fn test_top_level_usage_skips_long_items() {
        let data = [
            0xFE, 0x00, 0x10, 0x00, 0x00, // long item, no payload
            0x06, 0x00, 0xFF, // Usage Page (0xFF00)
            0x09, 0x01, // Usage (1)
            0xC0,
        ];
        let usage = top_level_usage(&data);
        assert_eq!(usage.usage_page, 0xFF00);
        assert_eq!(usage.usage, 0x01);
    }
}
