//! Protobuf decoding for GTFS Realtime feeds.

use prost::Message;
use tracing::debug;

use crate::error::RealtimeError;
use crate::gtfs_rt::FeedMessage;

/// Decodes a protobuf-encoded GTFS-RT [`FeedMessage`] from raw bytes.
///
/// Empty input is the "no data" case from the fetch layer and short-circuits
/// to a message with zero entities without touching the decoder.
///
/// # Errors
///
/// Returns [`RealtimeError::Decode`] if the bytes are not valid protobuf for a
/// `FeedMessage`, and [`RealtimeError::MissingHeader`] if they decode but
/// carry no header version.
pub fn decode_feed(bytes: &[u8]) -> Result<FeedMessage, RealtimeError> {
    if bytes.is_empty() {
        return Ok(FeedMessage::default());
    }

    let feed = FeedMessage::decode(bytes)?;
    if feed.header.gtfs_realtime_version.is_empty() {
        return Err(RealtimeError::MissingHeader);
    }

    debug!(
        version = %feed.header.gtfs_realtime_version,
        timestamp = feed.header.timestamp,
        entity_count = feed.entity.len(),
        "Feed decoded"
    );
    Ok(feed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs_rt::{FeedEntity, FeedHeader, Position, VehicleDescriptor, VehiclePosition};

    fn header() -> FeedHeader {
        FeedHeader {
            gtfs_realtime_version: "2.0".to_string(),
            timestamp: Some(1234567890),
            incrementality: None,
            feed_version: None,
        }
    }

    #[test]
    fn test_decode_empty_bytes_returns_empty_feed() {
        let feed = decode_feed(&[]).unwrap();
        assert!(feed.entity.is_empty());
    }

    #[test]
    fn test_decode_invalid_bytes() {
        let invalid_bytes = vec![0xFF, 0xFE, 0x00, 0x01];
        let result = decode_feed(&invalid_bytes);
        assert!(matches!(result, Err(RealtimeError::Decode(_))));
    }

    #[test]
    fn test_decode_without_header_version() {
        // Entity only, header left at its default.
        let feed = FeedMessage {
            header: FeedHeader::default(),
            entity: vec![FeedEntity {
                id: "1".to_string(),
                ..Default::default()
            }],
        };
        let result = decode_feed(&feed.encode_to_vec());
        assert!(matches!(result, Err(RealtimeError::MissingHeader)));
    }

    #[test]
    fn test_decode_preserves_entities() {
        let feed = FeedMessage {
            header: header(),
            entity: vec![FeedEntity {
                id: "vehicle-1".to_string(),
                vehicle: Some(VehiclePosition {
                    vehicle: Some(VehicleDescriptor {
                        id: Some("test-bus-01".to_string()),
                        ..Default::default()
                    }),
                    position: Some(Position {
                        latitude: 50.0,
                        longitude: 20.0,
                        bearing: None,
                        odometer: None,
                        speed: None,
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }],
        };

        let parsed = decode_feed(&feed.encode_to_vec()).unwrap();

        assert_eq!(parsed.header.gtfs_realtime_version, "2.0");
        assert_eq!(parsed.header.timestamp, Some(1234567890));
        assert_eq!(parsed, feed);
    }
}
