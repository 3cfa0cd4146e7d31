//! Tests for the channel form of the reader.

use std::io;

use futures_util::StreamExt;
use streampump::reader::{
    event_stream, spawn_event_reader, ChunkPolicy, ReaderEvent, Termination,
    DEFAULT_CHANNEL_CAPACITY,
};
use tokio::io::AsyncWriteExt;
use tokio_test::io::Builder;

#[test]
fn default_channel_capacity() {
    assert_eq!(DEFAULT_CHANNEL_CAPACITY, 64);
}

#[tokio::test]
async fn events_arrive_in_order_with_single_terminal() {
    let (handle, stream) = event_stream(&b"a\nbb\nccc"[..], ChunkPolicy::line(), 8);
    let events: Vec<ReaderEvent> = stream.collect().await;

    assert_eq!(
        events,
        vec![
            ReaderEvent::Started,
            ReaderEvent::Chunk(b"a".to_vec()),
            ReaderEvent::Chunk(b"bb".to_vec()),
            ReaderEvent::EndOfStream,
        ]
    );
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);

    let summary = handle.join().await.unwrap();
    assert_eq!(summary.bytes_discarded, 3);
}

#[tokio::test]
async fn fault_is_delivered_as_typed_event() {
    let source = Builder::new()
        .read(b"12345678")
        .read_error(io::Error::new(io::ErrorKind::ConnectionAborted, "aborted"))
        .build();
    let (handle, mut rx) = spawn_event_reader(source, ChunkPolicy::block(4).unwrap(), 4);

    assert_eq!(rx.recv().await, Some(ReaderEvent::Started));
    assert_eq!(rx.recv().await, Some(ReaderEvent::Chunk(b"12345678".to_vec())));
    match rx.recv().await {
        Some(ReaderEvent::Fault(error)) => {
            assert_eq!(error.io_kind(), Some(io::ErrorKind::ConnectionAborted));
        }
        other => panic!("Expected Fault, got {other:?}"),
    }
    assert_eq!(rx.recv().await, None);

    let summary = handle.join().await.unwrap();
    assert!(matches!(summary.termination, Termination::Fault(_)));
}

#[tokio::test]
async fn capacity_one_applies_backpressure_without_loss() {
    let (source, mut writer) = tokio::io::duplex(256);
    let (handle, mut rx) = spawn_event_reader(source, ChunkPolicy::line(), 1);

    let writer_task = tokio::spawn(async move {
        for i in 0..50 {
            writer
                .write_all(format!("line {i}\n").as_bytes())
                .await
                .unwrap();
        }
    });

    let mut lines = Vec::new();
    while let Some(event) = rx.recv().await {
        if let ReaderEvent::Chunk(chunk) = event {
            lines.push(String::from_utf8(chunk).unwrap());
        }
    }
    writer_task.await.unwrap();

    let expected: Vec<String> = (0..50).map(|i| format!("line {i}")).collect();
    assert_eq!(lines, expected);
    assert_eq!(handle.join().await.unwrap().chunks, 50);
}

#[tokio::test]
async fn dropping_receiver_stops_reader() {
    let (source, mut writer) = tokio::io::duplex(64);
    let (handle, mut rx) = spawn_event_reader(source, ChunkPolicy::line(), 1);

    assert_eq!(rx.recv().await, Some(ReaderEvent::Started));
    drop(rx);

    // The reader only notices at its next delivery.
    let _ = writer.write_all(b"unheard\n").await;

    let summary = handle.join().await.unwrap();
    assert_eq!(summary.termination, Termination::Detached);
    assert_eq!(summary.chunks, 0);
}
