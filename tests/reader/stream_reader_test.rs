//! Tests for the listener-driven stream reader.

use std::io;

use streampump::reader::{Listener, ReadMode, ReaderError, ReaderState, StreamReader, Termination};
use tokio::io::AsyncWriteExt;
use tokio_test::io::Builder;

use crate::common::{Call, Recorder};

/// Mock source returning `data` in reads of `step` bytes.
fn stepped_source(data: &[u8], step: usize) -> tokio_test::io::Mock {
    let mut builder = Builder::new();
    for piece in data.chunks(step) {
        builder.read(piece);
    }
    builder.build()
}

#[tokio::test]
async fn block_mode_drops_trailing_partial_block() {
    let data: Vec<u8> = (0u8..10).collect();
    let recorder = Recorder::default();
    let reader = StreamReader::with_block_size(
        stepped_source(&data, 2),
        Some(recorder.clone()),
        ReadMode::Block,
        4,
    )
    .unwrap();

    let summary = reader.start().join().await.unwrap();

    recorder.assert_well_formed();
    assert_eq!(recorder.chunks(), vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7]]);
    assert_eq!(summary.bytes_read, 10);
    assert_eq!(summary.bytes_discarded, 2);
}

#[tokio::test]
async fn block_mode_single_byte_reads() {
    let data: Vec<u8> = (0u8..10).collect();
    let recorder = Recorder::default();
    StreamReader::with_block_size(
        stepped_source(&data, 1),
        Some(recorder.clone()),
        ReadMode::Block,
        4,
    )
    .unwrap()
    .start()
    .join()
    .await
    .unwrap();

    assert_eq!(recorder.chunks(), vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7]]);
}

#[tokio::test]
async fn block_mode_flushes_whole_buffer_on_long_read() {
    let recorder = Recorder::default();
    let source = Builder::new().read(b"abc").read(b"defgh").read(b"ij").build();
    StreamReader::with_block_size(source, Some(recorder.clone()), ReadMode::Block, 4)
        .unwrap()
        .start()
        .join()
        .await
        .unwrap();

    // 3 bytes: no flush; 8 bytes accumulated: flush all 8; "ij" is dropped.
    assert_eq!(recorder.chunks(), vec![b"abcdefgh".to_vec()]);
}

#[tokio::test]
async fn block_mode_default_size_is_256() {
    let data = vec![7u8; 600];
    let recorder = Recorder::default();
    let summary = StreamReader::new(stepped_source(&data, 128), Some(recorder.clone()), ReadMode::Block)
        .start()
        .join()
        .await
        .unwrap();

    assert_eq!(recorder.chunks(), vec![vec![7u8; 256], vec![7u8; 256]]);
    assert_eq!(summary.bytes_discarded, 88);
}

#[tokio::test]
async fn line_mode_drops_unterminated_last_line() {
    let recorder = Recorder::default();
    StreamReader::new(&b"a\nbb\nccc"[..], Some(recorder.clone()), ReadMode::Line)
        .start()
        .join()
        .await
        .unwrap();

    recorder.assert_well_formed();
    assert_eq!(recorder.chunks(), vec![b"a".to_vec(), b"bb".to_vec()]);
}

#[tokio::test]
async fn line_mode_keeps_carriage_return() {
    let recorder = Recorder::default();
    StreamReader::new(&b"x\r\ny"[..], Some(recorder.clone()), ReadMode::Line)
        .start()
        .join()
        .await
        .unwrap();

    assert_eq!(recorder.chunks(), vec![b"x\r".to_vec()]);
}

#[tokio::test]
async fn chunk_order_matches_byte_order_for_any_read_size() {
    let text: &[u8] = b"first\nsecond line\n\nthird\nfourth and last\ntail";
    let expected: Vec<Vec<u8>> = vec![
        b"first".to_vec(),
        b"second line".to_vec(),
        Vec::new(),
        b"third".to_vec(),
        b"fourth and last".to_vec(),
    ];

    for step in 1..=9 {
        let recorder = Recorder::default();
        StreamReader::new(stepped_source(text, step), Some(recorder.clone()), ReadMode::Line)
            .start()
            .join()
            .await
            .unwrap();
        assert_eq!(recorder.chunks(), expected, "line mode, step {step}");
    }

    let bytes: Vec<u8> = (0u8..=99).collect();
    for step in 1..=9 {
        let recorder = Recorder::default();
        let summary = StreamReader::with_block_size(
            stepped_source(&bytes, step),
            Some(recorder.clone()),
            ReadMode::Block,
            5,
        )
        .unwrap()
        .start()
        .join()
        .await
        .unwrap();

        let delivered: Vec<u8> = recorder.chunks().concat();
        let delivered_len = usize::try_from(summary.bytes_delivered).unwrap();
        assert_eq!(delivered, bytes[..delivered_len], "block mode, step {step}");
        assert!(recorder.chunks().iter().all(|c| c.len() >= 5));
    }
}

#[tokio::test]
async fn fault_still_finishes_last() {
    let source = Builder::new()
        .read(b"ok\npart")
        .read_error(io::Error::new(io::ErrorKind::UnexpectedEof, "gone"))
        .build();
    let recorder = Recorder::default();
    let summary = StreamReader::new(source, Some(recorder.clone()), ReadMode::Line)
        .start()
        .join()
        .await
        .unwrap();

    recorder.assert_well_formed();
    assert_eq!(
        recorder.calls(),
        vec![Call::Start, Call::Read(b"ok".to_vec()), Call::Fault, Call::Finish]
    );
    assert!(matches!(summary.termination, Termination::Fault(_)));
    assert_eq!(summary.bytes_discarded, 4);
}

#[tokio::test]
async fn fault_before_any_data() {
    let source = Builder::new()
        .read_error(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        .build();
    let recorder = Recorder::default();
    StreamReader::new(source, Some(recorder.clone()), ReadMode::Block)
        .start()
        .join()
        .await
        .unwrap();

    assert_eq!(recorder.calls(), vec![Call::Start, Call::Fault, Call::Finish]);
}

/// Records start and finish but panics on the first chunk.
struct PanicsOnRead(Recorder);

impl Listener for PanicsOnRead {
    fn on_start(&mut self) {
        self.0.on_start();
    }

    fn on_read(&mut self, _chunk: Vec<u8>) {
        panic!("listener rejected chunk");
    }

    fn on_finish(&mut self) {
        self.0.on_finish();
    }
}

#[tokio::test]
async fn panicking_listener_still_finishes_last() {
    let recorder = Recorder::default();
    let result = StreamReader::new(
        &b"a\nb\n"[..],
        Some(PanicsOnRead(recorder.clone())),
        ReadMode::Line,
    )
    .start()
    .join()
    .await;

    assert!(matches!(result, Err(ReaderError::TaskFailed(_))), "{result:?}");
    assert_eq!(recorder.calls(), vec![Call::Start, Call::Finish]);
}

#[tokio::test]
async fn panicking_listener_leaves_handle_finished() {
    let handle = StreamReader::new(
        &b"a\n"[..],
        Some(PanicsOnRead(Recorder::default())),
        ReadMode::Line,
    )
    .start();

    for _ in 0..100 {
        if handle.is_finished() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert_eq!(handle.state(), ReaderState::Finished);
    assert!(handle.join().await.is_err());
}

#[tokio::test]
async fn concurrent_readers_do_not_interfere() {
    let (source_a, mut writer_a) = tokio::io::duplex(16);
    let (source_b, mut writer_b) = tokio::io::duplex(16);
    let recorder_a = Recorder::default();
    let recorder_b = Recorder::default();

    let handle_a = StreamReader::new(source_a, Some(recorder_a.clone()), ReadMode::Line).start();
    let handle_b = StreamReader::new(source_b, Some(recorder_b.clone()), ReadMode::Line).start();

    for i in 0..20 {
        writer_a.write_all(format!("a{i}\n").as_bytes()).await.unwrap();
        writer_b.write_all(format!("b{i}\n").as_bytes()).await.unwrap();
    }
    drop(writer_a);
    drop(writer_b);

    handle_a.join().await.unwrap();
    handle_b.join().await.unwrap();

    let expected_a: Vec<Vec<u8>> = (0..20).map(|i| format!("a{i}").into_bytes()).collect();
    let expected_b: Vec<Vec<u8>> = (0..20).map(|i| format!("b{i}").into_bytes()).collect();
    assert_eq!(recorder_a.chunks(), expected_a);
    assert_eq!(recorder_b.chunks(), expected_b);
    recorder_a.assert_well_formed();
    recorder_b.assert_well_formed();
}

#[tokio::test]
async fn start_returns_before_source_ends() {
    let (source, mut writer) = tokio::io::duplex(64);
    let recorder = Recorder::default();

    let handle = StreamReader::new(source, Some(recorder.clone()), ReadMode::Line).start();
    assert_eq!(handle.state(), ReaderState::Running);

    writer.write_all(b"one\n").await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(!handle.is_finished());

    drop(writer);
    let summary = handle.join().await.unwrap();
    assert_eq!(summary.chunks, 1);
    assert_eq!(recorder.chunks(), vec![b"one".to_vec()]);
}
