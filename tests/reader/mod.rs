//! Reader module tests.

mod event_channel_test;
mod stream_reader_test;
