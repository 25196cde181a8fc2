//! Minimal reference implementations for testing, available behind the
//! `test-utils` feature flag. These prove the trait contracts are usable
//! and are reused by this crate's own unit tests as well as by
//! downstream crates' integration tests.

mod channel_sink;
mod const_harness;
mod fail_harness;
mod recording_reporter;

pub use channel_sink::ChannelSignalSink;
pub use const_harness::ConstHarness;
pub use fail_harness::FailHarness;
pub use recording_reporter::RecordingReporter;
