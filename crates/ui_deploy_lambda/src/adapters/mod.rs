pub mod channel;
#[cfg(any(test, feature = "test-helpers"))]
pub mod memory;
pub mod object_store;
pub mod s3;
pub mod sqs;
