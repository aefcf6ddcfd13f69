use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum BookingQueueError {
    #[error("Subscriber fell behind and skipped {skipped} events")]
    Lagged { skipped: u64 },

    #[error("Event queue closed")]
    Closed,
}
