pub mod controller;
pub mod scanner;
pub mod segmenter;
pub mod session;
pub mod traits;

pub use controller::StreamController;
pub use scanner::{MarkerScan, partial_prefix_len, scan};
pub use segmenter::{Segment, segment};
pub use session::StreamSession;
pub use traits::{EmissionState, Fragment, SessionId, StreamError, TransportError};
