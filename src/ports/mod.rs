pub mod automation;
pub mod http;
pub mod provisioner;
pub mod transcoder;
pub mod transcriber;

pub use automation::{Automation, ElementRef, FrameRef, SessionHandle};
pub use http::HttpClient;
pub use provisioner::Provisioner;
pub use transcoder::Transcoder;
pub use transcriber::Transcriber;
