pub mod capture_task;
pub mod fetcher;
pub mod http_fetcher;
pub mod normalizer;
#[cfg(test)]
pub mod test_doubles;
pub mod types;

pub use capture_task::CaptureTask;
pub use fetcher::Fetcher;
pub use http_fetcher::HttpFetcher;
pub use normalizer::ImageNormalizer;
pub use types::{CaptureErrorKind, CaptureOutcome, RoundResult};
