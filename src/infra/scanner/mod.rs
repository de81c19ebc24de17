pub mod qr_reader_client;

pub use qr_reader_client::HttpScanOracle;
