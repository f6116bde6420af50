//! メッセージ送信（通知）の実装
//!
//! ## 実装
//!
//! - `registry`: Mutex で保護された接続レジストリと、接続ごとの
//!   bounded キューを使った Broadcast Fan-out

pub mod registry;

pub use registry::ConnectionRegistry;
