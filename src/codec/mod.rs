//! Codec module - serialization of tracking structs.
//!
//! Every struct frame on the wire carries a MessagePack body produced by
//! [`MsgPackCodec`]. Records are encoded in map form so that fields can be
//! added later without breaking older peers.
//!
//! # Example
//!
//! ```
//! use rpc_tracker::codec::MsgPackCodec;
//! use rpc_tracker::tracking::UpgradeArgs;
//!
//! let args = UpgradeArgs::new("billing", 2);
//! let encoded = MsgPackCodec::encode(&args).unwrap();
//! let decoded: UpgradeArgs = MsgPackCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, args);
//! ```

mod msgpack;

pub use msgpack::MsgPackCodec;
