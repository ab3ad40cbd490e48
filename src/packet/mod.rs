mod events;
mod key;
mod parse;
mod reader;
mod region;
mod signature;
mod subpacket;
mod user_id;

pub use self::events::{Disposition, Event, PacketHeader, ParseOptions, RawPacket, Sink};
pub use self::key::{PublicKey, PublicParams};
pub use self::parse::parse;
pub use self::reader::{Accumulator, IoSource, ReadOutcome, SliceSource, Source};
pub use self::region::{Region, RegionStack};
pub use self::signature::{HashedRange, Signature, SignatureMaterial};
pub use self::subpacket::Subpacket;
pub use self::user_id::UserId;
