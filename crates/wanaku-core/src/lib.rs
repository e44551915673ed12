pub mod codec;
pub mod entry;
pub mod errors;
pub mod response;
pub mod service_type;
pub mod state;
pub mod target;
pub mod time;

pub use codec::{Deserializer, JsonCodec, Serializer};
pub use entry::{SERVICE_ID_LEN, ServiceEntry};
pub use errors::{WanakuError, WanakuResult};
pub use response::{ResponseError, WanakuResponse};
pub use service_type::ServiceType;
pub use state::ServiceState;
pub use target::ServiceTarget;
pub use time::{Clock, SystemClock};
