pub mod fixtures;
pub mod live;
pub mod logging;
pub mod query;
pub mod session;
pub mod source;

pub use fixtures::{MockSpec, generate_mock_tokens};
pub use live::{ConnectionState, DeltaSimulator, LiveEvent, LiveFeed, SimulatorConfig};
pub use query::{QueryConfig, QueryKey, QueryTracker, RequestId};
pub use session::{
    FetchOutcome, Notification, QuickBuyError, QuickBuyOrder, Session, SharedSession, lock, refresh,
};
pub use source::{MockSourceConfig, MockTokenSource, TokenPage, TokenQuery, TokenSource};
