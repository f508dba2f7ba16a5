pub mod issue;
pub mod issue_type;
pub mod record;
pub mod search;
pub mod upsert;
pub mod version;
pub mod worklog;

pub use issue::*;
pub use issue_type::*;
pub use record::*;
pub use search::*;
pub use upsert::*;
pub use version::*;
pub use worklog::*;
