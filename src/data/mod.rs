//! Data layer: loading, assembling, filtering and reducing exports.
//!
//! Architecture:
//! ```text
//!  <root>/<category>/*.xlsx|csv|parquet|json
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse files, LapTime → seconds, concat → Table
//!   └──────────┘      (optional <processed>/<category>.csv)
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ assemble  │  Date → calendar date, roster left join (Position)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  schema   │  Table → Vec<SessionRecord> / Vec<LoadRecord>
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  trailing window + population → View
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ aggregate │  group-by mean / sum → Series
//!   └──────────┘
//! ```

pub mod aggregate;
pub mod assemble;
pub mod filter;
pub mod loader;
pub mod model;
pub mod roster;
pub mod schema;
pub mod time;
