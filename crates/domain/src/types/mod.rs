//! Domain types and models.

pub mod events;
pub mod intent;
pub mod logs;
pub mod queue;
pub mod recurrence;
pub mod task;
pub mod user;

pub use events::{ChangeEvent, TaskAction};
pub use intent::{IntentOutcome, ToolIntent};
pub use logs::{LogKind, UserLogEntry};
pub use queue::{QueueStatus, QueuedRequest, ScheduleQueueEntry};
pub use recurrence::{Frequency, RecurrenceRule, RuleDay};
pub use task::{Importance, ScheduleType, Task, TaskDraft, TaskPatch, TaskSummary};
pub use user::{BoundaryPolicy, UserRecord};
