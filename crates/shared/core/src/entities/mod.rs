mod holding;
mod instruction;
mod outcome;
mod report;
mod session;
mod side;
mod target;

pub use holding::{Holding, Holdings, QueryFilter};
pub use instruction::Instruction;
pub use outcome::{Outcome, OutcomeStatus, UnitState};
pub use report::{ExecutionReport, ReportKind, ReportSummary};
pub use session::{Session, SessionHandle};
pub use side::Side;
pub use target::{RateLimit, Target};
