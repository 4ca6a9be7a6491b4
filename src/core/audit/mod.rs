pub mod audit_trail;

pub use audit_trail::{AuditAction, AuditTrail, SYNC_ACTOR};
